use anyhow::Result;
use clap::Parser;
use code_diff_view::cli::{self, Cli, Commands};
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let parsed = Cli::parse();
    code_diff_view::debug::init(parsed.log_level.as_deref());
    log::debug!("code-diff {}", code_diff_view::VERSION);

    let runtime = Runtime::new()?;
    let code = match &parsed.command {
        Commands::Render(args) => runtime.block_on(cli::run_render(args))?,
        Commands::Serve => {
            runtime.block_on(cli::run_serve())?;
            0
        }
    };

    // Stdin reads in `serve` run on a blocking thread that may never return.
    runtime.shutdown_timeout(std::time::Duration::from_millis(200));

    if code != 0 {
        // Non-zero exit: use process::exit so the shell sees the correct code.
        std::process::exit(code);
    }
    Ok(())
}
