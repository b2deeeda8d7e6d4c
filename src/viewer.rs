//! Host facade: one embedded view, rendered through a bridge channel.

use code_diff_bridge::{
    BridgeChannel, ChannelState, DiffResult, LocalView, RenderHandle, StdioTransport, ViewEvent,
    ViewTransport, WireRequest, codec,
};
use code_diff_config::{DiffOptions, Language, OptionsMap, ViewerConfig};
use tokio::sync::mpsc;

use crate::engine::LineDiffEngine;
use crate::error::ViewerError;

/// A mounted diff view and the settings used to talk to it.
///
/// Per-call options are layered over the configured defaults, which are
/// themselves layered over the built-in defaults.
#[derive(Debug, Clone)]
pub struct DiffViewer {
    channel: BridgeChannel,
    defaults: DiffOptions,
    language: Language,
}

impl DiffViewer {
    /// Mount a view reachable through `transport` / `events`.
    ///
    /// Fails before mounting if the configuration is invalid.
    pub fn mount<T: ViewTransport>(
        transport: T,
        events: mpsc::UnboundedReceiver<ViewEvent>,
        config: &ViewerConfig,
    ) -> Result<Self, ViewerError> {
        config.validate()?;
        let defaults = config.default_options()?;
        let channel = BridgeChannel::mount(transport, events, config.bridge);
        Ok(Self {
            channel,
            defaults,
            language: config.language(),
        })
    }

    /// Mount the reference engine in-process.
    pub fn local(config: &ViewerConfig) -> Result<Self, ViewerError> {
        let (transport, events) = LocalView::spawn(LineDiffEngine::new());
        Self::mount(transport, events, config)
    }

    /// Mount a view subprocess speaking the stdio protocol.
    pub fn stdio(command_line: &str, config: &ViewerConfig) -> Result<Self, ViewerError> {
        let (transport, events) = StdioTransport::spawn(command_line)?;
        Self::mount(transport, events, config)
    }

    /// Mount whatever the configuration asks for: the configured
    /// `view_command` if set, otherwise the in-process reference engine.
    pub fn from_config(config: &ViewerConfig) -> Result<Self, ViewerError> {
        match config.view_command.as_deref() {
            Some(command) => Self::stdio(command, config),
            None => Self::local(config),
        }
    }

    /// Build the wire request for a render call without sending it.
    ///
    /// `language` falls back to the configured default; unknown names fall
    /// back to plain text.
    pub fn request(
        &self,
        old_text: &str,
        new_text: &str,
        options: &OptionsMap,
        language: Option<&str>,
    ) -> Result<WireRequest, ViewerError> {
        let options = self.defaults.overlay(options)?;
        let language = language.map_or(self.language, Language::from_name);
        Ok(codec::encode(old_text, new_text, language, options))
    }

    /// Render a diff and wait for the view's result.
    ///
    /// Waits for the view to mount first. Channel failures are errors; a
    /// render failure inside the view is an `Ok` result with `error` set.
    pub async fn render(
        &self,
        old_text: &str,
        new_text: &str,
        options: &OptionsMap,
        language: Option<&str>,
    ) -> Result<DiffResult, ViewerError> {
        let request = self.request(old_text, new_text, options, language)?;
        self.channel.wait_ready().await?;
        Ok(self.channel.send(request).result().await?)
    }

    /// Send a render without waiting for it. A later send supersedes it.
    pub fn render_handle(
        &self,
        old_text: &str,
        new_text: &str,
        options: &OptionsMap,
        language: Option<&str>,
    ) -> Result<RenderHandle, ViewerError> {
        let request = self.request(old_text, new_text, options, language)?;
        Ok(self.channel.send(request))
    }

    /// Wait for the view to mount.
    pub async fn ready(&self) -> Result<(), ViewerError> {
        Ok(self.channel.wait_ready().await?)
    }

    pub fn state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Unmount the view, cancelling any pending render.
    pub async fn teardown(&self) {
        self.channel.teardown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_diff_config::{DiffStyle, OutputFormat};
    use serde_json::json;

    fn map(value: serde_json::Value) -> OptionsMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_render_through_local_view() {
        let viewer = DiffViewer::local(&ViewerConfig::default()).unwrap();
        let result = viewer
            .render("a\nb\n", "a\nc\n", &OptionsMap::new(), None)
            .await
            .unwrap();
        assert_eq!((result.lines_added, result.lines_removed), (1, 1));
        assert_eq!(result.applied_options, DiffOptions::default());
        assert_eq!(viewer.state(), ChannelState::Ready);
    }

    #[tokio::test]
    async fn test_call_options_override_configured_defaults() {
        let config = ViewerConfig {
            defaults: map(json!({ "diffStyle": "char", "context": 2 })),
            default_language: "python".to_string(),
            ..ViewerConfig::default()
        };
        let viewer = DiffViewer::local(&config).unwrap();

        let request = viewer
            .request("a", "b", &map(json!({ "context": 7 })), None)
            .unwrap();
        assert_eq!(request.options.diff_style, DiffStyle::Char);
        assert_eq!(request.options.context, 7);
        assert_eq!(request.options.output_format, OutputFormat::SideBySide);
        assert_eq!(request.language, Language::Python);

        let request = viewer
            .request("a", "b", &OptionsMap::new(), Some("rust"))
            .unwrap();
        assert_eq!(request.language, Language::Rust);
        assert_eq!(request.options.context, 2);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_send() {
        let viewer = DiffViewer::local(&ViewerConfig::default()).unwrap();
        let err = viewer
            .render("a", "b", &map(json!({ "outputFormat": "grid" })), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ViewerError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_mount() {
        let mut config = ViewerConfig::default();
        config.bridge.response_timeout_ms = 0;
        assert!(matches!(
            DiffViewer::local(&config),
            Err(ViewerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_render_after_teardown_is_not_ready() {
        let viewer = DiffViewer::local(&ViewerConfig::default()).unwrap();
        viewer.ready().await.unwrap();
        viewer.teardown().await;
        assert_eq!(viewer.state(), ChannelState::Unmounted);

        let err = viewer
            .render("a", "b", &OptionsMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ViewerError::Bridge(_)));
    }
}
