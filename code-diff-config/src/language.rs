//! Language identifiers understood by the embedded view.
//!
//! Any identifier outside the recognized set falls back to
//! [`Language::Plaintext`], so language resolution never fails.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Language used by the view to pick its rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Json,
    Yaml,
    Java,
    Bash,
    Sql,
    Html,
    Xml,
    Css,
    Rust,
    Go,
    C,
    Cpp,
    Markdown,
    #[default]
    Plaintext,
}

impl Language {
    /// Canonical wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Java => "java",
            Language::Bash => "bash",
            Language::Sql => "sql",
            Language::Html => "html",
            Language::Xml => "xml",
            Language::Css => "css",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Markdown => "markdown",
            Language::Plaintext => "plaintext",
        }
    }

    /// All recognized languages, for UI iteration.
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Json,
            Language::Yaml,
            Language::Java,
            Language::Bash,
            Language::Sql,
            Language::Html,
            Language::Xml,
            Language::Css,
            Language::Rust,
            Language::Go,
            Language::C,
            Language::Cpp,
            Language::Markdown,
            Language::Plaintext,
        ]
    }

    /// Look up a recognized identifier or alias (case-insensitive).
    ///
    /// Returns `None` for anything outside the recognized set.
    pub fn parse(name: &str) -> Option<Language> {
        let lang = match name.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "json" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "java" => Language::Java,
            "bash" | "sh" | "shell" => Language::Bash,
            "sql" => Language::Sql,
            "html" => Language::Html,
            "xml" => Language::Xml,
            "css" => Language::Css,
            "rust" | "rs" => Language::Rust,
            "go" | "golang" => Language::Go,
            "c" => Language::C,
            "cpp" | "c++" => Language::Cpp,
            "markdown" | "md" => Language::Markdown,
            "plaintext" | "text" | "txt" | "plain" => Language::Plaintext,
            _ => return None,
        };
        Some(lang)
    }

    /// Resolve an identifier, falling back to plain text when unrecognized.
    pub fn from_name(name: &str) -> Language {
        Self::parse(name).unwrap_or_else(|| {
            log::debug!("Unrecognized language '{name}', rendering as plaintext");
            Language::Plaintext
        })
    }

    /// Resolve an optional identifier; absent means plain text.
    pub fn resolve(name: Option<&str>) -> Language {
        name.map(Self::from_name).unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Language::from_name(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases_case_insensitive() {
        assert_eq!(Language::parse("Python"), Some(Language::Python));
        assert_eq!(Language::parse("JS"), Some(Language::JavaScript));
        assert_eq!(Language::parse(" yml "), Some(Language::Yaml));
        assert_eq!(Language::parse("c++"), Some(Language::Cpp));
    }

    #[test]
    fn test_unrecognized_falls_back_to_plaintext() {
        assert_eq!(Language::parse("cobol"), None);
        assert_eq!(Language::from_name("cobol"), Language::Plaintext);
        assert_eq!(Language::resolve(None), Language::Plaintext);
    }

    #[test]
    fn test_every_canonical_name_round_trips() {
        for lang in Language::all() {
            assert_eq!(Language::parse(lang.as_str()), Some(*lang));
        }
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Language::TypeScript).unwrap();
        assert_eq!(json, r#""typescript""#);

        let lang: Language = serde_json::from_str(r#""brainfuck""#).unwrap();
        assert_eq!(lang, Language::Plaintext);
    }
}
