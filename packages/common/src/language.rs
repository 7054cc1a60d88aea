use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported submission languages.
///
/// The set is fixed: adding a runtime means adding a variant here together
/// with its execution backend language id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Java,
    JavaScript,
    Python,
    Rust,
}

impl Language {
    /// All supported languages.
    pub const ALL: &'static [Language] = &[
        Self::C,
        Self::Cpp,
        Self::Java,
        Self::JavaScript,
        Self::Python,
        Self::Rust,
    ];

    /// Language id understood by the Judge0-compatible execution backend.
    pub fn backend_id(&self) -> u32 {
        match self {
            Self::C => 50,
            Self::Cpp => 54,
            Self::Java => 62,
            Self::JavaScript => 63,
            Self::Python => 71,
            Self::Rust => 73,
        }
    }

    /// Whether the backend runs a separate compile phase for this language.
    ///
    /// Interpreted languages go straight from queued to running; compiled
    /// ones pass through `Compiling` first.
    pub fn has_compile_step(&self) -> bool {
        !matches!(self, Self::JavaScript | Self::Python)
    }

    /// Returns the string representation (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unsupported language string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    invalid: String,
}

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported language '{}'. Valid values: {}",
            self.invalid,
            Language::ALL
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c" => Ok(Self::C),
            "cpp" | "c++" => Ok(Self::Cpp),
            "java" => Ok(Self::Java),
            "javascript" | "js" => Ok(Self::JavaScript),
            "python" | "py" => Ok(Self::Python),
            "rust" => Ok(Self::Rust),
            _ => Err(ParseLanguageError {
                invalid: s.to_string(),
            }),
        }
    }
}
