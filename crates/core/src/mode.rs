//! How the final prompt text is assembled before it is sent.

use serde::{Deserialize, Serialize};

/// Prompt assembly mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    /// The user prompt is sent as-is.
    Direct,
    /// Enabled layers are composed and the user prompt is appended.
    #[default]
    Layered,
}

impl std::fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Layered => write!(f, "layered"),
        }
    }
}

impl std::str::FromStr for CompositionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "simple" => Ok(Self::Direct),
            "layered" | "layers" => Ok(Self::Layered),
            other => Err(format!("unknown composition mode '{other}'")),
        }
    }
}
