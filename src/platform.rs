//! Target AI platforms and their static display data.

use serde::{Deserialize, Serialize};

/// AI platform a prompt is written for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Claude,
    Gemini,
    Gpt,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Claude, Platform::Gemini, Platform::Gpt];

    /// Name sent to the backend in the `platform` field.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Platform::Claude => "claude",
            Platform::Gemini => "gemini",
            Platform::Gpt => "gpt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Claude => "Claude",
            Platform::Gemini => "Gemini",
            Platform::Gpt => "GPT",
        }
    }

    /// Input price in USD per million tokens, for the cost calculator.
    pub fn input_price_per_million(&self) -> f64 {
        match self {
            Platform::Claude => 3.00,
            Platform::Gemini => 1.25,
            Platform::Gpt => 2.50,
        }
    }

    /// Cycle to the next platform (wraps around).
    pub fn next(self) -> Self {
        match self {
            Platform::Claude => Platform::Gemini,
            Platform::Gemini => Platform::Gpt,
            Platform::Gpt => Platform::Claude,
        }
    }

    /// Parse a platform name as written in config or env vars.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Some(Platform::Claude),
            "gemini" => Some(Platform::Gemini),
            "gpt" | "chatgpt" | "openai" => Some(Platform::Gpt),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
