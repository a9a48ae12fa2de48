//! User-facing generation options.

use serde::{Deserialize, Serialize};

/// Default prebuilt voice for speech synthesis.
pub const DEFAULT_VOICE: &str = "Kore";

/// Output language for analysis and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Id,
    En,
}

impl Language {
    /// Language name as written into prompts.
    pub fn instruction(&self) -> &'static str {
        match self {
            Language::Id => "Bahasa Indonesia",
            Language::En => "English",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Id => "id",
            Language::En => "en",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(Language::Id),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// Presenter gender for the model image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            other => Err(format!("unsupported gender '{}'", other)),
        }
    }
}

/// Target length of a generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStyle {
    #[default]
    Short,
    Normal,
}

impl std::str::FromStr for ScriptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(ScriptStyle::Short),
            "normal" => Ok(ScriptStyle::Normal),
            other => Err(format!("unsupported script style '{}'", other)),
        }
    }
}

/// Rewrite instruction applied to an existing script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptEdit {
    Shorten,
    Expand,
    Regenerate,
}

impl ScriptEdit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptEdit::Shorten => "shorten",
            ScriptEdit::Expand => "expand",
            ScriptEdit::Regenerate => "regenerate",
        }
    }
}

impl std::str::FromStr for ScriptEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shorten" => Ok(ScriptEdit::Shorten),
            "expand" => Ok(ScriptEdit::Expand),
            "regenerate" => Ok(ScriptEdit::Regenerate),
            other => Err(format!("unsupported script edit '{}'", other)),
        }
    }
}
