//! Keyword-based intent classification for inbound chat messages.
//!
//! Matching is plain substring containment over the lower-cased text. Work
//! from home keywords are always checked before leave keywords, so a message
//! mentioning both is classified as [`IntentCategory::Wfh`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WFH_KEYWORDS: &[&str] =
    &["wfh", "work from home", "working from home", "remote", "home office", "working remotely"];

pub const LEAVE_KEYWORDS: &[&str] = &[
    "leave",
    "off",
    "vacation",
    "holiday",
    "absent",
    "sick",
    "medical",
    "emergency",
    "pto",
    "time off",
    "not coming",
    "won't be in",
    "taking off",
];

/// Which request form, if any, a message is asking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    /// Work from home request
    Wfh,
    /// Leave / time off request
    Leave,
    /// Nothing recognised
    None,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wfh => "wfh",
            Self::Leave => "leave",
            Self::None => "none",
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported intent category `{0}` (expected wfh|leave|none)")]
pub struct ParseIntentError(pub String);

impl FromStr for IntentCategory {
    type Err = ParseIntentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wfh" => Ok(Self::Wfh),
            "leave" => Ok(Self::Leave),
            "none" => Ok(Self::None),
            other => Err(ParseIntentError(other.to_owned())),
        }
    }
}

/// Classifies `text` into an [`IntentCategory`].
pub fn classify(text: &str) -> IntentCategory {
    matched_keyword(text).map(|(category, _)| category).unwrap_or(IntentCategory::None)
}

/// Returns the category together with the first keyword that fired.
pub fn matched_keyword(text: &str) -> Option<(IntentCategory, &'static str)> {
    let folded = text.to_lowercase();
    if folded.trim().is_empty() {
        return None;
    }

    if let Some(keyword) = first_match(&folded, WFH_KEYWORDS) {
        return Some((IntentCategory::Wfh, keyword));
    }
    first_match(&folded, LEAVE_KEYWORDS).map(|keyword| (IntentCategory::Leave, keyword))
}

fn first_match(folded: &str, keywords: &[&'static str]) -> Option<&'static str> {
    keywords.iter().copied().find(|keyword| folded.contains(keyword))
}
