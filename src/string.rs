use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

/// Inline-allocated string used for short, hot values like handles, tags,
/// and filenames.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmallString(CompactString);

impl SmallString {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(CompactString::new(text))
    }

    pub fn to_lowercase(&self) -> Self {
        Self(self.0.to_lowercase())
    }
}

impl Deref for SmallString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for SmallString {
    type Err = core::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompactString::from_str(s).map(Self)
    }
}

impl From<String> for SmallString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SmallString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Display for SmallString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
