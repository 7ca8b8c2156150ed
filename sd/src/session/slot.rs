//! Slot, image reference and label types

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// One of the three fixed image positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Slot {
    A,
    B,
    C,
}

impl Slot {
    /// All slots in display order
    pub const ALL: [Slot; 3] = [Slot::A, Slot::B, Slot::C];

    /// Zero-based position of this slot
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    /// Slot at the given zero-based position
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Marker the user types to refer to this slot's pattern
    pub fn marker(self) -> &'static str {
        match self {
            Self::A => "Aパターン",
            Self::B => "Bパターン",
            Self::C => "Cパターン",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        write!(f, "{}", letter)
    }
}

impl FromStr for Slot {
    type Err = String;

    /// Accepts a letter (`a`, `B`) or a one-based position (`1`..`3`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "1" => Ok(Self::A),
            "b" | "2" => Ok(Self::B),
            "c" | "3" => Ok(Self::C),
            other => Err(format!("Unknown slot '{}': expected A, B, C or 1-3", other)),
        }
    }
}

/// Locator for a generated image (typically a URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the service handed back a blank locator
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Caption shown under a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotLabel {
    /// Generic label after an initial generation
    Pattern(Slot),
    /// Semantic labels after a preview expansion
    Title,
    Content,
    Divider,
}

impl SlotLabel {
    /// Generic A/B/C labels
    pub fn patterns() -> [SlotLabel; 3] {
        Slot::ALL.map(SlotLabel::Pattern)
    }

    /// Title/content/divider labels
    pub fn semantic() -> [SlotLabel; 3] {
        [SlotLabel::Title, SlotLabel::Content, SlotLabel::Divider]
    }
}

impl fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(slot) => f.write_str(slot.marker()),
            Self::Title => f.write_str("タイトルスライド"),
            Self::Content => f.write_str("本文スライド"),
            Self::Divider => f.write_str("章区切りスライド"),
        }
    }
}
