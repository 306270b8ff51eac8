//! Cultivation seasons recognised by the fact graph.
//!
//! The enum offers compile-time safety for season lookups; parsing is
//! case-insensitive.
//!
//! # Examples
//! ```
//! use agrirank_core::Season;
//!
//! assert_eq!(Season::Rabi.as_str(), "rabi");
//! assert_eq!("Kharif".parse::<Season>(), Ok(Season::Kharif));
//! ```

use thiserror::Error;

/// Cultivation window on the Indian subcontinent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Season {
    /// Monsoon season, sown around June and harvested in autumn.
    Kharif,
    /// Winter season, sown around October and harvested in spring.
    Rabi,
    /// Short summer season between rabi and kharif.
    Zaid,
}

/// Error returned when a season label is not one of `kharif`, `rabi`, `zaid`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown season '{label}' (expected kharif, rabi or zaid)")]
pub struct SeasonParseError {
    /// The label that failed to parse.
    pub label: String,
}

impl Season {
    /// Every season, in calendar order.
    pub const ALL: [Self; 3] = [Self::Kharif, Self::Rabi, Self::Zaid];

    /// Return the season as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kharif => "kharif",
            Self::Rabi => "rabi",
            Self::Zaid => "zaid",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Season {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kharif" => Ok(Self::Kharif),
            "rabi" => Ok(Self::Rabi),
            "zaid" => Ok(Self::Zaid),
            _ => Err(SeasonParseError {
                label: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for Season {
    type Error = SeasonParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.as_str().to_owned()
    }
}
