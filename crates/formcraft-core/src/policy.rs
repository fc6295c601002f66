//! Value persistence policies.
//!
//! [`PersistenceMode`] decides where in-progress field values live between
//! renders, and [`ExpiryDuration`] bounds the lifetime of `permanent` entries.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::FormcraftError;

/// Where in-progress field values are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// In memory for the current render session only.
    None,
    /// In the session-scoped store; gone when the session ends.
    #[default]
    Session,
    /// In the durable store until an expiry computed at save time.
    Permanent,
}

impl PersistenceMode {
    /// Returns the lowercase name used in schemas and configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Session => "session",
            Self::Permanent => "permanent",
        }
    }
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistenceMode {
    type Err = FormcraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "session" => Ok(Self::Session),
            "permanent" => Ok(Self::Permanent),
            other => Err(FormcraftError::Configuration(format!(
                "Unknown persistence mode '{other}'"
            ))),
        }
    }
}

/// Lifetime of a `permanent` entry, counted from the moment it is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpiryDuration {
    /// 24 hours.
    #[serde(rename = "1_day")]
    OneDay,
    /// 7 days.
    #[default]
    #[serde(rename = "1_week")]
    OneWeek,
    /// 14 days.
    #[serde(rename = "2_weeks")]
    TwoWeeks,
    /// 21 days.
    #[serde(rename = "3_weeks")]
    ThreeWeeks,
    /// 30 days.
    #[serde(rename = "1_month")]
    OneMonth,
    /// 90 days.
    #[serde(rename = "3_months")]
    ThreeMonths,
    /// 180 days.
    #[serde(rename = "6_months")]
    SixMonths,
}

impl ExpiryDuration {
    /// Every supported duration, shortest first.
    pub const ALL: [Self; 7] = [
        Self::OneDay,
        Self::OneWeek,
        Self::TwoWeeks,
        Self::ThreeWeeks,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
    ];

    /// Returns the duration as a `chrono::Duration`.
    pub fn as_duration(self) -> Duration {
        match self {
            Self::OneDay => Duration::days(1),
            Self::OneWeek => Duration::weeks(1),
            Self::TwoWeeks => Duration::weeks(2),
            Self::ThreeWeeks => Duration::weeks(3),
            Self::OneMonth => Duration::days(30),
            Self::ThreeMonths => Duration::days(90),
            Self::SixMonths => Duration::days(180),
        }
    }

    /// Returns the configuration name (e.g. `1_day`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1_day",
            Self::OneWeek => "1_week",
            Self::TwoWeeks => "2_weeks",
            Self::ThreeWeeks => "3_weeks",
            Self::OneMonth => "1_month",
            Self::ThreeMonths => "3_months",
            Self::SixMonths => "6_months",
        }
    }

    /// Returns a human-readable label (e.g. "1 Day").
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1 Day",
            Self::OneWeek => "1 Week",
            Self::TwoWeeks => "2 Weeks",
            Self::ThreeWeeks => "3 Weeks",
            Self::OneMonth => "1 Month",
            Self::ThreeMonths => "3 Months",
            Self::SixMonths => "6 Months",
        }
    }
}

impl fmt::Display for ExpiryDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryDuration {
    type Err = FormcraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| FormcraftError::Configuration(format!("Unknown expiry duration '{s}'")))
    }
}
