//! Workload status names.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Status a unit or application reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusName {
    /// Ready to serve.
    Active,
    /// Needs operator intervention.
    Blocked,
    /// Performing internal work.
    Maintenance,
    /// Waiting on another unit or application.
    Waiting,
    /// Set by the platform when a hook fails.
    Error,
    /// Nothing reported yet.
    #[default]
    Unknown,
}

impl StatusName {
    /// Lowercase status name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Maintenance => "maintenance",
            Self::Waiting => "waiting",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a charm may set this status through `status-set`.
    ///
    /// `error` and `unknown` belong to the platform.
    pub fn is_settable(self) -> bool {
        matches!(self, Self::Active | Self::Blocked | Self::Maintenance | Self::Waiting)
    }
}

impl fmt::Display for StatusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "blocked" => Ok(Self::Blocked),
            "maintenance" => Ok(Self::Maintenance),
            "waiting" => Ok(Self::Waiting),
            "error" => Ok(Self::Error),
            "unknown" => Ok(Self::Unknown),
            other => Err(ProtocolError::InvalidStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_statuses_are_not_settable() {
        assert!(StatusName::Active.is_settable());
        assert!(StatusName::Waiting.is_settable());
        assert!(!StatusName::Error.is_settable());
        assert!(!StatusName::Unknown.is_settable());
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!("Active".parse::<StatusName>(), Err(ProtocolError::InvalidStatus("Active".into())));
        assert_eq!("blocked".parse::<StatusName>(), Ok(StatusName::Blocked));
    }
}
