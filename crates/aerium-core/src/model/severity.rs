//! Ordered alert severity.

use serde::{Deserialize, Serialize};

/// Alert severity tier for a pollutant or a device.
///
/// Total order: `None < Info < Warning < Danger`. `None` is the sentinel
/// for missing/NaN input — it never raises an aggregate and never renders.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Info,
    Warning,
    Danger,
}

impl Severity {
    /// Max-merge used by the device aggregation.
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Whether this severity makes a device "active" (table-eligible).
    pub fn is_active(self) -> bool {
        self != Self::None
    }

    /// Sort weight for the alert table: most severe first.
    pub fn table_weight(self) -> u8 {
        match self {
            Self::Danger => 0,
            Self::Warning => 1,
            Self::Info => 2,
            Self::None => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_are_totally_ordered() {
        assert!(Severity::None < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Danger);
    }

    #[test]
    fn merge_takes_the_maximum() {
        assert_eq!(Severity::Info.merge(Severity::Danger), Severity::Danger);
        assert_eq!(Severity::Warning.merge(Severity::None), Severity::Warning);
        assert_eq!(Severity::None.merge(Severity::None), Severity::None);
    }

    #[test]
    fn table_weight_puts_danger_first() {
        assert!(Severity::Danger.table_weight() < Severity::Warning.table_weight());
        assert!(Severity::Warning.table_weight() < Severity::Info.table_weight());
    }

    #[test]
    fn only_none_is_inactive() {
        assert!(!Severity::None.is_active());
        assert!(Severity::Info.is_active());
        assert!(Severity::Warning.is_active());
        assert!(Severity::Danger.is_active());
    }
}
