//! The normalized status scale shared by every source.

use core::fmt;
use core::str::FromStr;

/// A cross-vendor status bucket.
///
/// Every vendor vocabulary is mapped into one of these six values. The numeric
/// code is a fixed identifier used in the exposition format, not a severity
/// ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NormalizedStatus {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "unknown"))]
    Unknown,
    #[cfg_attr(feature = "serde", serde(rename = "operational"))]
    Operational,
    #[cfg_attr(feature = "serde", serde(rename = "under_maintenance"))]
    UnderMaintenance,
    #[cfg_attr(feature = "serde", serde(rename = "degraded_performance"))]
    Degraded,
    #[cfg_attr(feature = "serde", serde(rename = "partial_outage"))]
    PartialOutage,
    #[cfg_attr(feature = "serde", serde(rename = "major_outage"))]
    MajorOutage,
}

impl NormalizedStatus {
    /// All statuses in code order.
    pub const ALL: [NormalizedStatus; 6] = [
        NormalizedStatus::Unknown,
        NormalizedStatus::Operational,
        NormalizedStatus::UnderMaintenance,
        NormalizedStatus::Degraded,
        NormalizedStatus::PartialOutage,
        NormalizedStatus::MajorOutage,
    ];

    /// Numeric code exposed by the status gauge (0-5).
    pub const fn code(self) -> u8 {
        match self {
            NormalizedStatus::Unknown => 0,
            NormalizedStatus::Operational => 1,
            NormalizedStatus::UnderMaintenance => 2,
            NormalizedStatus::Degraded => 3,
            NormalizedStatus::PartialOutage => 4,
            NormalizedStatus::MajorOutage => 5,
        }
    }

    /// Look up a status by its numeric code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NormalizedStatus::Unknown),
            1 => Some(NormalizedStatus::Operational),
            2 => Some(NormalizedStatus::UnderMaintenance),
            3 => Some(NormalizedStatus::Degraded),
            4 => Some(NormalizedStatus::PartialOutage),
            5 => Some(NormalizedStatus::MajorOutage),
            _ => None,
        }
    }

    /// Label value used for the `status` label.
    pub const fn as_str(self) -> &'static str {
        match self {
            NormalizedStatus::Unknown => "unknown",
            NormalizedStatus::Operational => "operational",
            NormalizedStatus::UnderMaintenance => "under_maintenance",
            NormalizedStatus::Degraded => "degraded_performance",
            NormalizedStatus::PartialOutage => "partial_outage",
            NormalizedStatus::MajorOutage => "major_outage",
        }
    }

    /// Whether this is the fully operational state.
    pub fn is_operational(self) -> bool {
        self == NormalizedStatus::Operational
    }
}

impl fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised status label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError;

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unrecognised normalized status")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseStatusError {}

impl FromStr for NormalizedStatus {
    type Err = ParseStatusError;

    /// Parses the label form produced by [`NormalizedStatus::as_str`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NormalizedStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(ParseStatusError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_fixed() {
        assert_eq!(NormalizedStatus::Unknown.code(), 0);
        assert_eq!(NormalizedStatus::Operational.code(), 1);
        assert_eq!(NormalizedStatus::UnderMaintenance.code(), 2);
        assert_eq!(NormalizedStatus::Degraded.code(), 3);
        assert_eq!(NormalizedStatus::PartialOutage.code(), 4);
        assert_eq!(NormalizedStatus::MajorOutage.code(), 5);
    }

    #[test]
    fn every_label_round_trips_to_the_same_code() {
        for status in NormalizedStatus::ALL {
            let parsed: NormalizedStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
            assert_eq!(parsed.code(), status.code());
            assert_eq!(NormalizedStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_code_and_label_are_rejected() {
        assert_eq!(NormalizedStatus::from_code(6), None);
        assert!("sideways".parse::<NormalizedStatus>().is_err());
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(NormalizedStatus::default(), NormalizedStatus::Unknown);
    }

    #[test]
    fn display_matches_label() {
        assert_eq!(
            alloc::format!("{}", NormalizedStatus::Degraded),
            "degraded_performance"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_label_form() {
        let json = serde_json::to_string(&NormalizedStatus::PartialOutage).unwrap();
        assert_eq!(json, "\"partial_outage\"");

        let parsed: NormalizedStatus = serde_json::from_str("\"major_outage\"").unwrap();
        assert_eq!(parsed, NormalizedStatus::MajorOutage);
    }
}
