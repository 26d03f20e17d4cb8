use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// Retention window applied by the backend when listing reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeFilter {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl TimeFilter {
    pub const ALL: [TimeFilter; 3] = [Self::OneHour, Self::SixHours, Self::TwentyFourHours];

    /// Value of the `time_filter` query parameter
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::TwentyFourHours => "24h",
        }
    }

    pub fn window(&self) -> Duration {
        let hours = match self {
            Self::OneHour => 1,
            Self::SixHours => 6,
            Self::TwentyFourHours => 24,
        };
        Duration::from_secs(hours * 60 * 60)
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time filter {0:?}, expected 1h, 6h or 24h")]
pub struct UnknownTimeFilter(pub String);

impl FromStr for TimeFilter {
    type Err = UnknownTimeFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1h" => Ok(Self::OneHour),
            "6h" => Ok(Self::SixHours),
            "24h" => Ok(Self::TwentyFourHours),
            other => Err(UnknownTimeFilter(other.to_string())),
        }
    }
}
