use crate::{core::geo::LatLng, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Heatmap weight for a severity label the client does not recognise
pub const DEFAULT_INTENSITY: f64 = 0.5;

/// How bad the waterlogging is at a reported spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Minor puddles, passable
    Low,
    /// Significant water, slow traffic
    Medium,
    /// Deep water, avoid area
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Self::Low, Self::Medium, Self::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::Severe => "Severe",
        }
    }

    /// Weight of a report of this severity on the heatmap
    pub fn heatmap_intensity(&self) -> f64 {
        intensity_for_label(self.as_str())
    }
}

/// Heatmap weight for a raw severity label; total over every string
pub fn intensity_for_label(label: &str) -> f64 {
    match label {
        "Low" => 0.3,
        "Medium" => 0.6,
        "Severe" => 1.0,
        _ => DEFAULT_INTENSITY,
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "Severe" => Ok(Self::Severe),
            other => Err(ValidationError::UnknownSeverity(other.to_string())),
        }
    }
}

/// Whether a record has been seen in an authoritative snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Confirmed,
    /// Written locally; `missed_polls` counts snapshots that did not contain it
    Pending { missed_polls: u32 },
}

impl SyncState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// A waterlogging report as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub severity: Severity,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accuracy_score: i64,
    #[serde(default)]
    pub total_votes: i64,
    /// Photo reference as returned by the backend (URL or base64 payload)
    #[serde(default, alias = "image_base64", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip)]
    pub sync: SyncState,
}

impl Report {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn is_pending(&self) -> bool {
        self.sync.is_pending()
    }

    /// Coordinates must lie in WGS84 range
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.position().validate()
    }

    /// Display form of `created_at`, e.g. `01 Jun, 10:15`
    pub fn reported_at_label(&self) -> String {
        self.created_at.format("%d %b, %H:%M").to_string()
    }
}

/// Body of `POST /api/reports`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReport {
    pub lat: f64,
    pub lng: f64,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl NewReport {
    /// Validate raw input from a map click and severity prompt
    pub fn parse(position: LatLng, severity: &str) -> Result<Self, ValidationError> {
        let severity = severity.trim().parse::<Severity>()?;
        position.validate()?;
        Ok(Self {
            lat: position.lat,
            lng: position.lng,
            severity,
            image_base64: None,
        })
    }

    pub fn with_image_base64(mut self, encoded: String) -> Self {
        self.image_base64 = Some(encoded);
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Field updates merged into an existing report by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPatch {
    pub severity: Option<Severity>,
    pub accuracy_score: Option<i64>,
    pub total_votes: Option<i64>,
    pub image: Option<String>,
}

impl ReportPatch {
    pub fn votes(accuracy_score: i64, total_votes: i64) -> Self {
        Self {
            accuracy_score: Some(accuracy_score),
            total_votes: Some(total_votes),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, report: &mut Report) {
        if let Some(severity) = self.severity {
            report.severity = severity;
        }
        if let Some(score) = self.accuracy_score {
            report.accuracy_score = score;
        }
        if let Some(votes) = self.total_votes {
            report.total_votes = votes;
        }
        if let Some(ref image) = self.image {
            report.image = Some(image.clone());
        }
    }
}

/// Backend timestamps are naive UTC (`2024-06-01T10:15:00.123456`); RFC 3339 is accepted too.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp {:?}", raw)))
    }

    pub mod option {
        use super::*;
        use serde::de::Error as _;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp {:?}", raw))),
                None => Ok(None),
            }
        }
    }
}
