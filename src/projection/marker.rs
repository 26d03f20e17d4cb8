use crate::{
    core::geo::LatLng,
    model::report::{Report, Severity},
};

/// Colour for reports whose severity is not recognised
pub const FALLBACK_COLOR: &str = "#007bff";

/// Icon geometry and colour for one severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub icon_size: [u32; 2],
    pub icon_anchor: [i32; 2],
    pub popup_anchor: [i32; 2],
    pub class_name: &'static str,
}

impl MarkerStyle {
    pub fn for_severity(severity: Severity) -> Self {
        Self::for_label(severity.as_str())
    }

    /// Style for a raw label: unknown labels get the Medium icon in the fallback colour
    pub fn for_label(label: &str) -> Self {
        match label {
            "Low" => Self {
                color: "#28a745",
                icon_size: [20, 32],
                icon_anchor: [10, 32],
                popup_anchor: [0, -32],
                class_name: "severity-low",
            },
            "Severe" => Self {
                color: "#dc3545",
                icon_size: [30, 50],
                icon_anchor: [15, 50],
                popup_anchor: [0, -50],
                class_name: "severity-severe",
            },
            "Medium" => Self::MEDIUM,
            _ => Self {
                color: FALLBACK_COLOR,
                ..Self::MEDIUM
            },
        }
    }

    const MEDIUM: Self = Self {
        color: "#ffc107",
        icon_size: [25, 41],
        icon_anchor: [12, 41],
        popup_anchor: [1, -34],
        class_name: "severity-medium",
    };
}

pub fn advisory(severity: Severity) -> &'static str {
    match severity {
        Severity::Severe => "Avoid this area - deep water reported",
        Severity::Medium => "Use caution - significant waterlogging",
        Severity::Low => "Passable with care - minor waterlogging",
    }
}

/// Text shown when a marker is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    pub title: String,
    pub location: String,
    pub reported_at: String,
    pub advisory: &'static str,
    pub votes: String,
}

/// A report rendered as an icon on the map
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPoint {
    pub report_id: String,
    pub position: LatLng,
    pub severity: Severity,
    pub style: MarkerStyle,
    /// Written locally and not yet seen in a snapshot
    pub pending: bool,
    pub popup: PopupContent,
}

impl MarkerPoint {
    pub fn from_report(report: &Report) -> Self {
        let popup = PopupContent {
            title: format!("{} Waterlogging", report.severity),
            location: report.position().to_string(),
            reported_at: report.reported_at_label(),
            advisory: advisory(report.severity),
            votes: format!(
                "accuracy {:+} from {} votes",
                report.accuracy_score, report.total_votes
            ),
        };
        Self {
            report_id: report.id.clone(),
            position: report.position(),
            severity: report.severity,
            style: MarkerStyle::for_severity(report.severity),
            pending: report.is_pending(),
            popup,
        }
    }
}
