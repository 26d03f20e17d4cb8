//! View projection
//!
//! Pure functions from the store contents to what a map renderer draws:
//! severity-styled markers or weighted heatmap points. Nothing here keeps
//! state; call [`project`] again whenever the store changes.

pub mod heatmap;
pub mod marker;

pub use heatmap::{HeatmapConfig, HeatmapPoint};
pub use marker::{MarkerPoint, MarkerStyle, PopupContent};

use crate::{core::geo::LatLngBounds, spatial::ReportIndex, store::ReportStore};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Markers,
    Heatmap,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Markers => "markers",
            Self::Heatmap => "heatmap",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown display mode {0:?}, expected markers or heatmap")]
pub struct UnknownDisplayMode(pub String);

impl FromStr for DisplayMode {
    type Err = UnknownDisplayMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markers" | "marker" => Ok(Self::Markers),
            "heatmap" | "heat" => Ok(Self::Heatmap),
            _ => Err(UnknownDisplayMode(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Markers(Vec<MarkerPoint>),
    Heatmap(Vec<HeatmapPoint>),
}

impl Projection {
    pub fn len(&self) -> usize {
        match self {
            Self::Markers(points) => points.len(),
            Self::Heatmap(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> DisplayMode {
        match self {
            Self::Markers(_) => DisplayMode::Markers,
            Self::Heatmap(_) => DisplayMode::Heatmap,
        }
    }
}

/// Derive renderable points from the store, in store order.
/// With a `viewport`, only reports inside it are projected.
pub fn project(store: &ReportStore, mode: DisplayMode, viewport: Option<&LatLngBounds>) -> Projection {
    let reports = store.reports();
    let visible: Vec<_> = match viewport {
        Some(bounds) => ReportIndex::build(reports)
            .within(bounds)
            .into_iter()
            .map(|item| &reports[item.slot])
            .collect(),
        None => reports.iter().collect(),
    };

    match mode {
        DisplayMode::Markers => {
            Projection::Markers(visible.into_iter().map(MarkerPoint::from_report).collect())
        }
        DisplayMode::Heatmap => {
            Projection::Heatmap(visible.into_iter().map(HeatmapPoint::from_report).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::report::{Report, Severity, SyncState};
    use chrono::Utc;

    fn report(id: &str, lat: f64, severity: Severity) -> Report {
        Report {
            id: id.to_string(),
            lat,
            lng: 72.85,
            severity,
            created_at: Utc::now(),
            expires_at: None,
            accuracy_score: 0,
            total_votes: 0,
            image: None,
            sync: SyncState::Confirmed,
        }
    }

    fn store() -> ReportStore {
        let mut store = ReportStore::default();
        store.replace_all(vec![
            report("low", 19.00, Severity::Low),
            report("medium", 19.05, Severity::Medium),
            report("severe", 19.10, Severity::Severe),
        ]);
        store
    }

    #[test]
    fn test_heatmap_weights() {
        let Projection::Heatmap(points) = project(&store(), DisplayMode::Heatmap, None) else {
            panic!("expected heatmap");
        };
        let weights: Vec<_> = points.iter().map(|p| p.intensity).collect();
        assert_eq!(weights, vec![0.3, 0.6, 1.0]);
    }

    #[test]
    fn test_markers_keep_store_order() {
        let projection = project(&store(), DisplayMode::Markers, None);
        assert_eq!(projection.mode(), DisplayMode::Markers);
        let Projection::Markers(markers) = projection else {
            panic!("expected markers");
        };
        let ids: Vec<_> = markers.iter().map(|m| m.report_id.as_str()).collect();
        assert_eq!(ids, vec!["low", "medium", "severe"]);
    }

    #[test]
    fn test_viewport_culls() {
        let bounds = LatLngBounds::from_coords(19.03, 72.0, 19.2, 73.0);
        let projection = project(&store(), DisplayMode::Heatmap, Some(&bounds));
        assert_eq!(projection.len(), 2);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let store = store();
        assert_eq!(
            project(&store, DisplayMode::Markers, None),
            project(&store, DisplayMode::Markers, None)
        );
        assert!(project(&ReportStore::default(), DisplayMode::Heatmap, None).is_empty());
    }

    #[test]
    fn test_display_mode_parse() {
        assert_eq!("Heatmap".parse::<DisplayMode>(), Ok(DisplayMode::Heatmap));
        assert_eq!(
            "globe".parse::<DisplayMode>(),
            Err(UnknownDisplayMode("globe".into()))
        );
    }
}
