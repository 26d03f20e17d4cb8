//! Prelude module for common aquaroute types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use aquaroute::prelude::*;`

pub use crate::core::{
    config::ClientConfig,
    geo::{LatLng, LatLngBounds},
};

pub use crate::model::{
    comment::{Comment, CommentDraft, NewComment},
    filter::TimeFilter,
    report::{NewReport, Report, ReportPatch, Severity, SyncState},
};

pub use crate::api::{http::HttpReportApi, ReportApi, VoteReceipt, VoteType};

pub use crate::device::{Capabilities, CameraProvider, FilePicker, GeoProvider, ImagePayload};

pub use crate::events::{ClientEvent, Notice};

pub use crate::mutation::{MutationClient, VoteOutcome};

pub use crate::projection::{
    project, DisplayMode, HeatmapConfig, HeatmapPoint, MarkerPoint, MarkerStyle, Projection,
};

pub use crate::session::{Located, PhotoSource, Session, StatusSummary};

pub use crate::store::{ReportStore, SharedStore};

pub use crate::sync::{PollOutcome, Poller, SyncEngine};

pub use crate::{DeviceError, Error, NetworkError, Result, ValidationError};

pub use std::{sync::Arc, time::Duration};
