//! # AquaRoute
//!
//! Client-side synchronization for a crowdsourced waterlogging map.
//!
//! The crate keeps an in-memory collection of flood reports fresh against a
//! REST backend, applies local effects of report/vote/comment writes, and
//! derives renderable marker or heatmap data from the current collection.
//! Device capabilities (location, camera, file picking) are optional and
//! plugged in through small traits.

pub mod api;
pub mod core;
pub mod device;
pub mod events;
pub mod model;
pub mod mutation;
pub mod prelude;
pub mod projection;
pub mod runtime;
pub mod session;
pub mod spatial;
pub mod store;
pub mod sync;

// Re-export public API
pub use crate::core::{
    config::ClientConfig,
    geo::{LatLng, LatLngBounds},
};

pub use model::{
    comment::{Comment, CommentDraft, NewComment},
    filter::TimeFilter,
    report::{NewReport, Report, ReportPatch, Severity, SyncState},
};

pub use api::{http::HttpReportApi, ReportApi, VoteType};
pub use device::{Capabilities, CameraProvider, FilePicker, GeoProvider, ImagePayload};
pub use mutation::MutationClient;
pub use projection::{project, DisplayMode, Projection};
pub use events::{ClientEvent, Notice};
pub use session::Session;
pub use store::{ReportStore, SharedStore};
pub use sync::{engine::SyncEngine, poller::Poller};

/// Install `env_logger`, honouring `RUST_LOG` and defaulting to `info` for
/// this crate. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("aquaroute=info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already installed");
    }
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Requests that could not complete or came back with a non-success status
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Input rejected locally, before any request is issued
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("severity must be Low, Medium, or Severe (got {0:?})")]
    UnknownSeverity(String),

    #[error("coordinates out of range: {lat}, {lng}")]
    CoordinatesOutOfRange { lat: f64, lng: f64 },

    #[error("comment text is empty")]
    EmptyComment,

    #[error("comment text is {len} characters, limit is {max}")]
    CommentTooLong { len: usize, max: usize },

    #[error("author name is {len} characters, limit is {max}")]
    AuthorTooLong { len: usize, max: usize },

    #[error("a photo is required for this report")]
    MissingPhoto,

    #[error("a report submission is already in progress")]
    SubmissionInProgress,
}

/// Which optional device capability failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Geolocation,
    Camera,
    FilePicker,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Geolocation => "geolocation",
            Self::Camera => "camera",
            Self::FilePicker => "file picker",
        };
        f.write_str(name)
    }
}

/// Device capability missing, denied or failing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("{0} is not supported on this device")]
    Unsupported(DeviceKind),

    #[error("{0} permission denied")]
    PermissionDenied(DeviceKind),

    #[error("{kind} unavailable: {reason}")]
    Unavailable { kind: DeviceKind, reason: String },
}

impl DeviceError {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Unsupported(kind) | Self::PermissionDenied(kind) => *kind,
            Self::Unavailable { kind, .. } => *kind,
        }
    }
}

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(NetworkError::Transport(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Network(NetworkError::Decode(err))
    }
}

impl Error {
    /// Whether the failure happened before any request went out
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short text suitable for a non-fatal notification
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network request failed. Please try again.".to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Device(err) => match err {
                DeviceError::Unsupported(kind) => {
                    format!("Your device does not support {}.", kind)
                }
                DeviceError::PermissionDenied(kind) => {
                    format!("Access to {} was denied.", kind)
                }
                DeviceError::Unavailable { kind, .. } => {
                    format!("Unable to use {} right now.", kind)
                }
            },
            Self::Config(msg) => msg.clone(),
        }
    }
}
