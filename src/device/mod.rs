//! Optional device capabilities
//!
//! Location, camera and file picking may each be missing or refused at
//! runtime. They are modelled as trait objects held in [`Capabilities`];
//! every access goes through a `try_*` call that turns absence into a
//! [`DeviceError`] instead of a panic.

use crate::{core::geo::LatLng, DeviceError, DeviceKind};
use async_trait::async_trait;
use std::{path::PathBuf, sync::Arc};

/// An image ready to attach to a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// JPEG frame, the format camera captures are encoded in
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encoding used for the `image_base64` request field
    pub fn to_base64(&self) -> String {
        base64::encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }
}

#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn locate(&self) -> Result<LatLng, DeviceError>;
}

#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn capture(&self) -> Result<ImagePayload, DeviceError>;
}

#[async_trait]
pub trait FilePicker: Send + Sync {
    /// `Ok(None)` when the user dismissed the picker
    async fn pick_image(&self) -> Result<Option<ImagePayload>, DeviceError>;
}

/// The device collaborators available to a session
#[derive(Clone, Default)]
pub struct Capabilities {
    geo: Option<Arc<dyn GeoProvider>>,
    camera: Option<Arc<dyn CameraProvider>>,
    files: Option<Arc<dyn FilePicker>>,
}

impl Capabilities {
    /// No device access at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_geo(mut self, geo: Arc<dyn GeoProvider>) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn with_camera(mut self, camera: Arc<dyn CameraProvider>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_file_picker(mut self, files: Arc<dyn FilePicker>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn has_geo(&self) -> bool {
        self.geo.is_some()
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn has_file_picker(&self) -> bool {
        self.files.is_some()
    }

    pub async fn try_locate(&self) -> Result<LatLng, DeviceError> {
        let geo = self
            .geo
            .as_ref()
            .ok_or(DeviceError::Unsupported(DeviceKind::Geolocation))?;
        let position = geo.locate().await?;
        if !position.is_valid() {
            return Err(DeviceError::Unavailable {
                kind: DeviceKind::Geolocation,
                reason: format!("provider returned {:?}", position),
            });
        }
        Ok(position)
    }

    pub async fn try_capture(&self) -> Result<ImagePayload, DeviceError> {
        let camera = self
            .camera
            .as_ref()
            .ok_or(DeviceError::Unsupported(DeviceKind::Camera))?;
        camera.capture().await
    }

    pub async fn try_pick_image(&self) -> Result<Option<ImagePayload>, DeviceError> {
        let files = self
            .files
            .as_ref()
            .ok_or(DeviceError::Unsupported(DeviceKind::FilePicker))?;
        files.pick_image().await
    }
}

/// Geo provider that always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub LatLng);

#[async_trait]
impl GeoProvider for FixedLocation {
    async fn locate(&self) -> Result<LatLng, DeviceError> {
        Ok(self.0)
    }
}

/// File picker over a path chosen up front (command line, config)
#[derive(Debug, Clone)]
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn mime_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[async_trait]
impl FilePicker for PathPicker {
    async fn pick_image(&self) -> Result<Option<ImagePayload>, DeviceError> {
        let path = self.path.clone();
        let read = tokio::task::spawn_blocking(move || std::fs::read(&path))
            .await
            .map_err(|e| DeviceError::Unavailable {
                kind: DeviceKind::FilePicker,
                reason: e.to_string(),
            })?;

        match read {
            Ok(bytes) => Ok(Some(ImagePayload::new(bytes, mime_for(&self.path)))),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(DeviceError::PermissionDenied(DeviceKind::FilePicker))
            }
            Err(e) => Err(DeviceError::Unavailable {
                kind: DeviceKind::FilePicker,
                reason: format!("{}: {}", self.path.display(), e),
            }),
        }
    }
}
