//! A client session: one store, one sync engine, one poll loop.
//!
//! [`Session`] is what a map view holds while it is on screen. It owns the
//! background [`Poller`] (released when the session is stopped or dropped),
//! turns write failures into [`Notice`]s on the event channel, and exposes
//! the read side through [`Session::projection`] and [`Session::summary`].

use crate::{
    api::{http::HttpReportApi, ReportApi, VoteType},
    core::{
        config::ClientConfig,
        geo::{LatLng, LatLngBounds},
    },
    device::{Capabilities, ImagePayload},
    events::EventSink,
    model::{
        comment::{Comment, CommentDraft},
        filter::TimeFilter,
        report::Report,
    },
    mutation::{MutationClient, VoteOutcome},
    projection::{self, DisplayMode, Projection},
    spatial::ReportIndex,
    store::{self, ReportStore, SharedStore},
    sync::{PollOutcome, Poller, SyncEngine},
    Error, Result,
};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver};
use std::{fmt, sync::Arc};

pub use crate::events::{ClientEvent, Notice};

/// Where the photo for a new report comes from
#[derive(Debug, Clone, Default)]
pub enum PhotoSource {
    #[default]
    None,
    Camera,
    FilePicker,
    Provided(ImagePayload),
}

/// Header line data: how many reports are shown and how fresh they are
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub count: usize,
    pub pending: usize,
    pub filter: TimeFilter,
    pub last_updated: Option<DateTime<Utc>>,
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} active reports ({})", self.count, self.filter)?;
        if self.pending > 0 {
            write!(f, ", {} awaiting confirmation", self.pending)?;
        }
        if let Some(at) = self.last_updated {
            write!(f, " • Updated: {}", at.format("%H:%M:%S"))?;
        }
        Ok(())
    }
}

/// The user's position and the reports closest to it
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub position: LatLng,
    /// Closest first, with great-circle distance in metres
    pub nearby: Vec<(Report, f64)>,
}

pub struct Session {
    config: ClientConfig,
    engine: SyncEngine,
    mutations: MutationClient,
    capabilities: Capabilities,
    events: EventSink,
    event_rx: Receiver<ClientEvent>,
    poller: Option<Poller>,
}

impl Session {
    pub fn new(config: ClientConfig, api: Arc<dyn ReportApi>, capabilities: Capabilities) -> Result<Self> {
        config.validate()?;

        let (tx, event_rx) = unbounded();
        let events = EventSink::new(tx);
        let store = ReportStore::new(config.max_missed_polls, config.comment_cache_capacity).into_shared();
        let engine = SyncEngine::new(api.clone(), store, config.time_filter).with_events(events.clone());
        let mutations = MutationClient::new(api, engine.clone()).require_photo(config.require_photo);

        Ok(Self {
            config,
            engine,
            mutations,
            capabilities,
            events,
            event_rx,
            poller: None,
        })
    }

    /// Session against the HTTP backend named in `config`
    pub fn connect(config: ClientConfig, capabilities: Capabilities) -> Result<Self> {
        let api = HttpReportApi::new(&config)?;
        Self::new(config, Arc::new(api), capabilities)
    }

    /// Start the poll loop; the first poll runs right away
    pub fn start(&mut self) {
        if self.is_polling() {
            return;
        }
        log::info!(
            "session started: polling {} every {:?}",
            self.engine.time_filter(),
            self.config.poll_interval
        );
        self.poller = Some(Poller::start(self.engine.clone(), self.config.poll_interval));
    }

    pub fn stop(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
            log::info!("session stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().map_or(false, Poller::is_running)
    }

    /// Receiver for session events; clones share one queue
    pub fn events(&self) -> Receiver<ClientEvent> {
        self.event_rx.clone()
    }

    pub fn store(&self) -> &SharedStore {
        self.engine.store()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn time_filter(&self) -> TimeFilter {
        self.engine.time_filter()
    }

    /// Switch the time window. The filter stays selected if the fetch
    /// fails; the error is also published as a `PollFailed` event and the
    /// next tick tries again.
    pub async fn set_time_filter(&self, filter: TimeFilter) -> Result<PollOutcome> {
        self.engine.set_time_filter(filter).await
    }

    /// User-triggered refresh. On error the store is left as it was.
    pub async fn refresh(&self) -> Result<PollOutcome> {
        self.engine.poll().await
    }

    /// Submit a report at a map position
    pub async fn report_at(&self, position: LatLng, severity: &str, photo: PhotoSource) -> Result<Report> {
        let result = async {
            let image = self.acquire_photo(photo).await?;
            self.mutations.create_report(position, severity, image).await
        }
        .await;

        match result {
            Ok(report) => {
                self.events.notify(Notice::Success(format!(
                    "Waterlogging report submitted successfully! Location: {} Severity: {}",
                    report.position(),
                    report.severity
                )));
                Ok(report)
            }
            Err(e) => Err(self.notify_failure("submit report", e)),
        }
    }

    pub async fn vote(&self, report_id: &str, vote: VoteType) -> Result<VoteOutcome> {
        match self.mutations.vote(report_id, vote).await {
            Ok(outcome) => {
                self.events.notify(Notice::Success("Vote recorded".into()));
                Ok(outcome)
            }
            Err(e) => Err(self.notify_failure("record vote", e)),
        }
    }

    /// Load a report's comments when its details are opened
    pub async fn open_comments(&self, report_id: &str) -> Result<Vec<Comment>> {
        self.mutations
            .open_comments(report_id)
            .await
            .map_err(|e| self.notify_failure("load comments", e))
    }

    pub async fn comment(&self, report_id: &str, draft: &mut CommentDraft) -> Result<Comment> {
        match self.mutations.comment(report_id, draft).await {
            Ok(comment) => {
                self.events.notify(Notice::Success("Comment posted".into()));
                Ok(comment)
            }
            Err(e) => Err(self.notify_failure("post comment", e)),
        }
    }

    /// Ask the geo provider for the user's position and list the closest reports
    pub async fn locate_me(&self, limit: usize) -> Result<Located> {
        let position = self
            .capabilities
            .try_locate()
            .await
            .map_err(|e| self.notify_failure("get your location", e.into()))?;

        let store = store::read(self.store());
        let reports = store.reports();
        let nearby = ReportIndex::build(reports)
            .nearest(position, limit)
            .into_iter()
            .map(|n| (reports[n.report.slot].clone(), n.distance_m))
            .collect();
        Ok(Located { position, nearby })
    }

    pub fn projection(&self, mode: DisplayMode, viewport: Option<&LatLngBounds>) -> Projection {
        projection::project(&store::read(self.store()), mode, viewport)
    }

    pub fn comments(&self, report_id: &str) -> Option<Vec<Comment>> {
        store::read(self.store()).comments(report_id).map(<[Comment]>::to_vec)
    }

    pub fn summary(&self) -> StatusSummary {
        let store = store::read(self.store());
        StatusSummary {
            count: store.len(),
            pending: store.pending_count(),
            filter: self.engine.time_filter(),
            last_updated: store.last_updated(),
        }
    }

    async fn acquire_photo(&self, photo: PhotoSource) -> Result<Option<ImagePayload>> {
        let image = match photo {
            PhotoSource::None => None,
            PhotoSource::Provided(image) => Some(image),
            PhotoSource::Camera => Some(self.capabilities.try_capture().await?),
            PhotoSource::FilePicker => self.capabilities.try_pick_image().await?,
        };
        Ok(image)
    }

    fn notify_failure(&self, action: &str, err: Error) -> Error {
        let message = match err {
            Error::Network(_) => format!("Failed to {}. Please try again.", action),
            ref other => other.user_message(),
        };
        self.events.notify(Notice::Error(message));
        err
    }
}
