//! Report, vote and comment writes together with their local effects.
//!
//! Input is validated before any request goes out. A successful create is
//! appended to the store right away as a pending record; a successful vote
//! triggers one authoritative poll instead of adjusting counts locally; a
//! successful comment is appended to the report's thread. Failures leave
//! the store untouched and are returned to the caller, never retried.

use crate::{
    api::{ReportApi, VoteReceipt, VoteType},
    core::geo::LatLng,
    device::ImagePayload,
    model::{
        comment::{Comment, CommentDraft},
        report::{NewReport, Report},
    },
    store,
    sync::{PollOutcome, SyncEngine},
    Result, ValidationError,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Result of a vote: the backend echo plus the follow-up poll
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    pub receipt: VoteReceipt,
    /// `None` when the follow-up poll failed
    pub refresh: Option<PollOutcome>,
}

/// Clears the in-flight flag on every exit path
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct MutationClient {
    api: Arc<dyn ReportApi>,
    engine: SyncEngine,
    require_photo: bool,
    submitting: Arc<AtomicBool>,
}

impl MutationClient {
    pub fn new(api: Arc<dyn ReportApi>, engine: SyncEngine) -> Self {
        Self {
            api,
            engine,
            require_photo: false,
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn require_photo(mut self, required: bool) -> Self {
        self.require_photo = required;
        self
    }

    /// The engine writes are applied through and refreshed with
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Validate and submit a new report, then append the server's record
    pub async fn create_report(
        &self,
        position: LatLng,
        severity: &str,
        image: Option<ImagePayload>,
    ) -> Result<Report> {
        let mut new_report = NewReport::parse(position, severity)?;
        match image {
            Some(image) if !image.is_empty() => {
                new_report = new_report.with_image_base64(image.to_base64());
            }
            _ if self.require_photo => return Err(ValidationError::MissingPhoto.into()),
            _ => {}
        }

        let _guard =
            SubmitGuard::acquire(&self.submitting).ok_or(ValidationError::SubmissionInProgress)?;

        let report = self.api.create_report(&new_report).await.map_err(|e| {
            log::warn!("report submission failed: {}", e);
            e
        })?;

        log::info!(
            "report {} created: {} at {}",
            report.id,
            report.severity,
            report.position()
        );
        store::write(self.engine.store()).append(report.clone());
        Ok(report)
    }

    /// Record a vote and refresh from the backend.
    ///
    /// Counts are never adjusted locally; the follow-up poll brings the
    /// backend's `accuracy_score` and `total_votes`.
    pub async fn vote(&self, report_id: &str, vote: VoteType) -> Result<VoteOutcome> {
        let receipt = self.api.vote(report_id, vote).await.map_err(|e| {
            log::warn!("vote on {} failed: {}", report_id, e);
            e
        })?;
        log::info!("voted {} on report {}", vote, report_id);

        let refresh = self.engine.poll().await.ok();
        Ok(VoteOutcome { receipt, refresh })
    }

    /// Load the comment thread of a report into the store
    pub async fn open_comments(&self, report_id: &str) -> Result<Vec<Comment>> {
        let comments = self.api.fetch_comments(report_id).await.map_err(|e| {
            log::warn!("loading comments for {} failed: {}", report_id, e);
            e
        })?;
        log::debug!("loaded {} comments for {}", comments.len(), report_id);
        store::write(self.engine.store()).set_comments(report_id, comments.clone());
        Ok(comments)
    }

    /// Post the draft as a comment on `report_id`.
    ///
    /// The draft text is cleared only when the backend accepts it, so a
    /// failed post can be retried as typed.
    pub async fn comment(&self, report_id: &str, draft: &mut CommentDraft) -> Result<Comment> {
        let new_comment = draft.to_new_comment()?;

        let mut comment = self
            .api
            .post_comment(report_id, &new_comment)
            .await
            .map_err(|e| {
                log::warn!("comment on {} failed: {}", report_id, e);
                e
            })?;

        if comment.report_id != report_id {
            log::warn!(
                "backend filed comment {} under {}, expected {}",
                comment.id,
                comment.report_id,
                report_id
            );
            comment.report_id = report_id.to_string();
        }
        store::write(self.engine.store()).push_comment(comment.clone());
        draft.clear_text();
        Ok(comment)
    }
}
