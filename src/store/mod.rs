//! In-memory report collection
//!
//! [`ReportStore`] is the single source of truth for what the map shows. It
//! keeps reports in insertion order, indexed by id, together with the
//! comment threads opened during the session.

pub mod comments;

use crate::model::{
    comment::Comment,
    report::{Report, ReportPatch, SyncState},
};
use chrono::{DateTime, Utc};
use comments::CommentThreads;
use fxhash::{FxHashMap, FxHashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Store handle shared between the sync engine, mutation client and views
pub type SharedStore = Arc<RwLock<ReportStore>>;

/// Read access that survives a panicked writer
pub fn read(store: &SharedStore) -> RwLockReadGuard<'_, ReportStore> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write(store: &SharedStore) -> RwLockWriteGuard<'_, ReportStore> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

/// What a snapshot did to the locally written records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// Records in the store afterwards
    pub total: usize,
    /// Pending records the snapshot confirmed
    pub confirmed: usize,
    /// Pending records kept although the snapshot lacked them
    pub retained: usize,
    /// Pending records dropped after too many missing snapshots
    pub dropped: usize,
}

pub struct ReportStore {
    reports: Vec<Report>,
    index: FxHashMap<String, usize>,
    threads: CommentThreads,
    max_missed_polls: u32,
    last_updated: Option<DateTime<Utc>>,
}

impl ReportStore {
    pub fn new(max_missed_polls: u32, comment_capacity: usize) -> Self {
        Self {
            reports: Vec::new(),
            index: FxHashMap::default(),
            threads: CommentThreads::new(comment_capacity),
            max_missed_polls,
            last_updated: None,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Swap in an authoritative snapshot.
    ///
    /// Snapshot records are confirmed. A pending record whose id is missing
    /// from the snapshot is carried over until it has missed more than
    /// `max_missed_polls` snapshots, then dropped.
    pub fn replace_all(&mut self, snapshot: Vec<Report>) -> ReplaceSummary {
        let mut summary = ReplaceSummary::default();
        let mut next = Vec::with_capacity(snapshot.len());
        let mut seen = FxHashSet::default();

        for mut report in snapshot {
            if !seen.insert(report.id.clone()) {
                log::warn!("snapshot repeats report id {}, keeping the first", report.id);
                continue;
            }
            if self.get(&report.id).map_or(false, Report::is_pending) {
                summary.confirmed += 1;
            }
            report.sync = SyncState::Confirmed;
            next.push(report);
        }

        for local in self.reports.drain(..) {
            let SyncState::Pending { missed_polls } = local.sync else {
                continue;
            };
            if seen.contains(&local.id) {
                continue;
            }
            let missed_polls = missed_polls + 1;
            if missed_polls > self.max_missed_polls {
                log::warn!(
                    "dropping unconfirmed report {} after {} snapshots without it",
                    local.id,
                    missed_polls
                );
                summary.dropped += 1;
            } else {
                summary.retained += 1;
                next.push(Report {
                    sync: SyncState::Pending { missed_polls },
                    ..local
                });
            }
        }

        self.reports = next;
        self.rebuild_index();
        let index = &self.index;
        self.threads.retain(|report_id| index.contains_key(report_id));
        self.last_updated = Some(Utc::now());

        summary.total = self.reports.len();
        summary
    }

    /// Add a locally written record as pending. Returns `false` and leaves
    /// the store untouched if the id is already present.
    pub fn append(&mut self, mut report: Report) -> bool {
        if self.index.contains_key(&report.id) {
            log::debug!("report {} already in store, not appending", report.id);
            return false;
        }
        report.sync = SyncState::Pending { missed_polls: 0 };
        self.index.insert(report.id.clone(), self.reports.len());
        self.reports.push(report);
        true
    }

    /// Merge fields into the record with `id`; no-op when absent.
    /// A patched record is pending until the next snapshot confirms it.
    pub fn patch(&mut self, id: &str, patch: &ReportPatch) -> bool {
        let Some(&pos) = self.index.get(id) else {
            return false;
        };
        let report = &mut self.reports[pos];
        patch.apply(report);
        if !report.is_pending() {
            report.sync = SyncState::Pending { missed_polls: 0 };
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<&Report> {
        self.index.get(id).map(|&pos| &self.reports[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Reports in insertion order
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_pending()).count()
    }

    /// Time of the last applied snapshot
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Comments loaded for `report_id`, if its thread has been opened
    pub fn comments(&self, report_id: &str) -> Option<&[Comment]> {
        self.threads.get(report_id)
    }

    pub fn set_comments(&mut self, report_id: &str, comments: Vec<Comment>) {
        self.threads.replace(report_id, comments);
    }

    /// Append a comment the backend has accepted
    pub fn push_comment(&mut self, comment: Comment) {
        self.threads.push(comment);
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .reports
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id.clone(), pos))
            .collect();
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new(
            crate::core::config::DEFAULT_MAX_MISSED_POLLS,
            crate::core::config::DEFAULT_COMMENT_CACHE_CAPACITY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::report::Severity;
    use chrono::TimeZone;

    fn report(id: &str, severity: Severity) -> Report {
        Report {
            id: id.to_string(),
            lat: 19.0,
            lng: 72.8,
            severity,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            expires_at: None,
            accuracy_score: 0,
            total_votes: 0,
            image: None,
            sync: SyncState::Confirmed,
        }
    }

    #[test]
    fn test_replace_all_swaps_collection() {
        let mut store = ReportStore::default();
        store.replace_all(vec![report("a", Severity::Low), report("b", Severity::Medium)]);
        assert_eq!(store.len(), 2);
        assert!(store.last_updated().is_some());

        let summary = store.replace_all(vec![report("c", Severity::Severe)]);
        assert_eq!(summary.total, 1);
        assert!(!store.contains("a"));
        assert_eq!(store.get("c").unwrap().severity, Severity::Severe);
    }

    #[test]
    fn test_replace_all_keeps_first_duplicate() {
        let mut store = ReportStore::default();
        store.replace_all(vec![report("a", Severity::Low), report("a", Severity::Severe)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().severity, Severity::Low);
    }

    #[test]
    fn test_append_is_pending_and_unique() {
        let mut store = ReportStore::default();
        store.replace_all(vec![report("a", Severity::Low)]);
        assert!(store.append(report("b", Severity::Medium)));
        assert!(!store.append(report("a", Severity::Severe)));
        assert_eq!(store.len(), 2);
        assert!(store.get("b").unwrap().is_pending());
        assert!(!store.get("a").unwrap().is_pending());
        assert_eq!(store.reports().last().unwrap().id, "b");
    }

    #[test]
    fn test_snapshot_confirms_pending() {
        let mut store = ReportStore::default();
        store.append(report("new", Severity::Severe));
        let summary = store.replace_all(vec![report("new", Severity::Severe)]);
        assert_eq!(summary.confirmed, 1);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_orphaned_pending_dropped_after_missed_polls() {
        let mut store = ReportStore::new(2, 8);
        store.append(report("orphan", Severity::Low));

        let first = store.replace_all(vec![report("a", Severity::Low)]);
        assert_eq!(first.retained, 1);
        assert_eq!(
            store.get("orphan").unwrap().sync,
            SyncState::Pending { missed_polls: 1 }
        );

        store.replace_all(vec![report("a", Severity::Low)]);
        assert!(store.contains("orphan"));

        let third = store.replace_all(vec![report("a", Severity::Low)]);
        assert_eq!(third.dropped, 1);
        assert!(!store.contains("orphan"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_patch_merges_and_marks_pending() {
        let mut store = ReportStore::default();
        store.replace_all(vec![report("a", Severity::Low)]);
        assert!(store.patch("a", &ReportPatch::votes(2, 3)));
        let a = store.get("a").unwrap();
        assert_eq!((a.accuracy_score, a.total_votes), (2, 3));
        assert!(a.is_pending());

        assert!(!store.patch("missing", &ReportPatch::votes(1, 1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_threads_pruned_with_reports() {
        let mut store = ReportStore::default();
        store.replace_all(vec![report("a", Severity::Low)]);
        store.set_comments("a", Vec::new());
        assert!(store.comments("a").is_some());

        store.replace_all(vec![report("b", Severity::Low)]);
        assert!(store.comments("a").is_none());
    }
}
