//! In-memory backend shared by the integration tests

#![allow(dead_code)]

use aquaroute::{
    api::VoteReceipt, Comment, Error, NetworkError, NewComment, NewReport, Report, ReportApi,
    Severity, SyncState, TimeFilter, VoteType,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::Notify;

/// A request the fake backend received
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(TimeFilter),
    Create(NewReport),
    Vote(String, VoteType),
    FetchComments(String),
    PostComment { report_id: String, text: String, author: String },
}

#[derive(Default)]
pub struct FakeApi {
    snapshots: Mutex<HashMap<TimeFilter, Vec<Report>>>,
    comments: Mutex<HashMap<String, Vec<Comment>>>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    next_id: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Created reports are left out of later snapshots
    pub forget_creates: AtomicBool,
}

pub fn unavailable() -> Error {
    NetworkError::Status {
        status: 503,
        body: "service unavailable".into(),
    }
    .into()
}

pub fn report(id: &str, lat: f64, lng: f64, severity: Severity) -> Report {
    Report {
        id: id.to_string(),
        lat,
        lng,
        severity,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 15, 0).unwrap(),
        expires_at: None,
        accuracy_score: 0,
        total_votes: 0,
        image: None,
        sync: SyncState::Confirmed,
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Same reports for every time filter
    pub fn with_reports(reports: Vec<Report>) -> Arc<Self> {
        let api = Self::new();
        for filter in TimeFilter::ALL {
            api.set_snapshot(filter, reports.clone());
        }
        api
    }

    pub fn set_snapshot(&self, filter: TimeFilter, reports: Vec<Report>) {
        self.snapshots.lock().unwrap().insert(filter, reports);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Fetch(_)))
            .count()
    }

    pub fn fetches_for(&self, filter: TimeFilter) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == Call::Fetch(filter))
            .count()
    }

    /// Hold the next fetch for `filter` until the returned `Notify` fires
    pub fn gate_fetch(&self, filter: TimeFilter) -> Arc<Notify> {
        self.gate(format!("fetch:{}", filter))
    }

    /// Hold the next report creation until the returned `Notify` fires
    pub fn gate_create(&self) -> Arc<Notify> {
        self.gate("create".to_string())
    }

    fn gate(&self, key: String) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(key, notify.clone());
        notify
    }

    async fn pass_gate(&self, key: &str) {
        let gate = self.gates.lock().unwrap().remove(key);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_writes(&self) -> aquaroute::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReportApi for FakeApi {
    async fn fetch_reports(&self, filter: TimeFilter) -> aquaroute::Result<Vec<Report>> {
        self.record(Call::Fetch(filter));
        // The snapshot is taken when the request arrives, not when it is answered
        let snapshot = self
            .snapshots
            .lock()
            .unwrap()
            .get(&filter)
            .cloned()
            .unwrap_or_default();
        self.pass_gate(&format!("fetch:{}", filter)).await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(snapshot)
    }

    async fn create_report(&self, new_report: &NewReport) -> aquaroute::Result<Report> {
        self.record(Call::Create(new_report.clone()));
        self.pass_gate("create").await;
        self.check_writes()?;

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created_at = Utc::now();
        let report = Report {
            id: format!("srv-{}", n),
            lat: new_report.lat,
            lng: new_report.lng,
            severity: new_report.severity,
            created_at,
            expires_at: Some(created_at + ChronoDuration::hours(24)),
            accuracy_score: 0,
            total_votes: 0,
            image: new_report.image_base64.clone(),
            sync: SyncState::Confirmed,
        };
        if !self.forget_creates.load(Ordering::SeqCst) {
            for reports in self.snapshots.lock().unwrap().values_mut() {
                reports.push(report.clone());
            }
        }
        Ok(report)
    }

    async fn vote(&self, report_id: &str, vote: VoteType) -> aquaroute::Result<VoteReceipt> {
        self.record(Call::Vote(report_id.to_string(), vote));
        self.check_writes()?;

        let delta = match vote {
            VoteType::Up => 1,
            VoteType::Down => -1,
        };
        let mut receipt = VoteReceipt {
            message: Some("Vote recorded".into()),
            ..Default::default()
        };
        for reports in self.snapshots.lock().unwrap().values_mut() {
            for report in reports.iter_mut().filter(|r| r.id == report_id) {
                report.accuracy_score += delta;
                report.total_votes += 1;
                receipt.accuracy_score = Some(report.accuracy_score);
                receipt.total_votes = Some(report.total_votes);
            }
        }
        Ok(receipt)
    }

    async fn fetch_comments(&self, report_id: &str) -> aquaroute::Result<Vec<Comment>> {
        self.record(Call::FetchComments(report_id.to_string()));
        self.check_writes()?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(report_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn post_comment(
        &self,
        report_id: &str,
        comment: &NewComment,
    ) -> aquaroute::Result<Comment> {
        self.record(Call::PostComment {
            report_id: report_id.to_string(),
            text: comment.text().to_string(),
            author: comment.author().to_string(),
        });
        self.check_writes()?;

        let mut comments = self.comments.lock().unwrap();
        let thread = comments.entry(report_id.to_string()).or_default();
        let stored = Comment {
            id: format!("c-{}", thread.len() + 1),
            report_id: report_id.to_string(),
            author: comment.author().to_string(),
            text: comment.text().to_string(),
            created_at: Utc::now(),
        };
        thread.push(stored.clone());
        Ok(stored)
    }
}

/// Let spawned tasks run until the fake has seen `n` calls
pub async fn wait_for_calls(api: &FakeApi, n: usize) {
    for _ in 0..1000 {
        if api.call_count() >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {} calls, saw {:?}", n, api.calls());
}
