//! Backend seam
//!
//! Everything the client needs from the REST backend goes through
//! [`ReportApi`], so the sync and mutation logic can run against the real
//! HTTP implementation or an in-memory stand-in.

pub mod http;

use crate::{
    model::{
        comment::{Comment, NewComment},
        filter::TimeFilter,
        report::{NewReport, Report},
    },
    Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

/// Counts echoed by the backend after a vote. Informational only: the store
/// is refreshed from the next snapshot instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VoteReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub accuracy_score: Option<i64>,
    #[serde(default)]
    pub total_votes: Option<i64>,
}

#[async_trait]
pub trait ReportApi: Send + Sync {
    /// `GET /api/reports?time_filter=…`
    async fn fetch_reports(&self, filter: TimeFilter) -> Result<Vec<Report>>;

    /// `POST /api/reports`
    async fn create_report(&self, report: &NewReport) -> Result<Report>;

    /// `POST /api/reports/{id}/vote`
    async fn vote(&self, report_id: &str, vote: VoteType) -> Result<VoteReceipt>;

    /// `GET /api/reports/{id}/comments`
    async fn fetch_comments(&self, report_id: &str) -> Result<Vec<Comment>>;

    /// `POST /api/reports/{id}/comments`
    async fn post_comment(&self, report_id: &str, comment: &NewComment) -> Result<Comment>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_body() {
        let body = serde_json::json!({ "vote_type": VoteType::Down });
        assert_eq!(body.to_string(), r#"{"vote_type":"down"}"#);
    }

    #[test]
    fn test_vote_receipt_tolerates_partial_body() {
        let receipt: VoteReceipt = serde_json::from_str(r#"{"message":"Vote recorded"}"#).unwrap();
        assert_eq!(receipt.message.as_deref(), Some("Vote recorded"));
        assert_eq!(receipt.total_votes, None);
    }
}
