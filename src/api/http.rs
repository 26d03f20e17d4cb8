use super::{ReportApi, VoteReceipt, VoteType};
use crate::{
    core::config::ClientConfig,
    model::{
        comment::{Comment, NewComment},
        filter::TimeFilter,
        report::{NewReport, Report},
    },
    NetworkError, Result,
};
use async_trait::async_trait;
use fxhash::FxHashSet;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

/// [`ReportApi`] over HTTP with a shared `reqwest` client.
///
/// The client carries the configured User-Agent and request timeout; a
/// timeout surfaces as an ordinary [`NetworkError::Transport`].
#[derive(Clone)]
pub struct HttpReportApi {
    client: Client,
    reports_url: Url,
}

impl HttpReportApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(NetworkError::from)?;
        Ok(Self {
            client,
            reports_url: config.reports_url()?,
        })
    }

    pub fn reports_url(&self) -> &Url {
        &self.reports_url
    }

    /// `{reports}/{id}/{tail}`, with the id percent-encoded as one segment
    fn report_url(&self, report_id: &str, tail: &str) -> Result<Url> {
        let mut url = self.reports_url.clone();
        url.path_segments_mut()
            .map_err(|_| NetworkError::Endpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(report_id)
            .push(tail);
        Ok(url)
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(NetworkError::Status {
        status: status.as_u16(),
        body,
    }
    .into())
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let bytes = check_status(resp).await?.bytes().await.map_err(NetworkError::from)?;
    Ok(serde_json::from_slice(&bytes).map_err(NetworkError::from)?)
}

/// Decode a snapshot element by element.
///
/// Elements that fail to decode or carry out-of-range coordinates are
/// skipped, and a repeated id keeps its first occurrence, so one bad record
/// never costs the whole poll.
pub fn decode_snapshot(values: Vec<serde_json::Value>) -> Vec<Report> {
    let mut seen = FxHashSet::default();
    let mut reports = Vec::with_capacity(values.len());

    for value in values {
        let report: Report = match serde_json::from_value(value) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("skipping undecodable report: {}", e);
                continue;
            }
        };
        if let Err(e) = report.validate() {
            log::warn!("skipping report {}: {}", report.id, e);
            continue;
        }
        if !seen.insert(report.id.clone()) {
            log::warn!("skipping duplicate report id {}", report.id);
            continue;
        }
        reports.push(report);
    }

    reports
}

#[async_trait]
impl ReportApi for HttpReportApi {
    async fn fetch_reports(&self, filter: TimeFilter) -> Result<Vec<Report>> {
        log::debug!("GET {} time_filter={}", self.reports_url, filter);
        let resp = self
            .client
            .get(self.reports_url.clone())
            .query(&[("time_filter", filter.as_query_value())])
            .send()
            .await
            .map_err(NetworkError::from)?;
        let values: Vec<serde_json::Value> = read_json(resp).await?;
        Ok(decode_snapshot(values))
    }

    async fn create_report(&self, report: &NewReport) -> Result<Report> {
        log::debug!(
            "POST {} severity={} at {}",
            self.reports_url,
            report.severity,
            report.position()
        );
        let resp = self
            .client
            .post(self.reports_url.clone())
            .json(report)
            .send()
            .await
            .map_err(NetworkError::from)?;
        read_json(resp).await
    }

    async fn vote(&self, report_id: &str, vote: VoteType) -> Result<VoteReceipt> {
        let url = self.report_url(report_id, "vote")?;
        log::debug!("POST {} vote_type={}", url, vote);
        let resp = self
            .client
            .post(url)
            .json(&serde_json::json!({ "vote_type": vote }))
            .send()
            .await
            .map_err(NetworkError::from)?;
        let body = check_status(resp).await?.text().await.map_err(NetworkError::from)?;
        if body.trim().is_empty() {
            return Ok(VoteReceipt::default());
        }
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            log::debug!("ignoring unexpected vote response body: {}", e);
            VoteReceipt::default()
        }))
    }

    async fn fetch_comments(&self, report_id: &str) -> Result<Vec<Comment>> {
        let url = self.report_url(report_id, "comments")?;
        log::debug!("GET {}", url);
        let resp = self.client.get(url).send().await.map_err(NetworkError::from)?;
        read_json(resp).await
    }

    async fn post_comment(&self, report_id: &str, comment: &NewComment) -> Result<Comment> {
        let url = self.report_url(report_id, "comments")?;
        log::debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .json(comment)
            .send()
            .await
            .map_err(NetworkError::from)?;
        read_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_json(id: &str, lat: f64, severity: &str) -> serde_json::Value {
        json!({
            "id": id,
            "lat": lat,
            "lng": 72.8777,
            "severity": severity,
            "created_at": "2024-06-01T10:15:00"
        })
    }

    #[test]
    fn test_report_urls() {
        let api = HttpReportApi::new(&ClientConfig::default().with_backend_url("http://api.test"))
            .unwrap();
        assert_eq!(api.reports_url().as_str(), "http://api.test/api/reports");
        assert_eq!(
            api.report_url("abc-1", "vote").unwrap().as_str(),
            "http://api.test/api/reports/abc-1/vote"
        );
        assert_eq!(
            api.report_url("a/b", "comments").unwrap().as_str(),
            "http://api.test/api/reports/a%2Fb/comments"
        );
    }

    #[test]
    fn test_report_urls_under_path_prefix() {
        let config = ClientConfig::default().with_backend_url("https://flood.example.org/aquaroute");
        let api = HttpReportApi::new(&config).unwrap();
        assert_eq!(
            api.reports_url().as_str(),
            "https://flood.example.org/aquaroute/api/reports"
        );
        assert_eq!(
            api.report_url("abc-1", "comments").unwrap().as_str(),
            "https://flood.example.org/aquaroute/api/reports/abc-1/comments"
        );
    }

    #[test]
    fn test_decode_snapshot_skips_bad_records() {
        let reports = decode_snapshot(vec![
            report_json("r1", 19.0, "Low"),
            report_json("r2", 19.1, "Extreme"),
            report_json("r3", 123.0, "Medium"),
            json!({"id": "r4"}),
            report_json("r1", 19.2, "Severe"),
            report_json("r5", 19.3, "Severe"),
        ]);
        let ids: Vec<_> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r5"]);
        assert_eq!(reports[0].lat, 19.0);
    }
}
