use serde::Serialize;

use crate::config::InfluxConfig;
use crate::metrics::MetricPoint;

use super::{Error, Result, SeriesBackend, TimePrecision};

/// Client for the InfluxDB 0.8 HTTP API.
///
/// - ping: `GET /ping`
/// - write: `POST /db/<db>/series?time_precision=<p>` with a series/columns/points document
/// - drop: `GET /db/<db>/series?q=drop series "<name>"`
///
/// Credentials travel as the `u` and `p` query parameters.
#[derive(Debug, Clone)]
pub struct InfluxBackend {
    client: reqwest::Client,
    host: String,
    database: String,
    user: String,
    password: String,
}

/// One entry of the write document.
#[derive(Debug, Serialize)]
struct SeriesPayload<'a> {
    name: &'a str,
    columns: &'a [String],
    points: [&'a [u64]; 1],
}

impl<'a> From<&'a MetricPoint> for SeriesPayload<'a> {
    fn from(point: &'a MetricPoint) -> Self {
        Self {
            name: point.series_name(),
            columns: point.columns(),
            points: [point.values()],
        }
    }
}

impl InfluxBackend {
    /// Builds a client for the configured backend. Does not contact the backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if the HTTP client cannot be constructed.
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_owned(),
            database: config.database.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn series_url(&self) -> String {
        format!("{}/db/{}/series", self.host, self.database)
    }

    fn credentials(&self) -> [(&'static str, &str); 2] {
        [("u", self.user.as_str()), ("p", self.password.as_str())]
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<()> {
        let response = request.send().await.map_err(Error::Request)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn drop_series_query(series_name: &str) -> String {
    format!("drop series \"{}\"", series_name.replace('"', "\\\""))
}

impl SeriesBackend for InfluxBackend {
    async fn ping(&self) -> Result<()> {
        let url = format!("{}/ping", self.host);
        self.send(self.client.get(url)).await
    }

    async fn write_point(&self, point: &MetricPoint, precision: TimePrecision) -> Result<()> {
        let body = [SeriesPayload::from(point)];
        let request = self
            .client
            .post(self.series_url())
            .query(&self.credentials())
            .query(&[("time_precision", precision.as_str())])
            .json(&body);
        self.send(request).await
    }

    async fn drop_series(&self, series_name: &str) -> Result<()> {
        let query = drop_series_query(series_name);
        let request = self
            .client
            .get(self.series_url())
            .query(&self.credentials())
            .query(&[("q", query.as_str())]);
        self.send(request).await
    }
}
