use rand::Rng;
use reqwest::{RequestBuilder, StatusCode};

use loadgen_common::{LoadgenError, Result};
use loadgen_core::{BatchRequest, DeliveryRecord, ErrorScenario, RequestKind};

/// Thin wrapper over a shared `reqwest::Client` bound to one API base.
///
/// Cloning is cheap; every worker gets its own clone.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LoadgenError::Config(format!("http client: {e}")))?;
        Ok(Self { http, base: base.trim_end_matches('/').to_string() })
    }

    pub fn base(&self) -> &str { &self.base }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base, path) }

    pub async fn health(&self) -> reqwest::Result<StatusCode> { self.get(RequestKind::Health).await }

    pub async fn model_info(&self) -> reqwest::Result<StatusCode> { self.get(RequestKind::ModelInfo).await }

    async fn get(&self, kind: RequestKind) -> reqwest::Result<StatusCode> {
        self.http.get(self.url(kind.path())).timeout(kind.timeout()).send().await.map(|r| r.status())
    }

    pub async fn predict(&self, record: &DeliveryRecord) -> reqwest::Result<StatusCode> {
        self.http
            .post(self.url(RequestKind::Predict.path()))
            .timeout(RequestKind::Predict.timeout())
            .json(record)
            .send()
            .await
            .map(|r| r.status())
    }

    pub async fn predict_batch(&self, batch: &BatchRequest) -> reqwest::Result<StatusCode> {
        self.http
            .post(self.url(RequestKind::Batch.path()))
            .timeout(RequestKind::Batch.timeout())
            .json(batch)
            .send()
            .await
            .map(|r| r.status())
    }

    /// Builds a request of `kind`, generating its payload from `rng`.
    ///
    /// The payload is produced before anything is awaited so the RNG is
    /// never held across a suspension point.
    pub fn build<R: Rng + ?Sized>(&self, kind: RequestKind, rng: &mut R) -> RequestBuilder {
        let req = match kind {
            RequestKind::Predict => self.http.post(self.url(kind.path())).json(&DeliveryRecord::random(rng)),
            RequestKind::Batch => self.http.post(self.url(kind.path())).json(&BatchRequest::random(rng)),
            RequestKind::Health | RequestKind::ModelInfo => self.http.get(self.url(kind.path())),
        };
        req.timeout(kind.timeout())
    }

    pub async fn send<R: Rng + ?Sized>(&self, kind: RequestKind, rng: &mut R) -> reqwest::Result<StatusCode> {
        let req = self.build(kind, rng);
        req.send().await.map(|r| r.status())
    }

    pub async fn send_scenario(&self, scenario: ErrorScenario) -> reqwest::Result<StatusCode> {
        let url = self.url(scenario.path());
        let req = match scenario.payload() {
            Some(body) => self.http.post(url).json(&body),
            None => self.http.get(url),
        };
        req.timeout(scenario.timeout()).send().await.map(|r| r.status())
    }
}
