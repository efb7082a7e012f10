//! Generation service HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{GenError, GenResult};
use crate::service::GenerationService;
use crate::types::{
    CritiqueRequest, CritiqueResponse, DebugRequest, DebugResponse, ExportRequest,
    ExportResponse, ScriptRequest, ScriptResponse, VideoGenRequest, VideoGenResponse,
    VisionRequest, VisionResponse, VoiceRequest, VoiceResponse,
};

/// Configuration for the generation client.
#[derive(Debug, Clone)]
pub struct GenClientConfig {
    /// Base URL of the generation gateway
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for retryable errors
    pub max_retries: u32,
}

impl Default for GenClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            timeout: Duration::from_secs(600), // video generation is slow
            max_retries: 2,
        }
    }
}

impl GenClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GEN_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8100".to_string()),
            timeout: Duration::from_secs(
                std::env::var("GEN_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            max_retries: std::env::var("GEN_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// HTTP implementation of [`GenerationService`].
pub struct HttpGenerationService {
    http: Client,
    config: GenClientConfig,
}

impl HttpGenerationService {
    /// Create a new client.
    pub fn new(config: GenClientConfig) -> GenResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenResult<Self> {
        Self::new(GenClientConfig::from_env())
    }

    /// POST a JSON request to an endpoint and decode the JSON response.
    async fn post_json<Req, Resp>(&self, endpoint: &str, request: &Req) -> GenResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        debug!("Sending generation request to {}", url);

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .json(request)
                    .send()
                    .await
                    .map_err(GenError::Network)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::RequestFailed(format!(
                "Generation service returned {}: {}",
                status, body
            )));
        }

        let decoded: Resp = response.json().await?;
        Ok(decoded)
    }

    /// Execute with retry logic on retryable errors.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> GenResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GenResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Generation request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(GenError::RequestFailed("Unknown error".to_string())))
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate_script(&self, request: &ScriptRequest) -> GenResult<ScriptResponse> {
        self.post_json("script", request).await
    }

    async fn analyze_reference(&self, request: &VisionRequest) -> GenResult<VisionResponse> {
        self.post_json("vision", request).await
    }

    async fn critique(&self, request: &CritiqueRequest) -> GenResult<CritiqueResponse> {
        self.post_json("critique", request).await
    }

    async fn generate_video(&self, request: &VideoGenRequest) -> GenResult<VideoGenResponse> {
        self.post_json("video", request).await
    }

    async fn generate_voice(&self, request: &VoiceRequest) -> GenResult<VoiceResponse> {
        self.post_json("voice", request).await
    }

    async fn score_visual(&self, request: &DebugRequest) -> GenResult<DebugResponse> {
        self.post_json("debug", request).await
    }

    async fn export(&self, request: &ExportRequest) -> GenResult<ExportResponse> {
        self.post_json("export", request).await
    }
}
