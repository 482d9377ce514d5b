//! HTTP client for the external deployment collaborator.
//!
//! The collaborator exposes two JSON endpoints: `deploy` for new base
//! contracts and `configure` for post-deployment configuration of an
//! existing contract. Only connect failures are retried with exponential
//! backoff: if the connection was never established the server provably did
//! not observe the request. Anything later, including a request timeout, may
//! mean the collaborator already submitted the transaction, so it is
//! surfaced as an error instead of re-sent and a configuration chunk keeps
//! exactly one logical attempt.

use std::time::Duration;

use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use serde::de::DeserializeOwned;
use url::Url;

use crate::collaborators::{
    ConfigureOutcome, DeployOutcome, DeployRequest, DeploymentBackend,
};
use crate::modules::ModuleCategory;

/// Default timeout for collaborator requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum transport-level retries per request.
const MAX_TRANSPORT_RETRIES: usize = 3;

/// HTTP implementation of [`DeploymentBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpBackend {
    /// Create a client for the collaborator at `endpoint`.
    pub fn new(endpoint: Url) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, endpoint })
    }

    /// POST a JSON body and deserialize the JSON response.
    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = self
            .endpoint
            .join(path)
            .with_context(|| format!("Failed to build collaborator URL for {path}"))?;

        let send = || async {
            self.client
                .post(url.clone())
                .json(body)
                .send()
                .await?
                .error_for_status()
        };

        // Only a failed connect is safe to retry; once bytes may have reached
        // the collaborator, a resend could submit the same transaction twice.
        let response = send
            .retry(ExponentialBuilder::default().with_max_times(MAX_TRANSPORT_RETRIES))
            .when(|e: &reqwest::Error| e.is_connect())
            .notify(|e: &reqwest::Error, dur: Duration| {
                tracing::warn!(error = %e, retry_in = ?dur, "Collaborator request failed, retrying");
            })
            .await
            .with_context(|| format!("Collaborator request to {path} failed"))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse collaborator {path} response"))
    }
}

impl DeploymentBackend for HttpBackend {
    async fn deploy(&self, request: DeployRequest, actor: &str) -> Result<DeployOutcome> {
        let mut body = match serde_json::to_value(&request) {
            Ok(value) => value,
            Err(e) => anyhow::bail!("Failed to serialize deploy request: {e}"),
        };
        body["actor"] = serde_json::Value::String(actor.to_string());

        tracing::info!(
            contract_type = %request.contract_type,
            blockchain = %request.blockchain,
            "Submitting base deployment to collaborator"
        );

        self.post_json("deploy", &body).await
    }

    async fn configure(
        &self,
        contract_address: &str,
        category: ModuleCategory,
        data: serde_json::Value,
        actor: &str,
    ) -> Result<ConfigureOutcome> {
        let body = serde_json::json!({
            "contract_address": contract_address,
            "category": category,
            "data": data,
            "actor": actor,
        });

        self.post_json("configure", &body).await
    }
}
