use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::error::LoadError;

const FHIR_JSON: &str = "application/fhir+json";

/// Raw server reply to a submission. Non-success statuses are data here,
/// not errors; the loader decides how to classify them.
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub status: StatusCode,
    pub body: String,
}

impl SubmitResponse {
    /// The server accepted the document (200 OK or 201 Created).
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, StatusCode::OK | StatusCode::CREATED)
    }
}

pub struct FhirClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl FhirClient {
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST a resource or Bundle to the endpoint as-is.
    pub async fn submit(&self, body: &Value) -> Result<SubmitResponse, LoadError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", FHIR_JSON)
            .header("Accept", FHIR_JSON)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Ok(SubmitResponse { status, body })
    }
}
