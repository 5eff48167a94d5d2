//! Resume-processing endpoints
//!
//! These are the operations the usage ledger meters. Their payloads
//! belong to the document pipeline, not to this client, so requests and
//! responses stay opaque `serde_json::Value`s here.

use serde_json::Value;

use crate::error::ApiError;
use crate::fetch::Fetch;
use crate::ApiClient;

/// Handle for the resume endpoint group
pub struct ResumeApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ResumeApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.client.base_url(), path);

        Fetch::post(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .json(payload)?
            .execute()
            .await
    }

    /// Analyze a resume against a job description.
    pub async fn analyze(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post("/resume/analyze", payload).await
    }

    /// Rewrite a resume for general strength.
    pub async fn optimize(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post("/resume/optimize", payload).await
    }

    /// Tailor a resume to a specific posting.
    pub async fn customize(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post("/resume/customize", payload).await
    }

    /// Score a resume the way an applicant tracking system would.
    pub async fn ats_scan(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post("/resume/ats-scan", payload).await
    }

    /// Salary estimate for the resume's profile.
    pub async fn salary_insights(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post("/resume/salary-insights", payload).await
    }

    /// List the available resume templates.
    pub async fn templates(&self) -> Result<Value, ApiError> {
        let url = format!("{}/resumebuilder/templates", self.client.base_url());

        Fetch::get(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .execute()
            .await
    }

    /// Upload a resume file and get its structured content back.
    pub async fn extract(&self, file_name: &str, bytes: Vec<u8>) -> Result<Value, ApiError> {
        let url = format!("{}/resumebuilder/extract", self.client.base_url());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        Fetch::post(self.client.http_client(), &url)
            .maybe_bearer_auth(self.client.auth_token().as_deref())
            .multipart(form)
            .execute()
            .await
    }

    /// Render a resume from structured content and a template.
    pub async fn build(&self, payload: &Value) -> Result<Value, ApiError> {
        self.post("/resumebuilder/build", payload).await
    }
}
