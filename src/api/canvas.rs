use super::{CanvasApi, SUBMISSIONS_PER_PAGE};
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{Assignment, Course, SubAccount, Submission};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct CanvasClient {
    client: reqwest::Client,
    base_url: String,
}

impl CanvasClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120)) // 2 minute timeout
            .connect_timeout(std::time::Duration::from_secs(30))
            .default_headers(build_headers(&config.api_token)?)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "Canvas request failed");
            return Err(FetchError::Status { url, status });
        }

        let response_text = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        serde_json::from_str(&response_text).map_err(|source| {
            tracing::warn!(
                %url,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Canvas response"
            );
            FetchError::Decode { url, source }
        })
    }
}

fn build_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
        .context("API token contains characters not allowed in an HTTP header")?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static("canvas-grade-auditor"));
    Ok(headers)
}

impl CanvasApi for CanvasClient {
    async fn get_course(&self, course_id: u64) -> Result<Course, FetchError> {
        self.get(&format!("courses/{}", course_id), &[]).await
    }

    async fn get_sub_account(&self, account_id: u64) -> Result<SubAccount, FetchError> {
        self.get(&format!("accounts/{}", account_id), &[]).await
    }

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>, FetchError> {
        self.get(&format!("courses/{}/assignments", course_id), &[])
            .await
    }

    async fn list_submissions_page(
        &self,
        course_id: u64,
        assignment_id: u64,
        page: u32,
    ) -> Result<Vec<Submission>, FetchError> {
        let path = format!(
            "courses/{}/assignments/{}/submissions",
            course_id, assignment_id
        );
        let query = [
            ("page", page.to_string()),
            ("per_page", SUBMISSIONS_PER_PAGE.to_string()),
            ("include[]", "user".to_string()),
            ("include[]", "rubric_assessment".to_string()),
            ("type[]", "StudentEnrollment".to_string()),
        ];
        self.get(&path, &query).await
    }
}
