use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::api::parser;
use crate::app::BuildRequest;

const CONNECT_TIMEOUT_SECS: u64 = 10;
// Applies to REST calls only; the tail stream must stay open indefinitely.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the Starfish web backend.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
}

impl Client {
    pub fn new(server: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| eyre!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            http,
            base: server.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub async fn fetch_builds(&self) -> Result<String> {
        self.get_json(&format!("{}/api/builds", self.base)).await
    }

    pub async fn fetch_build(&self, id: i32) -> Result<String> {
        self.get_json(&format!("{}/api/build/{id}", self.base)).await
    }

    pub async fn submit_build(&self, request: &BuildRequest) -> Result<String> {
        let url = format!("{}/api/build", self.base);
        let response = self
            .http
            .put(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(connect_error)?;
        read_body(response).await
    }

    pub async fn restart_build(&self, id: i32) -> Result<String> {
        let url = format!("{}/api/build/{id}/restart", self.base);
        let response = self
            .http
            .put(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body("")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(connect_error)?;
        read_body(response).await
    }

    /// Open the server-sent-event stream tailing one build's log. The
    /// `backlog` query parameter asks for that many historical lines up
    /// front.
    pub async fn open_tail(&self, id: i32, backlog: usize) -> Result<reqwest::Response> {
        let url = format!("{}/api/build/{id}/tail?len={backlog}", self.base);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(connect_error)?;
        if !response.status().is_success() {
            return Err(eyre!("tail endpoint returned {}", response.status()));
        }
        Ok(response)
    }

    async fn get_json(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(connect_error)?;
        read_body(response).await
    }
}

fn connect_error(e: reqwest::Error) -> color_eyre::eyre::Report {
    if e.is_connect() {
        eyre!("cannot reach the Starfish backend: {e}")
    } else {
        eyre!("request failed: {e}")
    }
}

/// Non-2xx bodies carry an `{ "error": {...} }` envelope; surface its
/// description when present.
async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| eyre!("failed to read response body: {e}"))?;
    if status.is_success() {
        return Ok(body);
    }
    match parser::error_description(&body) {
        Some(description) => Err(eyre!("{description}")),
        None => Err(eyre!("server returned {status}")),
    }
}
