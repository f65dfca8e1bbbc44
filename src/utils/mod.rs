pub mod crypto;
pub mod crypto_js;
pub mod html;
pub mod jwp_player;
pub mod text;

use std::time::Duration;

use log::debug;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    ClientBuilder,
};
use serde::de::DeserializeOwned;

use crate::errors::{Error, Result};

pub fn get_user_agent<'a>() -> &'a str {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36"
}

pub fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::default();

    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

pub fn create_client_builder(timeout: Duration) -> ClientBuilder {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .user_agent(get_user_agent())
        .default_headers(get_default_headers())
}

/// Outbound HTTP with a fixed timeout and browser-like headers. Every failure
/// (timeout, connection, non-2xx status, unreadable body) is reported as
/// [`Error::UpstreamUnavailable`]; retries are up to the caller.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = create_client_builder(timeout)
            .build()
            .map_err(|e| Error::upstream("<client>", e))?;

        Ok(Self { client })
    }

    /// Headers given here replace the defaults of the same name.
    pub async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<reqwest::Response> {
        debug!("[upstream] GET {url}");

        self.client
            .get(url)
            .headers(headers)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| Error::upstream(url, e))
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_text_with(url, HeaderMap::new()).await
    }

    pub async fn get_text_with(&self, url: &str, headers: HeaderMap) -> Result<String> {
        self.fetch(url, headers)
            .await?
            .text()
            .await
            .map_err(|e| Error::upstream(url, e))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with(url, HeaderMap::new()).await
    }

    pub async fn get_json_with<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T> {
        let body = self.get_text_with(url, headers).await?;
        serde_json::from_str(&body).map_err(|e| Error::upstream(url, format!("bad json: {e}")))
    }
}
