use std::{future::Future, time::Duration};

use log::{debug, info};
use reqwest::{header, Url};

use crate::{config::Config, cookie_store::Credentials};

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: Url, timeout: Duration },
    #[error("Request to {url} failed: {source}")]
    Connection {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

/// Anything that can hand out the raw leaderboard page.
pub trait PageSource {
    fn fetch_page(
        &self,
        url: &Url,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

pub struct ForumClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ForumClient {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            timeout: config.request_timeout,
        })
    }

    /// Sends a single GET and returns the body whatever the status code is;
    /// the caller decides from the content whether the page is usable.
    pub async fn fetch(&self, url: &Url, credentials: &Credentials) -> Result<String, FetchError> {
        let classify = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: url.clone(),
                    timeout: self.timeout,
                }
            } else {
                FetchError::Connection {
                    url: url.clone(),
                    source,
                }
            }
        };
        info!("Fetching {url}");
        let response = self
            .client
            .get(url.clone())
            .header(header::COOKIE, credentials.cookie_header())
            .header(header::ACCEPT, ACCEPT)
            .send()
            .await
            .map_err(classify)?;
        debug!("Server returned {:?}", response.status());
        let body = response.text().await.map_err(classify)?;
        debug!("Received {} bytes", body.len());
        Ok(body)
    }
}

impl PageSource for ForumClient {
    async fn fetch_page(&self, url: &Url, credentials: &Credentials) -> Result<String, FetchError> {
        self.fetch(url, credentials).await
    }
}
