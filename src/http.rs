use anyhow::Context;
use std::ops::Deref;
use std::time::Duration;

use crate::fetcher::PageProvider;

pub struct HttpClient(reqwest::Client);

impl Default for HttpClient {
    fn default() -> Self {
        Self(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap(),
        )
    }
}

impl Deref for HttpClient {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inner(&self) -> &reqwest::Client {
        &self.0
    }
}

#[async_trait::async_trait]
impl PageProvider for HttpClient {
    async fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
        self.get(url)
            .send()
            .await
            .with_context(|| format!("fail to send GET request to url: `{url}`"))?
            .error_for_status()
            .with_context(|| format!("got bad status from url: `{url}`"))?
            .text()
            .await
            .with_context(|| format!("fail to read response body from url: `{url}`"))
    }
}
