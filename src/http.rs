use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tracing::debug;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// GET-only client bound to one site. Every request carries the same
/// `user-agent` and `referer` headers.
#[derive(Debug, Clone)]
pub struct SiteClient {
    client: Client,
    base_url: String,
}

impl SiteClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> HashMap<String, String> {
        HashMap::from([
            ("user-agent".to_string(), USER_AGENT.to_string()),
            ("referer".to_string(), self.base_url.clone()),
        ])
    }

    /// Full URL for a slug; slugs that already contain the base URL pass through.
    pub fn url_for(&self, slug: &str) -> String {
        if slug.contains(&self.base_url) {
            slug.to_string()
        } else {
            format!("{}{}", self.base_url, slug)
        }
    }

    pub async fn request(&self, slug: &str) -> Result<String> {
        let url = self.url_for(slug);
        debug!(%url, "fetching page");
        let mut req = self.client.get(&url);
        for (key, value) in self.headers() {
            req = req.header(key, value);
        }
        let response = req
            .send()
            .await
            .with_context(|| format!("request failed for {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {status} for {url}");
        }
        response
            .text()
            .await
            .with_context(|| format!("failed to read body for {url}"))
    }
}
