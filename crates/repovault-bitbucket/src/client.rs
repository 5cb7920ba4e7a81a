use crate::{Error, Result};
use repovault_core::{retry_fixed, BackupTarget, RETRY_ATTEMPTS, RETRY_DELAY};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const API_BASE: &str = "https://api.bitbucket.org/2.0";
const TOKEN_URL: &str = "https://bitbucket.org/site/oauth2/access_token";

/// Bitbucket Cloud API client: OAuth2 client-credentials token exchange plus
/// the paginated repository listing.
#[derive(Clone)]
pub struct BitbucketClient {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    token_url: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl BitbucketClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            API_BASE.to_string(),
            TOKEN_URL.to_string(),
        )
    }

    /// Client against explicit endpoints. Production uses [`Self::new`];
    /// tests point this at a local mock server.
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        api_base: String,
        token_url: String,
    ) -> Self {
        Self {
            client: Client::new(),
            client_id,
            client_secret,
            api_base,
            token_url,
            retry_attempts: RETRY_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    /// Acquire a bearer token, retrying the exchange. Exhaustion is fatal to
    /// the run: with no token there is nothing to list.
    pub async fn access_token(&self) -> Result<String> {
        retry_fixed(
            "bitbucket token exchange",
            self.retry_attempts,
            self.retry_delay,
            || self.fetch_token(),
        )
        .await
    }

    async fn fetch_token(&self) -> Result<String> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed token response: {}", e)))?;

        Ok(token.access_token)
    }

    /// List every repository of `workspace` that exposes an SSH clone link,
    /// following the `next` cursor until the listing is exhausted.
    pub async fn list_targets(&self, workspace: &str) -> Result<Vec<BackupTarget>> {
        let token = self.access_token().await?;

        let mut targets = Vec::new();
        let mut page_url = Some(format!(
            "{}/repositories/{}?pagelen=100",
            self.api_base, workspace
        ));

        while let Some(url) = page_url {
            let page = self.fetch_page(&url, &token).await?;

            for repo in page.values {
                match repo.ssh_clone_url() {
                    Some(href) => targets.push(BackupTarget::from_clone_url(href)),
                    None => {
                        tracing::debug!(
                            "repository {} exposes no ssh clone link, skipping",
                            repo.full_name
                        );
                    }
                }
            }

            page_url = page.next;
        }

        tracing::info!("discovered {} repositories to back up", targets.len());

        Ok(targets)
    }

    async fn fetch_page(&self, url: &str, token: &str) -> Result<RepoPage> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Listing(format!("repository listing failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Listing(format!(
                "repository listing failed ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Listing(format!("malformed listing response: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct RepoPage {
    #[serde(default)]
    values: Vec<RepoEntry>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    links: RepoLinks,
}

#[derive(Debug, Default, Deserialize)]
struct RepoLinks {
    #[serde(default)]
    clone: Vec<CloneLink>,
}

#[derive(Debug, Deserialize)]
struct CloneLink {
    name: String,
    href: String,
}

impl RepoEntry {
    fn ssh_clone_url(&self) -> Option<&str> {
        self.links
            .clone
            .iter()
            .find(|link| link.name == "ssh")
            .map(|link| link.href.as_str())
    }
}
