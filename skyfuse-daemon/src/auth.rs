//! Bearer credential caching with client-credentials refresh.
//!
//! One `TokenCache` per authority. A credential is reused until it comes
//! within `REFRESH_MARGIN` of expiry, then replaced via a single exchange.
//! The cache slot is an async mutex held across the exchange, so concurrent
//! callers during a refresh wait for it and observe the fresh credential —
//! never a refresh storm, never a half-written slot.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use skyfuse_core::types::{Result, SkyfuseError};

/// Refresh this many seconds before actual expiry.
pub const REFRESH_MARGIN: f64 = 300.0;

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Bearer credential issued by one authority. Immutable once issued;
/// replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub expires_at: f64,
}

impl Credential {
    /// Credential for feeds that require no authentication. Never expires,
    /// never produces a bearer header.
    pub fn anonymous() -> Self {
        Credential {
            token: String::new(),
            expires_at: f64::INFINITY,
        }
    }

    pub fn is_fresh(&self, now: f64) -> bool {
        now < self.expires_at - REFRESH_MARGIN
    }

    /// Header value, or `None` in anonymous mode.
    pub fn bearer(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// The opaque client-credentials network call, seam for testing.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, now: f64) -> Result<Credential>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: f64,
}

/// Client-credentials exchange over HTTP (RFC 6749 §4.4 form post).
pub struct HttpExchanger {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl HttpExchanger {
    pub fn new(client: reqwest::Client, token_url: &str, client_id: &str, client_secret: &str) -> Self {
        HttpExchanger {
            client,
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

#[async_trait]
impl TokenExchanger for HttpExchanger {
    async fn exchange(&self, now: f64) -> Result<Credential> {
        let auth_err = |reason: String| SkyfuseError::Auth {
            authority: self.token_url.clone(),
            reason,
        };

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .send()
            .await
            .map_err(|e| auth_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(auth_err(format!("status {}", response.status())));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_err(format!("bad token response: {e}")))?;

        Ok(Credential {
            token: body.access_token,
            expires_at: now + body.expires_in,
        })
    }
}

// ---------------------------------------------------------------------------
// TokenCache
// ---------------------------------------------------------------------------

/// Per-authority credential cache.
pub struct TokenCache {
    authority: String,
    exchanger: Box<dyn TokenExchanger>,
    slot: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(authority: &str, exchanger: Box<dyn TokenExchanger>) -> Self {
        TokenCache {
            authority: authority.to_string(),
            exchanger,
            slot: Mutex::new(None),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Return a credential valid for the near future, exchanging only when
    /// the cached one is missing or inside the refresh margin.
    ///
    /// On a failed exchange the stale credential is discarded and the error
    /// surfaces to the caller; the polling cadence provides the retry.
    pub async fn get_valid(&self, now: f64) -> Result<Credential> {
        let mut slot = self.slot.lock().await;

        if let Some(cred) = slot.as_ref() {
            if cred.is_fresh(now) {
                return Ok(cred.clone());
            }
        }

        match self.exchanger.exchange(now).await {
            Ok(fresh) => {
                *slot = Some(fresh.clone());
                Ok(fresh)
            }
            Err(e) => {
                *slot = None;
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
