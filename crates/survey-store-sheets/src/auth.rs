//! Service-account authentication (OAuth 2.0 JWT-bearer grant).
//!
//! A signed assertion is exchanged at the account's `token_uri` for a
//! short-lived access token. The token is cached and reused until shortly
//! before it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{Error, Result};

/// OAuth scope granting read/write access to spreadsheets.
pub(crate) const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion, in seconds; Google caps it at one
/// hour.
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh this many seconds before the cached token's reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String { "https://oauth2.googleapis.com/token".to_owned() }

/// The fields of a service-account JSON key file that matter here.
/// Everything else in the blob is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
  pub client_email:   String,
  /// PEM-encoded RSA private key.
  pub private_key:    String,
  #[serde(default)]
  pub private_key_id: Option<String>,
  #[serde(default = "default_token_uri")]
  pub token_uri:      String,
}

impl ServiceAccountKey {
  /// Parse a service-account JSON blob.
  pub fn from_json(raw: &str) -> Result<Self> {
    let key: Self = serde_json::from_str(raw)
      .map_err(|e| Error::Credentials(e.to_string()))?;
    if key.client_email.trim().is_empty() {
      return Err(Error::Credentials("client_email is empty".to_owned()));
    }
    Ok(key)
  }

  /// Decode the private key. Fails for anything that is not an RSA PEM.
  pub(crate) fn encoding_key(&self) -> Result<EncodingKey> {
    EncodingKey::from_rsa_pem(self.private_key.as_bytes())
      .map_err(|e| Error::Credentials(format!("private_key: {e}")))
  }
}

// ─── Token exchange ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
  pub iss:   String,
  pub scope: String,
  pub aud:   String,
  pub iat:   i64,
  pub exp:   i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: String,
  expires_in:   i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
  value:      String,
  expires_at: DateTime<Utc>,
}

/// Signs assertions for one service account and caches the resulting token.
pub(crate) struct TokenSource {
  key:     ServiceAccountKey,
  signing: EncodingKey,
  cached:  Mutex<Option<AccessToken>>,
}

impl TokenSource {
  pub fn new(key: ServiceAccountKey) -> Result<Self> {
    let signing = key.encoding_key()?;
    Ok(Self { key, signing, cached: Mutex::new(None) })
  }

  /// A valid bearer token, exchanging a fresh assertion when needed.
  pub async fn token(&self, http: &Client) -> Result<String> {
    let mut cached = self.cached.lock().await;
    if let Some(token) = cached.as_ref()
      && token.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now()
    {
      return Ok(token.value.clone());
    }

    let fresh = self.exchange(http).await?;
    let value = fresh.value.clone();
    *cached = Some(fresh);
    Ok(value)
  }

  /// Drop the cached token, e.g. after the API rejected it.
  pub async fn invalidate(&self) { *self.cached.lock().await = None; }

  fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = self.key.private_key_id.clone();

    let claims = Claims {
      iss:   self.key.client_email.clone(),
      scope: SHEETS_SCOPE.to_owned(),
      aud:   self.key.token_uri.clone(),
      iat:   now.timestamp(),
      exp:   (now + Duration::seconds(ASSERTION_TTL_SECS)).timestamp(),
    };
    Ok(jsonwebtoken::encode(&header, &claims, &self.signing)?)
  }

  async fn exchange(&self, http: &Client) -> Result<AccessToken> {
    let now = Utc::now();
    let assertion = self.assertion(now)?;

    tracing::debug!(token_uri = %self.key.token_uri, "exchanging service account assertion");
    let resp = http
      .post(&self.key.token_uri)
      .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      // The token endpoint reports bad grants as 400 `invalid_grant`.
      return Err(if status.is_client_error() {
        Error::Unauthorized { status: status.as_u16(), body }
      } else {
        Error::Status { status: status.as_u16(), body }
      });
    }

    let token: TokenResponse = resp.json().await?;
    Ok(AccessToken {
      value:      token.access_token,
      expires_at: now + Duration::seconds(token.expires_in),
    })
  }
}
