//! OAuth client-credentials flow with an ES256-signed client secret

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

use super::error::{ApiError, Result};
use crate::core::config::Settings;

const AUDIENCE: &str = "https://appleid.apple.com";
const SCOPE: &str = "searchadsorg";
const SECRET_LIFETIME_SECS: i64 = 86_400;
/// Refresh tokens this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ClientSecretClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl ClientSecretClaims {
    pub fn new(settings: &Settings, now: i64) -> Self {
        Self {
            sub: settings.client_id.clone(),
            iss: settings.team_id.clone(),
            aud: AUDIENCE.to_string(),
            iat: now,
            exp: now + SECRET_LIFETIME_SECS,
        }
    }
}

/// Sign the client secret JWT
pub(crate) fn client_secret(settings: &Settings, now: i64) -> Result<String> {
    let pem = settings.private_key.pem()?;
    let key = EncodingKey::from_ec_pem(pem.as_bytes())?;
    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(settings.key_id.clone());
    Ok(encode(&header, &ClientSecretClaims::new(settings, now), &key)?)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// A bearer token plus the instant it stops being usable
#[derive(Debug, Clone)]
pub(crate) struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Exchange a freshly signed client secret for an access token
pub(crate) fn request_token(http: &reqwest::blocking::Client, settings: &Settings) -> Result<AccessToken> {
    let secret = client_secret(settings, chrono::Utc::now().timestamp())?;
    let response = http
        .post(&settings.token_url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", settings.client_id.as_str()),
            ("client_secret", secret.as_str()),
            ("scope", SCOPE),
        ])
        .send()?;

    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(ApiError::Token {
            status: status.as_u16(),
            message: token_error_message(&body),
        });
    }

    let token: TokenResponse = serde_json::from_str(&body).map_err(|source| ApiError::Decode {
        path: settings.token_url.clone(),
        source,
    })?;
    info!(expires_in = token.expires_in, "obtained access token");
    Ok(AccessToken {
        value: token.access_token,
        expires_at: Instant::now() + Duration::from_secs(token.expires_in),
    })
}

fn token_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| "token request rejected".to_string())
}
