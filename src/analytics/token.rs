//! OAuth2 service-account token exchange
//! Signs a JWT-bearer assertion with the key's RSA private key and trades it for an access token.

use crate::analytics::credentials::ServiceAccountKey;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Build the RS256 assertion for `scope`, issued at `now`.
pub fn sign_assertion(key: &ServiceAccountKey, scope: &str, now: DateTime<Utc>) -> Result<String> {
    let iat = now.timestamp();
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: scope.to_string(),
        aud: key.token_uri.clone(),
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("Service account private_key is not a valid RSA PEM key")?;

    encode(&header, &claims, &encoding_key).context("Failed to sign JWT assertion")
}

/// Exchange a freshly signed assertion for an access token at the key's token URI.
pub fn fetch_access_token(
    client: &Client,
    key: &ServiceAccountKey,
    scope: &str,
) -> Result<AccessToken> {
    let assertion = sign_assertion(key, scope, Utc::now())?;

    debug!(
        "Requesting access token for {} from {}",
        key.client_email, key.token_uri
    );

    let resp = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .with_context(|| format!("POST {} failed", key.token_uri))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        return Err(anyhow!("POST {} {}: {}", key.token_uri, status, text));
    }

    let token = resp
        .json::<AccessToken>()
        .context("Failed to parse token response")?;

    if token.access_token.is_empty() {
        return Err(anyhow!("token endpoint returned an empty access_token"));
    }

    debug!("Access token obtained, expires in {:?}s", token.expires_in);
    Ok(token)
}
