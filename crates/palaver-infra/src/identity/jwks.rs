//! RS256 ID-token verification against a provider's published JWKS.
//!
//! Google Sign-In and Firebase Authentication both issue RS256 JWTs whose
//! signing keys are published as a JSON Web Key Set. The two differ only in
//! issuer, audience, and the key-set URL, so one verifier type serves both.
//!
//! Keys are cached for the `max-age` the provider advertises (one hour when
//! absent). A token signed with a key id missing from the cache triggers one
//! refresh, rate limited so forged key ids cannot hammer the provider.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use palaver_core::identity::verifier::IdentityVerifier;
use palaver_types::error::IdentityError;
use palaver_types::identity::{IdentityProviderKind, VerifiedIdentity};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio::sync::RwLock;

pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const FIREBASE_CERTS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(3600);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Claims read from a verified ID token.
#[derive(Debug, Clone, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

struct CachedKeys {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// `IdentityVerifier` for a JWKS-publishing OpenID provider.
pub struct JwksIdentityVerifier {
    provider: IdentityProviderKind,
    issuers: Vec<String>,
    audience: String,
    certs_url: String,
    http: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksIdentityVerifier {
    /// Verifier for Google Sign-In ID tokens issued to `client_id`.
    pub fn google(client_id: impl Into<String>) -> Self {
        Self::new(
            IdentityProviderKind::Google,
            vec![
                "accounts.google.com".to_string(),
                "https://accounts.google.com".to_string(),
            ],
            client_id.into(),
            GOOGLE_CERTS_URL,
        )
    }

    /// Verifier for Firebase Authentication ID tokens of `project_id`.
    pub fn firebase(project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self::new(
            IdentityProviderKind::Firebase,
            vec![format!("https://securetoken.google.com/{project_id}")],
            project_id,
            FIREBASE_CERTS_URL,
        )
    }

    fn new(
        provider: IdentityProviderKind,
        issuers: Vec<String>,
        audience: String,
        certs_url: &str,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            provider,
            issuers,
            audience,
            certs_url: certs_url.to_string(),
            http,
            cache: RwLock::new(None),
        }
    }

    /// Fetch keys from a different URL (self-hosted mirrors, tests).
    pub fn with_certs_url(mut self, url: impl Into<String>) -> Self {
        self.certs_url = url.into();
        self
    }

    /// Cached key set, fetched when missing or stale. With `force`, a
    /// refresh happens unless the cache was filled very recently.
    async fn signing_keys(&self, force: bool) -> Result<Arc<JwkSet>, IdentityError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let recently = cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL;
                if cached.is_fresh() && (!force || recently) {
                    return Ok(cached.keys.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref()
            && cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL
        {
            return Ok(cached.keys.clone());
        }

        let (keys, ttl) = self.fetch_keys().await?;
        let keys = Arc::new(keys);
        tracing::debug!(
            provider = %self.provider,
            keys = keys.keys.len(),
            ttl_secs = ttl.as_secs(),
            "Fetched identity provider signing keys"
        );
        *cache = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
            ttl,
        });
        Ok(keys)
    }

    async fn fetch_keys(&self) -> Result<(JwkSet, Duration), IdentityError> {
        let unavailable = |e: reqwest::Error| {
            tracing::warn!(provider = %self.provider, error = %e, "Signing key fetch failed");
            IdentityError::KeysUnavailable(e.to_string())
        };

        let response = self
            .http
            .get(&self.certs_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?;

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEYS_TTL);

        let keys = response.json::<JwkSet>().await.map_err(unavailable)?;
        Ok((keys, ttl))
    }

    /// Check signature, algorithm, issuer, audience, and expiry of `token`
    /// against `keys`, then extract the identity claims.
    fn validate(&self, token: &str, keys: &JwkSet) -> Result<VerifiedIdentity, IdentityError> {
        let header = decode_header(token).map_err(invalid)?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidCredential(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidCredential("token has no key id".to_string()))?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| IdentityError::InvalidCredential(format!("unknown key id '{kid}'")))?;
        let key = DecodingKey::from_jwk(jwk).map_err(invalid)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&self.issuers);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<IdTokenClaims>(token, &key, &validation)
            .map_err(invalid)?
            .claims;

        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| IdentityError::InvalidCredential("token has no email".to_string()))?;

        Ok(VerifiedIdentity {
            provider: self.provider,
            external_id: claims.sub,
            email,
            display_name: claims.name.unwrap_or_default(),
            avatar_url: claims.picture.filter(|p| !p.is_empty()),
        })
    }

    /// Key id named by the token header, if it can be read.
    fn token_kid(token: &str) -> Option<String> {
        decode_header(token).ok().and_then(|h| h.kid)
    }
}

impl IdentityVerifier for JwksIdentityVerifier {
    fn provider(&self) -> IdentityProviderKind {
        self.provider
    }

    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let mut keys = self.signing_keys(false).await?;

        // Providers rotate keys; an unknown kid earns one refresh.
        if let Some(kid) = Self::token_kid(token)
            && keys.find(&kid).is_none()
        {
            keys = self.signing_keys(true).await?;
        }

        self.validate(token, &keys)
    }
}

fn invalid(e: jsonwebtoken::errors::Error) -> IdentityError {
    let reason = match e.kind() {
        ErrorKind::ExpiredSignature => "token expired".to_string(),
        ErrorKind::InvalidAudience => "wrong audience".to_string(),
        ErrorKind::InvalidIssuer => "wrong issuer".to_string(),
        ErrorKind::InvalidSignature => "bad signature".to_string(),
        _ => e.to_string(),
    };
    IdentityError::InvalidCredential(reason)
}

/// `max-age` seconds from a Cache-Control header value.
fn parse_max_age(value: &str) -> Option<Duration> {
    value
        .split(',')
        .filter_map(|d| d.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
