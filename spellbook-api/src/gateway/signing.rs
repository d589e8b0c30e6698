//! Signed URLs
//!
//! URLs of the form `{public_url}/blobs/{key}?expires=<unix>&signature=<hex>`
//! grant time-limited access to one object for one HTTP method. The
//! signature is HMAC-SHA256 over `"METHOD\nkey\nexpires"`.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

use crate::gateway::object_store::{StoreError, validate_key};

type HmacSha256 = Hmac<Sha256>;

/// HTTP method a signed URL is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedMethod {
    Get,
    Put,
}

impl SignedMethod {
    fn as_str(self) -> &'static str {
        match self {
            SignedMethod::Get => "GET",
            SignedMethod::Put => "PUT",
        }
    }
}

/// Reasons a signed URL is refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signed URL has expired")]
    Expired,

    #[error("signature does not match")]
    Invalid,
}

/// Issues and verifies signed blob URLs
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
    public_url: String,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Creates a signer for URLs rooted at `public_url`
    pub fn new(secret: &[u8], public_url: &str) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: <HmacSha256 as Mac>::new_from_slice(secret)?,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Signs `key` for `method`, valid for `ttl` from now
    pub fn sign(&self, method: SignedMethod, key: &str, ttl: Duration) -> Result<String, StoreError> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = chrono::Utc::now().timestamp().saturating_add(ttl);
        self.sign_until(method, key, expires)
    }

    /// Signs `key` for `method`, valid until the unix timestamp `expires`
    pub fn sign_until(
        &self,
        method: SignedMethod,
        key: &str,
        expires: i64,
    ) -> Result<String, StoreError> {
        validate_key(key)?;
        let signature = hex::encode(self.keyed(method, key, expires).finalize().into_bytes());

        Ok(format!(
            "{}/blobs/{}?expires={}&signature={}",
            self.public_url, key, expires, signature
        ))
    }

    /// Verifies a signature against the current time
    pub fn verify(
        &self,
        method: SignedMethod,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> Result<(), SignatureError> {
        self.verify_at(method, key, expires, signature, chrono::Utc::now().timestamp())
    }

    /// Verifies a signature against the unix timestamp `now`
    pub fn verify_at(
        &self,
        method: SignedMethod,
        key: &str,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> Result<(), SignatureError> {
        let provided = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;

        self.keyed(method, key, expires)
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        if now > expires {
            return Err(SignatureError::Expired);
        }

        Ok(())
    }

    fn keyed(&self, method: SignedMethod, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(method.as_str().as_bytes());
        mac.update(b"\n");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }
}
