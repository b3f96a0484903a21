//! Signed-request headers.
//!
//! The embedding application owns the identity every backend call must
//! prove. The client only asks a [`RequestSigner`] for extra headers and
//! attaches them; it never inspects them.

use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use reqwest::Method;
use sha2::Sha256;

/// Header carrying the caller's application id.
pub const HEADER_APP_ID: HeaderName = HeaderName::from_static("x-app-id");

/// Header carrying the signing time in epoch milliseconds.
pub const HEADER_TIMESTAMP: HeaderName = HeaderName::from_static("x-signature-timestamp");

/// Header carrying the hex-encoded HMAC-SHA256 signature.
pub const HEADER_SIGNATURE: HeaderName = HeaderName::from_static("x-signature");

/// Errors raised while producing signed-request headers.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Signing key rejected: {0}")]
    InvalidKey(String),

    #[error("Signed header value is not valid: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// The parts of an outbound request a signature covers.
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    pub method: &'a Method,
    /// Absolute URL path, e.g. `/start-migration`.
    pub path: &'a str,
    pub body: &'a [u8],
}

/// Produces the authentication headers for one outbound request.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: &SigningRequest<'_>) -> Result<HeaderMap, SignError>;
}

// ---------------------------------------------------------------------------
// UnsignedRequests
// ---------------------------------------------------------------------------

/// Signer for local development backends that do not check identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsignedRequests;

impl RequestSigner for UnsignedRequests {
    fn sign(&self, _request: &SigningRequest<'_>) -> Result<HeaderMap, SignError> {
        Ok(HeaderMap::new())
    }
}

// ---------------------------------------------------------------------------
// HmacSigner
// ---------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

/// Shared-secret signer.
///
/// Signs `METHOD\nPATH\nTIMESTAMP\nBODY` with HMAC-SHA256 and emits the
/// app id, timestamp, and signature as headers.
pub struct HmacSigner {
    app_id: String,
    secret: String,
}

impl HmacSigner {
    pub fn new(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            secret: secret.into(),
        }
    }

    /// Sign as of `timestamp_ms`. [`RequestSigner::sign`] uses the current time.
    pub fn sign_at(
        &self,
        request: &SigningRequest<'_>,
        timestamp_ms: i64,
    ) -> Result<HeaderMap, SignError> {
        let signature = self.signature(request, timestamp_ms)?;

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_APP_ID, HeaderValue::from_str(&self.app_id)?);
        headers.insert(HEADER_TIMESTAMP, HeaderValue::from(timestamp_ms));
        headers.insert(HEADER_SIGNATURE, HeaderValue::from_str(&signature)?);
        Ok(headers)
    }

    fn signature(&self, request: &SigningRequest<'_>, timestamp_ms: i64) -> Result<String, SignError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| SignError::InvalidKey(e.to_string()))?;
        mac.update(request.method.as_str().as_bytes());
        mac.update(b"\n");
        mac.update(request.path.as_bytes());
        mac.update(b"\n");
        mac.update(timestamp_ms.to_string().as_bytes());
        mac.update(b"\n");
        mac.update(request.body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl RequestSigner for HmacSigner {
    fn sign(&self, request: &SigningRequest<'_>) -> Result<HeaderMap, SignError> {
        self.sign_at(request, chrono::Utc::now().timestamp_millis())
    }
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn start_request() -> SigningRequest<'static> {
        SigningRequest {
            method: &Method::POST,
            path: "/start-migration",
            body: b"",
        }
    }

    #[test]
    fn unsigned_emits_no_headers() {
        let headers = UnsignedRequests.sign(&start_request()).unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn hmac_emits_identity_headers() {
        let signer = HmacSigner::new("space-admin", "s3cret");
        let headers = signer.sign_at(&start_request(), 1_000).unwrap();

        assert_eq!(headers[&HEADER_APP_ID], "space-admin");
        assert_eq!(headers[&HEADER_TIMESTAMP], "1000");
        let sig = headers[&HEADER_SIGNATURE].to_str().unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn signature_is_deterministic_for_same_input() {
        let signer = HmacSigner::new("app", "key");
        let a = signer.sign_at(&start_request(), 42).unwrap();
        let b = signer.sign_at(&start_request(), 42).unwrap();
        assert_eq!(a[&HEADER_SIGNATURE], b[&HEADER_SIGNATURE]);
    }

    #[test]
    fn signature_covers_path_timestamp_and_secret() {
        let signer = HmacSigner::new("app", "key");
        let base = signer.sign_at(&start_request(), 42).unwrap();

        let other_path = SigningRequest {
            method: &Method::GET,
            path: "/migration-status/m1",
            body: b"",
        };
        let by_path = signer.sign_at(&other_path, 42).unwrap();
        let by_time = signer.sign_at(&start_request(), 43).unwrap();
        let by_secret = HmacSigner::new("app", "other")
            .sign_at(&start_request(), 42)
            .unwrap();

        assert_ne!(base[&HEADER_SIGNATURE], by_path[&HEADER_SIGNATURE]);
        assert_ne!(base[&HEADER_SIGNATURE], by_time[&HEADER_SIGNATURE]);
        assert_ne!(base[&HEADER_SIGNATURE], by_secret[&HEADER_SIGNATURE]);
    }

    #[test]
    fn app_id_with_newline_is_rejected() {
        let signer = HmacSigner::new("bad\nid", "key");
        assert!(matches!(
            signer.sign_at(&start_request(), 1),
            Err(SignError::InvalidHeader(_))
        ));
    }

    #[test]
    fn hex_encoding() {
        assert_eq!(hex::encode([0x00, 0xab, 0x10]), "00ab10");
    }
}
