//! Webhook signature verification.
//!
//! The platform signs every webhook body with HMAC-SHA256 keyed by the
//! channel secret and sends the base64 digest in `X-Line-Signature`.
//!
//! Verification is a one-way transition encoded in types: an
//! [`InboundRequest`] goes through [`SignatureVerifier::verify`] and either
//! becomes a [`VerifiedPayload`] or is rejected. `VerifiedPayload` has no
//! public constructor, so nothing downstream can parse an unverified body.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use wordline_core::{WebhookEnvelope, WordlineError};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature. Header lookup is case-insensitive.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Reasons a request fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Signature header absent or empty.
    #[error("signature header missing")]
    MissingSignature,
    /// Request body empty.
    #[error("request body missing")]
    MissingBody,
    /// Signature header is not base64.
    #[error("signature is not valid base64")]
    InvalidEncoding,
    /// Digest does not match the body.
    #[error("signature mismatch")]
    Mismatch,
    /// Verifier was built with an empty channel secret.
    #[error("channel secret is empty")]
    EmptySecret,
    /// Channel secret was rejected as an HMAC key.
    #[error("invalid channel secret")]
    InvalidSecret,
}

impl From<VerificationError> for WordlineError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::MissingSignature | VerificationError::MissingBody => {
                Self::malformed_request(err.to_string())
            },
            VerificationError::InvalidEncoding | VerificationError::Mismatch => {
                Self::InvalidSignature
            },
            VerificationError::EmptySecret | VerificationError::InvalidSecret => {
                Self::Internal(anyhow::Error::new(err))
            },
        }
    }
}

/// Raw webhook request as received, before verification.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    signature: String,
    body: Bytes,
}

impl InboundRequest {
    /// Frames a request from the signature header and raw body.
    ///
    /// # Errors
    ///
    /// Returns `MissingSignature` or `MissingBody` when either part is empty.
    /// The signature is checked first, so a request missing both reports the
    /// signature.
    pub fn new(signature: Option<&str>, body: Bytes) -> Result<Self, VerificationError> {
        let signature = signature.map(str::trim).filter(|s| !s.is_empty());
        let Some(signature) = signature else {
            return Err(VerificationError::MissingSignature);
        };
        if body.is_empty() {
            return Err(VerificationError::MissingBody);
        }

        Ok(Self { signature: signature.to_string(), body })
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Body whose signature matched the channel secret.
#[derive(Debug, Clone)]
pub struct VerifiedPayload {
    body: Bytes,
}

impl VerifiedPayload {
    /// Verified raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the verified body into a webhook envelope.
    ///
    /// # Errors
    ///
    /// Returns `WordlineError::MalformedPayload` when the body is not a JSON
    /// object with an `events` array.
    pub fn parse(&self) -> Result<WebhookEnvelope, WordlineError> {
        WebhookEnvelope::from_slice(&self.body)
            .map_err(|e| WordlineError::MalformedPayload { reason: e.to_string() })
    }
}

/// HMAC-SHA256 verifier bound to one channel secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    keyed: HmacSha256,
}

impl SignatureVerifier {
    /// Creates a verifier for the channel secret.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::EmptySecret` for an empty secret.
    pub fn new(channel_secret: &str) -> Result<Self, VerificationError> {
        if channel_secret.is_empty() {
            return Err(VerificationError::EmptySecret);
        }
        let keyed = HmacSha256::new_from_slice(channel_secret.as_bytes())
            .map_err(|_| VerificationError::InvalidSecret)?;
        Ok(Self { keyed })
    }

    /// Computes the base64 signature the platform would send for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        STANDARD.encode(self.mac(body).finalize().into_bytes())
    }

    /// Checks the request signature in constant time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEncoding` when the header is not base64 and
    /// `Mismatch` when the digest does not match the body.
    pub fn verify(&self, request: InboundRequest) -> Result<VerifiedPayload, VerificationError> {
        let provided = STANDARD
            .decode(request.signature.as_bytes())
            .map_err(|_| VerificationError::InvalidEncoding)?;

        self.mac(&request.body)
            .verify_slice(&provided)
            .map_err(|_| VerificationError::Mismatch)?;

        Ok(VerifiedPayload { body: request.body })
    }

    fn mac(&self, body: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(body);
        mac
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier").field("secret", &"[REDACTED]").finish()
    }
}
