//! Signed pagination cursors
//!
//! A cursor records the sort-key values of a boundary row plus the ordering
//! it was minted under. The token is `base64url(json || hmac_sha256(json))`,
//! so clients can carry it around but cannot forge or edit it. Nothing is
//! stored server-side.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::error::QueryError;
use super::types::{Scalar, SortDirection};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 tag length in bytes
const TAG_LEN: usize = 32;

/// Upper bound on accepted token length; longer input is rejected unparsed
const MAX_TOKEN_LEN: usize = 4096;

/// Which side of the boundary row the next page lies on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    /// Rows strictly after the boundary in display order (`nextCursor`)
    #[default]
    After,
    /// Rows strictly before the boundary in display order (`prevCursor`)
    Before,
}

/// Boundary row position as recorded in a cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub sort_field: String,
    pub sort_value: Scalar,
    /// Values of sort keys between the primary key and the tiebreaker
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<Scalar>,
    pub tiebreaker_value: Scalar,
    pub direction: SortDirection,
    #[serde(default)]
    pub navigation: Navigation,
    /// Canonical sort list the cursor was minted under, e.g. `price:asc,id:asc`
    pub order: String,
}

/// Signed cursor contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPayload {
    pub position: CursorPosition,
    /// Unix seconds
    pub issued_at: i64,
    /// Unix seconds; the cursor is rejected from this instant on
    pub expires_at: i64,
}

/// Encodes and verifies cursor tokens with a server-held secret
#[derive(Clone)]
pub struct CursorCodec {
    key: Vec<u8>,
    ttl_secs: u64,
}

impl fmt::Debug for CursorCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorCodec")
            .field("key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl CursorCodec {
    pub fn new(key: impl Into<Vec<u8>>, ttl_secs: u64) -> Self {
        Self {
            key: key.into(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Codec with a key derived for one endpoint
    ///
    /// Tokens minted by one scope fail verification in every other scope.
    pub fn scoped(&self, scope: &str) -> Self {
        Self {
            key: self.sign(scope.as_bytes()),
            ttl_secs: self.ttl_secs,
        }
    }

    /// Mint a token for the given position using the current time
    pub fn encode(&self, position: CursorPosition) -> Result<String, QueryError> {
        self.encode_at(position, chrono::Utc::now().timestamp())
    }

    /// Mint a token as if the current time were `now` (unix seconds)
    pub fn encode_at(&self, position: CursorPosition, now: i64) -> Result<String, QueryError> {
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        let payload = CursorPayload {
            position,
            issued_at: now,
            expires_at: now.saturating_add(ttl),
        };

        let mut bytes = serde_json::to_vec(&payload)?;
        let tag = self.sign(&bytes);
        bytes.extend_from_slice(&tag);
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Verify and decode a token using the current time
    pub fn decode(&self, token: &str) -> Result<CursorPayload, QueryError> {
        self.decode_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify and decode a token as if the current time were `now`
    ///
    /// Signature is checked before the payload is parsed. Any structural or
    /// signature failure is `InvalidCursor`; a valid but stale token is
    /// `CursorExpired`.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<CursorPayload, QueryError> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(QueryError::InvalidCursor);
        }
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| QueryError::InvalidCursor)?;
        if raw.len() <= TAG_LEN {
            return Err(QueryError::InvalidCursor);
        }

        let (body, tag) = raw.split_at(raw.len() - TAG_LEN);
        let expected = self.sign(body);
        if !bool::from(expected.as_slice().ct_eq(tag)) {
            return Err(QueryError::InvalidCursor);
        }

        let payload: CursorPayload =
            serde_json::from_slice(body).map_err(|_| QueryError::InvalidCursor)?;
        if payload.expires_at < payload.issued_at {
            return Err(QueryError::InvalidCursor);
        }
        if now >= payload.expires_at {
            return Err(QueryError::CursorExpired);
        }
        Ok(payload)
    }

    fn sign(&self, bytes: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(bytes);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> CursorCodec {
        CursorCodec::new(vec![7u8; 32], 3600)
    }

    fn position() -> CursorPosition {
        CursorPosition {
            sort_field: "price".into(),
            sort_value: Scalar::Number(9.0),
            keys: vec![],
            tiebreaker_value: Scalar::Integer(3),
            direction: SortDirection::Asc,
            navigation: Navigation::After,
            order: "price:asc,id:asc".into(),
        }
    }

    #[test]
    fn round_trip() {
        let token = codec().encode_at(position(), NOW).unwrap();
        let payload = codec().decode_at(&token, NOW + 10).unwrap();
        assert_eq!(payload.position, position());
        assert_eq!(payload.issued_at, NOW);
        assert_eq!(payload.expires_at, NOW + 3600);
    }

    #[test]
    fn scoped_codecs_reject_each_other() {
        let products = codec().scoped("products");
        let posts = codec().scoped("posts");
        let token = products.encode_at(position(), NOW).unwrap();
        assert!(products.decode_at(&token, NOW).is_ok());
        assert!(matches!(
            posts.decode_at(&token, NOW),
            Err(QueryError::InvalidCursor)
        ));
        assert!(matches!(
            codec().decode_at(&token, NOW),
            Err(QueryError::InvalidCursor)
        ));
    }

    #[test]
    fn token_is_url_safe() {
        let token = codec().encode_at(position(), NOW).unwrap();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn any_single_byte_change_is_rejected() {
        let token = codec().encode_at(position(), NOW).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(&token).unwrap();
        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let tampered = URL_SAFE_NO_PAD.encode(&tampered);
            let err = codec().decode_at(&tampered, NOW).unwrap_err();
            assert!(matches!(err, QueryError::InvalidCursor), "byte {}", i);
        }
    }

    #[test]
    fn forged_payload_with_wrong_key_is_rejected() {
        let other = CursorCodec::new(vec![8u8; 32], 3600);
        let token = other.encode_at(position(), NOW).unwrap();
        assert!(matches!(
            codec().decode_at(&token, NOW),
            Err(QueryError::InvalidCursor)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        for token in ["", "!!!", "abc", &"A".repeat(MAX_TOKEN_LEN + 1)] {
            assert!(matches!(
                codec().decode_at(token, NOW),
                Err(QueryError::InvalidCursor)
            ));
        }
    }

    #[test]
    fn expiry_boundary() {
        let token = codec().encode_at(position(), NOW).unwrap();
        assert!(codec().decode_at(&token, NOW + 3599).is_ok());
        assert!(matches!(
            codec().decode_at(&token, NOW + 3600),
            Err(QueryError::CursorExpired)
        ));
    }

    #[test]
    fn zero_ttl_is_immediately_expired() {
        let codec = CursorCodec::new(vec![7u8; 32], 0);
        let token = codec.encode_at(position(), NOW).unwrap();
        assert!(matches!(
            codec.decode_at(&token, NOW),
            Err(QueryError::CursorExpired)
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", codec());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("7, 7"));
    }
}
