//! Session tokens and their expiry rules
//!
//! A [`Token`] is an opaque bearer credential. When it is shaped like a JWT
//! (`header.payload.signature`), the payload's `exp` claim decides whether it
//! is still usable. The signature is never verified here, that is the
//! backend's job. The client only needs to know when to stop sending it.


use std::fmt;

use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, Snafu};

use crate::Timestamp;

/// A token counts as expired this long before its literal `exp`
///
/// Covers clock skew and requests still in flight when it runs out.
pub const EXPIRY_SAFETY_MARGIN_SECS: u64 = 5 * 60;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TokenError {
    #[snafu(display("Expected 3 dot-separated segments, got {count}"))]
    SegmentCount { count: usize },
    #[snafu(display("Payload is not valid base64"))]
    Base64 { source: data_encoding::DecodeError },
    #[snafu(display("Payload is not a valid claims object"))]
    Json { source: serde_json::Error },
}

pub type TokenResult<T> = std::result::Result<T, TokenError>;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the JWT payload
    pub fn claims(&self) -> TokenResult<TokenClaims> {
        let segments: Vec<&str> = self.0.split('.').collect();
        if segments.len() != 3 {
            return SegmentCountSnafu {
                count: segments.len(),
            }
            .fail();
        }

        let payload = decode_base64_lenient(segments[1]).context(Base64Snafu)?;
        serde_json::from_slice(&payload).context(JsonSnafu)
    }

    pub fn expiry_at(&self, now: Timestamp) -> TokenResult<Expiry> {
        Ok(self.claims()?.expiry_at(now))
    }

    /// Whether the token should no longer be used
    ///
    /// Tokens that can't be decoded are treated as expired.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        !matches!(
            self.expiry_at(now),
            Ok(Expiry::Never | Expiry::ValidUntil(_))
        )
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Redacted, only shows the first few characters
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "Token({prefix}…)")
    }
}

/// The subset of JWT claims the client cares about
///
/// Unknown claims are ignored. A payload that is not a JSON object fails to
/// decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since epoch (may be fractional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>,
}

impl TokenClaims {
    pub fn expiry_at(&self, now: Timestamp) -> Expiry {
        let Some(exp) = self.exp else {
            return Expiry::Never;
        };

        let exp_ms = exp * 1000.0;
        let cutoff_ms = exp_ms - (EXPIRY_SAFETY_MARGIN_SECS * 1000) as f64;

        if cutoff_ms <= now.as_millis() as f64 {
            Expiry::Expired
        } else {
            Expiry::ValidUntil(Timestamp::from_millis(cutoff_ms as u64))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// No `exp` claim; legacy session tokens look like this
    Never,
    /// Usable until the given instant (safety margin already applied)
    ValidUntil(Timestamp),
    Expired,
}

/// Decode either base64 alphabet, padded or not
fn decode_base64_lenient(s: &str) -> Result<Vec<u8>, data_encoding::DecodeError> {
    let normalized: String = s
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    data_encoding::BASE64URL_NOPAD.decode(normalized.as_bytes())
}
