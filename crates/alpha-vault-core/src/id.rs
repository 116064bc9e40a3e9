use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Numeric id of a user, as assigned by the backend
///
/// Absence of an identity is always `Option<UserId>::None`, never a
/// magic value. [`UserId::SENTINEL_RAW`] is only how "no identity" is
/// rendered where a plain integer is expected (legacy wire/CLI output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const SENTINEL_RAW: u64 = 0;

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Render an optional identity the way the identity stream is written on
    /// the wire: the id, or `0`
    pub fn raw_or_sentinel(id: Option<Self>) -> u64 {
        id.map_or(Self::SENTINEL_RAW, Self::raw)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<UserId> for u64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("Not a decimal user id: {value:?}"))]
pub struct UserIdParseError {
    pub value: String,
}

impl FromStr for UserId {
    type Err = UserIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self).map_err(|_| UserIdParseError {
            value: s.to_owned(),
        })
    }
}
