use std::fmt;
use std::str::FromStr;

use snafu::Snafu;

/// How the current session was established
///
/// The backend historically supported both bearer tokens and cookie
/// sessions, and the stored flag tells the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMode {
    /// Bearer token (optionally a JWT) paired with a numeric user id
    Token,
    /// Cookie session, with a cached profile standing in for the token
    Session,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Token => "token",
            AuthMode::Session => "session",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("Unknown auth mode: {value:?}"))]
pub struct AuthModeParseError {
    pub value: String,
}

impl FromStr for AuthMode {
    type Err = AuthModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(AuthMode::Token),
            "session" => Ok(AuthMode::Session),
            _ => Err(AuthModeParseError {
                value: s.to_owned(),
            }),
        }
    }
}
