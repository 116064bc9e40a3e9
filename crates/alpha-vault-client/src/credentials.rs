//! Picking credentials out of login responses
//!
//! The backend has answered logins in a few shapes over time. The token may
//! sit at the top level or one level down under `data`, under either
//! `token` or `accessToken`. The user id and profile move around the same
//! way.

use alpha_vault_core::{Profile, Token, UserId};
use serde_json::Value;

#[derive(Debug, Default, PartialEq)]
pub(crate) struct LoginCredentials {
    pub token: Option<Token>,
    pub user_id: Option<UserId>,
    pub profile: Option<Profile>,
}

static TOKEN_KEYS: [&str; 2] = ["token", "accessToken"];

pub(crate) fn extract(body: &Value) -> LoginCredentials {
    let data = body.get("data");
    let levels = || [Some(body), data].into_iter().flatten();

    let token = levels()
        .flat_map(|level| TOKEN_KEYS.iter().filter_map(move |k| level.get(*k)))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        .map(Token::from);

    let profile = levels()
        .filter_map(|level| level.get("user"))
        .find(|v| v.is_object())
        .cloned()
        .map(Profile::new);

    let user_id = levels()
        .filter_map(|level| level.get("userId"))
        .find_map(as_user_id)
        .or_else(|| profile.as_ref().and_then(Profile::user_id))
        .or_else(|| levels().filter_map(|level| level.get("id")).find_map(as_user_id));

    LoginCredentials {
        token,
        user_id,
        profile,
    }
}

fn as_user_id(v: &Value) -> Option<UserId> {
    match v {
        Value::Number(n) => n.as_u64().map(UserId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
