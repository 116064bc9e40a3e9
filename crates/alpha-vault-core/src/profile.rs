use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::UserId;

/// Cached user profile, as returned by the backend on login
///
/// The shape is up to the backend and is kept as raw JSON. Only the id is
/// interpreted, and only when it is there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Value);

impl Profile {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    /// The user id in the profile, if any
    ///
    /// Accepts `id` or `userId`, as a number or a decimal string.
    pub fn user_id(&self) -> Option<UserId> {
        ["id", "userId"]
            .into_iter()
            .filter_map(|key| self.0.get(key))
            .find_map(|v| match v {
                Value::Number(n) => n.as_u64().map(UserId::new),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
    }
}

impl From<Value> for Profile {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
