//! Finance records the backend stores per user
//!
//! All of them travel as camelCase JSON. `id` is assigned by the backend and
//! `user_id` is stamped by the client right before sending.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// A record that belongs to a single user
pub trait OwnedRecord {
    fn user_id(&self) -> Option<UserId>;
    fn set_user_id(&mut self, user_id: UserId);
}

macro_rules! impl_owned_record {
    ($($t:ty),* $(,)?) => {
        $(
            impl OwnedRecord for $t {
                fn user_id(&self) -> Option<UserId> {
                    self.user_id
                }

                fn set_user_id(&mut self, user_id: UserId) {
                    self.user_id = Some(user_id);
                }
            }
        )*
    };
}

impl_owned_record!(Income, Expense, Debt, Investment, SavingsGoal, Budget);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub source: String,
    pub amount: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub category: String,
    pub amount: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub creditor: String,
    pub principal: f64,
    /// Annual rate, in percent
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub name: String,
    /// Free-form asset class (`stock`, `bond`, `crypto`, ...)
    pub kind: String,
    pub amount_invested: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub saved_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl SavingsGoal {
    /// Fraction of the target saved so far, clamped to `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 1.0;
        }
        (self.saved_amount / self.target_amount).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub category: String,
    pub limit: f64,
    /// `monthly`, `weekly`, ...
    pub period: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stamping_sets_user_id_in_json() {
        let mut expense = Expense {
            category: "food".into(),
            amount: 12.5,
            date: "2026-10-01".into(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&expense).unwrap(),
            json!({ "category": "food", "amount": 12.5, "date": "2026-10-01" })
        );

        expense.set_user_id(UserId::new(9));
        assert_eq!(serde_json::to_value(&expense).unwrap()["userId"], json!(9));
    }

    #[test]
    fn savings_progress_is_clamped() {
        let mut goal = SavingsGoal {
            name: "car".into(),
            target_amount: 1000.0,
            saved_amount: 250.0,
            ..Default::default()
        };
        assert_eq!(goal.progress(), 0.25);
        goal.saved_amount = 5000.0;
        assert_eq!(goal.progress(), 1.0);
        goal.target_amount = 0.0;
        assert_eq!(goal.progress(), 1.0);
    }
}
