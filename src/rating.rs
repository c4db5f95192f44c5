use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type ItemId = i64;

/// Single explicit rating of an item by a user.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
}

impl Rating {
    #[must_use]
    pub const fn new(user_id: UserId, item_id: ItemId, value: f64) -> Self {
        Self {
            user_id,
            item_id,
            value,
        }
    }

    /// Only positive ratings take part in the factorization.
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.value > 0.0
    }
}
