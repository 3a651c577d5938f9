use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{card::CardView, phase::VisibleClaimStatus},
    state::game::{Owner, OwnerClaimStatus},
};

/// One row of the owner roster.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnerSummary {
    pub owner_name: String,
    pub cards: u32,
    pub last_purchase: Option<f64>,
    pub xiv_username: Option<String>,
    pub xiv_world: Option<String>,
    /// Aggregate claim status: pending, then approved, then denied.
    pub claim_status: VisibleClaimStatus,
}

impl OwnerSummary {
    /// Combine a roster entry with its claim status.
    pub fn new(owner: Owner, claim_status: OwnerClaimStatus) -> Self {
        let (xiv_username, xiv_world) = match owner.xiv {
            Some(link) => (Some(link.username), link.world),
            None => (None, None),
        };
        Self {
            owner_name: owner.owner_name,
            cards: owner.cards,
            last_purchase: owner.last_purchase,
            xiv_username,
            xiv_world,
            claim_status: claim_status.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnerTokenResponse {
    pub owner_name: String,
    pub token: String,
    /// Link the owner opens to follow their cards.
    pub share_link: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnerCardsResponse {
    pub owner_name: String,
    pub claim_status: VisibleClaimStatus,
    pub cards: Vec<CardView>,
}

/// Link an owner to an external user.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LinkOwnerRequest {
    #[validate(range(min = 1, message = "User id must be a positive number."))]
    pub user_id: u64,
}
