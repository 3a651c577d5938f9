//! Per-game owner roster plus a cache of share-link tokens.

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use crate::state::game::Owner;

#[derive(Debug, Default)]
struct Roster {
    game_id: Option<String>,
    owners: IndexMap<String, Owner>,
}

/// Owner roster of the selected game, replaced wholesale on every load.
#[derive(Default)]
pub struct OwnerRegistry {
    roster: RwLock<Roster>,
    tokens: DashMap<(String, String), Arc<OnceCell<String>>>,
}

impl OwnerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster for `game_id`, keeping the order the service returned.
    pub async fn replace(&self, game_id: &str, owners: Vec<Owner>) {
        let mut roster = self.roster.write().await;
        if roster.game_id.as_deref() != Some(game_id) {
            self.tokens.retain(|(game, _), _| game == game_id);
        }

        let mut by_name = IndexMap::with_capacity(owners.len());
        for owner in owners {
            if let Some(token) = owner.token.clone() {
                self.tokens.insert(
                    (game_id.to_owned(), owner.owner_name.clone()),
                    Arc::new(OnceCell::from(token)),
                );
            }
            if by_name.contains_key(&owner.owner_name) {
                debug!(game_id = %game_id, owner = %owner.owner_name, "duplicate owner in roster");
            }
            by_name.insert(owner.owner_name.clone(), owner);
        }

        roster.game_id = Some(game_id.to_owned());
        roster.owners = by_name;
    }

    /// Forget the roster and every cached token.
    pub async fn invalidate(&self) {
        let mut roster = self.roster.write().await;
        *roster = Roster::default();
        self.tokens.clear();
    }

    /// Game the roster belongs to.
    pub async fn game_id(&self) -> Option<String> {
        self.roster.read().await.game_id.clone()
    }

    /// Owners of `game_id`, or nothing when the roster belongs to another game.
    pub async fn owners(&self, game_id: &str) -> Vec<Owner> {
        let roster = self.roster.read().await;
        if roster.game_id.as_deref() != Some(game_id) {
            return Vec::new();
        }
        roster.owners.values().cloned().collect()
    }

    /// Look up one owner of `game_id`.
    pub async fn get(&self, game_id: &str, owner_name: &str) -> Option<Owner> {
        let roster = self.roster.read().await;
        if roster.game_id.as_deref() != Some(game_id) {
            return None;
        }
        roster.owners.get(owner_name).cloned()
    }

    /// Token previously seen for an owner, either on the roster or fetched.
    pub fn cached_token(&self, game_id: &str, owner_name: &str) -> Option<String> {
        self.tokens
            .get(&(game_id.to_owned(), owner_name.to_owned()))
            .and_then(|entry| entry.value().get().cloned())
    }

    /// Slot holding an owner's token; concurrent fetches for the same owner share it.
    pub fn token_slot(&self, game_id: &str, owner_name: &str) -> Arc<OnceCell<String>> {
        self.tokens
            .entry((game_id.to_owned(), owner_name.to_owned()))
            .or_default()
            .value()
            .clone()
    }
}
