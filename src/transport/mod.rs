//! Boundary to the external game service.
//!
//! Everything the console knows about a game comes through [`SessionTransport`]. The HTTP
//! implementation lives in [`http`]; tests swap in an in-memory fake.

pub mod http;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::state::game::{Card, GameListing, GameSession, Owner};

pub use self::models::{AdvanceOutcome, CreateSessionParams, PurchaseParams, SessionSettings};

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Normalised failure raised by any transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The operator's credentials were refused.
    #[error("Unauthorized")]
    Unauthorized,
    /// The service refused the request; the message is surfaced verbatim.
    #[error("{message}")]
    Rejected {
        /// HTTP status when the refusal came with a non-2xx response.
        status: Option<u16>,
        /// Message reported by the service.
        message: String,
    },
    /// The requested game does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The service could not be reached or answered with something unreadable.
    #[error("game service unavailable: {message}")]
    Unavailable {
        /// Context describing the failed call.
        message: String,
        /// Underlying client error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl TransportError {
    /// Construct an unavailable error from any client failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        TransportError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a rejection carrying the service's own message.
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        TransportError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Abstract operations offered by the game service.
///
/// Futures are `'static` so callers can hold them across lock-free await points without
/// borrowing the transport.
pub trait SessionTransport: Send + Sync {
    /// List the games known to the service, newest first.
    fn list_games(&self) -> BoxFuture<'static, TransportResult<Vec<GameListing>>>;
    /// Fetch the authoritative snapshot of one game.
    fn fetch_session(&self, game_id: &str) -> BoxFuture<'static, TransportResult<GameSession>>;
    /// Create a new game and return its initial snapshot.
    fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> BoxFuture<'static, TransportResult<GameSession>>;
    /// Begin the draw.
    fn start(&self, game_id: &str) -> BoxFuture<'static, TransportResult<()>>;
    /// Draw the next number and return the full called sequence.
    fn roll(&self, game_id: &str) -> BoxFuture<'static, TransportResult<Vec<u32>>>;
    /// Move to the next win-pattern tier, or end the game after the last one.
    fn advance_stage(&self, game_id: &str) -> BoxFuture<'static, TransportResult<AdvanceOutcome>>;
    /// Explicitly mark one cell of a card.
    fn mark(
        &self,
        game_id: &str,
        card_id: &str,
        row: usize,
        col: usize,
    ) -> BoxFuture<'static, TransportResult<()>>;
    /// Purchase cards for an owner.
    fn buy(
        &self,
        game_id: &str,
        params: PurchaseParams,
    ) -> BoxFuture<'static, TransportResult<Vec<Card>>>;
    /// Add funds to the pot.
    fn seed(&self, game_id: &str, amount: i64) -> BoxFuture<'static, TransportResult<()>>;
    /// Approve the pending claim on a card.
    fn approve_claim(&self, game_id: &str, card_id: &str)
    -> BoxFuture<'static, TransportResult<()>>;
    /// Deny the pending claim on a card.
    fn deny_claim(&self, game_id: &str, card_id: &str) -> BoxFuture<'static, TransportResult<()>>;
    /// Close the game; closed games are terminal.
    fn close(&self, game_id: &str) -> BoxFuture<'static, TransportResult<()>>;
    /// Update mutable game settings.
    fn update_settings(
        &self,
        game_id: &str,
        settings: SessionSettings,
    ) -> BoxFuture<'static, TransportResult<()>>;
    /// Fetch the owner roster of a game in service order.
    fn owners(&self, game_id: &str) -> BoxFuture<'static, TransportResult<Vec<Owner>>>;
    /// Fetch the share-link token of an owner.
    fn owner_token(
        &self,
        game_id: &str,
        owner_name: &str,
    ) -> BoxFuture<'static, TransportResult<String>>;
    /// Fetch the cards held by an owner.
    fn owner_cards(
        &self,
        game_id: &str,
        owner_name: &str,
    ) -> BoxFuture<'static, TransportResult<Vec<Card>>>;
    /// Link an owner to an external user id.
    fn link_owner(
        &self,
        game_id: &str,
        owner_name: &str,
        user_id: u64,
    ) -> BoxFuture<'static, TransportResult<()>>;
}
