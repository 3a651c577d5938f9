pub mod claims;
mod events;
pub mod game;
pub mod lifecycle;
pub mod owners;
pub mod store;

use std::sync::Arc;

use tokio::{
    sync::{Mutex, RwLock, watch},
    task::JoinHandle,
};

use crate::{config::ConsoleConfig, transport::SessionTransport};

pub use self::events::EventHub;
use self::{claims::ClaimLocks, game::Card, owners::OwnerRegistry, store::GameStateStore};

pub type SharedState = Arc<AppState>;

const EVENT_CAPACITY: usize = 64;

/// Card currently loaded for inspection and marking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedCard {
    /// Game the card belongs to.
    pub game_id: String,
    /// Owner holding the card.
    pub owner_name: String,
    /// Local copy, optimistically updated by marks.
    pub card: Card,
}

/// Central console state: the transport, the store and everything derived from it.
pub struct AppState {
    config: ConsoleConfig,
    transport: Arc<dyn SessionTransport>,
    store: GameStateStore,
    owners: OwnerRegistry,
    inspected: RwLock<Option<InspectedCard>>,
    claim_locks: ClaimLocks,
    events: EventHub,
    panel_active: watch::Sender<bool>,
    degraded: watch::Sender<bool>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The console panel starts active so a headless daemon polls as soon as a game is selected.
    pub fn new(config: ConsoleConfig, transport: Arc<dyn SessionTransport>) -> SharedState {
        let (panel_tx, _rx) = watch::channel(true);
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            store: GameStateStore::new(config.history_capacity),
            config,
            transport,
            owners: OwnerRegistry::new(),
            inspected: RwLock::new(None),
            claim_locks: ClaimLocks::new(),
            events: EventHub::new(EVENT_CAPACITY),
            panel_active: panel_tx,
            degraded: degraded_tx,
            poller: Mutex::new(None),
        })
    }

    /// Immutable console configuration.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Handle to the game service.
    pub fn transport(&self) -> Arc<dyn SessionTransport> {
        self.transport.clone()
    }

    /// Snapshot store of the selected game.
    pub fn store(&self) -> &GameStateStore {
        &self.store
    }

    /// Owner roster and token cache.
    pub fn owners(&self) -> &OwnerRegistry {
        &self.owners
    }

    /// Card loaded for inspection.
    pub fn inspected(&self) -> &RwLock<Option<InspectedCard>> {
        &self.inspected
    }

    /// Claims currently being resolved.
    pub fn claim_locks(&self) -> &ClaimLocks {
        &self.claim_locks
    }

    /// Broadcast hub used for the console SSE stream.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Whether the console panel is visible.
    pub fn is_panel_active(&self) -> bool {
        *self.panel_active.borrow()
    }

    /// Record panel visibility, returning `true` when it changed.
    pub fn set_panel_active(&self, active: bool) -> bool {
        self.panel_active.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        })
    }

    /// Whether the last refresh failed.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, returning `true` when it changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        })
    }

    /// Slot holding the polling task.
    pub fn poller(&self) -> &Mutex<Option<JoinHandle<()>>> {
        &self.poller
    }
}
