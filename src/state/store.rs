//! Single source of truth for the currently viewed game.
//!
//! Every write replaces the snapshot wholesale. The store also owns the short call/action
//! history shown next to the board and detects changes of the most recent call.

use std::{collections::VecDeque, time::SystemTime};

use tokio::sync::RwLock;
use tracing::debug;

use crate::state::game::GameSession;

/// One line of the call/action history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// When the entry was recorded.
    pub at: SystemTime,
    /// Human-readable text, e.g. `Called 42`.
    pub message: String,
}

/// Observable side effects of applying a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreUpdate {
    /// The applied game differs from the previous one; history was cleared.
    pub reset: bool,
    /// The most recent call changed to this number.
    pub called: Option<u32>,
}

/// Read-only copy of the store used to build views.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Game currently selected by the operator.
    pub selected: Option<String>,
    /// Last applied session of the selected game.
    pub session: Option<GameSession>,
    /// Newest-first history.
    pub history: Vec<HistoryEntry>,
    /// Text of the latest operator action or call.
    pub last_action: Option<String>,
}

#[derive(Debug, Default)]
struct StoreInner {
    selected: Option<String>,
    session: Option<GameSession>,
    applied_game_id: Option<String>,
    last_called: Option<u32>,
    history: VecDeque<HistoryEntry>,
    last_action: Option<String>,
    resets: u64,
}

impl StoreInner {
    fn push_history(&mut self, message: String, capacity: usize) {
        self.history.push_front(HistoryEntry {
            at: SystemTime::now(),
            message: message.clone(),
        });
        self.history.truncate(capacity);
        self.last_action = Some(message);
    }

    fn reset_to(&mut self, game_id: Option<String>) {
        self.history.clear();
        self.last_action = None;
        self.last_called = None;
        self.applied_game_id = game_id;
        self.resets += 1;
    }

    fn apply(&mut self, session: GameSession, capacity: usize) -> StoreUpdate {
        let mut update = StoreUpdate::default();
        let incoming = Some(session.game_id.clone()).filter(|id| !id.is_empty());

        if incoming != self.applied_game_id {
            self.reset_to(incoming.clone());
            update.reset = true;
        }

        self.selected = incoming;
        if self.selected.is_none() {
            self.session = None;
            return update;
        }

        let latest = session.latest_call();
        if latest.is_some() && latest != self.last_called {
            self.last_called = latest;
            update.called = latest;
            if let Some(number) = latest {
                self.push_history(format!("Called {number}"), capacity);
            }
        }

        self.session = Some(session);
        update
    }
}

/// Store for the selected game's snapshot and its history.
pub struct GameStateStore {
    inner: RwLock<StoreInner>,
    history_capacity: usize,
}

impl GameStateStore {
    /// Create an empty store keeping at most `history_capacity` history entries.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Replace the snapshot wholesale and make its game the current selection.
    ///
    /// An empty `game_id` clears both the snapshot and the selection.
    pub async fn set_session(&self, session: GameSession) -> StoreUpdate {
        let mut inner = self.inner.write().await;
        inner.apply(session, self.history_capacity)
    }

    /// Apply a refresh result only when it belongs to the current selection.
    ///
    /// Responses tagged with a game the operator has since switched away from return `None`.
    pub async fn apply_refresh(&self, tag: &str, session: GameSession) -> Option<StoreUpdate> {
        let mut inner = self.inner.write().await;
        if inner.selected.as_deref() != Some(tag) || session.game_id != tag {
            debug!(
                tag = %tag,
                selected = ?inner.selected,
                "discarding refresh for a game that is no longer selected"
            );
            return None;
        }
        Some(inner.apply(session, self.history_capacity))
    }

    /// Change the viewed game without a snapshot.
    ///
    /// A change drops the snapshot together with the history, the last action and the last
    /// observed call, so the first snapshot of the new game applies without a second reset.
    pub async fn select(&self, game_id: Option<String>) -> StoreUpdate {
        let game_id = game_id.filter(|id| !id.is_empty());
        let mut inner = self.inner.write().await;
        if inner.selected == game_id {
            return StoreUpdate::default();
        }

        let mut update = StoreUpdate::default();
        if inner.applied_game_id != game_id {
            inner.reset_to(game_id.clone());
            update.reset = true;
        }
        inner.selected = game_id;
        inner.session = None;
        update
    }

    /// Push an operator action into the history.
    pub async fn record_action(&self, message: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.push_history(message.into(), self.history_capacity);
    }

    /// Currently selected game.
    pub async fn selected(&self) -> Option<String> {
        self.inner.read().await.selected.clone()
    }

    /// Last applied snapshot.
    pub async fn session(&self) -> Option<GameSession> {
        self.inner.read().await.session.clone()
    }

    /// Run `f` against the current snapshot without cloning it.
    pub async fn read_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&GameSession>) -> R,
    {
        let inner = self.inner.read().await;
        f(inner.session.as_ref())
    }

    /// Newest-first history.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.inner.read().await.history.iter().cloned().collect()
    }

    /// Number of game switches observed so far.
    pub async fn resets(&self) -> u64 {
        self.inner.read().await.resets
    }

    /// Copy everything a view needs under a single lock.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read().await;
        StoreSnapshot {
            selected: inner.selected.clone(),
            session: inner.session.clone(),
            history: inner.history.iter().cloned().collect(),
            last_action: inner.last_action.clone(),
        }
    }

    /// Return the store to its constructed state.
    pub async fn dispose(&self) {
        let mut inner = self.inner.write().await;
        *inner = StoreInner::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::fixtures::session;

    fn with_calls(game_id: &str, called: &[u32]) -> GameSession {
        let mut game = session(game_id);
        game.started = true;
        game.called = called.to_vec();
        game
    }

    #[tokio::test]
    async fn switching_games_resets_once() {
        let store = GameStateStore::new(5);

        assert!(store.set_session(with_calls("g1", &[3])).await.reset);
        store.record_action("Game started").await;
        assert_eq!(store.resets().await, 1);

        for _ in 0..3 {
            assert!(!store.set_session(with_calls("g1", &[3])).await.reset);
        }
        assert_eq!(store.history().await.len(), 2);

        let update = store.set_session(with_calls("g2", &[])).await;
        assert!(update.reset);
        assert_eq!(store.resets().await, 2);
        assert!(store.history().await.is_empty());

        store.set_session(with_calls("g2", &[])).await;
        assert_eq!(store.resets().await, 2);
    }

    #[tokio::test]
    async fn last_called_fires_only_on_change() {
        let store = GameStateStore::new(5);

        assert_eq!(store.set_session(with_calls("g1", &[])).await.called, None);
        assert_eq!(store.set_session(with_calls("g1", &[7])).await.called, Some(7));
        assert_eq!(store.set_session(with_calls("g1", &[7])).await.called, None);
        assert_eq!(
            store.set_session(with_calls("g1", &[7, 12])).await.called,
            Some(12)
        );

        let history = store.history().await;
        let messages: Vec<_> = history.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Called 12", "Called 7"]);
    }

    #[tokio::test]
    async fn history_is_bounded_newest_first() {
        let store = GameStateStore::new(5);
        for n in 1..=7 {
            let called: Vec<u32> = (1..=n).collect();
            store.set_session(with_calls("g1", &called)).await;
        }

        let history = store.history().await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].message, "Called 7");
        assert_eq!(history[4].message, "Called 3");
    }

    #[tokio::test]
    async fn empty_game_id_clears_selection() {
        let store = GameStateStore::new(5);
        store.set_session(session("g1")).await;
        store.set_session(session("")).await;

        assert_eq!(store.selected().await, None);
        assert!(store.session().await.is_none());
    }

    #[tokio::test]
    async fn stale_refresh_is_discarded() {
        let store = GameStateStore::new(5);
        store.select(Some("g1".into())).await;
        store.select(Some("g2".into())).await;

        assert!(store.apply_refresh("g1", session("g1")).await.is_none());
        assert!(store.session().await.is_none());

        assert!(store.apply_refresh("g2", session("g2")).await.is_some());
        assert_eq!(
            store.session().await.map(|s| s.game_id),
            Some("g2".to_string())
        );
    }

    #[tokio::test]
    async fn selecting_another_game_clears_history_at_once() {
        let store = GameStateStore::new(5);
        store.select(Some("g1".into())).await;
        store.apply_refresh("g1", with_calls("g1", &[42])).await;
        store.record_action("Game started.").await;
        assert_eq!(store.resets().await, 1);

        assert!(store.select(Some("g2".into())).await.reset);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.selected.as_deref(), Some("g2"));
        assert!(snapshot.history.is_empty());
        assert!(snapshot.last_action.is_none());
        assert_eq!(store.resets().await, 2);

        let update = store.apply_refresh("g2", with_calls("g2", &[42])).await;
        assert_eq!(
            update,
            Some(StoreUpdate {
                reset: false,
                called: Some(42),
            })
        );
        assert_eq!(store.resets().await, 2);
    }

    #[tokio::test]
    async fn reselecting_the_same_game_keeps_history() {
        let store = GameStateStore::new(5);
        store.select(Some("g1".into())).await;
        store.apply_refresh("g1", with_calls("g1", &[7])).await;

        assert!(!store.select(Some("g1".into())).await.reset);
        assert_eq!(store.history().await.len(), 1);
    }

    #[tokio::test]
    async fn dispose_returns_to_initial_state() {
        let store = GameStateStore::new(5);
        store.set_session(with_calls("g1", &[1])).await;
        store.dispose().await;

        let snapshot = store.snapshot().await;
        assert!(snapshot.selected.is_none());
        assert!(snapshot.history.is_empty());
        assert_eq!(store.resets().await, 0);
    }
}
