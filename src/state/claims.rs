use dashmap::DashSet;

/// Claims currently being resolved, keyed by `(game_id, card_id)`.
#[derive(Default)]
pub struct ClaimLocks {
    in_flight: DashSet<(String, String)>,
}

impl ClaimLocks {
    /// Create an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a claim for resolution; `None` when it is already in flight.
    pub fn acquire(&self, game_id: &str, card_id: &str) -> Option<ClaimGuard<'_>> {
        let key = (game_id.to_owned(), card_id.to_owned());
        self.in_flight.insert(key.clone()).then(|| ClaimGuard {
            locks: self,
            key,
        })
    }

    /// Whether a claim is currently being resolved.
    pub fn is_in_flight(&self, game_id: &str, card_id: &str) -> bool {
        self.in_flight
            .contains(&(game_id.to_owned(), card_id.to_owned()))
    }
}

/// Releases the claim when dropped.
pub struct ClaimGuard<'a> {
    locks: &'a ClaimLocks,
    key: (String, String),
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.locks.in_flight.remove(&self.key);
    }
}
