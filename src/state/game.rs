//! Local mirror of the game service's session model.
//!
//! Everything here is owned by a [`GameSession`] snapshot: cards and claims have no identity
//! outside the session they were fetched with.

/// Stage reported for sessions whose payload omits one.
pub const DEFAULT_STAGE: &str = "single";
/// Header shown when the service does not provide one.
const DEFAULT_HEADER: &str = "BING";
/// Call-out headers are always exactly this many characters.
const HEADER_LEN: usize = 4;
/// Ratio of called cells from which a card is flagged as close to winning.
const NEAR_WIN_RATIO: f64 = 0.75;

/// Authoritative snapshot of one live game, replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    /// Opaque identifier; empty means no session is selected.
    pub game_id: String,
    /// Display title of the game.
    pub title: String,
    /// Normalised 4-character call-out header.
    pub header_text: String,
    /// Current win-pattern tier (e.g. `single`, `double`, `full`).
    pub stage: String,
    /// Pot in `currency` units.
    pub pot: i64,
    /// Currency label for `pot` and `price`.
    pub currency: String,
    /// `false` once the game is closed; terminal.
    pub active: bool,
    /// `false` until the operator starts the draw.
    pub started: bool,
    /// Whether the service announces calls on its own channels.
    pub announce_calls: bool,
    /// Optional hex accent color used by presentation layers.
    pub theme_color: Option<String>,
    /// Optional relative URL of the background asset.
    pub background: Option<String>,
    /// Called numbers in call order; the last element is the most recent call.
    pub called: Vec<u32>,
    /// Explicit most-recent call when the service reports one.
    pub last_called: Option<u32>,
    /// Claims raised against the game, oldest first.
    pub claims: Vec<Claim>,
    /// Ticket price.
    pub price: i64,
    /// Per-owner ticket cap.
    pub max_cards_per_player: u32,
    /// Payout split for each stage.
    pub payouts: Payouts,
    /// Ticket sales counters.
    pub stats: GameStats,
}

impl GameSession {
    /// Most recent call: the explicit server field wins over the tail of `called`.
    pub fn latest_call(&self) -> Option<u32> {
        self.last_called.or_else(|| self.called.last().copied())
    }

    /// Whether at least one claim is still awaiting the operator.
    pub fn has_pending_claim(&self) -> bool {
        self.claims.iter().any(|claim| claim.pending)
    }

    /// Aggregate claim status for a ticket holder.
    ///
    /// Precedence is pending, then approved, then denied; owners without claims get
    /// [`OwnerClaimStatus::NoClaim`].
    pub fn claim_status_for(&self, owner_name: &str) -> OwnerClaimStatus {
        let mut approved = false;
        let mut denied = false;
        for claim in self.claims.iter().filter(|c| c.owner_name == owner_name) {
            match claim.state() {
                ClaimState::Pending => return OwnerClaimStatus::Pending,
                ClaimState::Approved => approved = true,
                ClaimState::Denied => denied = true,
            }
        }

        if approved {
            OwnerClaimStatus::Approved
        } else if denied {
            OwnerClaimStatus::Denied
        } else {
            OwnerClaimStatus::NoClaim
        }
    }
}

/// Payout split reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Payouts {
    /// Payout for a single line.
    pub single: i64,
    /// Payout for two lines.
    pub double: i64,
    /// Payout for a full card.
    pub full: i64,
}

/// Ticket counters reported alongside a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    /// Cards sold.
    pub cards: u32,
    /// Distinct owners holding cards.
    pub players: u32,
}

/// A player's assertion that a card satisfies the current stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// Ticket holder; join key against owners and cards.
    pub owner_name: String,
    /// Card the claim was raised for.
    pub card_id: String,
    /// Stage the claim targets.
    pub stage: String,
    /// Awaiting operator resolution.
    pub pending: bool,
    /// Rejected by the operator.
    pub denied: bool,
    /// Seconds since the epoch when the claim was raised.
    pub ts: Option<f64>,
    /// Where the claim originated (web, chat, ...).
    pub source: Option<String>,
}

impl Claim {
    /// Resolution state of this claim instance.
    pub fn state(&self) -> ClaimState {
        if self.pending {
            ClaimState::Pending
        } else if self.denied {
            ClaimState::Denied
        } else {
            ClaimState::Approved
        }
    }
}

/// Lifecycle of one claim: `Pending` moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    /// Waiting for the operator.
    Pending,
    /// Confirmed by the operator.
    Approved,
    /// Rejected by the operator.
    Denied,
}

/// Claim status derived for an owner across all of their claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerClaimStatus {
    /// At least one claim is pending.
    Pending,
    /// No pending claim and at least one approved.
    Approved,
    /// Only denied claims.
    Denied,
    /// The owner never claimed.
    NoClaim,
}

/// Grid position of a card cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
}

/// A single bingo ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Identifier used by the mark and claim endpoints.
    pub card_id: String,
    /// Row-major grid of numbers.
    pub numbers: Vec<Vec<u32>>,
    /// Row-major grid of explicit marks, same shape as `numbers`.
    pub marks: Vec<Vec<bool>>,
}

impl Card {
    /// Build a card, reshaping `marks` so it always matches `numbers`.
    pub fn new(card_id: String, numbers: Vec<Vec<u32>>, marks: Vec<Vec<bool>>) -> Self {
        let marks = numbers
            .iter()
            .enumerate()
            .map(|(r, row)| {
                (0..row.len())
                    .map(|c| {
                        marks
                            .get(r)
                            .and_then(|mark_row| mark_row.get(c))
                            .copied()
                            .unwrap_or(false)
                    })
                    .collect()
            })
            .collect();

        Self {
            card_id,
            numbers,
            marks,
        }
    }

    /// Every cell holding `number`, in row-major order.
    pub fn cells_with(&self, number: u32) -> Vec<CellRef> {
        self.numbers
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .filter(move |(_, value)| **value == number)
                    .map(move |(col, _)| CellRef { row, col })
            })
            .collect()
    }

    /// Explicit mark state of a cell; out-of-range cells are unmarked.
    pub fn is_marked(&self, cell: CellRef) -> bool {
        self.marks
            .get(cell.row)
            .and_then(|row| row.get(cell.col))
            .copied()
            .unwrap_or(false)
    }

    /// Set the explicit mark on a cell, returning `false` when the cell does not exist.
    pub fn set_marked(&mut self, cell: CellRef) -> bool {
        match self
            .marks
            .get_mut(cell.row)
            .and_then(|row| row.get_mut(cell.col))
        {
            Some(slot) => {
                *slot = true;
                true
            }
            None => false,
        }
    }

    /// Display cells: a cell is visually marked when it is explicitly marked or called.
    pub fn display_cells(&self, called: &[u32]) -> Vec<Vec<CardCell>> {
        self.numbers
            .iter()
            .enumerate()
            .map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(|(col, &number)| {
                        let is_called = called.contains(&number);
                        CardCell {
                            number,
                            called: is_called,
                            marked: is_called || self.is_marked(CellRef { row, col }),
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// How many of the card's cells have been called.
    pub fn progress(&self, called: &[u32]) -> CardProgress {
        let total = self.numbers.iter().map(Vec::len).sum::<usize>();
        let hit = self
            .numbers
            .iter()
            .flatten()
            .filter(|number| called.contains(number))
            .count();
        let complete = total > 0 && hit == total;
        let near_win = !complete && total > 0 && (hit as f64 / total as f64) >= NEAR_WIN_RATIO;

        CardProgress {
            called_cells: hit,
            total_cells: total,
            complete,
            near_win,
        }
    }
}

/// Derived display state of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardCell {
    /// Number printed in the cell.
    pub number: u32,
    /// Explicitly marked or called.
    pub marked: bool,
    /// Present in the called sequence.
    pub called: bool,
}

/// Call coverage of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardProgress {
    /// Cells whose number has been called.
    pub called_cells: usize,
    /// Cells on the card.
    pub total_cells: usize,
    /// Every cell called.
    pub complete: bool,
    /// At least three quarters called but not complete.
    pub near_win: bool,
}

/// External identity linked to an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XivLink {
    /// Linked character name.
    pub username: String,
    /// Home world, when known.
    pub world: Option<String>,
}

/// A ticket holder within one game's roster.
#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    /// Free-text display name; unique within one roster.
    pub owner_name: String,
    /// Number of cards held.
    pub cards: u32,
    /// Share-link credential, when the roster carries one.
    pub token: Option<String>,
    /// Seconds since the epoch of the latest purchase.
    pub last_purchase: Option<f64>,
    /// Linked external identity.
    pub xiv: Option<XivLink>,
}

/// Entry of the game picker.
#[derive(Debug, Clone, PartialEq)]
pub struct GameListing {
    /// Identifier to select.
    pub game_id: String,
    /// Display title.
    pub title: String,
    /// Seconds since the epoch of creation.
    pub created_at: Option<f64>,
    /// `false` for closed games.
    pub active: bool,
    /// Current stage.
    pub stage: String,
    /// Current pot.
    pub pot: i64,
}

/// Upper-case, truncate and pad a header to exactly four characters.
pub fn normalize_header(raw: Option<&str>) -> String {
    let source = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_HEADER)
        .to_uppercase();

    let mut header = source.chars().take(HEADER_LEN).collect::<String>();
    while header.chars().count() < HEADER_LEN {
        header.push(' ');
    }
    header
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal open session used across the unit tests.
    pub fn session(game_id: &str) -> GameSession {
        GameSession {
            game_id: game_id.into(),
            title: "Friday Bingo".into(),
            header_text: normalize_header(None),
            stage: DEFAULT_STAGE.into(),
            pot: 0,
            currency: "gil".into(),
            active: true,
            started: false,
            announce_calls: false,
            theme_color: None,
            background: None,
            called: Vec::new(),
            last_called: None,
            claims: Vec::new(),
            price: 100,
            max_cards_per_player: 10,
            payouts: Payouts::default(),
            stats: GameStats::default(),
        }
    }

    pub fn claim(owner: &str, card_id: &str, pending: bool, denied: bool) -> Claim {
        Claim {
            owner_name: owner.into(),
            card_id: card_id.into(),
            stage: DEFAULT_STAGE.into(),
            pending,
            denied,
            ts: None,
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{claim, session};
    use super::*;

    #[test]
    fn header_is_padded_and_truncated() {
        assert_eq!(normalize_header(Some("bingo")), "BING");
        assert_eq!(normalize_header(Some("ab")), "AB  ");
        assert_eq!(normalize_header(Some("   ")), "BING");
        assert_eq!(normalize_header(None), "BING");
    }

    #[test]
    fn explicit_last_called_wins_over_tail() {
        let mut game = session("g1");
        game.called = vec![4, 9];
        assert_eq!(game.latest_call(), Some(9));
        game.last_called = Some(4);
        assert_eq!(game.latest_call(), Some(4));
    }

    #[test]
    fn owner_claim_status_follows_precedence() {
        let mut game = session("g1");
        assert_eq!(game.claim_status_for("A"), OwnerClaimStatus::NoClaim);

        game.claims.push(claim("A", "c1", false, true));
        assert_eq!(game.claim_status_for("A"), OwnerClaimStatus::Denied);

        game.claims.push(claim("A", "c2", false, false));
        assert_eq!(game.claim_status_for("A"), OwnerClaimStatus::Approved);

        game.claims.push(claim("A", "c3", true, false));
        assert_eq!(game.claim_status_for("A"), OwnerClaimStatus::Pending);
        assert_eq!(game.claim_status_for("B"), OwnerClaimStatus::NoClaim);
    }

    #[test]
    fn duplicate_numbers_yield_every_cell() {
        let card = Card::new("c1".into(), vec![vec![1, 2], vec![3, 1]], Vec::new());
        assert_eq!(
            card.cells_with(1),
            vec![CellRef { row: 0, col: 0 }, CellRef { row: 1, col: 1 }]
        );
        assert!(card.cells_with(7).is_empty());
        assert_eq!(card.marks, vec![vec![false, false], vec![false, false]]);
    }

    #[test]
    fn called_numbers_display_as_marked_without_touching_marks() {
        let mut card = Card::new("c1".into(), vec![vec![1, 2], vec![3, 4]], Vec::new());
        card.set_marked(CellRef { row: 1, col: 0 });

        let cells = card.display_cells(&[2]);
        assert!(!cells[0][0].marked);
        assert!(cells[0][1].marked && cells[0][1].called);
        assert!(cells[1][0].marked && !cells[1][0].called);
        assert!(!card.is_marked(CellRef { row: 0, col: 1 }));
    }

    #[test]
    fn progress_flags_near_win_and_complete() {
        let card = Card::new("c1".into(), vec![vec![1, 2], vec![3, 4]], Vec::new());
        let near = card.progress(&[1, 2, 3]);
        assert_eq!((near.called_cells, near.total_cells), (3, 4));
        assert!(near.near_win && !near.complete);

        let done = card.progress(&[1, 2, 3, 4]);
        assert!(done.complete && !done.near_win);
    }
}
