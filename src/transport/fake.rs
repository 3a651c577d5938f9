//! In-memory game service used by unit tests.
//!
//! Records every call and simulates just enough server behavior for the console flows:
//! starting, rolling from a queue, advancing stages, resolving claims and marking cells.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use futures::future::BoxFuture;
use tokio::sync::Notify;

use crate::{
    state::game::{Card, CellRef, GameListing, GameSession, Owner, XivLink},
    transport::{
        AdvanceOutcome, CreateSessionParams, PurchaseParams, SessionSettings, SessionTransport,
        TransportError, TransportResult,
    },
};

const STAGES: [&str; 3] = ["single", "double", "full"];

/// Call recorded by the fake, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListGames,
    FetchSession(String),
    Create(String),
    Start(String),
    Roll(String),
    Advance(String),
    Mark {
        card_id: String,
        row: usize,
        col: usize,
    },
    Buy {
        owner_name: String,
        quantity: u32,
    },
    Seed(i64),
    Approve(String),
    Deny(String),
    Close(String),
    UpdateSettings(bool),
    Owners(String),
    OwnerToken(String),
    OwnerCards(String),
    LinkOwner {
        owner_name: String,
        user_id: u64,
    },
}

/// Failure injected for calls matching a predicate.
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Unauthorized,
    Rejected(String),
}

impl Failure {
    fn into_error(self) -> TransportError {
        match self {
            Failure::Unauthorized => TransportError::Unauthorized,
            Failure::Rejected(message) => TransportError::rejected(None, message),
        }
    }
}

type Matcher = Box<dyn Fn(&Call) -> bool + Send>;

#[derive(Default)]
struct FakeInner {
    sessions: HashMap<String, GameSession>,
    owners: HashMap<String, Vec<Owner>>,
    cards: HashMap<(String, String), Vec<Card>>,
    tokens: HashMap<(String, String), String>,
    draws: VecDeque<u32>,
    calls: Vec<Call>,
    failures: Vec<(Matcher, Failure)>,
    approval_gate: Option<Arc<Notify>>,
    token_gate: Option<Arc<Notify>>,
}

/// Cloneable handle; clones share the same simulated service.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeInner> {
        self.inner.lock().unwrap()
    }

    pub fn insert_session(&self, session: GameSession) {
        self.lock()
            .sessions
            .insert(session.game_id.clone(), session);
    }

    pub fn session(&self, game_id: &str) -> Option<GameSession> {
        self.lock().sessions.get(game_id).cloned()
    }

    pub fn update_session(&self, game_id: &str, f: impl FnOnce(&mut GameSession)) {
        if let Some(session) = self.lock().sessions.get_mut(game_id) {
            f(session);
        }
    }

    pub fn set_owners(&self, game_id: &str, owners: Vec<Owner>) {
        self.lock().owners.insert(game_id.into(), owners);
    }

    pub fn set_cards(&self, game_id: &str, owner_name: &str, cards: Vec<Card>) {
        self.lock()
            .cards
            .insert((game_id.into(), owner_name.into()), cards);
    }

    pub fn set_token(&self, game_id: &str, owner_name: &str, token: &str) {
        self.lock()
            .tokens
            .insert((game_id.into(), owner_name.into()), token.into());
    }

    pub fn queue_draws(&self, draws: &[u32]) {
        self.lock().draws.extend(draws.iter().copied());
    }

    pub fn fail_when(&self, matcher: impl Fn(&Call) -> bool + Send + 'static, failure: Failure) {
        self.lock().failures.push((Box::new(matcher), failure));
    }

    /// Hold every approval until the returned handle is notified.
    pub fn gate_approvals(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().approval_gate = Some(gate.clone());
        gate
    }

    /// Hold every token response until the returned gate is notified.
    pub fn gate_tokens(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().token_gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: Call) -> TransportResult<()> {
        let mut inner = self.lock();
        let failure = inner
            .failures
            .iter()
            .find(|(matcher, _)| matcher(&call))
            .map(|(_, failure)| failure.clone());
        inner.calls.push(call);
        match failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    fn with_session<T>(
        &self,
        game_id: &str,
        f: impl FnOnce(&mut GameSession) -> TransportResult<T>,
    ) -> TransportResult<T> {
        let mut inner = self.lock();
        match inner.sessions.get_mut(game_id) {
            Some(session) => f(session),
            None => Err(TransportError::NotFound("game not found".into())),
        }
    }

    fn ready<T: Send + 'static>(result: TransportResult<T>) -> BoxFuture<'static, TransportResult<T>> {
        Box::pin(async move { result })
    }
}

impl SessionTransport for FakeTransport {
    fn list_games(&self) -> BoxFuture<'static, TransportResult<Vec<GameListing>>> {
        let result = self.record(Call::ListGames).map(|()| {
            let mut games: Vec<GameListing> = self
                .lock()
                .sessions
                .values()
                .map(|session| GameListing {
                    game_id: session.game_id.clone(),
                    title: session.title.clone(),
                    created_at: None,
                    active: session.active,
                    stage: session.stage.clone(),
                    pot: session.pot,
                })
                .collect();
            games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
            games
        });
        Self::ready(result)
    }

    fn fetch_session(&self, game_id: &str) -> BoxFuture<'static, TransportResult<GameSession>> {
        let result = self
            .record(Call::FetchSession(game_id.into()))
            .and_then(|()| self.with_session(game_id, |session| Ok(session.clone())));
        Self::ready(result)
    }

    fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> BoxFuture<'static, TransportResult<GameSession>> {
        let result = self.record(Call::Create(params.title.clone())).map(|()| {
            let mut inner = self.lock();
            let game_id = format!("game-{}", inner.sessions.len() + 1);
            let mut session = crate::state::game::fixtures::session(&game_id);
            session.title = params.title;
            session.header_text = crate::state::game::normalize_header(Some(&params.header_text));
            session.price = params.price;
            session.currency = params.currency;
            session.pot = params.seed_pot;
            session.max_cards_per_player = params.max_cards_per_player;
            session.announce_calls = params.announce_calls;
            session.theme_color = params.theme_color;
            inner.sessions.insert(game_id, session.clone());
            session
        });
        Self::ready(result)
    }

    fn start(&self, game_id: &str) -> BoxFuture<'static, TransportResult<()>> {
        let result = self.record(Call::Start(game_id.into())).and_then(|()| {
            self.with_session(game_id, |session| {
                session.started = true;
                Ok(())
            })
        });
        Self::ready(result)
    }

    fn roll(&self, game_id: &str) -> BoxFuture<'static, TransportResult<Vec<u32>>> {
        let result = self.record(Call::Roll(game_id.into())).and_then(|()| {
            let next = self.lock().draws.pop_front();
            self.with_session(game_id, |session| {
                let number = next
                    .or_else(|| (1..=75).find(|n| !session.called.contains(n)))
                    .ok_or_else(|| TransportError::rejected(None, "All numbers called"))?;
                session.called.push(number);
                session.last_called = None;
                Ok(session.called.clone())
            })
        });
        Self::ready(result)
    }

    fn advance_stage(&self, game_id: &str) -> BoxFuture<'static, TransportResult<AdvanceOutcome>> {
        let result = self.record(Call::Advance(game_id.into())).and_then(|()| {
            self.with_session(game_id, |session| {
                let position = STAGES.iter().position(|stage| *stage == session.stage);
                match position.and_then(|p| STAGES.get(p + 1)) {
                    Some(next) => {
                        session.stage = (*next).to_string();
                        Ok(AdvanceOutcome {
                            ended: false,
                            stage: Some(session.stage.clone()),
                        })
                    }
                    None => {
                        session.active = false;
                        Ok(AdvanceOutcome {
                            ended: true,
                            stage: None,
                        })
                    }
                }
            })
        });
        Self::ready(result)
    }

    fn mark(
        &self,
        game_id: &str,
        card_id: &str,
        row: usize,
        col: usize,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let result = self
            .record(Call::Mark {
                card_id: card_id.into(),
                row,
                col,
            })
            .map(|()| {
                let mut inner = self.lock();
                for ((game, _), cards) in inner.cards.iter_mut() {
                    if game != game_id {
                        continue;
                    }
                    for card in cards.iter_mut().filter(|c| c.card_id == card_id) {
                        card.set_marked(CellRef { row, col });
                    }
                }
            });
        Self::ready(result)
    }

    fn buy(
        &self,
        game_id: &str,
        params: PurchaseParams,
    ) -> BoxFuture<'static, TransportResult<Vec<Card>>> {
        let result = self
            .record(Call::Buy {
                owner_name: params.owner_name.clone(),
                quantity: params.quantity,
            })
            .map(|()| {
                let mut inner = self.lock();
                let key = (game_id.to_owned(), params.owner_name.clone());
                let held = inner.cards.get(&key).map_or(0, Vec::len);
                let bought: Vec<Card> = (0..params.quantity as usize)
                    .map(|i| {
                        let base = ((held + i) * 4) as u32;
                        Card::new(
                            format!("{}-{}", params.owner_name, held + i + 1),
                            vec![vec![base + 1, base + 2], vec![base + 3, base + 4]],
                            Vec::new(),
                        )
                    })
                    .collect();
                inner.cards.entry(key).or_default().extend(bought.clone());

                let owners = inner.owners.entry(game_id.to_owned()).or_default();
                match owners
                    .iter_mut()
                    .find(|o| o.owner_name == params.owner_name)
                {
                    Some(owner) => owner.cards += params.quantity,
                    None => owners.push(Owner {
                        owner_name: params.owner_name.clone(),
                        cards: params.quantity,
                        token: None,
                        last_purchase: None,
                        xiv: None,
                    }),
                }
                bought
            });
        Self::ready(result)
    }

    fn seed(&self, game_id: &str, amount: i64) -> BoxFuture<'static, TransportResult<()>> {
        let result = self.record(Call::Seed(amount)).and_then(|()| {
            self.with_session(game_id, |session| {
                session.pot += amount;
                Ok(())
            })
        });
        Self::ready(result)
    }

    fn approve_claim(
        &self,
        game_id: &str,
        card_id: &str,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let result = self.record(Call::Approve(card_id.into())).and_then(|()| {
            self.with_session(game_id, |session| {
                for claim in session.claims.iter_mut().filter(|c| c.card_id == card_id) {
                    claim.pending = false;
                    claim.denied = false;
                }
                Ok(())
            })
        });
        let gate = self.lock().approval_gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        })
    }

    fn deny_claim(&self, game_id: &str, card_id: &str) -> BoxFuture<'static, TransportResult<()>> {
        let result = self.record(Call::Deny(card_id.into())).and_then(|()| {
            self.with_session(game_id, |session| {
                for claim in session.claims.iter_mut().filter(|c| c.card_id == card_id) {
                    claim.pending = false;
                    claim.denied = true;
                }
                Ok(())
            })
        });
        Self::ready(result)
    }

    fn close(&self, game_id: &str) -> BoxFuture<'static, TransportResult<()>> {
        let result = self.record(Call::Close(game_id.into())).and_then(|()| {
            self.with_session(game_id, |session| {
                session.active = false;
                Ok(())
            })
        });
        Self::ready(result)
    }

    fn update_settings(
        &self,
        game_id: &str,
        settings: SessionSettings,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let result = self
            .record(Call::UpdateSettings(settings.announce_calls))
            .and_then(|()| {
                self.with_session(game_id, |session| {
                    session.announce_calls = settings.announce_calls;
                    Ok(())
                })
            });
        Self::ready(result)
    }

    fn owners(&self, game_id: &str) -> BoxFuture<'static, TransportResult<Vec<Owner>>> {
        let result = self
            .record(Call::Owners(game_id.into()))
            .map(|()| self.lock().owners.get(game_id).cloned().unwrap_or_default());
        Self::ready(result)
    }

    fn owner_token(
        &self,
        game_id: &str,
        owner_name: &str,
    ) -> BoxFuture<'static, TransportResult<String>> {
        let result = self
            .record(Call::OwnerToken(owner_name.into()))
            .and_then(|()| {
                self.lock()
                    .tokens
                    .get(&(game_id.to_owned(), owner_name.to_owned()))
                    .cloned()
                    .ok_or_else(|| TransportError::rejected(Some(404), "Owner not found"))
            });
        let gate = self.lock().token_gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        })
    }

    fn owner_cards(
        &self,
        game_id: &str,
        owner_name: &str,
    ) -> BoxFuture<'static, TransportResult<Vec<Card>>> {
        let result = self
            .record(Call::OwnerCards(owner_name.into()))
            .map(|()| {
                self.lock()
                    .cards
                    .get(&(game_id.to_owned(), owner_name.to_owned()))
                    .cloned()
                    .unwrap_or_default()
            });
        Self::ready(result)
    }

    fn link_owner(
        &self,
        game_id: &str,
        owner_name: &str,
        user_id: u64,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let result = self
            .record(Call::LinkOwner {
                owner_name: owner_name.into(),
                user_id,
            })
            .map(|()| {
                let mut inner = self.lock();
                if let Some(owner) = inner
                    .owners
                    .get_mut(game_id)
                    .and_then(|owners| owners.iter_mut().find(|o| o.owner_name == owner_name))
                {
                    owner.xiv = Some(XivLink {
                        username: format!("user-{user_id}"),
                        world: None,
                    });
                }
            });
        Self::ready(result)
    }
}
