use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use crate::{
    state::game::{Card, GameListing, GameSession, Owner},
    transport::{
        AdvanceOutcome, CreateSessionParams, PurchaseParams, SessionSettings, SessionTransport,
        TransportError, TransportResult,
    },
};

use super::{
    config::HttpTransportConfig,
    error::{HttpResult, HttpTransportError},
    models::{
        Ack, AdvanceResponse, BuyBody, CardActionBody, CardsResponse, CreateBody, CreateResponse,
        GAME_NOT_FOUND, GameIdBody, GamesResponse, LinkBody, MarkBody, OwnersResponse,
        RollResponse, SeedBody, SessionEnvelope, SettingsBody, TokenResponse,
    },
};

const API_KEY_HEADER: &str = "X-API-Key";
const REQUEST_ID_HEADER: &str = "X-Request-Id";
const FALLBACK_ERROR: &str = "Request failed";
const ROOT: &str = "bingo";

/// [`SessionTransport`] backed by the game service's JSON API.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Arc<Url>,
    api_key: Option<Arc<str>>,
}

impl HttpTransport {
    /// Build the HTTP client and validate the base URL.
    pub fn new(config: HttpTransportConfig) -> HttpResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| HttpTransportError::ClientBuilder { source })?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|err| {
            HttpTransportError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: err.to_string(),
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(HttpTransportError::InvalidBaseUrl {
                url: config.base_url,
                reason: "URL cannot carry a path".into(),
            });
        }

        Ok(Self {
            client,
            base_url: Arc::new(base_url),
            api_key: config.api_key.map(Arc::from),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = (*self.base_url).clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(ROOT).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        match self.api_key {
            Some(ref key) => builder.header(API_KEY_HEADER, key.as_ref()),
            None => builder,
        }
    }

    async fn get<T>(&self, segments: &[&str]) -> TransportResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let path = url.path().to_owned();
        self.dispatch(self.request(Method::GET, url), path).await
    }

    async fn send<B, T>(&self, method: Method, segments: &[&str], body: &B) -> TransportResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let path = url.path().to_owned();
        self.dispatch(self.request(method, url).json(body), path)
            .await
    }

    async fn delete<T>(&self, segments: &[&str]) -> TransportResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let path = url.path().to_owned();
        self.dispatch(self.request(Method::DELETE, url), path).await
    }

    async fn dispatch<T>(&self, builder: RequestBuilder, path: String) -> TransportResult<T>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| HttpTransportError::RequestSend {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!(path = %path, "game service refused credentials");
            return Err(TransportError::Unauthorized);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| HttpTransportError::ReadBody {
                path: path.clone(),
                source,
            })?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        if !status.is_success() {
            let message = serde_json::from_slice::<Ack>(body)
                .ok()
                .and_then(Ack::into_message)
                .unwrap_or_else(|| FALLBACK_ERROR.to_string());
            debug!(path = %path, status = %status, message = %message, "game service rejected request");
            return Err(TransportError::rejected(Some(status.as_u16()), message));
        }

        if let Ok(ack) = serde_json::from_slice::<Ack>(body) {
            if ack.ok == Some(false) {
                let message = ack
                    .into_message()
                    .unwrap_or_else(|| FALLBACK_ERROR.to_string());
                return Err(TransportError::rejected(None, message));
            }
        }

        serde_json::from_slice(body).map_err(|source| {
            HttpTransportError::DecodeResponse {
                path: path.clone(),
                source,
            }
            .into()
        })
    }
}

impl SessionTransport for HttpTransport {
    fn list_games(&self) -> BoxFuture<'static, TransportResult<Vec<GameListing>>> {
        let transport = self.clone();
        Box::pin(async move {
            let response: GamesResponse = transport.get(&["games"]).await?;
            Ok(response.games.into_iter().map(GameListing::from).collect())
        })
    }

    fn fetch_session(&self, game_id: &str) -> BoxFuture<'static, TransportResult<GameSession>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let envelope: SessionEnvelope = transport.get(&[game_id.as_str()]).await?;
            envelope.into_session()
        })
    }

    fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> BoxFuture<'static, TransportResult<GameSession>> {
        let transport = self.clone();
        Box::pin(async move {
            let response: CreateResponse = transport
                .send(Method::POST, &["create"], &CreateBody::from(&params))
                .await?;
            response
                .game
                .map(|game| game.into_session(None))
                .ok_or_else(|| TransportError::NotFound(GAME_NOT_FOUND.into()))
        })
    }

    fn start(&self, game_id: &str) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let _: Ack = transport
                .send(Method::POST, &["start"], &GameIdBody { game_id: &game_id })
                .await?;
            Ok(())
        })
    }

    fn roll(&self, game_id: &str) -> BoxFuture<'static, TransportResult<Vec<u32>>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let response: RollResponse = transport
                .send(Method::POST, &["roll"], &GameIdBody { game_id: &game_id })
                .await?;
            Ok(response.called)
        })
    }

    fn advance_stage(&self, game_id: &str) -> BoxFuture<'static, TransportResult<AdvanceOutcome>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let response: AdvanceResponse = transport
                .send(
                    Method::POST,
                    &["advance-stage"],
                    &GameIdBody { game_id: &game_id },
                )
                .await?;
            Ok(response.into())
        })
    }

    fn mark(
        &self,
        game_id: &str,
        card_id: &str,
        row: usize,
        col: usize,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        let card_id = card_id.to_owned();
        Box::pin(async move {
            let body = MarkBody {
                game_id: &game_id,
                card_id: &card_id,
                row,
                col,
            };
            let _: Ack = transport.send(Method::POST, &["mark"], &body).await?;
            Ok(())
        })
    }

    fn buy(
        &self,
        game_id: &str,
        params: PurchaseParams,
    ) -> BoxFuture<'static, TransportResult<Vec<Card>>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let response: CardsResponse = transport
                .send(Method::POST, &["buy"], &BuyBody::new(&game_id, &params))
                .await?;
            Ok(response.cards.into_iter().map(Card::from).collect())
        })
    }

    fn seed(&self, game_id: &str, amount: i64) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let body = SeedBody {
                game_id: &game_id,
                amount,
            };
            let _: Ack = transport.send(Method::POST, &["seed"], &body).await?;
            Ok(())
        })
    }

    fn approve_claim(
        &self,
        game_id: &str,
        card_id: &str,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        let card_id = card_id.to_owned();
        Box::pin(async move {
            let body = CardActionBody {
                game_id: &game_id,
                card_id: &card_id,
            };
            let _: Ack = transport
                .send(Method::POST, &["claim-approve"], &body)
                .await?;
            Ok(())
        })
    }

    fn deny_claim(&self, game_id: &str, card_id: &str) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        let card_id = card_id.to_owned();
        Box::pin(async move {
            let body = CardActionBody {
                game_id: &game_id,
                card_id: &card_id,
            };
            let _: Ack = transport
                .send(Method::POST, &["claim-deny"], &body)
                .await?;
            Ok(())
        })
    }

    fn close(&self, game_id: &str) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let _: Ack = transport.delete(&[game_id.as_str()]).await?;
            Ok(())
        })
    }

    fn update_settings(
        &self,
        game_id: &str,
        settings: SessionSettings,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let body = SettingsBody {
                announce_calls: settings.announce_calls,
            };
            let _: Ack = transport.send(Method::PATCH, &[game_id.as_str()], &body).await?;
            Ok(())
        })
    }

    fn owners(&self, game_id: &str) -> BoxFuture<'static, TransportResult<Vec<Owner>>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            let response: OwnersResponse = transport.get(&[game_id.as_str(), "owners"]).await?;
            Ok(response.owners.into_iter().map(Owner::from).collect())
        })
    }

    fn owner_token(
        &self,
        game_id: &str,
        owner_name: &str,
    ) -> BoxFuture<'static, TransportResult<String>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        let owner_name = owner_name.to_owned();
        Box::pin(async move {
            let response: TokenResponse = transport
                .get(&[game_id.as_str(), "owner", owner_name.as_str(), "token"])
                .await?;
            response
                .token
                .filter(|token| !token.is_empty())
                .ok_or_else(|| TransportError::rejected(None, "Missing token"))
        })
    }

    fn owner_cards(
        &self,
        game_id: &str,
        owner_name: &str,
    ) -> BoxFuture<'static, TransportResult<Vec<Card>>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        let owner_name = owner_name.to_owned();
        Box::pin(async move {
            let response: CardsResponse = transport
                .get(&[game_id.as_str(), "owner", owner_name.as_str(), "cards"])
                .await?;
            Ok(response.cards.into_iter().map(Card::from).collect())
        })
    }

    fn link_owner(
        &self,
        game_id: &str,
        owner_name: &str,
        user_id: u64,
    ) -> BoxFuture<'static, TransportResult<()>> {
        let transport = self.clone();
        let game_id = game_id.to_owned();
        let owner_name = owner_name.to_owned();
        Box::pin(async move {
            let _: Ack = transport
                .send(
                    Method::POST,
                    &[game_id.as_str(), "owner", owner_name.as_str(), "link"],
                    &LinkBody { user_id },
                )
                .await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(HttpTransportConfig::new(base)).unwrap()
    }

    #[test]
    fn endpoint_escapes_path_segments() {
        let transport = transport("http://localhost:8080/api/");
        let url = transport.endpoint(&["g 1", "owner", "Ann/Bee", "cards"]);
        assert_eq!(url.path(), "/api/bingo/g%201/owner/Ann%2FBee/cards");
    }

    #[test]
    fn endpoint_on_bare_host() {
        let transport = transport("http://localhost:8080");
        assert_eq!(transport.endpoint(&["games"]).path(), "/bingo/games");
    }

    #[test]
    fn rejects_non_hierarchical_urls() {
        let result = HttpTransport::new(HttpTransportConfig::new("mailto:ops@example.org"));
        assert!(matches!(
            result,
            Err(HttpTransportError::InvalidBaseUrl { .. })
        ));
    }
}
