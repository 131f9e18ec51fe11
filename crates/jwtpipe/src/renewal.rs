//! Single-flight access token renewal.
//!
//! A burst of requests that all find their access token rejected must not
//! turn into a burst of refresh calls. The first caller to reach
//! [`RenewalCoordinator::renew`] starts one renewal exchange; everyone who
//! arrives while it is in flight awaits the same shared result.

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, error, info, instrument, warn};

use jwtpipe_core::error::InvalidInputError;
use jwtpipe_core::header::CONTENT_TYPE;
use jwtpipe_core::{
    AccessToken, ApiUrl, CredentialStore, HeaderValue, HttpRequest, Method, RefreshToken, Result,
    Transport,
};

use crate::classify;
use crate::endpoints::{RefreshRequest, RefreshResponse, TOKEN_REFRESH};

/// How a renewal settled. Every waiter of the same renewal sees the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// A new access token was stored.
    Renewed(AccessToken),
    /// Renewal was impossible. The session it was started for is gone from
    /// the store, either cleared here or replaced by a newer one.
    Failed,
}

type PendingRenewal = Shared<BoxFuture<'static, RenewalOutcome>>;

#[derive(Default)]
struct PendingSlot {
    next_id: u64,
    current: Option<(u64, PendingRenewal)>,
}

/// Turns the refresh token into a new access token, at most one exchange at a time.
pub struct RenewalCoordinator {
    exchange: Arc<RenewalExchange>,
    pending: Arc<Mutex<PendingSlot>>,
}

struct RenewalExchange {
    url: String,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
}

impl RenewalCoordinator {
    pub fn new(
        api: &ApiUrl,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            exchange: Arc::new(RenewalExchange {
                url: api.endpoint(TOKEN_REFRESH),
                transport,
                store,
            }),
            pending: Arc::new(Mutex::new(PendingSlot::default())),
        }
    }

    /// Renew the access token, or join the renewal already in flight.
    ///
    /// With no refresh token stored this fails immediately, clears the store
    /// and sends nothing.
    ///
    /// The result is applied only while the store still holds the refresh
    /// token the exchange was made with, so a logout or login that lands
    /// mid-renewal is never overwritten.
    #[instrument(skip(self))]
    pub async fn renew(&self) -> RenewalOutcome {
        match self.begin(None) {
            Ok(pending) => pending.await,
            Err(settled) => settled,
        }
    }

    /// Like [`renew`](Self::renew), for a request that was rejected while
    /// carrying `stale`.
    ///
    /// When the store already holds a different access token, another
    /// renewal has completed since `stale` was read and that token is
    /// returned without a new exchange.
    #[instrument(skip_all)]
    pub async fn renew_after(&self, stale: &AccessToken) -> RenewalOutcome {
        match self.begin(Some(stale)) {
            Ok(pending) => pending.await,
            Err(settled) => settled,
        }
    }

    /// Join or start a renewal, or settle immediately without one.
    fn begin(
        &self,
        stale: Option<&AccessToken>,
    ) -> std::result::Result<PendingRenewal, RenewalOutcome> {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, pending)) = &slot.current {
            debug!("Joining in-flight renewal");
            return Ok(pending.clone());
        }

        // The slot is released only after the exchange has written the store,
        // so a settled renewal is always visible here.
        if let Some(stale) = stale
            && let Some(current) = self.exchange.store.access_token()
            && &current != stale
        {
            debug!("Access token already renewed");
            return Err(RenewalOutcome::Renewed(current));
        }

        let Some(refresh) = self.exchange.store.refresh_token() else {
            warn!("No refresh token stored, session lost");
            self.exchange.store.clear_if(None);
            return Err(RenewalOutcome::Failed);
        };
        Ok(self.start(&mut slot, refresh))
    }

    /// Returns true while a renewal exchange is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .is_some()
    }

    fn start(&self, slot: &mut PendingSlot, refresh: RefreshToken) -> PendingRenewal {
        info!("Renewing access token");

        let id = slot.next_id;
        slot.next_id += 1;

        // The exchange runs on its own task so it settles even if every
        // waiter is dropped.
        let exchange = Arc::clone(&self.exchange);
        let release = SlotRelease {
            slot: Arc::clone(&self.pending),
            id,
        };
        let issued_with = refresh.clone();
        let task = tokio::spawn(async move {
            let outcome = exchange.run(refresh).await;
            drop(release);
            outcome
        });

        let store = Arc::clone(&self.exchange.store);
        let pending = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(error = %err, "Renewal task aborted");
                    store.clear_if(Some(&issued_with));
                    RenewalOutcome::Failed
                }
            }
        }
        .boxed()
        .shared();

        slot.current = Some((id, pending.clone()));
        pending
    }
}

impl std::fmt::Debug for RenewalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalCoordinator")
            .field("url", &self.exchange.url)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Empties the pending slot once its renewal has settled, including on panic.
struct SlotRelease {
    slot: Arc<Mutex<PendingSlot>>,
    id: u64,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.current.as_ref().is_some_and(|(id, _)| *id == self.id) {
            slot.current = None;
        }
    }
}

impl RenewalExchange {
    /// Perform the exchange and apply its result to the store, provided the
    /// store still holds `refresh`.
    async fn run(&self, refresh: RefreshToken) -> RenewalOutcome {
        match self.exchange(&refresh).await {
            Ok(response) => {
                let access = AccessToken::new(response.access);
                let rotated = response.refresh.map(RefreshToken::new);
                if !self.store.renew_access(&refresh, &access, rotated.as_ref()) {
                    warn!("Session ended during renewal, discarding renewed token");
                    return RenewalOutcome::Failed;
                }
                info!(rotated = rotated.is_some(), "Access token renewed");
                RenewalOutcome::Renewed(access)
            }
            Err(err) => {
                // Rejected refresh tokens and unreachable servers end the same way.
                if self.store.clear_if(Some(&refresh)) {
                    warn!(error = %err, "Token renewal failed, credentials cleared");
                } else {
                    warn!(error = %err, "Token renewal failed after the session changed");
                }
                RenewalOutcome::Failed
            }
        }
    }

    async fn exchange(&self, refresh: &RefreshToken) -> Result<RefreshResponse> {
        let body = serde_json::to_vec(&RefreshRequest {
            refresh: refresh.as_str(),
        })
        .map_err(InvalidInputError::from)?;

        let mut request = HttpRequest::new(Method::POST, &self.url);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.body = Some(body);

        let response = self.transport.send(request).await?;
        classify::decode_json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use crate::mock::MockTransport;
    use jwtpipe_core::{Error, HttpResponse, TokenKind, TokenPair};
    use serde_json::json;
    use std::time::Duration;

    fn api() -> ApiUrl {
        ApiUrl::new("http://localhost:8000/api").unwrap()
    }

    #[tokio::test]
    async fn renews_and_stores_access_token() {
        let transport = MockTransport::new(|request| async move {
            assert_eq!(request.url, "http://localhost:8000/api/auth/token/refresh/");
            assert!(request.bearer_token().is_none());
            let body: serde_json::Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, json!({"refresh": "R1"}));
            Ok(HttpResponse::json(200, &json!({"access": "A2"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport.clone(), store.clone());

        let outcome = coordinator.renew().await;

        assert_eq!(outcome, RenewalOutcome::Renewed(AccessToken::new("A2")));
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("A2"));
        assert_eq!(store.get(TokenKind::Refresh).as_deref(), Some("R1"));
        assert_eq!(transport.count(TOKEN_REFRESH), 1);
        assert!(!coordinator.is_pending());
    }

    #[tokio::test]
    async fn stores_rotated_refresh_token() {
        let transport = MockTransport::new(|_| async {
            Ok(HttpResponse::json(200, &json!({"access": "A2", "refresh": "R2"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport, store.clone());

        coordinator.renew().await;

        assert_eq!(store.get(TokenKind::Refresh).as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn rejected_refresh_clears_store() {
        let transport = MockTransport::new(|_| async {
            Ok(HttpResponse::json(
                401,
                &json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
            ))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport, store.clone());

        assert_eq!(coordinator.renew().await, RenewalOutcome::Failed);
        assert!(!store.is_authenticated());
        assert!(store.refresh_token().is_none());
    }

    #[tokio::test]
    async fn network_failure_collapses_into_failure() {
        let transport = MockTransport::new(|_| async {
            Err(Error::Network(jwtpipe_core::error::NetworkError::Connection {
                message: "connection refused".to_string(),
            }))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport, store.clone());

        assert_eq!(coordinator.renew().await, RenewalOutcome::Failed);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn malformed_success_body_is_failure() {
        let transport = MockTransport::new(|_| async {
            Ok(HttpResponse::json(200, &json!({"token": "A2"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport, store.clone());

        assert_eq!(coordinator.renew().await, RenewalOutcome::Failed);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_exchange() {
        let transport = MockTransport::unused();
        let store = Arc::new(MemoryStore::new());
        store.set(TokenKind::Access, "A1".to_string());
        let coordinator = RenewalCoordinator::new(&api(), transport.clone(), store.clone());

        assert_eq!(coordinator.renew().await, RenewalOutcome::Failed);
        assert!(!store.is_authenticated());
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_exchange() {
        let transport = MockTransport::new(|_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(HttpResponse::json(200, &json!({"access": "A2"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = Arc::new(RenewalCoordinator::new(&api(), transport.clone(), store));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.renew().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                RenewalOutcome::Renewed(AccessToken::new("A2"))
            );
        }
        assert_eq!(transport.count(TOKEN_REFRESH), 1);
    }

    #[tokio::test]
    async fn settled_renewal_allows_a_fresh_one() {
        let transport = MockTransport::new(|_| async {
            Ok(HttpResponse::json(200, &json!({"access": "A-next"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport.clone(), store);

        coordinator.renew().await;
        coordinator.renew().await;

        assert_eq!(transport.count(TOKEN_REFRESH), 2);
    }

    #[tokio::test]
    async fn renew_after_reuses_newer_token() {
        let transport = MockTransport::unused();
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A2", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport.clone(), store);

        let outcome = coordinator.renew_after(&AccessToken::new("A1")).await;

        assert_eq!(outcome, RenewalOutcome::Renewed(AccessToken::new("A2")));
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn renew_after_current_token_exchanges() {
        let transport = MockTransport::new(|_| async {
            Ok(HttpResponse::json(200, &json!({"access": "A2"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport.clone(), store);

        let outcome = coordinator.renew_after(&AccessToken::new("A1")).await;

        assert_eq!(outcome, RenewalOutcome::Renewed(AccessToken::new("A2")));
        assert_eq!(transport.count(TOKEN_REFRESH), 1);
    }

    #[tokio::test]
    async fn clear_during_renewal_discards_new_token() {
        let transport = MockTransport::new(|_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(HttpResponse::json(200, &json!({"access": "A2"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport, store.clone());

        let (outcome, ()) = tokio::join!(coordinator.renew(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.clear();
        });

        assert_eq!(outcome, RenewalOutcome::Failed);
        assert!(!store.is_authenticated());
        assert!(store.refresh_token().is_none());
    }

    #[tokio::test]
    async fn failed_renewal_keeps_newer_session() {
        let transport = MockTransport::new(|_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(HttpResponse::json(401, &json!({"detail": "Token is blacklisted"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport, store.clone());

        let (outcome, ()) = tokio::join!(coordinator.renew(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.set_pair(TokenPair::new("B1", "S1"));
        });

        assert_eq!(outcome, RenewalOutcome::Failed);
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("B1"));
        assert_eq!(store.get(TokenKind::Refresh).as_deref(), Some("S1"));
    }

    #[tokio::test]
    async fn renewal_settles_when_waiter_is_dropped() {
        let transport = MockTransport::new(|_| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(HttpResponse::json(200, &json!({"access": "A2"})))
        });
        let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
        let coordinator = RenewalCoordinator::new(&api(), transport, store.clone());

        let abandoned = tokio::time::timeout(Duration::from_millis(1), coordinator.renew()).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("A2"));
        assert!(!coordinator.is_pending());
    }
}
