use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::store::TokenStore;

/// Single-flight coordinator for token refresh.
///
/// Many concurrent requests can hit a 401 at the same time once the access
/// token expires. The first caller to arrive owns the outbound refresh call;
/// everyone else that arrives while it is in flight awaits the same shared
/// outcome. The slot is reset to idle once the owning call settles, success
/// or failure, so a failed refresh can never wedge future requests.
///
/// Owned by a single [`ApiClient`](crate::client::ApiClient) instance, not
/// stored globally, so independent clients never share refresh state.
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Mutex<Option<InFlight>>,
    next_seq: AtomicU64,
}

#[derive(Clone)]
struct InFlight {
    /// Guards the reset: an awaiter may only clear the slot it joined,
    /// never a newer refresh started after its own settled.
    seq: u64,
    result: Shared<BoxFuture<'static, bool>>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the stored access token, returning whether it succeeded.
    ///
    /// Joins the in-flight refresh when one exists; otherwise starts one.
    /// The slot mutex is never held across an await.
    pub async fn refresh(
        &self,
        http: &reqwest::Client,
        refresh_url: &str,
        store: &Arc<dyn TokenStore>,
    ) -> bool {
        let (seq, result) = {
            let mut slot = self.slot.lock().expect("refresh slot poisoned");
            match slot.as_ref() {
                Some(in_flight) => (in_flight.seq, in_flight.result.clone()),
                None => {
                    let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                    let future = perform_refresh(
                        http.clone(),
                        refresh_url.to_string(),
                        Arc::clone(store),
                    )
                    .boxed()
                    .shared();
                    *slot = Some(InFlight {
                        seq,
                        result: future.clone(),
                    });
                    (seq, future)
                }
            }
        };

        let refreshed = result.await;

        let mut slot = self.slot.lock().expect("refresh slot poisoned");
        if slot.as_ref().is_some_and(|in_flight| in_flight.seq == seq) {
            *slot = None;
        }
        refreshed
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// The refresh call itself, run once per coordinator cycle.
///
/// On success the new access token is persisted alongside the unchanged
/// refresh token. On any failure (non-success status, transport error,
/// malformed body, store write failure) both tokens are cleared so the
/// store never holds a half-valid pair.
async fn perform_refresh(
    http: reqwest::Client,
    refresh_url: String,
    store: Arc<dyn TokenStore>,
) -> bool {
    let credentials = match store.load() {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            tracing::debug!("no stored refresh token, failing refresh without a network call");
            return false;
        }
        Err(err) => {
            tracing::warn!(error = %err, "token store read failed during refresh");
            return false;
        }
    };

    tracing::debug!(url = %refresh_url, "refreshing access token");
    let response = http
        .post(&refresh_url)
        .header(
            AUTHORIZATION,
            format!("Bearer {}", credentials.refresh_token),
        )
        .send()
        .await;

    let renewed = match response {
        Ok(response) if response.status().is_success() => {
            match response.json::<RefreshResponse>().await {
                Ok(body) => Some(credentials.with_access_token(body.access_token)),
                Err(err) => {
                    tracing::warn!(error = %err, "malformed refresh response");
                    None
                }
            }
        }
        Ok(response) => {
            tracing::warn!(status = %response.status(), "refresh rejected by backend");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, "refresh request failed to complete");
            None
        }
    };

    match renewed {
        Some(renewed) => match store.save(&renewed) {
            Ok(()) => {
                tracing::debug!("access token refreshed");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist refreshed token");
                clear_store(&store);
                false
            }
        },
        None => {
            clear_store(&store);
            false
        }
    }
}

fn clear_store(store: &Arc<dyn TokenStore>) {
    if let Err(err) = store.clear() {
        tracing::warn!(error = %err, "failed to clear credentials after refresh failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::NoopTokenStore;

    #[tokio::test]
    async fn refresh_without_stored_credentials_fails_with_no_network_call() {
        let coordinator = RefreshCoordinator::new();
        let store: Arc<dyn TokenStore> = Arc::new(NoopTokenStore::new());
        // The URL is unroutable; the call must short-circuit before reaching it.
        let refreshed = coordinator
            .refresh(
                &reqwest::Client::new(),
                "http://127.0.0.1:1/api/auth/refresh/",
                &store,
            )
            .await;
        assert!(!refreshed);
    }

    #[tokio::test]
    async fn coordinator_resets_to_idle_after_failure() {
        let coordinator = RefreshCoordinator::new();
        let store: Arc<dyn TokenStore> = Arc::new(NoopTokenStore::new());
        let http = reqwest::Client::new();
        let url = "http://127.0.0.1:1/api/auth/refresh/";

        assert!(!coordinator.refresh(&http, url, &store).await);
        assert!(coordinator.slot.lock().unwrap().is_none());
        // A second cycle must start cleanly rather than observe stale state.
        assert!(!coordinator.refresh(&http, url, &store).await);
    }
}
