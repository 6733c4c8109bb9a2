// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push registration manager.

use std::sync::Arc;

use tracing::{debug, info, warn};

use tether_config::model::AppConfig;
use tether_core::types::{DeviceInfo, Platform, RegisterDeviceRequest, keys};
use tether_core::{DeviceToken, DeviceTokenApi, KeyValueStore, PushProvider, SessionToken, TetherError};

/// Result of trying to register a token with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The backend accepted the token.
    Registered,
    /// No session yet; the token was parked as pending.
    Deferred,
    /// Store or backend failure. State is unchanged.
    Failed,
}

/// Owns the device token lifecycle.
///
/// None of the public operations fail: errors are logged and reported as
/// `false`, `None` or [`RegistrationOutcome::Failed`].
pub struct PushRegistrationManager {
    store: Arc<dyn KeyValueStore>,
    provider: Arc<dyn PushProvider>,
    api: Arc<dyn DeviceTokenApi>,
    platform: Platform,
    device: DeviceInfo,
}

impl PushRegistrationManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn PushProvider>,
        api: Arc<dyn DeviceTokenApi>,
        platform: Platform,
        device: DeviceInfo,
    ) -> Self {
        Self {
            store,
            provider,
            api,
            platform,
            device,
        }
    }

    /// Platform and device metadata taken from `[app]`.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn PushProvider>,
        api: Arc<dyn DeviceTokenApi>,
    ) -> Self {
        Self::new(store, provider, api, config.platform, config.device_info())
    }

    /// Asks for notification permission where the OS needs a runtime grant.
    pub async fn request_permission(&self) -> bool {
        match self.platform {
            Platform::Android => true,
            Platform::Ios => match self.provider.request_permission().await {
                Ok(granted) => {
                    info!(granted, "notification permission prompt answered");
                    granted
                }
                Err(e) => {
                    warn!(error = %e, "notification permission request failed");
                    false
                }
            },
        }
    }

    /// The device token, cached or freshly minted, synced with the backend.
    pub async fn get_token(&self) -> Option<DeviceToken> {
        let token = match self.obtain_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not obtain device token");
                return None;
            }
        };
        self.register_token_with_server(&token).await;
        Some(token)
    }

    /// Registers `token` if a session exists, parks it as pending otherwise.
    pub async fn register_token_with_server(&self, token: &DeviceToken) -> RegistrationOutcome {
        match self.session().await {
            Ok(session) => self.register_as(token, session.as_ref()).await,
            Err(e) => {
                warn!(error = %e, "could not read session token");
                RegistrationOutcome::Failed
            }
        }
    }

    /// Registers the token captured before login, or falls back to
    /// [`get_token`](Self::get_token) semantics when none was captured.
    ///
    /// Call once per successful login.
    pub async fn consume_pending_token_after_login(
        &self,
        session: &SessionToken,
    ) -> RegistrationOutcome {
        let pending = match self.store.get(keys::PENDING_DEVICE_TOKEN).await {
            Ok(pending) => pending.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read pending device token");
                return RegistrationOutcome::Failed;
            }
        };

        let Some(pending) = pending else {
            debug!("no pending device token, syncing current token");
            return match self.obtain_token().await {
                Ok(token) => self.register_as(&token, Some(session)).await,
                Err(e) => {
                    warn!(error = %e, "could not obtain device token after login");
                    RegistrationOutcome::Failed
                }
            };
        };

        let token = DeviceToken(pending);
        let outcome = self.register_as(&token, Some(session)).await;
        if outcome == RegistrationOutcome::Registered {
            if let Err(e) = self.store.set(keys::DEVICE_TOKEN, token.as_str()).await {
                warn!(error = %e, "could not persist consumed device token");
            }
            info!(token = %token.redacted(), "pending device token consumed");
        }
        outcome
    }

    /// Persists a provider-rotated token and re-registers it.
    pub async fn on_token_refresh(&self, token: &DeviceToken) -> RegistrationOutcome {
        info!(token = %token.redacted(), "device token refreshed");
        if let Err(e) = self.store.set(keys::DEVICE_TOKEN, token.as_str()).await {
            warn!(error = %e, "could not persist refreshed device token");
        }
        self.register_token_with_server(token).await
    }

    /// Logout cleanup. Unregistering is best-effort; local state is always cleared.
    pub async fn delete_token(&self) {
        let session = self.session().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not read session token during logout");
            None
        });
        let stored = self.store.get(keys::DEVICE_TOKEN).await.unwrap_or_else(|e| {
            warn!(error = %e, "could not read device token during logout");
            None
        });

        match (session, stored) {
            (Some(session), Some(token)) => {
                let token = DeviceToken(token);
                match self.api.unregister_device_token(&session, &token).await {
                    Ok(()) => info!(token = %token.redacted(), "device token unregistered"),
                    Err(e) => warn!(error = %e, "device token unregister failed, continuing logout"),
                }
            }
            _ => debug!("nothing to unregister"),
        }

        for key in [keys::DEVICE_TOKEN, keys::PENDING_DEVICE_TOKEN] {
            if let Err(e) = self.store.remove(key).await {
                warn!(key, error = %e, "could not remove stored token");
            }
        }
        if let Err(e) = self.provider.delete_token().await {
            warn!(error = %e, "push provider token invalidation failed");
        }
    }

    async fn session(&self) -> Result<Option<SessionToken>, TetherError> {
        Ok(self
            .store
            .get(keys::SESSION_TOKEN)
            .await?
            .filter(|s| !s.is_empty())
            .map(SessionToken::new))
    }

    /// The cached token, or a fresh one from the provider persisted first.
    async fn obtain_token(&self) -> Result<DeviceToken, TetherError> {
        if let Some(cached) = self.store.get(keys::DEVICE_TOKEN).await? {
            if !cached.is_empty() {
                debug!("using cached device token");
                return Ok(DeviceToken(cached));
            }
        }
        let token = self.provider.get_token().await?;
        self.store.set(keys::DEVICE_TOKEN, token.as_str()).await?;
        info!(token = %token.redacted(), "device token obtained");
        Ok(token)
    }

    async fn register_as(
        &self,
        token: &DeviceToken,
        session: Option<&SessionToken>,
    ) -> RegistrationOutcome {
        let Some(session) = session else {
            return match self.store.set(keys::PENDING_DEVICE_TOKEN, token.as_str()).await {
                Ok(()) => {
                    info!(token = %token.redacted(), "no session, device token held as pending");
                    RegistrationOutcome::Deferred
                }
                Err(e) => {
                    warn!(error = %e, "could not persist pending device token");
                    RegistrationOutcome::Failed
                }
            };
        };

        let request = RegisterDeviceRequest {
            token: token.as_str().to_string(),
            device_name: self.device.name.clone(),
            device_model: self.device.model.clone(),
        };
        match self.api.register_device_token(session, &request).await {
            Ok(()) => {
                if let Err(e) = self.store.remove(keys::PENDING_DEVICE_TOKEN).await {
                    warn!(error = %e, "could not clear pending device token");
                }
                info!(token = %token.redacted(), "device token registered");
                RegistrationOutcome::Registered
            }
            Err(e) => {
                warn!(token = %token.redacted(), error = %e, "device token registration failed");
                RegistrationOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_test_utils::{MemoryStore, MockBackend, MockPushProvider};

    struct Fixture {
        store: Arc<MemoryStore>,
        push: Arc<MockPushProvider>,
        backend: Arc<MockBackend>,
        manager: PushRegistrationManager,
    }

    fn fixture(platform: Platform, session: Option<&str>) -> Fixture {
        let store = Arc::new(match session {
            Some(s) => MemoryStore::with_entries([(keys::SESSION_TOKEN, s)]),
            None => MemoryStore::new(),
        });
        let push = Arc::new(MockPushProvider::new());
        let backend = Arc::new(MockBackend::new());
        let manager = PushRegistrationManager::new(
            store.clone(),
            push.clone(),
            backend.clone(),
            platform,
            DeviceInfo {
                name: "Kid's phone".into(),
                model: "Pixel 8".into(),
            },
        );
        Fixture {
            store,
            push,
            backend,
            manager,
        }
    }

    async fn stored(store: &MemoryStore, key: &str) -> Option<String> {
        store.get(key).await.unwrap()
    }

    #[tokio::test]
    async fn android_grants_without_prompt() {
        let f = fixture(Platform::Android, None);
        f.push.set_permission_granted(false);
        assert!(f.manager.request_permission().await);
        assert_eq!(f.push.permission_requests(), 0);
    }

    #[tokio::test]
    async fn ios_reports_prompt_denial() {
        let f = fixture(Platform::Ios, None);
        f.push.set_permission_granted(false);
        assert!(!f.manager.request_permission().await);
        assert_eq!(f.push.permission_requests(), 1);
    }

    #[tokio::test]
    async fn fresh_token_is_persisted_and_registered() {
        let f = fixture(Platform::Android, Some("sess"));
        f.push.set_token("fresh-token");

        let token = f.manager.get_token().await.unwrap();
        assert_eq!(token.as_str(), "fresh-token");
        assert_eq!(stored(&f.store, keys::DEVICE_TOKEN).await.as_deref(), Some("fresh-token"));

        let registered = f.backend.registered();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].device_name, "Kid's phone");
        assert_eq!(registered[0].device_model, "Pixel 8");
        assert_eq!(f.backend.sessions_seen(), vec!["sess"]);
    }

    #[tokio::test]
    async fn cached_token_skips_provider_but_resyncs() {
        let f = fixture(Platform::Android, Some("sess"));
        f.store.set(keys::DEVICE_TOKEN, "cached").await.unwrap();

        let token = f.manager.get_token().await.unwrap();
        assert_eq!(token.as_str(), "cached");
        assert_eq!(f.push.token_requests(), 0);
        assert_eq!(f.backend.registered_tokens(), vec!["cached"]);
    }

    #[tokio::test]
    async fn provider_failure_yields_none() {
        let f = fixture(Platform::Android, Some("sess"));
        f.push.set_token_failure(true);
        assert!(f.manager.get_token().await.is_none());
        assert!(f.backend.registered().is_empty());
    }

    #[tokio::test]
    async fn no_session_parks_token_without_backend_call() {
        let f = fixture(Platform::Android, None);
        f.push.set_token("early");

        f.manager.get_token().await.unwrap();
        assert_eq!(stored(&f.store, keys::PENDING_DEVICE_TOKEN).await.as_deref(), Some("early"));
        assert!(f.backend.registered().is_empty());
        assert!(f.backend.sessions_seen().is_empty());
    }

    #[tokio::test]
    async fn pending_token_is_consumed_after_login() {
        let f = fixture(Platform::Android, None);
        f.push.set_token("T1");
        f.manager.get_token().await;

        f.store.set(keys::SESSION_TOKEN, "S").await.unwrap();
        let outcome = f
            .manager
            .consume_pending_token_after_login(&SessionToken::new("S"))
            .await;

        assert_eq!(outcome, RegistrationOutcome::Registered);
        assert_eq!(f.backend.registered_tokens(), vec!["T1"]);
        assert_eq!(f.backend.sessions_seen(), vec!["S"]);
        assert_eq!(stored(&f.store, keys::PENDING_DEVICE_TOKEN).await, None);
        assert_eq!(stored(&f.store, keys::DEVICE_TOKEN).await.as_deref(), Some("T1"));

        // The registered token is served without asking the provider again.
        let requests = f.push.token_requests();
        f.push.set_token("T-new");
        let token = f.manager.get_token().await.unwrap();
        assert_eq!(token.as_str(), "T1");
        assert_eq!(f.push.token_requests(), requests);
    }

    #[tokio::test]
    async fn login_without_pending_falls_back_to_current_token() {
        let f = fixture(Platform::Android, None);
        f.push.set_token("T2");

        let outcome = f
            .manager
            .consume_pending_token_after_login(&SessionToken::new("S"))
            .await;
        assert_eq!(outcome, RegistrationOutcome::Registered);
        assert_eq!(f.backend.registered_tokens(), vec!["T2"]);
    }

    #[tokio::test]
    async fn failed_registration_keeps_pending_token() {
        let f = fixture(Platform::Android, None);
        f.store.set(keys::PENDING_DEVICE_TOKEN, "P").await.unwrap();
        f.backend.set_register_failure(true);

        let outcome = f
            .manager
            .consume_pending_token_after_login(&SessionToken::new("S"))
            .await;
        assert_eq!(outcome, RegistrationOutcome::Failed);
        assert_eq!(stored(&f.store, keys::PENDING_DEVICE_TOKEN).await.as_deref(), Some("P"));
        assert_eq!(stored(&f.store, keys::DEVICE_TOKEN).await, None);
    }

    #[tokio::test]
    async fn token_refresh_replaces_and_registers() {
        let f = fixture(Platform::Android, Some("sess"));
        f.store.set(keys::DEVICE_TOKEN, "old").await.unwrap();

        let outcome = f.manager.on_token_refresh(&DeviceToken("new".into())).await;
        assert_eq!(outcome, RegistrationOutcome::Registered);
        assert_eq!(stored(&f.store, keys::DEVICE_TOKEN).await.as_deref(), Some("new"));
        assert_eq!(f.backend.registered_tokens(), vec!["new"]);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn delete_token_clears_keys_even_when_unregister_fails() {
        let f = fixture(Platform::Android, Some("sess"));
        f.store.set(keys::DEVICE_TOKEN, "tok").await.unwrap();
        f.store.set(keys::PENDING_DEVICE_TOKEN, "stale").await.unwrap();
        f.backend.set_unregister_failure(true);

        f.manager.delete_token().await;

        assert_eq!(stored(&f.store, keys::DEVICE_TOKEN).await, None);
        assert_eq!(stored(&f.store, keys::PENDING_DEVICE_TOKEN).await, None);
        assert_eq!(f.push.token_deletions(), 1);
        assert!(logs_contain("unregister failed"));
    }

    #[tokio::test]
    async fn delete_token_unregisters_stored_token() {
        let f = fixture(Platform::Android, Some("sess"));
        f.store.set(keys::DEVICE_TOKEN, "tok").await.unwrap();
        f.manager.delete_token().await;
        assert_eq!(f.backend.unregistered(), vec!["tok"]);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn tokens_never_logged_in_full() {
        let f = fixture(Platform::Android, Some("sess"));
        f.push.set_token("abcdefghijklmnopqrstuvwxyz");
        f.manager.get_token().await;
        assert!(logs_contain("abcdefgh"));
        assert!(!logs_contain("abcdefghijklmnop"));
    }
}
