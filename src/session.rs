// MIT License - Copyright (c) 2026 Peter Wright
// Panel session lifecycle

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::client::AlarmClient;
use crate::clock::Clock;
use crate::error::{BridgeError, Result};

/// Default age after which a session token is discarded.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
struct Session {
    token: String,
    last_login: Instant,
}

/// Owns the panel session token and decides when to reuse or renew it.
///
/// The lock is only held while reading or writing the cached session, never
/// across a call to the panel. Two callers that both find the token stale
/// will therefore both log in again; the panel tolerates the duplicate.
pub struct SessionManager {
    client: Arc<dyn AlarmClient>,
    code: String,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    session: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(
        client: Arc<dyn AlarmClient>,
        code: impl Into<String>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            code: code.into(),
            timeout,
            clock,
            session: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return a token young enough to use, logging in again if needed.
    pub async fn ensure_session(&self) -> Result<String> {
        let stale_token = {
            let session = self.session.lock().await;
            match session.as_ref() {
                Some(s) if self.elapsed_since(s.last_login) <= self.timeout => {
                    return Ok(s.token.clone());
                }
                Some(s) => Some(s.token.clone()),
                None => None,
            }
        };

        if let Some(token) = stale_token {
            debug!("Session token expired, logging out before renewing");
            if let Err(e) = self.client.logout(&token).await {
                debug!("Logout of expired session failed (ignored): {}", e);
            }
            let mut session = self.session.lock().await;
            if session.as_ref().is_some_and(|s| s.token == token) {
                *session = None;
            }
        }

        let token = self.client.login(&self.code).await.map_err(|e| match e {
            BridgeError::Auth { .. } => e,
            other => BridgeError::auth(other.to_string()),
        })?;
        info!("Logged in to alarm panel");

        *self.session.lock().await = Some(Session {
            token: token.clone(),
            last_login: self.clock.now(),
        });
        Ok(token)
    }

    /// Drop the cached token so the next call is forced to log in.
    pub async fn invalidate(&self) {
        *self.session.lock().await = None;
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Run `op` with a valid token.
    ///
    /// Any failure, whether obtaining the token or inside `op`, invalidates
    /// the cached session before the error is returned.
    pub async fn with_session<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let result = match self.ensure_session().await {
            Ok(token) => op(token).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!("Error during {}: {}", operation, e);
            self.invalidate().await;
        }
        result
    }

    fn elapsed_since(&self, last_login: Instant) -> Duration {
        self.clock.now().saturating_duration_since(last_login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::devices::{Area, AreaDesc, Zone, ZoneDesc};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingClient {
        logins: AtomicU32,
        logouts: AtomicU32,
        fail_login: bool,
        fail_logout: bool,
    }

    #[async_trait]
    impl AlarmClient for CountingClient {
        async fn login(&self, _code: &str) -> Result<String> {
            if self.fail_login {
                return Err(BridgeError::communication("login", "unreachable"));
            }
            let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("uid-{n}"))
        }
        async fn logout(&self, _token: &str) -> Result<()> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            if self.fail_logout {
                return Err(BridgeError::communication("logout", "reset"));
            }
            Ok(())
        }
        async fn area_descriptions(&self, _token: &str) -> Result<Vec<AreaDesc>> {
            Ok(Vec::new())
        }
        async fn zone_descriptions(&self, _token: &str) -> Result<Vec<ZoneDesc>> {
            Ok(Vec::new())
        }
        async fn find_active_areas(
            &self,
            _token: &str,
            _areas: Option<&[AreaDesc]>,
        ) -> Result<Vec<Area>> {
            Ok(Vec::new())
        }
        async fn zone_status(&self, _token: &str, _zones: Option<&[ZoneDesc]>) -> Result<Vec<Zone>> {
            Ok(Vec::new())
        }
        async fn arm(&self, _: &str, _: u32, _: bool, _: Option<&str>) -> Result<()> {
            Ok(())
        }
        async fn disarm(&self, _: &str, _: u32) -> Result<()> {
            Ok(())
        }
        async fn include_zone(&self, _: &str, _: u32) -> Result<()> {
            Ok(())
        }
        async fn exclude_zone(&self, _: &str, _: u32) -> Result<()> {
            Ok(())
        }
    }

    fn manager(client: Arc<CountingClient>, clock: Arc<ManualClock>) -> SessionManager {
        SessionManager::new(client, "1234", DEFAULT_LOGIN_TIMEOUT, clock)
    }

    #[tokio::test]
    async fn test_token_reused_within_timeout() {
        let client = Arc::new(CountingClient::default());
        let clock = Arc::new(ManualClock::new());
        let sessions = manager(client.clone(), clock.clone());

        let first = sessions.ensure_session().await.unwrap();
        clock.advance(Duration::from_secs(10));
        let second = sessions.ensure_session().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.logins.load(Ordering::SeqCst), 1);
        assert_eq!(client.logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_token_logs_out_then_in() {
        let client = Arc::new(CountingClient::default());
        let clock = Arc::new(ManualClock::new());
        let sessions = manager(client.clone(), clock.clone());

        let first = sessions.ensure_session().await.unwrap();
        clock.advance(Duration::from_secs(16));
        let second = sessions.ensure_session().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(client.logouts.load(Ordering::SeqCst), 1);
        assert_eq!(client.logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_logout_failure_is_ignored() {
        let client = Arc::new(CountingClient {
            fail_logout: true,
            ..Default::default()
        });
        let clock = Arc::new(ManualClock::new());
        let sessions = manager(client.clone(), clock.clone());

        sessions.ensure_session().await.unwrap();
        clock.advance(Duration::from_secs(30));
        assert_eq!(sessions.ensure_session().await.unwrap(), "uid-2");
    }

    #[tokio::test]
    async fn test_login_failure_maps_to_auth_error() {
        let client = Arc::new(CountingClient {
            fail_login: true,
            ..Default::default()
        });
        let sessions = manager(client, Arc::new(ManualClock::new()));

        let err = sessions.ensure_session().await.unwrap_err();
        assert!(matches!(err, BridgeError::Auth { .. }));
        assert!(!sessions.has_session().await);
    }

    #[tokio::test]
    async fn test_failed_operation_invalidates_session() {
        let client = Arc::new(CountingClient::default());
        let sessions = manager(client.clone(), Arc::new(ManualClock::new()));

        let result: Result<()> = sessions
            .with_session("fetch areas", |_token| async {
                Err(BridgeError::communication("fetch areas", "timeout"))
            })
            .await;
        assert!(result.is_err());
        assert!(!sessions.has_session().await);

        // Invalidated, not expired: no logout, just a fresh login.
        sessions.ensure_session().await.unwrap();
        assert_eq!(client.logins.load(Ordering::SeqCst), 2);
        assert_eq!(client.logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_operation_keeps_session() {
        let client = Arc::new(CountingClient::default());
        let sessions = manager(client.clone(), Arc::new(ManualClock::new()));

        let token = sessions
            .with_session("fetch zones", |token| async move { Ok(token) })
            .await
            .unwrap();
        assert_eq!(token, "uid-1");
        assert!(sessions.has_session().await);
    }
}
