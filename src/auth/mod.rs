pub mod rate_limit;
pub mod session;
pub mod token;

use chrono::Duration;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::database::SessionStore;
use crate::services::ServiceError;
use crate::types::is_approver;

pub use rate_limit::{InMemoryRateLimiter, RateLimiter};
pub use session::Session;

/// Who is knocking: the limiter key plus what gets recorded on the session
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn rate_limit_key(&self) -> &str {
        self.ip_address.as_deref().unwrap_or("unknown")
    }
}

/// Issues, validates and revokes editor sessions
#[derive(Clone)]
pub struct Authenticator {
    sessions: Arc<dyn SessionStore>,
    limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn Clock>,
    password: String,
    session_lifetime: Duration,
}

impl Authenticator {
    pub fn new(
        config: &AuthConfig,
        sessions: Arc<dyn SessionStore>,
        limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            limiter,
            clock,
            password: config.edit_password.clone(),
            session_lifetime: config.session_lifetime(),
        }
    }

    /// Check the shared password for an allow-listed approver and open a session.
    ///
    /// The limiter sees every attempt for a known name, so the sixth attempt
    /// inside the window is refused even with the right password.
    pub async fn login(
        &self,
        user_name: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<Session, ServiceError> {
        if !is_approver(user_name) {
            return Err(ServiceError::BadRequest("Invalid user name".to_string()));
        }

        let now = self.clock.now();
        if !self.limiter.check_and_record(client.rate_limit_key(), now) {
            tracing::warn!("Login rate limit hit for client {}", client.rate_limit_key());
            return Err(ServiceError::RateLimited);
        }

        if self.password.is_empty() {
            tracing::error!("Login refused: FINANCE_EDIT_PASSWORD is not configured");
            return Err(ServiceError::NotConfigured("Editing is not configured on this server"));
        }

        if !constant_time_eq(password.as_bytes(), self.password.as_bytes()) {
            tracing::warn!("Invalid password for '{}' from {}", user_name, client.rate_limit_key());
            return Err(ServiceError::Unauthorized("Invalid password".to_string()));
        }

        let session = Session::issue(
            token::generate_session_token(),
            user_name,
            now,
            self.session_lifetime,
            client.ip_address.clone(),
            client.user_agent.clone(),
        );
        self.sessions.insert_session(&session).await.map_err(|e| {
            tracing::error!("Failed to store session for '{}': {}", user_name, e);
            ServiceError::from(e)
        })?;

        tracing::info!("Session issued for '{}' until {}", user_name, session.expires_at);
        self.spawn_sweep();
        Ok(session)
    }

    /// Resolve a token to its live session and record the activity.
    /// `expires_at` is never extended.
    pub async fn validate(&self, token: &str) -> Result<Session, ServiceError> {
        let now = self.clock.now();
        let session = self
            .sessions
            .find_session(token)
            .await?
            .filter(|s| !s.is_expired(now))
            .ok_or_else(|| ServiceError::Unauthorized("Invalid or expired session".to_string()))?;

        if let Err(e) = self.sessions.touch_session(token, now).await {
            tracing::warn!("Failed to update session activity: {}", e);
        }
        Ok(session)
    }

    /// Gate for every mutating operation: the acting user behind a token
    pub async fn require_user(&self, token: Option<&str>) -> Result<String, ServiceError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ServiceError::Unauthorized("Session token is required".to_string()))?;
        Ok(self.validate(token).await?.user_name)
    }

    /// Idempotent: revoking an unknown token succeeds
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.sessions.delete_session(token).await?;
        Ok(())
    }

    pub async fn sweep_expired(&self) -> Result<u64, ServiceError> {
        Ok(self.sessions.delete_expired_sessions(self.clock.now()).await?)
    }

    /// Best-effort cleanup after a login; never blocks the response
    fn spawn_sweep(&self) {
        let sessions = self.sessions.clone();
        let now = self.clock.now();
        tokio::spawn(async move {
            match sessions.delete_expired_sessions(now).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Swept {} expired sessions", n),
                Err(e) => tracing::warn!("Error cleaning up sessions: {}", e),
            }
        });
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
