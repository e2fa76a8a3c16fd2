use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A time-bounded authorization granted to one of the approvers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Session {
    pub fn issue(
        token: String,
        user_name: &str,
        now: DateTime<Utc>,
        lifetime: Duration,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            token,
            user_name: user_name.to_string(),
            created_at: now,
            expires_at: now + lifetime,
            last_activity: now,
            ip_address,
            user_agent,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
