use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::modules::memstore::Clock;

#[derive(Debug, Clone)]
struct CsrfSession {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Token handed to a client together with the session it is bound to
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub session_id: String,
    pub token: String,
    /// True when the session did not exist and the cookie must be set
    pub new_session: bool,
}

/// Per-session CSRF tokens for mutating requests.
///
/// A fresh session lives for an hour. The first accepted mutation extends it
/// to a day. At most `MAX_SESSIONS` are held; the soonest-expiring session is
/// evicted to make room.
pub struct CsrfService {
    sessions: Mutex<HashMap<String, CsrfSession>>,
    enabled: bool,
    unconfirmed_ttl: Duration,
    confirmed_ttl: Duration,
    max_sessions: usize,
    clock: Arc<dyn Clock>,
}

impl CsrfService {
    const UNCONFIRMED_TTL_MINUTES: i64 = 60;
    const CONFIRMED_TTL_HOURS: i64 = 24;
    const MAX_SESSIONS: usize = 10_000;

    pub fn with_clock(enabled: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            enabled,
            unconfirmed_ttl: Duration::minutes(Self::UNCONFIRMED_TTL_MINUTES),
            confirmed_ttl: Duration::hours(Self::CONFIRMED_TTL_HOURS),
            max_sessions: Self::MAX_SESSIONS,
            clock,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// POST, PUT, DELETE and PATCH must carry a token
    pub fn requires_check(method: &Method) -> bool {
        matches!(
            *method,
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH
        )
    }

    /// Return the token for an existing live session, or open a new session
    pub async fn issue(&self, session_id: Option<&str>) -> IssuedToken {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;

        if let Some(id) = session_id {
            if let Some(session) = sessions.get(id).filter(|s| now <= s.expires_at) {
                return IssuedToken {
                    session_id: id.to_string(),
                    token: session.token.clone(),
                    new_session: false,
                };
            }
        }

        if sessions.len() >= self.max_sessions {
            sessions.retain(|_, session| now <= session.expires_at);
        }
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.expires_at)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                debug!("Evicted CSRF session at capacity");
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        sessions.insert(
            id.clone(),
            CsrfSession {
                token: token.clone(),
                expires_at: now + self.unconfirmed_ttl,
            },
        );
        debug!("Opened CSRF session");

        IssuedToken {
            session_id: id,
            token,
            new_session: true,
        }
    }

    /// Check a presented token against the session's token. An accepted
    /// token extends the session to the confirmed lifetime.
    pub async fn verify(&self, session_id: Option<&str>, presented: Option<&str>) -> Result<()> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;

        let session = session_id
            .and_then(|id| sessions.get_mut(id))
            .filter(|session| now <= session.expires_at);
        let has_session = session.is_some();

        let confirmed = match (session, presented) {
            (Some(session), Some(presented))
                if bool::from(session.token.as_bytes().ct_eq(presented.as_bytes())) =>
            {
                session.expires_at = now + self.confirmed_ttl;
                true
            }
            _ => false,
        };

        if confirmed {
            Ok(())
        } else {
            warn!(
                has_session,
                has_token = presented.is_some(),
                "CSRF token validation failed"
            );
            Err(AppError::Forbidden(
                "CSRF token validation failed".to_string(),
            ))
        }
    }

    /// Drop sessions past their lifetime. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| now <= session.expires_at);
        before - sessions.len()
    }
}
