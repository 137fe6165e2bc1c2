//! Session identity from environment variables.
//!
//! The dashboard binary has no login flow of its own; it trusts whatever user id
//! the host put in `DASHBOARD_USER_ID` (usually via `.env`).

use crate::core::session::{SessionProvider, SessionUser};

/// Environment variable holding the authenticated user id.
pub const USER_ID_VAR: &str = "DASHBOARD_USER_ID";

/// Session provider backed by process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSession;

impl SessionProvider for EnvSession {
    fn current_user(&self) -> Option<SessionUser> {
        let id = std::env::var(USER_ID_VAR).ok()?;
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        Some(SessionUser::new(id))
    }
}
