//! Session identity seen by the dashboard.
//!
//! Authentication itself happens elsewhere; the dashboard only asks "who is
//! logged in right now?" and treats "nobody" as a quiet state, not a failure.

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    /// User id; every query is scoped to it
    pub id: String,
}

impl SessionUser {
    /// User with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Supplies the current user, if any.
pub trait SessionProvider {
    /// The logged-in user, or `None` when unauthenticated.
    fn current_user(&self) -> Option<SessionUser>;
}

impl SessionProvider for Option<SessionUser> {
    fn current_user(&self) -> Option<SessionUser> {
        self.clone()
    }
}
