//! Signed-in user context.

use crate::error::{Result, WorkflowError};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
}

/// The current sign-in state.
///
/// Workflows refuse to run without a user, and every stored request is
/// owned by the user signed in when it was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already signed in as `user_id`.
    pub fn signed_in(user_id: &str) -> Result<Self> {
        let mut session = Self::new();
        session.login(user_id)?;
        Ok(session)
    }

    /// Signs in, replacing any previous user.
    pub fn login(&mut self, user_id: &str) -> Result<&User> {
        let id = user_id.trim();
        if id.is_empty() {
            return Err(WorkflowError::invalid_input("user_id").with_reason("must not be empty"));
        }
        Ok(&*self.user.insert(User { id: id.to_string() }))
    }

    /// Signs out. Returns the user who was signed in, if any.
    pub fn logout(&mut self) -> Option<User> {
        self.user.take()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// The signed-in user, or [`WorkflowError::Unauthenticated`].
    pub fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(WorkflowError::Unauthenticated)
    }
}
