//! Explicit session context.
//!
//! The identity provider hands over a [`Session`] on sign-in; views borrow the
//! [`SessionContext`] they were given instead of reaching for global state.
//! Profile edits are patched into the live session so derived views (the
//! navbar avatar, owner names on new listings) update without a reload.

use crate::error::ApiError;
use crate::types::{Owner, UserProfile};

/// Identity issued by the external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// Bearer token for calls made on this user's behalf.
    pub token: String,
}

impl Session {
    /// Display name, or the local part of the email when the provider gave none.
    pub fn display_name(&self) -> &str {
        match self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    /// Owner block to attach to listings created by this user.
    pub fn as_owner(&self) -> Owner {
        Owner {
            owner_email: self.email.clone(),
            owner_name: self.display_name().to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the session delivered by the identity-provider callback,
    /// replacing any previous one.
    pub fn sign_in(&mut self, session: Session) {
        tracing::info!(email = %session.email, "signed in");
        self.current = Some(session);
    }

    /// Tears the session down. Returns the session that was active, if any.
    pub fn sign_out(&mut self) -> Option<Session> {
        let previous = self.current.take();
        if let Some(session) = &previous {
            tracing::info!(email = %session.email, "signed out");
        }
        previous
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    /// The session for ownership-scoped calls.
    pub fn actor(&self) -> Result<&Session, ApiError> {
        self.current.as_ref().ok_or(ApiError::NotSignedIn)
    }

    /// Patches the fields a profile edit may have changed. A profile for a
    /// different user is ignored.
    pub fn apply_profile(&mut self, profile: &UserProfile) -> bool {
        let Some(session) = self.current.as_mut() else {
            return false;
        };
        if session.email != profile.email {
            return false;
        }
        session.display_name = Some(profile.name.clone()).filter(|n| !n.is_empty());
        session.photo_url = Some(profile.photo_url.clone()).filter(|p| !p.is_empty());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(name: Option<&str>) -> Session {
        Session {
            email: "rahim@example.com".to_string(),
            display_name: name.map(str::to_string),
            photo_url: None,
            token: "dev-token".to_string(),
        }
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        assert_eq!(session(None).display_name(), "rahim");
        assert_eq!(session(Some(" ")).display_name(), "rahim");
        assert_eq!(session(Some("Rahim Uddin")).display_name(), "Rahim Uddin");
    }

    #[test]
    fn lifecycle() {
        let mut ctx = SessionContext::new();
        assert!(matches!(ctx.actor(), Err(ApiError::NotSignedIn)));

        ctx.sign_in(session(None));
        assert!(ctx.is_signed_in());
        assert_eq!(ctx.actor().unwrap().email, "rahim@example.com");

        let previous = ctx.sign_out().unwrap();
        assert_eq!(previous.email, "rahim@example.com");
        assert!(ctx.current().is_none());
        assert!(ctx.sign_out().is_none());
    }

    #[test]
    fn profile_edits_patch_the_live_session() {
        let mut ctx = SessionContext::new();
        ctx.sign_in(session(None));

        let mut profile = UserProfile::bootstrap("rahim@example.com", "Rahim", None);
        profile.photo_url = "https://i.ibb.co/r.png".to_string();
        assert!(ctx.apply_profile(&profile));

        let current = ctx.current().unwrap();
        assert_eq!(current.display_name(), "Rahim");
        assert_eq!(current.photo_url.as_deref(), Some("https://i.ibb.co/r.png"));
        assert_eq!(current.as_owner().owner_name, "Rahim");
    }

    #[test]
    fn foreign_profile_is_ignored() {
        let mut ctx = SessionContext::new();
        ctx.sign_in(session(Some("Rahim")));
        let other = UserProfile::bootstrap("karim@example.com", "Karim", None);
        assert!(!ctx.apply_profile(&other));
        assert_eq!(ctx.current().unwrap().display_name(), "Rahim");
    }
}
