//! Identity providers.
//!
//! Sign-in itself happens elsewhere; these providers only report who is
//! signed in right now.

use crate::models::Identity;
use crate::traits::IdentityProvider;

/// A fixed identity (or a fixed absence of one).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<Identity>);

impl StaticIdentity {
    pub fn signed_in(identity: Identity) -> Self {
        Self(Some(identity))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<Identity> {
        self.0.clone()
    }
}

/// Reads the session from `TRACKBACK_USER_ID` and `TRACKBACK_USER_EMAIL`.
///
/// An unset or blank user id means nobody is signed in.
#[derive(Debug, Clone, Default)]
pub struct EnvIdentity;

impl IdentityProvider for EnvIdentity {
    fn current_user(&self) -> Option<Identity> {
        let id = std::env::var("TRACKBACK_USER_ID").ok()?;
        if id.trim().is_empty() {
            return None;
        }
        Some(Identity {
            id,
            email: std::env::var("TRACKBACK_USER_EMAIL").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_identity() {
        assert!(StaticIdentity::signed_out().current_user().is_none());
        let user = StaticIdentity::signed_in(Identity::new("uid-1"))
            .current_user()
            .unwrap();
        assert_eq!(user.id, "uid-1");
    }
}
