//! Authentication user types.

use crate::db::User;
use crate::jwt::Claims;
use crate::policy::Principal;

/// A verified caller. `user` is re-read from the store on every request, so
/// role and activation changes apply without waiting for token expiry.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Claims from the access token
    pub claims: Claims,
    pub user: User,
}

impl AuthenticatedUser {
    pub fn principal(&self) -> Principal {
        Principal::User {
            id: self.user.id,
            role: self.user.role,
        }
    }
}
