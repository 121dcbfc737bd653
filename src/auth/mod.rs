//! JWT authentication.
//!
//! Dual-token system: short-lived access tokens (5 min, stateless) sent as
//! `Authorization: Bearer`, and long-lived refresh tokens (14 days,
//! database-tracked) exchanged explicitly for new access tokens.

mod bearer;
mod errors;
mod extractors;
mod session;
mod state;
mod types;

pub use bearer::{ACCESS_COOKIE_NAME, access_credential, bearer_token, get_cookie};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::{Auth, OptionalAuth};
pub use session::{
    RefreshedAccess, SessionTokens, issue_session, refresh_session, revoke_session,
};
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;
