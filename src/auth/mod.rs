//! Bearer-token authentication.
//!
//! Dual-token system: short-lived access tokens (1 hour, stateless) and
//! long-lived refresh tokens (30 days, one stored per user). Protected
//! endpoints take the `Auth` extractor; clients refresh expired access
//! tokens themselves through `/auth/refresh-token`.

mod bearer;
mod errors;
mod extractors;
mod service;
mod state;
mod types;

pub use bearer::{BEARER_SCHEME, bearer_header_value, get_bearer_token};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::Auth;
pub use service::{AuthService, AuthServiceError, normalize_email};
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;
