//! Authentication user types.

use crate::jwt::Claims;

/// User resolved from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Database user ID
    pub user_id: i64,
    /// Current email from the database
    pub email: String,
    /// JWT claims from the access token
    pub claims: Claims,
}
