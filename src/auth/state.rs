//! Authentication state trait and macro.

use super::service::AuthService;

/// Trait for state types that can authenticate bearer tokens.
pub trait HasAuthBackend {
    fn auth(&self) -> &AuthService;
}

/// Macro to implement `HasAuthBackend` for state structs with an `auth: AuthService` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub auth: AuthService,
///     // ... other fields
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn auth(&self) -> &$crate::auth::AuthService {
                &self.auth
            }
        }
    };
}
