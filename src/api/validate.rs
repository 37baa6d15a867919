//! Request body validation.
//!
//! Every JSON body is parsed through `ValidJson`, which rejects malformed
//! JSON and runs the type's `Validate` impl before the handler sees it.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::auth::normalize_email;
use crate::password::MAX_PASSWORD_BYTES;
use crate::wire::{CreateTodo, Credentials, RefreshTokenRequest, UpdateTodo};

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_TITLE_LENGTH: usize = 500;

/// Checks and normalizes a decoded request body.
pub trait Validate: Sized {
    fn validate(self) -> Result<Self, ApiError>;
}

/// JSON body that has passed `Validate`.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::bad_request(e.body_text()))?;
        value.validate().map(ValidJson)
    }
}

/// Parse a numeric path id.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request("Invalid id"))
}

fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = normalize_email(email);

    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::bad_request("Email is too long"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ApiError::bad_request("Email must not contain whitespace"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ApiError::bad_request("Invalid email address")),
    }
}

impl Validate for Credentials {
    fn validate(self) -> Result<Self, ApiError> {
        let email = validate_email(&self.email)?;

        if self.password.is_empty() {
            return Err(ApiError::bad_request("Password is required"));
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(ApiError::bad_request("Password is too long"));
        }

        Ok(Self {
            email,
            password: self.password,
        })
    }
}

impl Validate for RefreshTokenRequest {
    fn validate(self) -> Result<Self, ApiError> {
        let refresh_token = self.refresh_token.trim().to_string();
        if refresh_token.is_empty() {
            return Err(ApiError::bad_request("Refresh token is required"));
        }
        Ok(Self { refresh_token })
    }
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::bad_request("Title is too long"));
    }
    Ok(title.to_string())
}

impl Validate for CreateTodo {
    fn validate(self) -> Result<Self, ApiError> {
        Ok(Self {
            title: validate_title(&self.title)?,
        })
    }
}

impl Validate for UpdateTodo {
    fn validate(self) -> Result<Self, ApiError> {
        if self.title.is_none() && self.completed.is_none() {
            return Err(ApiError::bad_request("Nothing to update"));
        }
        Ok(Self {
            title: self.title.as_deref().map(validate_title).transpose()?,
            completed: self.completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_email_is_normalized() {
        let creds = credentials("  Bob@Example.com ", "pw").validate().unwrap();
        assert_eq!(creds.email, "bob@example.com");
    }

    #[test]
    fn test_invalid_emails_rejected() {
        let too_long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LENGTH));
        for email in ["", "   ", "no-at-sign", "@x.com", "a@", "a@b@c", "a b@x.com", &too_long] {
            assert!(
                credentials(email, "pw").validate().is_err(),
                "accepted {email:?}"
            );
        }
    }

    #[test]
    fn test_password_bounds() {
        assert!(credentials("a@x.com", "").validate().is_err());
        assert!(credentials("a@x.com", &"p".repeat(MAX_PASSWORD_BYTES)).validate().is_ok());
        assert!(credentials("a@x.com", &"p".repeat(MAX_PASSWORD_BYTES + 1)).validate().is_err());
    }

    #[test]
    fn test_title_trimmed_and_bounded() {
        let todo = CreateTodo {
            title: "  buy milk ".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(todo.title, "buy milk");

        assert!(CreateTodo { title: " ".into() }.validate().is_err());
        assert!(
            CreateTodo {
                title: "t".repeat(MAX_TITLE_LENGTH + 1)
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_update_requires_a_field() {
        assert!(UpdateTodo::default().validate().is_err());
        assert!(
            UpdateTodo {
                completed: Some(false),
                ..Default::default()
            }
            .validate()
            .is_ok()
        );
        assert!(
            UpdateTodo {
                title: Some("".into()),
                completed: Some(true),
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_empty_refresh_token_rejected() {
        let req = RefreshTokenRequest {
            refresh_token: " ".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("").is_err());
    }
}
