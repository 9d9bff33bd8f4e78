//! Entity repositories: typed wrappers around the record store, one per
//! collection. Each owns its key name, submission validation, default
//! fields, and the read-modify-write cycles for toggles.

pub mod community;
pub mod emergency;
pub mod events;
pub mod lostfound;
pub mod reports;
pub mod transport;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RepoError {
    /// User input fails the entity's minimum-content rule; nothing is written
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RepoError>;

/// Generate a fresh opaque record id
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trim a required text field and check its minimum length
pub(crate) fn require_min(
    value: &str,
    min: usize,
    message: &str,
) -> std::result::Result<String, RepoError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < min {
        return Err(RepoError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, dropping it entirely when blank
pub(crate) fn trim_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Cap a photo list at the entity's bound. Enforced here, at the write
/// boundary, never at render time.
pub(crate) fn truncate_photos(mut photos: Vec<String>, max: usize) -> Vec<String> {
    photos.truncate(max);
    photos
}

/// Build the stored contact record. Opting into contact sharing requires at
/// least one of email/phone; without the opt-in the details are dropped.
pub(crate) fn build_contact(
    allow_contact: bool,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> std::result::Result<crate::models::ContactInfo, RepoError> {
    if !allow_contact {
        return Ok(crate::models::ContactInfo {
            allow_contact: false,
            name: None,
            email: None,
            phone: None,
        });
    }
    let email = trim_opt(email);
    let phone = trim_opt(phone);
    if email.is_none() && phone.is_none() {
        return Err(RepoError::Validation(
            "Provide an email or phone if you allow contact.".to_string(),
        ));
    }
    Ok(crate::models::ContactInfo {
        allow_contact: true,
        name: trim_opt(name),
        email,
        phone,
    })
}
