use serde::{Deserialize, Serialize};
use std::fmt;

/// An authenticated user, identified by the auth provider's uid.
///
/// The uid becomes the last segment of the user's document path, so it must
/// be non-empty and must not contain a path separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("user id cannot be empty")]
    Empty,
    #[error("user id '{0}' cannot contain '/'")]
    InvalidCharacter(String),
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Result<Self, IdentityError> {
        let uid = uid.into();
        let trimmed = uid.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        if trimmed.contains('/') {
            return Err(IdentityError::InvalidCharacter(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn uid(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identity::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}
