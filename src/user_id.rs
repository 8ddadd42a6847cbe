//! A validated identifier for the user whose data is generated and stored.

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// The maximum number of characters in a user ID.
const MAX_LENGTH: usize = 128;

/// An opaque user identifier that is safe to use as a storage key.
///
/// A user ID contains between 1 and 128 ASCII letters, digits, underscores or
/// hyphens. This means it can never name a parent directory or contain a
/// path separator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Validate `raw` and wrap it as a user ID.
    ///
    /// # Errors
    /// Returns [Error::InvalidUserId] if `raw` is empty, too long or contains
    /// a disallowed character.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let is_valid = !raw.is_empty()
            && raw.len() <= MAX_LENGTH
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if is_valid {
            Ok(Self(raw.to_owned()))
        } else {
            Err(Error::InvalidUserId(raw.to_owned()))
        }
    }

    /// Derive a user ID from an email address by replacing '@' and '.' with
    /// underscores, e.g. "jo.bloggs@example.com" becomes "jo_bloggs_example_com".
    ///
    /// # Errors
    /// Returns [Error::InvalidUserId] if the derived ID is not valid.
    pub fn from_email(email: &str) -> Result<Self, Error> {
        let derived = email.trim().replace(['@', '.'], "_");
        Self::new(&derived)
    }

    /// Resolve the user a request is for from either an explicit user ID or
    /// an email address, see [UserId::from_email].
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if neither or both are given, or
    /// [Error::InvalidUserId] if the resulting ID is not valid.
    pub fn from_id_or_email(user_id: Option<&str>, email: Option<&str>) -> Result<Self, Error> {
        match (user_id, email) {
            (Some(user_id), None) => Self::new(user_id),
            (None, Some(email)) => Self::from_email(email),
            (Some(_), Some(_)) => Err(Error::InvalidArgument(
                "give either a user ID or an email address, not both".to_owned(),
            )),
            (None, None) => Err(Error::InvalidArgument(
                "a user ID or an email address is required".to_owned(),
            )),
        }
    }

    /// The user ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        UserId::new(&raw).map_err(serde::de::Error::custom)
    }
}
