use serde::{Deserialize, Serialize};

/// A registered account, persisted as one element of the `users` slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name, unique across users when compared case-insensitively
    pub username: String,
    pub email: String,
    /// Stored and compared verbatim
    pub password: String,
}

impl User {
    pub fn new(username: String, email: String, password: String) -> Self {
        Self {
            username,
            email,
            password,
        }
    }

    /// Case-insensitive username comparison used by registration and login
    pub fn has_username(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.to_lowercase()
    }
}
