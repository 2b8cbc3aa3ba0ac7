use serde::Serialize;

/// The logged-in user as seen by callers of the record store.
///
/// Built from the `currentUser` slot; `admin` is resolved once against the
/// configured admin set so handlers never consult ambient state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    pub username: String,
    pub admin: bool,
}

impl Session {
    pub fn new(username: String, admin: bool) -> Self {
        Self { username, admin }
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}
