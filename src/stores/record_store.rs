use crate::core::error::StoreError;
use crate::models::application::{Application, ApplicationFields, Verdict};
use crate::models::session::Session;
use crate::models::user::User;
use crate::security::admin_policy::AdminPolicy;
use crate::stores::kv::KvStore;
use crate::utils::auth::passwords_match;
use crate::utils::time::submitted_at_now;
use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Slot names for the three persisted values
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub users: String,
    pub applications: String,
    pub current_user: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            users: format!("{}users", prefix),
            applications: format!("{}applications", prefix),
            current_user: format!("{}currentUser", prefix),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

/// Users, applications and the session pointer on top of a [`KvStore`].
///
/// Collections are read and written whole. Every mutating operation,
/// session pointer writes included, holds the writer lock across its
/// read-modify-write, so concurrent callers cannot lose each other's updates.
pub struct RecordStore<K> {
    kv: K,
    keys: StorageKeys,
    admins: AdminPolicy,
    writer: Mutex<()>,
}

impl<K: KvStore> RecordStore<K> {
    pub fn new(kv: K, keys: StorageKeys, admins: AdminPolicy) -> Self {
        Self {
            kv,
            keys,
            admins,
            writer: Mutex::new(()),
        }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn admins(&self) -> &AdminPolicy {
        &self.admins
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        match self.kv.get(key)? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)
            .with_context(|| format!("Failed to serialize '{}'", key))?;
        self.kv.set(key, &raw)?;
        Ok(())
    }

    pub fn load_users(&self) -> Result<Vec<User>, StoreError> {
        self.load_list(&self.keys.users)
    }

    pub fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        let _guard = self.write_lock();
        self.save_list(&self.keys.users, users)
    }

    pub fn load_applications(&self) -> Result<Vec<Application>, StoreError> {
        self.load_list(&self.keys.applications)
    }

    pub fn save_applications(&self, applications: &[Application]) -> Result<(), StoreError> {
        let _guard = self.write_lock();
        self.save_list(&self.keys.applications, applications)
    }

    /// Username held by the session pointer. An empty slot counts as logged out.
    pub fn current_user(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .kv
            .get(&self.keys.current_user)?
            .filter(|name| !name.is_empty()))
    }

    pub fn set_current_user(&self, username: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock();
        self.write_current_user(username)
    }

    pub fn clear_current_user(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock();
        self.kv.remove(&self.keys.current_user)?;
        Ok(())
    }

    // Callers hold the writer lock
    fn write_current_user(&self, username: &str) -> Result<(), StoreError> {
        self.kv.set(&self.keys.current_user, username)?;
        Ok(())
    }

    pub fn is_admin(&self) -> Result<bool, StoreError> {
        Ok(self
            .current_user()?
            .is_some_and(|name| self.admins.is_admin(&name)))
    }

    /// The current session, with its admin flag resolved
    pub fn session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.current_user()?.map(|name| {
            let admin = self.admins.is_admin(&name);
            Session::new(name, admin)
        }))
    }

    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<(), StoreError> {
        for (field, value) in [("username", username), ("email", email), ("password", password)] {
            if value.is_empty() {
                return Err(StoreError::MissingField(field));
            }
        }

        let _guard = self.write_lock();
        let mut users = self.load_users()?;

        if users.iter().any(|user| user.has_username(username)) {
            debug!(username = %username, "Registration rejected, username taken");
            return Err(StoreError::AlreadyExists);
        }

        users.push(User::new(
            username.to_string(),
            email.to_string(),
            password.to_string(),
        ));
        self.save_list(&self.keys.users, &users)?;

        info!(username = %username, users = users.len(), "User registered");
        Ok(())
    }

    /// Check credentials and point the session at the stored username.
    ///
    /// The name matches case-insensitively, the password byte-for-byte.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let _guard = self.write_lock();
        let user = self
            .load_users()?
            .into_iter()
            .find(|user| user.has_username(username) && passwords_match(password, &user.password))
            .ok_or(StoreError::InvalidCredentials)?;

        self.write_current_user(&user.username)?;

        info!(
            username = %user.username,
            admin = self.admins.is_admin(&user.username),
            "User logged in"
        );
        Ok(user)
    }

    /// Append a pending application owned by `current_user`.
    ///
    /// Ownership is matched exactly; the session always carries the
    /// canonical-case name written by [`Self::authenticate`].
    pub fn submit_application(
        &self,
        current_user: Option<&str>,
        fields: ApplicationFields,
    ) -> Result<Application, StoreError> {
        let username = current_user
            .filter(|name| !name.is_empty())
            .ok_or(StoreError::NotAuthenticated)?;

        if let Some(field) = fields.first_missing() {
            return Err(StoreError::MissingField(field));
        }

        let _guard = self.write_lock();
        let mut applications = self.load_applications()?;

        if applications.iter().any(|app| app.username == username) {
            debug!(username = %username, "Duplicate application rejected");
            return Err(StoreError::DuplicateApplication);
        }

        let application = Application::new(username.to_string(), fields, submitted_at_now());
        applications.push(application.clone());
        self.save_list(&self.keys.applications, &applications)?;

        info!(
            username = %username,
            mc_username = %application.mc_username,
            index = applications.len() - 1,
            "Application submitted"
        );
        Ok(application)
    }

    /// Move a pending application to accepted or rejected
    pub fn set_application_status(
        &self,
        index: usize,
        verdict: Verdict,
    ) -> Result<Application, StoreError> {
        let _guard = self.write_lock();
        let mut applications = self.load_applications()?;
        let len = applications.len();

        let application = applications
            .get_mut(index)
            .ok_or(StoreError::OutOfRange { index, len })?;

        if !application.is_pending() {
            return Err(StoreError::NotPending(application.status));
        }

        application.status = verdict.into();
        let updated = application.clone();
        self.save_list(&self.keys.applications, &applications)?;

        info!(
            index = index,
            username = %updated.username,
            status = %updated.status,
            "Application reviewed"
        );
        Ok(updated)
    }

    /// Remove the application at `index` whatever its status.
    ///
    /// Later records shift down, so a stale index may now be out of range.
    pub fn delete_application(&self, index: usize) -> Result<Application, StoreError> {
        let _guard = self.write_lock();
        let mut applications = self.load_applications()?;
        let len = applications.len();

        if index >= len {
            return Err(StoreError::OutOfRange { index, len });
        }

        let removed = applications.remove(index);
        self.save_list(&self.keys.applications, &applications)?;

        info!(
            index = index,
            username = %removed.username,
            status = %removed.status,
            remaining = applications.len(),
            "Application deleted"
        );
        Ok(removed)
    }
}
