//! User directory and login session.
//!
//! Both live behind small traits so the app can run against memory (tests) or
//! the JSON files in the data directory. Storage failures never surface to the
//! user: they are logged and the state degrades to empty.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::JsonStore;
use crate::{CatProfile, KittyError, Result, User};

pub const USERS_KEY: &str = "kitty_mock_users_v1";
pub const SESSION_KEY: &str = "kitty_user_session_v1";

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// One registered account as stored in the directory file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub cats: Vec<CatProfile>,
}

impl UserRecord {
    pub fn to_user(&self) -> User {
        User {
            id: self.username.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            cats: self.cats.clone(),
        }
    }
}

pub trait UserRepository {
    fn load(&self) -> Vec<UserRecord>;
    fn save(&mut self, users: &[UserRecord]);
}

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: Vec<UserRecord>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryUserRepository {
    fn load(&self) -> Vec<UserRecord> {
        self.users.clone()
    }

    fn save(&mut self, users: &[UserRecord]) {
        self.users = users.to_vec();
    }
}

#[derive(Debug, Clone)]
pub struct FileUserRepository {
    store: JsonStore,
}

impl FileUserRepository {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }
}

impl UserRepository for FileUserRepository {
    fn load(&self) -> Vec<UserRecord> {
        self.store.read(USERS_KEY).unwrap_or_default()
    }

    fn save(&mut self, users: &[UserRecord]) {
        if let Err(e) = self.store.write(USERS_KEY, users) {
            warn!(error = %e, "failed to persist user directory");
        }
    }
}

/// Sign-up form input.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<()> {
        if self.username.chars().count() < MIN_USERNAME_LEN {
            return Err(KittyError::UsernameTooShort);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(KittyError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(KittyError::PasswordMismatch);
        }
        if self.email.trim().is_empty() {
            return Err(KittyError::MissingEmail);
        }
        Ok(())
    }
}

/// All registered accounts, loaded once and written back after every change.
pub struct UserDirectory<R> {
    repo: R,
    users: Vec<UserRecord>,
}

impl<R: UserRepository> UserDirectory<R> {
    pub fn new(repo: R) -> Self {
        let users = repo.load();
        Self { repo, users }
    }

    pub fn register(&mut self, registration: &Registration) -> Result<User> {
        registration.validate()?;
        let email = registration.email.trim();
        let taken = self
            .users
            .iter()
            .any(|u| u.username == registration.username || u.email == email);
        if taken {
            return Err(KittyError::DuplicateAccount);
        }

        let record = UserRecord {
            email: email.to_string(),
            username: registration.username.clone(),
            password: registration.password.clone(),
            cats: vec![],
        };
        let user = record.to_user();
        self.users.push(record);
        self.repo.save(&self.users);
        info!(username = %user.username, "registered account");
        Ok(user)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        if username.is_empty() || password.is_empty() {
            return Err(KittyError::MissingCredentials);
        }
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(UserRecord::to_user)
            .ok_or(KittyError::InvalidCredentials)
    }

    /// Replace the cats owned by `username`.
    pub fn set_cats(&mut self, username: &str, cats: Vec<CatProfile>) -> Result<()> {
        let record = self
            .users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| KittyError::UnknownUser(username.to_string()))?;
        record.cats = cats;
        self.repo.save(&self.users);
        Ok(())
    }

    pub fn find(&self, username: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Where the logged-in user's snapshot is kept between runs.
pub trait SessionStore {
    fn load(&self) -> Option<User>;
    /// `None` means logged out.
    fn save(&mut self, user: Option<&User>);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user: Option<User>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<User> {
        self.user.clone()
    }

    fn save(&mut self, user: Option<&User>) {
        self.user = user.cloned();
    }
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    store: JsonStore,
}

impl FileSessionStore {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<User> {
        self.store.read(SESSION_KEY)
    }

    fn save(&mut self, user: Option<&User>) {
        let result = match user {
            Some(user) => self.store.write(SESSION_KEY, user),
            None => self.store.remove(SESSION_KEY),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registration(email: &str, username: &str, password: &str, confirm: &str) -> Registration {
        Registration {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn alice() -> Registration {
        registration("alice@x.com", "alice", "secret1", "secret1")
    }

    #[rstest]
    #[case(registration("a@x.com", "al", "secret1", "secret1"), "Username must be at least 3 characters")]
    #[case(registration("a@x.com", "alice", "short", "short"), "Password must be at least 6 characters")]
    #[case(registration("a@x.com", "alice", "secret1", "secret2"), "Passwords do not match")]
    #[case(registration("  ", "alice", "secret1", "secret1"), "Please enter an email address")]
    fn test_registration_is_validated(#[case] input: Registration, #[case] message: &str) {
        let mut directory = UserDirectory::new(MemoryUserRepository::new());
        let err = directory.register(&input).unwrap_err();
        assert_eq!(err.to_string(), message);
        assert!(directory.is_empty());
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let mut directory = UserDirectory::new(MemoryUserRepository::new());
        let user = directory.register(&alice()).unwrap();
        assert_eq!(user.id, "alice");
        assert!(user.cats.is_empty());

        assert!(matches!(directory.register(&alice()), Err(KittyError::DuplicateAccount)));
        // same email under another name is also taken
        let other = registration("alice@x.com", "alicia", "secret1", "secret1");
        assert!(matches!(directory.register(&other), Err(KittyError::DuplicateAccount)));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_login() {
        let mut directory = UserDirectory::new(MemoryUserRepository::new());
        directory.register(&alice()).unwrap();

        assert_eq!(directory.login("alice", "secret1").unwrap().email, "alice@x.com");
        assert!(matches!(directory.login("alice", "nope!!"), Err(KittyError::InvalidCredentials)));
        assert!(matches!(directory.login("", "secret1"), Err(KittyError::MissingCredentials)));
    }

    #[test]
    fn test_set_cats_persists_through_repository() {
        let mut directory = UserDirectory::new(MemoryUserRepository::new());
        directory.register(&alice()).unwrap();
        let tom: CatProfile = serde_json::from_str(r#"{"id":"c1","name":"Tom"}"#).unwrap();

        directory.set_cats("alice", vec![tom.clone()]).unwrap();
        assert_eq!(directory.repo.load()[0].cats, vec![tom]);
        assert!(matches!(
            directory.set_cats("bob", vec![]),
            Err(KittyError::UnknownUser(name)) if name == "bob"
        ));
    }

    #[test]
    fn test_file_session_roundtrip_and_logout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let mut sessions = FileSessionStore::new(store.clone());
        let user = alice_user();

        sessions.save(Some(&user));
        assert_eq!(FileSessionStore::new(store.clone()).load(), Some(user));

        sessions.save(None);
        assert_eq!(sessions.load(), None);
        assert!(!store.path(SESSION_KEY).exists());
    }

    #[test]
    fn test_corrupt_directory_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.path(USERS_KEY), "[{").unwrap();

        let directory = UserDirectory::new(FileUserRepository::new(store));
        assert!(directory.is_empty());
    }

    fn alice_user() -> User {
        User {
            id: "alice".into(),
            email: "alice@x.com".into(),
            username: "alice".into(),
            cats: vec![],
        }
    }
}
