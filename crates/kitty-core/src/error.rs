use thiserror::Error;

use crate::accounts::{MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use crate::compare::{COMPARE_MAX, COMPARE_MIN};
use crate::profiles::MAX_CATS;

pub type Result<T> = std::result::Result<T, KittyError>;

/// Everything a user action can be refused for. The display text is the
/// notification shown to the user.
#[derive(Error, Debug)]
pub enum KittyError {
    #[error("Please fill in both username and password")]
    MissingCredentials,

    #[error("Please enter an email address")]
    MissingEmail,

    #[error("Username must be at least {} characters", MIN_USERNAME_LEN)]
    UsernameTooShort,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("This username or email is already registered")]
    DuplicateAccount,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Please log in first")]
    NotLoggedIn,

    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("Please enter a food name or brand")]
    EmptyQuery,

    #[error("Please enter a name for cat #{index}")]
    MissingCatName { index: usize },

    #[error("You can add at most {} cats", MAX_CATS)]
    TooManyCats,

    #[error("At least one cat profile is required")]
    LastCat,

    #[error("Cat '{0}' not found")]
    CatNotFound(String),

    #[error("Product '{0}' not found")]
    ProductNotFound(String),

    #[error("You can compare at most {} products", COMPARE_MAX)]
    CompareLimit,

    #[error("Select at least {} products to compare", COMPARE_MIN)]
    CompareTooFew,

    #[error("No products to compare")]
    NothingToCompare,

    #[error("Catalog data is malformed: {0}")]
    Catalog(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}
