mod generate;
mod guard;

pub use guard::*;

pub const SCORE_ID_LENGTH: usize = 16;
pub const USER_ID_LENGTH: usize = 12;
pub const ADMIN_KEY_LENGTH: usize = 20;

/// Keys accepted in the `api-key` header: non-empty and ASCII alphanumeric.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Random alphanumeric string used for ids and the admin key.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StringKey {
    key: String,
}

impl StringKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn inner(&self) -> &str {
        &self.key
    }

    pub fn into_inner(self) -> String {
        self.key
    }
}

impl std::fmt::Display for StringKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}
