use super::*;

use rand::{distributions::Alphanumeric, thread_rng, Rng};

impl StringKey {
    pub fn generate(length: usize) -> Self {
        let rng = thread_rng();

        let key: String = rng
            .sample_iter(Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();

        Self { key }
    }

    pub fn generate_score_id() -> Self {
        Self::generate(SCORE_ID_LENGTH)
    }

    pub fn generate_user_id() -> Self {
        Self::generate(USER_ID_LENGTH)
    }

    pub fn generate_admin_key() -> Self {
        Self::generate(ADMIN_KEY_LENGTH)
    }
}
