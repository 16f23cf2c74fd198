use std::time::{SystemTime, UNIX_EPOCH};

use config::{Config, Environment, File, FileFormat};
use rand::Rng;
use serde::Deserialize;

use crate::app::types::FRIEND_CODE_LEN;

pub fn read_config<'a, T>(file_name: &str, env_prefix: Option<&str>) -> T
where
    T: Deserialize<'a>,
{
    let mut config_builder =
        Config::builder().add_source(File::new(file_name, FileFormat::Toml).required(false));

    if let Some(env_prefix) = env_prefix {
        config_builder =
            config_builder.add_source(Environment::with_prefix(env_prefix).separator("__"));
    }

    let data = config_builder.build();

    // Unwrap here because without config application cannot be run
    data.unwrap().try_deserialize().unwrap()
}

pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Matchmade rooms are keyed by a v4 uuid.
pub fn generate_room_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Friend rooms are keyed by a short shareable code, uppercase alphanumeric.
pub fn generate_room_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..FRIEND_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Format-only token, never validated on subsequent events.
pub fn generate_auth_token(user_id: &str) -> String {
    format!("token_{}_{}", user_id, unix_timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_code_shape() {
        let code = generate_room_code();
        assert_eq!(code.len(), FRIEND_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn auth_token_carries_user_id() {
        let token = generate_auth_token("u1");
        assert!(token.starts_with("token_u1_"));
    }
}
