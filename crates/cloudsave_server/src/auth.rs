//! Access tokens for signed-in players.
//!
//! This module provides token-based authentication using HMAC-SHA256.
//! Tokens include a timestamp for expiration checking.
//!
//! ## Token Format
//!
//! Tokens are composed of:
//! - 16 bytes: player id (UUID)
//! - 8 bytes: timestamp (Unix millis, big-endian)
//! - 32 bytes: HMAC-SHA256 signature
//!
//! Total: 56 bytes, hex-encoded for transport.

use crate::error::{ServerError, ServerResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const PAYLOAD_LEN: usize = 24;
const TOKEN_LEN: usize = PAYLOAD_LEN + 32;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(60 * 60),
        }
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

/// Issues and validates access tokens.
#[derive(Clone)]
pub struct TokenValidator {
    config: AuthConfig,
}

impl TokenValidator {
    /// Creates a new token validator.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Creates an access token for a player.
    pub fn create_token(&self, player_id: Uuid) -> ServerResult<String> {
        let mut data = Vec::with_capacity(TOKEN_LEN);
        data.extend_from_slice(player_id.as_bytes());
        data.extend_from_slice(&now_millis().to_be_bytes());

        let signature = self.mac()?.chain_update(&data).finalize().into_bytes();
        data.extend_from_slice(&signature);
        Ok(hex::encode(&data))
    }

    /// Validates a token and returns the player it was issued to.
    pub fn validate_token(&self, token: &str) -> ServerResult<Uuid> {
        let bytes = hex::decode(token)
            .ok()
            .filter(|b| b.len() == TOKEN_LEN)
            .ok_or_else(|| ServerError::NotAuthorized("malformed access token".into()))?;
        let (payload, signature) = bytes.split_at(PAYLOAD_LEN);

        self.mac()?
            .chain_update(payload)
            .verify_slice(signature)
            .map_err(|_| ServerError::NotAuthorized("invalid signature".into()))?;

        let (id_bytes, timestamp_bytes) = payload.split_at(16);
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(timestamp_bytes);
        let issued = u64::from_be_bytes(timestamp);

        let expiry_millis = self.config.token_expiry.as_millis() as u64;
        if now_millis() > issued.saturating_add(expiry_millis) {
            return Err(ServerError::NotAuthorized("access token expired".into()));
        }

        Uuid::from_slice(id_bytes).map_err(|e| ServerError::NotAuthorized(e.to_string()))
    }

    fn mac(&self) -> ServerResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| ServerError::Internal(format!("hmac key: {}", e)))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn validator() -> TokenValidator {
        TokenValidator::new(AuthConfig::new(b"test-secret-key-32-bytes-long!!".to_vec()))
    }

    #[test]
    fn create_and_validate_token() {
        let validator = validator();
        let player = Uuid::new_v4();

        let token = validator.create_token(player).unwrap();
        assert_eq!(token.len(), TOKEN_LEN * 2);
        assert_eq!(validator.validate_token(&token).unwrap(), player);
    }

    #[test]
    fn reject_other_secret() {
        let token = validator().create_token(Uuid::new_v4()).unwrap();
        let other = TokenValidator::new(AuthConfig::new(b"another-secret".to_vec()));
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn reject_tampered_token() {
        let validator = validator();
        let token = validator.create_token(Uuid::new_v4()).unwrap();

        // Flip one nibble of the player id
        let mut chars: Vec<char> = token.chars().collect();
        chars[0] = if chars[0] == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();

        assert!(matches!(
            validator.validate_token(&tampered),
            Err(ServerError::NotAuthorized(_))
        ));
    }

    #[test]
    fn reject_garbage() {
        let validator = validator();
        assert!(validator.validate_token("").is_err());
        assert!(validator.validate_token("xyz").is_err());
        assert!(validator.validate_token("abcd").is_err());
    }

    #[test]
    fn reject_expired_token() {
        let validator = TokenValidator::new(
            AuthConfig::new(b"test-secret-key-32-bytes-long!!".to_vec())
                .with_expiry(Duration::from_secs(0)),
        );
        let token = validator.create_token(Uuid::new_v4()).unwrap();

        std::thread::sleep(Duration::from_millis(10));

        assert!(validator.validate_token(&token).is_err());
    }

    #[test]
    fn token_is_lowercase_hex() {
        let token = validator().create_token(Uuid::new_v4()).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(validator().validate_token(&token.to_uppercase()).is_ok());
    }

    proptest! {
        #[test]
        fn truncated_tokens_are_rejected(cut in 0usize..TOKEN_LEN * 2) {
            let validator = validator();
            let token = validator.create_token(Uuid::new_v4()).unwrap();
            prop_assert!(validator.validate_token(&token[..cut]).is_err());
        }

        #[test]
        fn arbitrary_strings_are_rejected(input in ".{0,160}") {
            prop_assert!(validator().validate_token(&input).is_err());
        }
    }
}
