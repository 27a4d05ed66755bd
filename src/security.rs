use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::TOKEN_SUBJECT_PREFIX;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Bearer Tokens
// =============================================================================

/// Issue a bearer token for an account
///
/// Format: `<account_id>.<hex HMAC-SHA256(secret, "account:<account_id>")>`.
/// Tokens are stateless; rotating `APP_SECRET_KEY` invalidates all of them.
pub fn issue_token(account_id: u64, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        tracing::error!("Failed to create HMAC instance");
        AppError::TokenSigning
    })?;
    mac.update(token_subject(account_id).as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", account_id, signature))
}

/// Verify a bearer token and return the account id it was issued for
pub fn verify_token(token: &str, secret: &str) -> Option<u64> {
    let (id_part, signature) = token.split_once('.')?;
    let account_id: u64 = id_part.parse().ok()?;

    if !verify_hmac(&token_subject(account_id), signature, secret) {
        tracing::warn!("Invalid bearer token signature for account {}", account_id);
        return None;
    }

    Some(account_id)
}

fn token_subject(account_id: u64) -> String {
    format!("{}{}", TOKEN_SUBJECT_PREFIX, account_id)
}

/// Verify HMAC-SHA256 signature
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    // Constant-time comparison
    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    #[test]
    fn test_issue_token_format() {
        let token = issue_token(42, SECRET).unwrap();
        let (id, signature) = token.split_once('.').unwrap();

        assert_eq!(id, "42");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_issue_token_deterministic() {
        assert_eq!(issue_token(7, SECRET).unwrap(), issue_token(7, SECRET).unwrap());
        assert_ne!(issue_token(7, SECRET).unwrap(), issue_token(8, SECRET).unwrap());
    }

    #[test]
    fn test_verify_token_roundtrip() {
        let token = issue_token(1234, SECRET).unwrap();
        assert_eq!(verify_token(&token, SECRET), Some(1234));
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let token = issue_token(1234, SECRET).unwrap();
        assert_eq!(verify_token(&token, "wrong-secret"), None);
    }

    #[test]
    fn test_verify_token_swapped_account_id() {
        // Signature for account 1 presented as account 2
        let token = issue_token(1, SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("2.{}", signature);

        assert_eq!(verify_token(&forged, SECRET), None);
    }

    #[test]
    fn test_verify_token_malformed() {
        assert_eq!(verify_token("", SECRET), None);
        assert_eq!(verify_token("no-separator", SECRET), None);
        assert_eq!(verify_token("abc.def", SECRET), None);
        assert_eq!(verify_token("5.not-hex", SECRET), None);
    }

    #[test]
    fn test_verify_hmac_valid() {
        let data = "test data";

        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(data.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_hmac(data, &signature, SECRET));
    }

    #[test]
    fn test_verify_hmac_invalid_signature() {
        let wrong_signature = "0".repeat(64);
        assert!(!verify_hmac("test data", &wrong_signature, SECRET));
    }
}
