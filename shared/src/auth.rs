use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::SecretString;

/// Header carrying the pre-shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

type HmacSha256 = Hmac<Sha256>;

fn tag(key: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(API_KEY_HEADER.as_bytes());
    mac
}

/// Check the presented api key against the configured secret.
/// Equal length is required first since HMAC zero-pads short keys.
pub fn verify_api_key(presented: Option<&str>, expected: &SecretString) -> bool {
    let Some(presented) = presented else {
        return false;
    };
    let expected = expected.expose();
    if expected.is_empty() || presented.len() != expected.len() {
        return false;
    }

    let expected_tag = tag(expected.as_bytes()).finalize().into_bytes();
    tag(presented.as_bytes()).verify_slice(&expected_tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_key_is_accepted() {
        let secret = SecretString::new("s3cr3t-value");
        assert!(verify_api_key(Some("s3cr3t-value"), &secret));
    }

    #[test]
    fn test_missing_or_wrong_key_is_rejected() {
        let secret = SecretString::new("s3cr3t-value");
        assert!(!verify_api_key(None, &secret));
        assert!(!verify_api_key(Some(""), &secret));
        assert!(!verify_api_key(Some("s3cr3t-valuE"), &secret));
        assert!(!verify_api_key(Some("s3cr3t"), &secret));
        assert!(!verify_api_key(Some("s3cr3t-value\0"), &secret));
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        let secret = SecretString::new("");
        assert!(!verify_api_key(Some(""), &secret));
    }
}
