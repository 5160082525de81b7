//! Anti-forgery tokens for admin actions
//!
//! A token is `<issued_at>/<digest>` where the digest is the hex SHA-256 of
//! the server secret, the user, the action and the issue time. Tokens are
//! bound to one user and one action and expire after a configured age.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Issues and validates anti-forgery tokens
#[derive(Debug, Clone)]
pub struct XsrfTokens {
    secret: String,
    max_age_secs: i64,
}

impl XsrfTokens {
    pub fn new(secret: impl Into<String>, max_age_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            max_age_secs,
        }
    }

    /// Issues a token for `user` to perform `action`
    pub fn issue(&self, user: &str, action: &str) -> String {
        self.issue_at(user, action, Utc::now().timestamp())
    }

    /// Checks a token presented by `user` for `action`
    pub fn validate(&self, token: &str, user: &str, action: &str) -> bool {
        self.validate_at(token, user, action, Utc::now().timestamp())
    }

    fn issue_at(&self, user: &str, action: &str, issued_at: i64) -> String {
        format!("{}/{}", issued_at, self.digest(user, action, issued_at))
    }

    fn validate_at(&self, token: &str, user: &str, action: &str, now: i64) -> bool {
        let Some((issued_at, digest)) = token.trim().split_once('/') else {
            return false;
        };
        let Ok(issued_at) = issued_at.parse::<i64>() else {
            return false;
        };

        let age = now.saturating_sub(issued_at);
        if age < 0 || age > self.max_age_secs {
            return false;
        }

        constant_time_eq(
            digest.as_bytes(),
            self.digest(user, action, issued_at).as_bytes(),
        )
    }

    fn digest(&self, user: &str, action: &str, issued_at: i64) -> String {
        let mut hasher = Sha256::new();
        for part in [self.secret.as_str(), user, action] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(issued_at.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 24 * 60 * 60;

    fn tokens() -> XsrfTokens {
        XsrfTokens::new("secret", DAY)
    }

    #[test]
    fn test_issued_token_validates() {
        let tokens = tokens();
        let token = tokens.issue("admin@example.com", "index_course");
        assert!(tokens.validate(&token, "admin@example.com", "index_course"));
    }

    #[test]
    fn test_token_bound_to_action_and_user() {
        let tokens = tokens();
        let token = tokens.issue("admin@example.com", "index_course");
        assert!(!tokens.validate(&token, "admin@example.com", "clear_index"));
        assert!(!tokens.validate(&token, "other@example.com", "index_course"));
    }

    #[test]
    fn test_token_bound_to_secret() {
        let token = tokens().issue("admin@example.com", "index_course");
        let other = XsrfTokens::new("another secret", DAY);
        assert!(!other.validate(&token, "admin@example.com", "index_course"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = tokens();
        let token = tokens.issue_at("admin", "index_course", 1_000);
        assert!(tokens.validate_at(&token, "admin", "index_course", 1_000 + DAY));
        assert!(!tokens.validate_at(&token, "admin", "index_course", 1_001 + DAY));
        assert!(!tokens.validate_at(&token, "admin", "index_course", 999));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = tokens();
        for token in ["", "abc", "123", "x/y", "123/", "/abc"] {
            assert!(!tokens.validate(token, "admin", "index_course"), "{:?}", token);
        }
    }

    #[test]
    fn test_tampered_timestamp_rejected() {
        let tokens = tokens();
        let token = tokens.issue_at("admin", "index_course", 1_000);
        let (_, digest) = token.split_once('/').unwrap();
        let forged = format!("1001/{}", digest);
        assert!(!tokens.validate_at(&forged, "admin", "index_course", 1_002));
    }
}
