//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data::models::Role;

/// User session data
///
/// Stored in a signed cookie. Contains minimal account info; the role
/// is re-read from the database on every authenticated request so a
/// demotion takes effect without waiting for token expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Account ID (ULID)
    pub account_id: String,
    /// Username at login time
    pub username: String,
    /// Role at login time
    pub role: Role,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session for a freshly authenticated account
    pub fn new(account_id: String, username: String, role: Role, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            username,
            role,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(
    session: &Session,
    secret: &str,
) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload =
        serde_json::to_string(session).map_err(|e| crate::error::AppError::Internal(e.into()))?;

    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns `Unauthorized` if the signature is invalid, the token is
/// malformed, or the session has expired.
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(crate::error::AppError::Unauthorized);
    }

    let payload_b64 = parts[0];
    let signature_b64 = parts[1];

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| crate::error::AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| crate::error::AppError::Unauthorized)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| crate::error::AppError::Unauthorized)?;

    let payload_str =
        String::from_utf8(payload_bytes).map_err(|_| crate::error::AppError::Unauthorized)?;

    let session: Session =
        serde_json::from_str(&payload_str).map_err(|_| crate::error::AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(crate::error::AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough!";

    fn sample_session() -> Session {
        Session::new(
            "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            "alice".to_string(),
            Role::User,
            3600,
        )
    }

    #[test]
    fn token_roundtrip() {
        let session = sample_session();
        let token = create_session_token(&session, SECRET).unwrap();
        let decoded = verify_session_token(&token, SECRET).unwrap();

        assert_eq!(decoded.account_id, session.account_id);
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.role, Role::User);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = create_session_token(&sample_session(), SECRET).unwrap();
        let mut tampered = token.clone();
        tampered.insert(5, 'x');

        assert!(verify_session_token(&tampered, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_session_token(&sample_session(), SECRET).unwrap();
        assert!(verify_session_token(&token, "another-secret-key-also-long-enough").is_err());
    }

    #[test]
    fn expired_session_is_rejected() {
        let mut session = sample_session();
        session.expires_at = Utc::now() - Duration::seconds(60);
        let token = create_session_token(&session, SECRET).unwrap();

        assert!(verify_session_token(&token, SECRET).is_err());
    }
}
