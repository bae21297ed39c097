use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultTypesError};

/// Request body for `POST /login` and `POST /register`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response body for `POST /login` and `POST /register`.  Registration may omit the token and email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// A signed-in session: the bearer token plus the identity it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub token: String,
    pub user_id: String,
    pub email: String,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AuthResponse {
    /// Converts a login response into a session.  `fallback_email` fills in a missing email.
    pub fn into_login_session(self, fallback_email: &str) -> Result<LoginSession> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VaultTypesError::MalformedAuthResponse("missing token".to_string()))?;
        let user_id = self
            .user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| VaultTypesError::MalformedAuthResponse("missing user_id".to_string()))?;

        Ok(LoginSession {
            token,
            user_id,
            email: self.email.unwrap_or_else(|| fallback_email.to_string()),
        })
    }
}

/// Error body the backend returns on non-success responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_session_from_response() {
        let resp: AuthResponse = serde_json::from_str(r#"{"token":"t0k","user_id":"u1","email":"a@b.c"}"#).unwrap();
        let session = resp.into_login_session("other@b.c").unwrap();
        assert_eq!(session.token, "t0k");
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.email, "a@b.c");
        assert!(!format!("{session:?}").contains("t0k"));
    }

    #[test]
    fn test_register_response_without_token() {
        let resp: AuthResponse = serde_json::from_str(r#"{"message":"User registered successfully","user_id":"u2"}"#).unwrap();
        assert!(resp.token.is_none());
        assert_eq!(resp.user_id.as_deref(), Some("u2"));
        assert!(matches!(resp.into_login_session("a@b.c"), Err(VaultTypesError::MalformedAuthResponse(_))));
    }

    #[test]
    fn test_error_body_message_is_optional() {
        let a: ErrorBody = serde_json::from_str(r#"{"message":"Token is missing!"}"#).unwrap();
        let b: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(a.message.as_deref(), Some("Token is missing!"));
        assert!(b.message.is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert_eq!(serde_json::to_value(&creds).unwrap()["password"], "hunter2");
    }
}
