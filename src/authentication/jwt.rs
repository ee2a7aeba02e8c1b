use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::User;
use crate::error::{ApiError, Error};
use crate::schema::{Id, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub email: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, email: String, role: UserRole, lifetime: Duration) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            email,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Id,
    pub email: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(ApiError::Unauthorized.default());
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            email: value.email,
            role: value.role,
        }
    }
}

/// Signing key and token lifetime shared by every request.
#[derive(Clone)]
pub struct SessionKeys {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, Error> {
        let key = Hmac::new_from_slice(secret).map_err(|e| {
            log::error!("Invalid session secret: {e}");
            ApiError::InternalServerError.default()
        })?;

        Ok(Self { key, lifetime })
    }

    pub fn generate_jwt_session(&self, user: &User) -> Result<String, Error> {
        let claims = JwtSessionData::new(
            user.id,
            user.email.to_owned(),
            user.role.to_owned(),
            self.lifetime,
        );

        claims.sign_with_key(&self.key).map_err(|e| {
            log::error!("Failed to sign session: {e}");
            ApiError::InternalServerError.default()
        })
    }

    pub fn verify_jwt_session(&self, token: &str) -> Result<JwtSessionData, Error> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| ApiError::InvalidSession.new("Invalid session; Invalid token"))?;

        let now = Local::now().timestamp();
        if (session.exp - now).is_negative() {
            return Err(ApiError::InvalidSession.new("Invalid session; Token expired"));
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Ada"),
            last_name: String::from("Lovelace"),
            password: String::new(),
            role,
        }
    }

    #[test]
    fn tokens_round_trip() {
        let keys = SessionKeys::new(b"secret", Duration::hours(1)).unwrap();
        let token = keys.generate_jwt_session(&user(UserRole::Admin)).unwrap();

        let session: SessionData = keys.verify_jwt_session(&token).unwrap().into();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.email, "cook@example.com");
        assert_eq!(session.role, UserRole::Admin);
    }

    #[test]
    fn foreign_tokens_are_rejected() {
        let keys = SessionKeys::new(b"secret", Duration::hours(1)).unwrap();
        let other = SessionKeys::new(b"another secret", Duration::hours(1)).unwrap();
        let token = other.generate_jwt_session(&user(UserRole::User)).unwrap();

        let error = keys.verify_jwt_session(&token).unwrap_err();
        assert_eq!(error.code, 401);
        assert!(keys.verify_jwt_session("garbage").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = SessionKeys::new(b"secret", Duration::hours(-1)).unwrap();
        let token = keys.generate_jwt_session(&user(UserRole::User)).unwrap();

        let error = keys.verify_jwt_session(&token).unwrap_err();
        assert_eq!(error.info.as_deref(), Some("Invalid session; Token expired"));
    }
}
