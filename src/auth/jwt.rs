//! Access token issuance and verification, plus the request extractor that
//! turns an `Authorization` header into an authenticated caller.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::JwtConfig, error::ApiError, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub is_admin: bool,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig { secret, ttl_days } = state.config.jwt.clone();
        Self::new(&secret, Duration::days(ttl_days))
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn sign_with_ttl(&self, user_id: Uuid, is_admin: bool, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            is_admin,
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, is_admin, "jwt signed");
        Ok(token)
    }

    /// Sign an access token for the subject. The returned string carries the
    /// `Bearer ` prefix, ready to be echoed into an `Authorization` header.
    pub fn issue(&self, user_id: Uuid, is_admin: bool) -> anyhow::Result<String> {
        Ok(format!(
            "Bearer {}",
            self.sign_with_ttl(user_id, is_admin, self.ttl)?
        ))
    }

    /// Verify a token, with or without its `Bearer ` prefix. Malformed,
    /// expired, and forged tokens are indistinguishable to the caller: all
    /// collapse into `TokenInvalid`.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "jwt rejected");
                ApiError::TokenInvalid
            })
    }
}

/// The authenticated caller, extracted from the `Authorization` header.
pub struct AuthUser {
    pub id: Uuid,
    pub is_admin: bool,
}

impl AuthUser {
    /// Callers may act on their own record; admins on any record.
    pub fn require_self_or_admin(&self, target: Uuid) -> Result<(), ApiError> {
        if self.id == target || self.is_admin {
            Ok(())
        } else {
            warn!(caller = %self.id, target = %target, "ownership check failed");
            Err(ApiError::NotAllowed)
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            warn!(caller = %self.id, "admin check failed");
            Err(ApiError::NotAllowed)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::NotAuthenticated)?;

        let claims = keys.verify(header)?;
        Ok(AuthUser {
            id: claims.sub,
            is_admin: claims.is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::new("jwt-secret", Duration::days(3))
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, true).expect("issue");
        assert!(token.starts_with("Bearer "));
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert!(claims.is_admin);
    }

    #[test]
    fn verify_accepts_bare_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, false).expect("issue");
        let bare = token.strip_prefix("Bearer ").unwrap();
        let claims = keys.verify(bare).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert!(!claims.is_admin);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys();
        // Past the default 60s decode leeway.
        let token = keys
            .sign_with_ttl(Uuid::new_v4(), false, Duration::seconds(-120))
            .expect("sign");
        assert!(matches!(keys.verify(&token), Err(ApiError::TokenInvalid)));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = make_keys().issue(Uuid::new_v4(), false).expect("issue");
        let other = JwtKeys::new("other-secret", Duration::days(3));
        assert!(matches!(other.verify(&token), Err(ApiError::TokenInvalid)));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(matches!(
            keys.verify("Bearer not.a.jwt"),
            Err(ApiError::TokenInvalid)
        ));
    }

    #[test]
    fn ownership_guards() {
        let id = Uuid::new_v4();
        let me = AuthUser {
            id,
            is_admin: false,
        };
        assert!(me.require_self_or_admin(id).is_ok());
        assert!(matches!(
            me.require_self_or_admin(Uuid::new_v4()),
            Err(ApiError::NotAllowed)
        ));
        assert!(matches!(me.require_admin(), Err(ApiError::NotAllowed)));

        let admin = AuthUser {
            id: Uuid::new_v4(),
            is_admin: true,
        };
        assert!(admin.require_self_or_admin(id).is_ok());
        assert!(admin.require_admin().is_ok());
    }
}
