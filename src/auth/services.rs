//! Registration and login pipelines. Same linear-check discipline as the
//! profile orchestrator: fixed field order, first failure wins.

use std::sync::Arc;

use tracing::info;

use crate::auth::codec::PasswordCodec;
use crate::auth::jwt::JwtKeys;
use crate::error::{ApiError, Field};
use crate::users::repo::{NewUser, User, UserStore};
use crate::validation;

pub struct RegisterInput {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: PasswordCodec,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, codec: PasswordCodec, keys: JwtKeys) -> Self {
        Self { store, codec, keys }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<User, ApiError> {
        for (field, valid) in [
            (Field::Username, validation::validate_username(&input.username)),
            (Field::Name, validation::validate_name(&input.name)),
            (Field::Email, validation::validate_email(&input.email)),
            (Field::Password, validation::validate_password(&input.password)),
            (Field::Phone, validation::validate_phone(&input.phone)),
            (Field::Address, validation::validate_address(&input.address)),
        ] {
            if !valid {
                return Err(ApiError::InvalidInput(field));
            }
        }

        for (field, value) in [
            (Field::Username, &input.username),
            (Field::Email, &input.email),
            (Field::Phone, &input.phone),
        ] {
            if self.store.find_by_field(field, value).await?.is_some() {
                return Err(ApiError::AlreadyExists(field));
            }
        }

        let user = self
            .store
            .create(NewUser {
                username: input.username,
                name: input.name,
                email: input.email,
                password: self.codec.encode(&input.password)?,
                phone: input.phone,
                address: input.address,
                is_admin: false,
            })
            .await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        if !validation::validate_email(email) {
            return Err(ApiError::InvalidInput(Field::Email));
        }
        if !validation::validate_password(password) {
            return Err(ApiError::InvalidInput(Field::Password));
        }

        let user = self
            .store
            .find_by_field(Field::Email, email)
            .await?
            .ok_or(ApiError::NotFound("user"))?;

        if !self.codec.compare(password, &user.password) {
            return Err(ApiError::PasswordMismatch);
        }

        let access_token = self.keys.issue(user.id, user.is_admin)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome { user, access_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::testing::MemStore;
    use time::Duration;

    const PASSWORD: &str = "Abcdef1!";

    fn make_service() -> (Arc<MemStore>, AuthService) {
        let store = Arc::new(MemStore::default());
        let service = AuthService::new(
            store.clone(),
            PasswordCodec::new("pass-secret"),
            JwtKeys::new("jwt-secret", Duration::days(3)),
        );
        (store, service)
    }

    fn valid_input() -> RegisterInput {
        RegisterInput {
            username: "ab_cd".into(),
            name: "John Doe".into(),
            email: "john@example.com".into(),
            password: PASSWORD.into(),
            phone: "555-123-4567".into(),
            address: "221b Baker Street, London".into(),
        }
    }

    #[tokio::test]
    async fn register_creates_user_with_encoded_password() {
        let (store, service) = make_service();
        let user = service.register(valid_input()).await.expect("register");
        assert!(!user.is_admin);
        assert_ne!(user.password, PASSWORD);

        let codec = PasswordCodec::new("pass-secret");
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(codec.compare(PASSWORD, &stored.password));
    }

    #[tokio::test]
    async fn register_validates_fields_in_fixed_order() {
        let (_, service) = make_service();
        // Username and email are both invalid; username is reported.
        let err = service
            .register(RegisterInput {
                username: "a..".into(),
                email: "not-an-email".into(),
                ..valid_input()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(Field::Username)));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username_without_writing() {
        let (store, service) = make_service();
        service.register(valid_input()).await.expect("first register");
        let writes_after_first = store.write_count();

        let err = service
            .register(RegisterInput {
                email: "jane@example.com".into(),
                phone: "555-999-8888".into(),
                ..valid_input()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyExists(Field::Username)));
        assert_eq!(store.write_count(), writes_after_first);
    }

    #[tokio::test]
    async fn register_checks_uniqueness_in_order() {
        let (_, service) = make_service();
        service.register(valid_input()).await.expect("first register");

        // Username differs, email and phone both collide; email is reported.
        let err = service
            .register(RegisterInput {
                username: "other_user".into(),
                ..valid_input()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyExists(Field::Email)));
    }

    #[tokio::test]
    async fn login_succeeds_with_bearer_token_and_no_password_leak() {
        let (_, service) = make_service();
        service.register(valid_input()).await.expect("register");

        let outcome = service
            .login("john@example.com", PASSWORD)
            .await
            .expect("login");
        assert!(outcome.access_token.starts_with("Bearer "));

        let json = serde_json::to_value(&outcome.user).expect("serialize user");
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "ab_cd");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let (_, service) = make_service();
        service.register(valid_input()).await.expect("register");
        let err = service
            .login("john@example.com", "Wr0ngPa$s")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PasswordMismatch));
    }

    #[tokio::test]
    async fn login_rejects_unknown_email() {
        let (_, service) = make_service();
        let err = service
            .login("nobody@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("user")));
    }

    #[tokio::test]
    async fn login_rejects_invalid_email_before_lookup() {
        let (_, service) = make_service();
        let err = service.login("not-an-email", PASSWORD).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(Field::Email)));
    }

    #[tokio::test]
    async fn issued_token_carries_subject_and_admin_flag() {
        let (_, service) = make_service();
        let user = service.register(valid_input()).await.expect("register");
        let outcome = service
            .login("john@example.com", PASSWORD)
            .await
            .expect("login");

        let keys = JwtKeys::new("jwt-secret", Duration::days(3));
        let claims = keys.verify(&outcome.access_token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert!(!claims.is_admin);
    }
}
