//! Profile self-service orchestration. Every mutating operation is an
//! ordered, linear check pipeline: the first failing check returns its
//! specific error and nothing later runs. The order is part of the contract.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::auth::codec::PasswordCodec;
use crate::error::{ApiError, Field};
use crate::users::repo::{MonthlyCount, StoreError, User, UserStore};
use crate::validation;

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            // A racing writer beat our uniqueness pre-check; the index is the
            // authority, report the collision as such.
            StoreError::ConstraintViolation(field) => ApiError::AlreadyExists(field),
            StoreError::Unavailable(e) => ApiError::StoreUnavailable(e.into()),
        }
    }
}

pub struct UserService {
    store: Arc<dyn UserStore>,
    codec: PasswordCodec,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, codec: PasswordCodec) -> Self {
        Self { store, codec }
    }

    async fn fetch(&self, id: Uuid) -> Result<User, ApiError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::NotFound("user"))
    }

    /// Current-password gate shared by every field update: syntax first,
    /// then the codec comparison against the stored encoding.
    fn check_password(&self, user: &User, password: &str) -> Result<(), ApiError> {
        if !validation::validate_password(password) {
            return Err(ApiError::InvalidInput(Field::Password));
        }
        if !self.codec.compare(password, &user.password) {
            return Err(ApiError::PasswordMismatch);
        }
        Ok(())
    }

    async fn ensure_unused(&self, field: Field, value: &str) -> Result<(), ApiError> {
        if self.store.find_by_field(field, value).await?.is_some() {
            return Err(ApiError::AlreadyExists(field));
        }
        Ok(())
    }

    async fn persist(&self, id: Uuid, field: Field, value: &str) -> Result<User, ApiError> {
        let user = self
            .store
            .update_field(id, field, value)
            .await?
            .ok_or(ApiError::PersistenceFailed)?;
        info!(user_id = %id, field = %field, "user updated");
        Ok(user)
    }

    pub async fn update_username(
        &self,
        id: Uuid,
        username: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = self.fetch(id).await?;
        if !validation::validate_username(username) {
            return Err(ApiError::InvalidInput(Field::Username));
        }
        self.check_password(&user, password)?;
        if user.username == username {
            return Err(ApiError::NoChange(Field::Username));
        }
        self.ensure_unused(Field::Username, username).await?;
        self.persist(id, Field::Username, username).await
    }

    pub async fn update_name(&self, id: Uuid, name: &str, password: &str) -> Result<User, ApiError> {
        let user = self.fetch(id).await?;
        if !validation::validate_name(name) {
            return Err(ApiError::InvalidInput(Field::Name));
        }
        self.check_password(&user, password)?;
        if user.name == name {
            return Err(ApiError::NoChange(Field::Name));
        }
        self.persist(id, Field::Name, name).await
    }

    pub async fn update_email(
        &self,
        id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = self.fetch(id).await?;
        if !validation::validate_email(email) {
            return Err(ApiError::InvalidInput(Field::Email));
        }
        self.check_password(&user, password)?;
        if user.email == email {
            return Err(ApiError::NoChange(Field::Email));
        }
        self.ensure_unused(Field::Email, email).await?;
        self.persist(id, Field::Email, email).await
    }

    /// Password change. The confirm-equality check runs before the user is
    /// even looked up.
    pub async fn update_password(
        &self,
        id: Uuid,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<User, ApiError> {
        if new_password != confirm_password {
            return Err(ApiError::PasswordMismatch);
        }
        let user = self.fetch(id).await?;
        for password in [old_password, new_password, confirm_password] {
            if !validation::validate_password(password) {
                return Err(ApiError::InvalidInput(Field::Password));
            }
        }
        if old_password == new_password {
            return Err(ApiError::NoChange(Field::Password));
        }
        if !self.codec.compare(old_password, &user.password) {
            return Err(ApiError::PasswordMismatch);
        }
        let encoded = self.codec.encode(new_password)?;
        self.persist(id, Field::Password, &encoded).await
    }

    pub async fn update_phone(
        &self,
        id: Uuid,
        phone: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = self.fetch(id).await?;
        if !validation::validate_phone(phone) {
            return Err(ApiError::InvalidInput(Field::Phone));
        }
        self.check_password(&user, password)?;
        if user.phone == phone {
            return Err(ApiError::NoChange(Field::Phone));
        }
        self.ensure_unused(Field::Phone, phone).await?;
        self.persist(id, Field::Phone, phone).await
    }

    pub async fn update_address(
        &self,
        id: Uuid,
        address: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = self.fetch(id).await?;
        if !validation::validate_address(address) {
            return Err(ApiError::InvalidInput(Field::Address));
        }
        self.check_password(&user, password)?;
        if user.address == address {
            return Err(ApiError::NoChange(Field::Address));
        }
        self.persist(id, Field::Address, address).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), ApiError> {
        self.fetch(id).await?;
        if !self.store.delete(id).await? {
            return Err(ApiError::DeleteFailed);
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ApiError> {
        self.fetch(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.store.list().await?)
    }

    /// Registrations per month over the trailing year; the grouping itself
    /// is store-native.
    pub async fn users_stats(&self) -> Result<Vec<MonthlyCount>, ApiError> {
        let since = OffsetDateTime::now_utc() - Duration::days(365);
        Ok(self.store.monthly_counts(since).await?)
    }
}
