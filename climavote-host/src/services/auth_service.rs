use std::sync::Arc;

use argon2::password_hash::{SaltString, rand_core};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::errors::AuthError;
use crate::models::User;
use crate::repositories::UserRepository;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct Argon2Hash(Argon2<'static>);

#[derive(Clone)]
pub struct AuthService {
    storage: Arc<Storage>,
    hasher: Arc<Argon2Hash>,
}

impl AuthService {
    pub fn new(storage: Arc<Storage>) -> Self {
        let hash = Argon2Hash(Argon2::default());

        Self {
            storage,
            hasher: Arc::new(hash),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let hash_salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = self.hasher.0.hash_password(password.as_ref(), &hash_salt)?;

        Ok(hash.to_string())
    }

    pub fn verify(&self, user: &User, password: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(&user.password)?;

        Ok(self.hasher.0.verify_password(password.as_ref(), &parsed_hash).is_ok())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AuthError::UsernameTooShort(MIN_USERNAME_LEN));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort(MIN_PASSWORD_LEN));
        }

        let repository = UserRepository::new(self.storage.clone());
        if repository.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameExists);
        }

        let mut user = User {
            id: 0,
            username: username.to_string(),
            password: self.hash(password)?,
            created_at: OffsetDateTime::now_utc(),
        };

        let mut tx = self.storage.get_pool().begin().await?;
        user.id = repository.create(&user, &mut tx).await?;
        tx.commit().await?;

        tracing::info!("registered user {} ({})", user.username, user.id);

        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let repository = UserRepository::new(self.storage.clone());

        let user = repository
            .find_by_username(username.trim())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.verify(&user, password)? {
            tracing::warn!("failed login for {}", user.username);
            return Err(AuthError::InvalidPassword);
        }

        Ok(user)
    }
}
