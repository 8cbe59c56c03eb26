use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::info;

use planty_db::{Database, DbError};
use planty_types::models::User;

use crate::{Error, Result};

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    /// True while the user owns no plants. Derived on every login.
    pub requires_plant_registration: bool,
}

/// User accounts with Argon2id password hashes.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, user_id: &str, nickname: &str, email: &str, password: &str) -> Result<User> {
        require("userId", user_id)?;
        require("nickname", nickname)?;
        require("email", email)?;
        if password.is_empty() {
            return Err(Error::BadRequest("userPw is required".into()));
        }

        if self.db.get_user_by_id(user_id)?.is_some() {
            return Err(Error::IdentifierTaken);
        }
        if self.db.get_user_by_email(email)?.is_some() {
            return Err(Error::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))?
            .to_string();

        // The checks above are not atomic with the insert; a concurrent
        // signup can still lose here on the UNIQUE constraints.
        self.db
            .create_user(user_id, nickname, email, &password_hash)
            .map_err(conflict_error)?;

        info!(user_id, "User created");
        Ok(User {
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
            email: email.to_string(),
            is_active: true,
        })
    }

    pub fn authenticate(&self, user_id: &str, password: &str) -> Result<Authenticated> {
        let row = self
            .db
            .get_user_by_id(user_id)?
            .ok_or(Error::NotFound("User not found"))?;

        let parsed_hash = PasswordHash::new(&row.hashed_password)
            .map_err(|e| Error::Internal(format!("stored hash for {} is corrupt: {}", user_id, e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| Error::BadCredential)?;

        let requires_plant_registration = self.requires_plant_registration(user_id)?;
        Ok(Authenticated {
            user: row.into(),
            requires_plant_registration,
        })
    }

    pub fn find(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user_by_id(user_id)?
            .map(User::from)
            .ok_or(Error::NotFound("User not found"))
    }

    pub fn requires_plant_registration(&self, user_id: &str) -> Result<bool> {
        Ok(!self.db.user_has_plants(user_id)?)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

fn conflict_error(err: DbError) -> Error {
    if err.is_conflict_on("users.user_id") {
        Error::IdentifierTaken
    } else if err.is_conflict_on("users.email") {
        Error::EmailTaken
    } else {
        Error::Db(err)
    }
}
