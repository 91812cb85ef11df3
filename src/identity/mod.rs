use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

const TEMPORARY_PASSWORD_LEN: usize = 16;

pub struct NewUser<'a> {
    pub email: &'a str,
    pub given_name: &'a str,
    pub family_name: &'a str,
    pub tenant_id: Uuid,
}

pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    // Non-retryable without user correction
    #[error("an account with email {0} already exists")]
    DuplicateEmail(String),
    #[error("identity provider failure: {0}")]
    Provider(#[from] sqlx::Error),
    #[error("password hashing failure: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Issues and checks tenant user credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create the identity record for a fresh tenant. The generated
    /// temporary credential is delivered out-of-band by the deployment's
    /// mail integration; this core only stores its hash.
    async fn create_user(&self, user: NewUser<'_>) -> Result<(), IdentityError>;

    /// Check an email/password pair; `None` means unknown email or wrong
    /// password, indistinguishable on purpose.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthenticatedUser>, IdentityError>;
}

pub struct PostgresIdentityProvider {
    pool: PgPool,
}

impl PostgresIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    tenant_id: Uuid,
    password_hash: String,
}

#[async_trait]
impl IdentityProvider for PostgresIdentityProvider {
    async fn create_user(&self, user: NewUser<'_>) -> Result<(), IdentityError> {
        let password = generate_temporary_password();
        let password_hash = hash_password(&password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, given_name, family_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.tenant_id)
        .bind(user.email)
        .bind(user.given_name)
        .bind(user.family_name)
        .bind(&password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(IdentityError::DuplicateEmail(user.email.to_string()))
            }
            Err(err) => Err(IdentityError::Provider(err)),
        }
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthenticatedUser>, IdentityError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, password_hash FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let parsed_hash = PasswordHash::new(&row.password_hash).map_err(IdentityError::Hash)?;
        let verified = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();

        if verified {
            Ok(Some(AuthenticatedUser {
                user_id: row.id,
                tenant_id: row.tenant_id,
            }))
        } else {
            Ok(None)
        }
    }
}

fn generate_temporary_password() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(IdentityError::Hash)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "23505")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_passwords_are_long_enough_and_alphanumeric() {
        let password = generate_temporary_password();
        assert_eq!(password.len(), TEMPORARY_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn hashed_password_verifies_against_the_original() {
        let hash = hash_password("hunter2hunter2").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2hunter2", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong-password", &parsed)
            .is_err());
    }
}
