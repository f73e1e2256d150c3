//! User repository for database operations

use sqlx::PgPool;
use tracing::{info, warn};

use crate::{
    error::UserError,
    models::{NewUser, UpdateUser, User},
    password::{hash_password, verify_password},
    validation::normalize_email,
};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a regular account
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, UserError> {
        self.insert(new_user, false).await
    }

    /// Create an account with the staff and superuser flags set
    pub async fn create_superuser(&self, new_user: &NewUser) -> Result<User, UserError> {
        self.insert(new_user, true).await
    }

    async fn insert(&self, new_user: &NewUser, privileged: bool) -> Result<User, UserError> {
        let email = normalize_email(&new_user.email);
        if email.is_empty() {
            return Err(UserError::Validation {
                field: "email",
                message: "Users must have an email address".to_string(),
            });
        }

        info!("Creating new user: {}", email);

        let password_hash =
            hash_password(&new_user.password).map_err(|e| UserError::Hashing(e.to_string()))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, name, password_hash, is_active, is_staff, is_superuser,
                      created_at, updated_at
            "#,
        )
        .bind(&email)
        .bind(&new_user.name)
        .bind(&password_hash)
        .bind(privileged)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email, normalizing the lookup key first
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let email = normalize_email(email);

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_staff, is_superuser,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_staff, is_superuser,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Apply a profile update to the user's own record
    ///
    /// Fields left as `None` keep their stored value. A new password is
    /// re-hashed before it is written.
    pub async fn update_profile(
        &self,
        id: i64,
        changes: &UpdateUser,
    ) -> Result<Option<User>, UserError> {
        let email = match &changes.email {
            Some(email) => {
                let email = normalize_email(email);
                if email.is_empty() {
                    return Err(UserError::Validation {
                        field: "email",
                        message: "Users must have an email address".to_string(),
                    });
                }
                Some(email)
            }
            None => None,
        };

        let password_hash = match &changes.password {
            Some(password) => {
                Some(hash_password(password).map_err(|e| UserError::Hashing(e.to_string()))?)
            }
            None => None,
        };

        info!("Updating profile for user: {}", id);

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, password_hash, is_active, is_staff, is_superuser,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(&changes.name)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> bool {
        match verify_password(password, &user.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Stored password hash for user {} is unreadable: {}", user.id, e);
                false
            }
        }
    }

    /// Resolve credentials to an active account
    ///
    /// Returns `None` for an unknown email, a wrong or blank password, and
    /// for deactivated accounts.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, UserError> {
        if password.is_empty() {
            return Ok(None);
        }

        let user = match self.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if !user.is_active || !self.verify_password(&user, password) {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Create the configured superuser unless an account with that email exists
    pub async fn ensure_superuser(&self, email: &str, password: &str) -> Result<User, UserError> {
        if let Some(user) = self.find_by_email(email).await? {
            info!("Superuser {} already present", user.email);
            return Ok(user);
        }

        self.create_superuser(&NewUser {
            email: email.to_string(),
            password: password.to_string(),
            name: String::new(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, password: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: password.to_string(),
            name: String::new(),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_create_user_with_email_successful(pool: PgPool) {
        let repo = UserRepository::new(pool);

        let user = repo
            .create_user(&new_user("test@example.com", "test123"))
            .await
            .unwrap();

        assert_eq!(user.email, "test@example.com");
        assert_ne!(user.password_hash, "test123");
        assert!(repo.verify_password(&user, "test123"));
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_new_user_email_normalized(pool: PgPool) {
        let repo = UserRepository::new(pool);
        let samples = [
            ("test1@EXAMPLE.COM", "test1@example.com"),
            ("test2@EXAmPLE.COM", "test2@example.com"),
            ("TeSt3@EXAmPLE.COM", "test3@example.com"),
        ];

        for (email, expected) in samples {
            let user = repo.create_user(&new_user(email, "sample123")).await.unwrap();
            assert_eq!(user.email, expected);
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_new_user_without_email_raises_error(pool: PgPool) {
        let repo = UserRepository::new(pool);

        let result = repo.create_user(&new_user("", "sample123")).await;
        assert!(matches!(
            result,
            Err(UserError::Validation { field: "email", .. })
        ));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_duplicate_email_is_rejected(pool: PgPool) {
        let repo = UserRepository::new(pool);

        repo.create_user(&new_user("abc@example.com", "1234"))
            .await
            .unwrap();
        let result = repo.create_user(&new_user("ABC@example.com", "1234")).await;

        assert!(matches!(result, Err(UserError::EmailTaken)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_create_superuser(pool: PgPool) {
        let repo = UserRepository::new(pool);

        let user = repo
            .create_superuser(&new_user("test@example.com", "sample123"))
            .await
            .unwrap();

        assert!(user.is_superuser);
        assert!(user.is_staff);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_ensure_superuser_is_idempotent(pool: PgPool) {
        let repo = UserRepository::new(pool);

        let first = repo
            .ensure_superuser("admin@example.com", "changeme")
            .await
            .unwrap();
        let second = repo
            .ensure_superuser("admin@example.com", "changeme")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_authenticate(pool: PgPool) {
        let repo = UserRepository::new(pool);
        let user = repo
            .create_user(&new_user("abc@example.com", "1234"))
            .await
            .unwrap();

        let found = repo.authenticate("ABC@example.com", "1234").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        assert!(repo.authenticate("abc@example.com", "123").await.unwrap().is_none());
        assert!(repo.authenticate("abc@example.com", "").await.unwrap().is_none());
        assert!(repo.authenticate("nobody@example.com", "1234").await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_update_profile(pool: PgPool) {
        let repo = UserRepository::new(pool);
        let user = repo
            .create_user(&NewUser {
                email: "abc@example.com".to_string(),
                password: "test123".to_string(),
                name: "Test".to_string(),
            })
            .await
            .unwrap();

        let updated = repo
            .update_profile(
                user.id,
                &UpdateUser {
                    name: Some("Test2".to_string()),
                    password: Some("Test321".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Test2");
        assert_eq!(updated.email, "abc@example.com");
        assert!(repo.verify_password(&updated, "Test321"));
        assert!(!repo.verify_password(&updated, "test123"));
    }
}
