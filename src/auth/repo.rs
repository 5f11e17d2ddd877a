use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::User;
use crate::error::StoreError;

/// Persistence for user accounts. Every call goes to the backing store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user whose password is already hashed.
    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, StoreError>;

    /// Exact-match lookup; `Ok(None)` when no row matches.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;
}

pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, is_admin)
            VALUES ($1, $2, $3)
            RETURNING id, email, password, is_admin, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::from_insert)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, is_admin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, password, is_admin, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::CredentialStore;
    use crate::auth::repo_types::User;
    use crate::error::StoreError;

    /// In-process store with the same uniqueness rule as the `users` table.
    #[derive(Default)]
    pub struct MemoryCredentialStore {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl CredentialStore for MemoryCredentialStore {
        async fn insert_user(
            &self,
            email: &str,
            password_hash: &str,
            is_admin: bool,
        ) -> Result<User, StoreError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
            let user = User {
                id: users.len() as i32 + 1,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_admin,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.id == id).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryCredentialStore;
    use super::*;

    #[tokio::test]
    async fn second_insert_with_same_email_fails() {
        let store = MemoryCredentialStore::default();
        store.insert_user("a@example.com", "$2b$04$hash", false).await.unwrap();
        let err = store
            .insert_user("a@example.com", "$2b$04$other", false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let store = MemoryCredentialStore::default();
        let created = store.insert_user("a@example.com", "h", false).await.unwrap();
        assert_eq!(created.id, 1);

        let found = store.find_user_by_email("a@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(1));
        assert!(store.find_user_by_email("A@example.com").await.unwrap().is_none());
        assert!(store.find_user_by_id(99).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // Requires DATABASE_URL pointing at a running Postgres instance
    async fn pg_insert_and_lookup(pool: PgPool) {
        let store = PgCredentialStore::new(pool);
        let created = store
            .insert_user("pg@example.com", "$2b$04$stored-hash", true)
            .await
            .unwrap();
        assert_eq!(created.email, "pg@example.com");
        assert_eq!(created.password_hash, "$2b$04$stored-hash");
        assert!(created.is_admin);

        let by_email = store.find_user_by_email("pg@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.password_hash, "$2b$04$stored-hash");

        let by_id = store.find_user_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "pg@example.com");

        assert!(store.find_user_by_email("PG@example.com").await.unwrap().is_none());
        assert!(store.find_user_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // Requires DATABASE_URL pointing at a running Postgres instance
    async fn pg_duplicate_email_is_reported(pool: PgPool) {
        let store = PgCredentialStore::new(pool);
        store.insert_user("dup@example.com", "$2b$04$one", false).await.unwrap();
        let err = store
            .insert_user("dup@example.com", "$2b$04$two", false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // Requires DATABASE_URL pointing at a running Postgres instance
    async fn pg_rejects_empty_hash(pool: PgPool) {
        let store = PgCredentialStore::new(pool);
        let err = store.insert_user("empty@example.com", "", false).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
