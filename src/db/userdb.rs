// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::*;

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, sqlx::Error>;

    /// Inserts a bare `user` row for an id seen for the first time, or returns the existing one.
    async fn provision_user(&self, user_id: &str) -> Result<User, sqlx::Error>;

    async fn upsert_user(
        &self,
        user_id: &str,
        name: Option<String>,
        email: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<User, sqlx::Error>;

    /// `phone` and `avatar_url`: `None` keeps the stored value, `Some(None)` clears it.
    async fn update_user_profile(
        &self,
        user_id: &str,
        name: Option<String>,
        phone: Option<Option<String>>,
        avatar_url: Option<Option<String>>,
    ) -> Result<User, sqlx::Error>;

    async fn get_provider_by_user(&self, user_id: &str) -> Result<Option<Provider>, sqlx::Error>;

    /// Creates the provider row and escalates the user's role atomically.
    async fn create_provider(&self, user_id: &str) -> Result<Provider, sqlx::Error>;

    async fn update_provider_availability(
        &self,
        provider_id: Uuid,
        availability_status: AvailabilityStatus,
    ) -> Result<Provider, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, phone, avatar_url, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn provision_user(&self, user_id: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id)
            VALUES ($1)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING id, name, email, phone, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn upsert_user(
        &self,
        user_id: &str,
        name: Option<String>,
        email: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = NOW()
            RETURNING id, name, email, phone, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(avatar_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_profile(
        &self,
        user_id: &str,
        name: Option<String>,
        phone: Option<Option<String>>,
        avatar_url: Option<Option<String>>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = CASE WHEN $3 THEN $4 ELSE phone END,
                avatar_url = CASE WHEN $5 THEN $6 ELSE avatar_url END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(phone.is_some())
        .bind(phone.flatten())
        .bind(avatar_url.is_some())
        .bind(avatar_url.flatten())
        .fetch_one(&self.pool)
        .await
    }

    async fn get_provider_by_user(&self, user_id: &str) -> Result<Option<Provider>, sqlx::Error> {
        sqlx::query_as::<_, Provider>(
            r#"
            SELECT id, user_id, availability_status, is_verified, rating, total_jobs, created_at
            FROM service_providers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_provider(&self, user_id: &str) -> Result<Provider, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let provider = sqlx::query_as::<_, Provider>(
            r#"
            INSERT INTO service_providers (user_id, is_verified, rating, total_jobs, availability_status)
            VALUES ($1, FALSE, 0, 0, 'offline')
            RETURNING id, user_id, availability_status, is_verified, rating, total_jobs, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(UserRole::Provider)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(provider)
    }

    async fn update_provider_availability(
        &self,
        provider_id: Uuid,
        availability_status: AvailabilityStatus,
    ) -> Result<Provider, sqlx::Error> {
        sqlx::query_as::<_, Provider>(
            r#"
            UPDATE service_providers
            SET availability_status = $2
            WHERE id = $1
            RETURNING id, user_id, availability_status, is_verified, rating, total_jobs, created_at
            "#,
        )
        .bind(provider_id)
        .bind(availability_status)
        .fetch_one(&self.pool)
        .await
    }
}
