// db/servicedb.rs
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::servicemodel::*;

#[async_trait]
pub trait CatalogExt {
    async fn get_categories(&self) -> Result<Vec<Category>, sqlx::Error>;

    async fn get_active_category(&self, name: &str) -> Result<Option<Category>, sqlx::Error>;

    /// One page of active services plus the total number of matches.
    async fn get_services(&self, query: &ServiceQuery)
        -> Result<(Vec<ServiceView>, i64), sqlx::Error>;

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error>;

    async fn get_service_view(&self, service_id: Uuid) -> Result<Option<ServiceView>, sqlx::Error>;

    async fn get_services_by_provider(
        &self,
        provider_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<ServiceView>, sqlx::Error>;

    async fn create_service(
        &self,
        provider_id: Uuid,
        title: String,
        description: String,
        category: String,
        price: f64,
        location: Option<String>,
        is_active: bool,
    ) -> Result<Service, sqlx::Error>;

    async fn update_service(
        &self,
        service_id: Uuid,
        patch: ServicePatch,
    ) -> Result<Service, sqlx::Error>;

    /// Deactivates the service unless a pending, accepted or in-progress booking references it.
    /// Returns false when such a booking exists.
    async fn deactivate_idle_service(&self, service_id: Uuid) -> Result<bool, sqlx::Error>;
}

/// Escapes LIKE metacharacters so user input is matched literally.
pub fn like_pattern(input: &str) -> String {
    let escaped = input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

const SERVICE_VIEW_SELECT: &str = r#"
    SELECT s.id, s.provider_id, s.title, s.description, s.category, s.price, s.location,
           s.is_active, s.created_at, s.updated_at,
           u.name AS provider_name,
           u.avatar_url AS provider_avatar_url,
           p.rating AS provider_rating,
           p.is_verified AS provider_is_verified
    FROM services s
    JOIN service_providers p ON p.id = s.provider_id
    JOIN users u ON u.id = p.user_id
"#;

fn push_service_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ServiceQuery) {
    builder.push(" WHERE s.is_active = TRUE");

    if let Some(category) = &query.category {
        builder.push(" AND s.category = ").push_bind(category.clone());
    }
    if let Some(location) = &query.location {
        builder
            .push(" AND s.location ILIKE ")
            .push_bind(like_pattern(location));
    }
    if let Some(min_price) = query.min_price {
        builder.push(" AND s.price >= ").push_bind(min_price);
    }
    if let Some(max_price) = query.max_price {
        builder.push(" AND s.price <= ").push_bind(max_price);
    }
    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (s.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl CatalogExt for DBClient {
    async fn get_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, icon, is_active, display_order
            FROM categories
            WHERE is_active = TRUE
            ORDER BY display_order ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_active_category(&self, name: &str) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, icon, is_active, display_order
            FROM categories
            WHERE name = $1 AND is_active = TRUE
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_services(
        &self,
        query: &ServiceQuery,
    ) -> Result<(Vec<ServiceView>, i64), sqlx::Error> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM services s");
        push_service_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut list = QueryBuilder::<Postgres>::new(SERVICE_VIEW_SELECT);
        push_service_filters(&mut list, query);
        list.push(" ORDER BY ")
            .push(query.sort.column())
            .push(if query.ascending { " ASC" } else { " DESC" })
            .push(", s.id ASC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let services = list
            .build_query_as::<ServiceView>()
            .fetch_all(&self.pool)
            .await?;

        Ok((services, total))
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT id, provider_id, title, description, category, price, location, is_active, created_at, updated_at
            FROM services
            WHERE id = $1
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_service_view(&self, service_id: Uuid) -> Result<Option<ServiceView>, sqlx::Error> {
        let sql = format!("{} WHERE s.id = $1", SERVICE_VIEW_SELECT);
        sqlx::query_as::<_, ServiceView>(&sql)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_services_by_provider(
        &self,
        provider_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<ServiceView>, sqlx::Error> {
        let sql = format!(
            "{} WHERE s.provider_id = $1 AND ($2 OR s.is_active = TRUE) ORDER BY s.created_at DESC",
            SERVICE_VIEW_SELECT
        );
        sqlx::query_as::<_, ServiceView>(&sql)
            .bind(provider_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
    }

    async fn create_service(
        &self,
        provider_id: Uuid,
        title: String,
        description: String,
        category: String,
        price: f64,
        location: Option<String>,
        is_active: bool,
    ) -> Result<Service, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (provider_id, title, description, category, price, location, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, provider_id, title, description, category, price, location, is_active, created_at, updated_at
            "#,
        )
        .bind(provider_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(price)
        .bind(location)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_service(
        &self,
        service_id: Uuid,
        patch: ServicePatch,
    ) -> Result<Service, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                price = COALESCE($5, price),
                location = CASE WHEN $6 THEN $7 ELSE location END,
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, provider_id, title, description, category, price, location, is_active, created_at, updated_at
            "#,
        )
        .bind(service_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.category)
        .bind(patch.price)
        .bind(patch.location.is_some())
        .bind(patch.location.flatten())
        .bind(patch.is_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn deactivate_idle_service(&self, service_id: Uuid) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE services
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM bookings
                  WHERE service_id = $1
                    AND status IN ('pending', 'accepted', 'in_progress')
              )
            "#,
        )
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        Ok(updated.rows_affected() == 1)
    }
}
