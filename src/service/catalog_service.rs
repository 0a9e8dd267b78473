// service/catalog_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::Store,
    dtos::{apidtos::Pagination, servicedtos::*},
    models::{servicemodel::*, usermodel::Provider},
    service::error::ServiceError,
    utils::params::{clearable, non_empty, parse_price, PageRequest},
};

#[derive(Debug, Clone)]
pub struct CatalogService {
    db_client: Arc<dyn Store>,
}

/// Turns the raw query string into a store query plus the page it describes.
pub fn service_query(filter: &ServiceFilterDto) -> (ServiceQuery, PageRequest) {
    let page = PageRequest::from_params(
        filter.page.as_deref(),
        filter.limit.as_deref(),
        DEFAULT_SERVICE_PAGE_SIZE,
    );

    let query = ServiceQuery {
        category: non_empty(filter.category.clone()),
        location: non_empty(filter.location.clone()),
        min_price: parse_price(filter.min_price.as_deref()),
        max_price: parse_price(filter.max_price.as_deref()),
        search: non_empty(filter.search.clone()),
        sort: ServiceSort::from_param(filter.sort_by.as_deref()),
        ascending: filter
            .order
            .as_deref()
            .map(|o| o.eq_ignore_ascii_case("asc"))
            .unwrap_or(false),
        limit: page.limit(),
        offset: page.offset(),
    };

    (query, page)
}

impl CatalogService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn list_services(
        &self,
        filter: ServiceFilterDto,
    ) -> Result<(Vec<ServiceView>, Pagination), ServiceError> {
        let (query, page) = service_query(&filter);
        let (services, total) = self.db_client.get_services(&query).await?;
        Ok((services, Pagination::new(page.page, page.limit, total)))
    }

    pub async fn get_service(&self, service_id: Uuid) -> Result<Service, ServiceError> {
        self.db_client
            .get_service(service_id)
            .await?
            .ok_or(ServiceError::ServiceNotFound(service_id))
    }

    /// The listing as shown to customers, with the provider's name and rating.
    pub async fn service_detail(&self, service_id: Uuid) -> Result<ServiceView, ServiceError> {
        self.db_client
            .get_service_view(service_id)
            .await?
            .ok_or(ServiceError::ServiceNotFound(service_id))
    }

    pub async fn services_by_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ServiceView>, ServiceError> {
        Ok(self
            .db_client
            .get_services_by_provider(provider_id, false)
            .await?)
    }

    pub async fn my_services(&self, provider: &Provider) -> Result<Vec<ServiceView>, ServiceError> {
        Ok(self
            .db_client
            .get_services_by_provider(provider.id, true)
            .await?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.db_client.get_categories().await?)
    }

    pub async fn create_service(
        &self,
        provider: &Provider,
        dto: CreateServiceDto,
    ) -> Result<Service, ServiceError> {
        let price = dto
            .price
            .ok_or_else(|| ServiceError::Validation("Price is required".to_string()))?;
        if price < 0.0 {
            return Err(ServiceError::Validation("Price must be positive".to_string()));
        }

        let category = dto.category.trim().to_string();
        self.ensure_category(&category).await?;

        let service = self
            .db_client
            .create_service(
                provider.id,
                dto.title.trim().to_string(),
                dto.description.trim().to_string(),
                category,
                price,
                non_empty(dto.location),
                dto.is_active.unwrap_or(true),
            )
            .await?;

        tracing::info!(service_id = %service.id, provider_id = %provider.id, "service created");
        Ok(service)
    }

    pub async fn update_service(
        &self,
        provider: &Provider,
        service_id: Uuid,
        dto: UpdateServiceDto,
    ) -> Result<Service, ServiceError> {
        let service = self.get_service(service_id).await?;
        if service.provider_id != provider.id {
            return Err(ServiceError::Forbidden(
                "Not authorized to update this service".to_string(),
            ));
        }

        let category = non_empty(dto.category);
        if let Some(category) = &category {
            self.ensure_category(category).await?;
        }

        let patch = ServicePatch {
            title: non_empty(dto.title),
            description: non_empty(dto.description),
            category,
            price: dto.price,
            location: clearable(dto.location),
            is_active: dto.is_active,
        };

        Ok(self.db_client.update_service(service_id, patch).await?)
    }

    /// Soft-deletes the listing so past bookings keep their reference.
    pub async fn delete_service(
        &self,
        provider: &Provider,
        service_id: Uuid,
    ) -> Result<(), ServiceError> {
        let service = self.get_service(service_id).await?;
        if service.provider_id != provider.id {
            return Err(ServiceError::Forbidden(
                "Not authorized to delete this service".to_string(),
            ));
        }

        if !self.db_client.deactivate_idle_service(service_id).await? {
            tracing::warn!(%service_id, "delete refused, service has open bookings");
            return Err(ServiceError::ServiceHasActiveBookings(service_id));
        }

        tracing::info!(%service_id, "service deactivated");
        Ok(())
    }

    async fn ensure_category(&self, name: &str) -> Result<(), ServiceError> {
        match self.db_client.get_active_category(name).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::CategoryNotFound(name.to_string())),
        }
    }
}
