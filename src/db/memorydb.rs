//! In-memory store used by the unit and router tests.
//!
//! Mirrors the guarantees the Postgres schema gives: the partial unique index on live
//! slots, the compare-and-set status update and the append-only tracking table.
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{
    bookingdb::BookingExt, db::StoreHealth, servicedb::CatalogExt, userdb::UserExt,
};
use crate::models::{bookingmodel::*, servicemodel::*, usermodel::*};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    providers: Vec<Provider>,
    categories: Vec<Category>,
    services: Vec<Service>,
    bookings: Vec<Booking>,
    tracking: Vec<BookingTracking>,
}

impl Tables {
    fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    fn view(&self, booking: &Booking) -> Option<BookingView> {
        let service = self.services.iter().find(|s| s.id == booking.service_id)?;
        let provider = self.providers.iter().find(|p| p.id == booking.provider_id)?;
        let provider_user = self.user(&provider.user_id)?;
        let customer = self.user(&booking.user_id)?;

        Some(BookingView {
            booking: booking.clone(),
            service_title: service.title.clone(),
            service_price: service.price,
            service_category: service.category.clone(),
            provider_name: provider_user.name.clone(),
            provider_phone: provider_user.phone.clone(),
            customer_name: customer.name.clone(),
            customer_phone: customer.phone.clone(),
        })
    }

    fn service_view(&self, service: &Service) -> Option<ServiceView> {
        let provider = self.providers.iter().find(|p| p.id == service.provider_id)?;
        let provider_user = self.user(&provider.user_id)?;

        Some(ServiceView {
            service: service.clone(),
            provider_name: provider_user.name.clone(),
            provider_avatar_url: provider_user.avatar_url.clone(),
            provider_rating: provider.rating,
            provider_is_verified: provider.is_verified,
        })
    }

    fn append_tracking(&mut self, booking_id: Uuid, status_text: &str) {
        let id = self.tracking.len() as i64 + 1;
        self.tracking.push(BookingTracking {
            id,
            booking_id,
            status_text: status_text.to_string(),
            recorded_at: Utc::now(),
        });
    }
}

/// Same predicate as the WHERE clause built by `servicedb::push_service_filters`.
fn matches_query(query: &ServiceQuery, service: &Service) -> bool {
    fn contains(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    service.is_active
        && query.category.as_deref().map_or(true, |c| service.category == c)
        && query.location.as_deref().map_or(true, |l| {
            service.location.as_deref().map_or(false, |stored| contains(stored, l))
        })
        && query.min_price.map_or(true, |min| service.price >= min)
        && query.max_price.map_or(true, |max| service.price <= max)
        && query.search.as_deref().map_or(true, |q| {
            contains(&service.title, q) || contains(&service.description, q)
        })
}

fn apply_patch(patch: ServicePatch, service: &mut Service) {
    if let Some(title) = patch.title {
        service.title = title;
    }
    if let Some(description) = patch.description {
        service.description = description;
    }
    if let Some(category) = patch.category {
        service.category = category;
    }
    if let Some(price) = patch.price {
        service.price = price;
    }
    if let Some(location) = patch.location {
        service.location = location;
    }
    if let Some(is_active) = patch.is_active {
        service.is_active = is_active;
    }
}

#[derive(Debug, Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user_id: &str, name: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: user_id.to_string(),
            name: Some(name.to_string()),
            email: Some(format!("{}@example.com", user_id)),
            phone: Some("08030000000".to_string()),
            avatar_url: None,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().users.push(user.clone());
        user
    }

    /// Seeds a user with a provider profile and returns both.
    pub fn seed_provider(&self, user_id: &str, name: &str) -> (User, Provider) {
        let mut user = self.seed_user(user_id, name);
        user.role = UserRole::Provider;
        let provider = Provider {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            availability_status: AvailabilityStatus::Available,
            is_verified: true,
            rating: 4.5,
            total_jobs: 0,
            created_at: Utc::now(),
        };

        let mut tables = self.tables.lock().unwrap();
        if let Some(stored) = tables.users.iter_mut().find(|u| u.id == user_id) {
            stored.role = UserRole::Provider;
        }
        tables.providers.push(provider.clone());
        (user, provider)
    }

    pub fn seed_category(&self, name: &str, display_order: i32) {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.categories.len() as i32 + 1;
        tables.categories.push(Category {
            id,
            name: name.to_string(),
            icon: None,
            is_active: true,
            display_order,
        });
    }

    pub fn seed_service(&self, provider_id: Uuid, title: &str, price: f64, is_active: bool) -> Service {
        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4(),
            provider_id,
            title: title.to_string(),
            description: format!("{} at your doorstep", title),
            category: "Plumbing".to_string(),
            price,
            location: Some("Lagos".to_string()),
            is_active,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().services.push(service.clone());
        service
    }

    pub fn booking_count(&self) -> usize {
        self.tables.lock().unwrap().bookings.len()
    }

    pub fn tracking_count(&self) -> usize {
        self.tables.lock().unwrap().tracking.len()
    }

    pub fn provider(&self, provider_id: Uuid) -> Option<Provider> {
        self.tables
            .lock()
            .unwrap()
            .providers
            .iter()
            .find(|p| p.id == provider_id)
            .cloned()
    }
}

#[async_trait]
impl StoreHealth for MemoryDb {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

#[async_trait]
impl UserExt for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().user(user_id).cloned())
    }

    async fn provision_user(&self, user_id: &str) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.user(user_id) {
            return Ok(user.clone());
        }
        let now = Utc::now();
        let user = User {
            id: user_id.to_string(),
            name: None,
            email: None,
            phone: None,
            avatar_url: None,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn upsert_user(
        &self,
        user_id: &str,
        name: Option<String>,
        email: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.name = name;
            user.email = email;
            user.avatar_url = avatar_url;
            user.updated_at = now;
            return Ok(user.clone());
        }
        let user = User {
            id: user_id.to_string(),
            name,
            email,
            phone: None,
            avatar_url,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_profile(
        &self,
        user_id: &str,
        name: Option<String>,
        phone: Option<Option<String>>,
        avatar_url: Option<Option<String>>,
    ) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        if name.is_some() {
            user.name = name;
        }
        if let Some(phone) = phone {
            user.phone = phone;
        }
        if let Some(avatar_url) = avatar_url {
            user.avatar_url = avatar_url;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn get_provider_by_user(&self, user_id: &str) -> Result<Option<Provider>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .providers
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn create_provider(&self, user_id: &str) -> Result<Provider, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.providers.iter().any(|p| p.user_id == user_id) {
            return Err(sqlx::Error::Protocol("duplicate provider".into()));
        }
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.role = UserRole::Provider;

        let provider = Provider {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            availability_status: AvailabilityStatus::Offline,
            is_verified: false,
            rating: 0.0,
            total_jobs: 0,
            created_at: Utc::now(),
        };
        tables.providers.push(provider.clone());
        Ok(provider)
    }

    async fn update_provider_availability(
        &self,
        provider_id: Uuid,
        availability_status: AvailabilityStatus,
    ) -> Result<Provider, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let provider = tables
            .providers
            .iter_mut()
            .find(|p| p.id == provider_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        provider.availability_status = availability_status;
        Ok(provider.clone())
    }
}

#[async_trait]
impl CatalogExt for MemoryDb {
    async fn get_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        let mut categories: Vec<Category> = self
            .tables
            .lock()
            .unwrap()
            .categories
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        categories.sort_by_key(|c| c.display_order);
        Ok(categories)
    }

    async fn get_active_category(&self, name: &str) -> Result<Option<Category>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .categories
            .iter()
            .find(|c| c.is_active && c.name == name)
            .cloned())
    }

    async fn get_services(
        &self,
        query: &ServiceQuery,
    ) -> Result<(Vec<ServiceView>, i64), sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut matched: Vec<&Service> = tables
            .services
            .iter()
            .filter(|s| matches_query(query, s))
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match query.sort {
                ServiceSort::CreatedAt => a.created_at.cmp(&b.created_at),
                ServiceSort::Price => a.price.total_cmp(&b.price),
                ServiceSort::Title => a.title.cmp(&b.title),
            };
            let ordering = if query.ascending { ordering } else { ordering.reverse() };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .filter_map(|s| tables.service_view(s))
            .collect();
        Ok((page, total))
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .services
            .iter()
            .find(|s| s.id == service_id)
            .cloned())
    }

    async fn get_service_view(&self, service_id: Uuid) -> Result<Option<ServiceView>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .services
            .iter()
            .find(|s| s.id == service_id)
            .and_then(|s| tables.service_view(s)))
    }

    async fn get_services_by_provider(
        &self,
        provider_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<ServiceView>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut services: Vec<&Service> = tables
            .services
            .iter()
            .filter(|s| s.provider_id == provider_id && (include_inactive || s.is_active))
            .collect();
        services.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(services
            .into_iter()
            .filter_map(|s| tables.service_view(s))
            .collect())
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
        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4(),
            provider_id,
            title,
            description,
            category,
            price,
            location,
            is_active,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().services.push(service.clone());
        Ok(service)
    }

    async fn update_service(
        &self,
        service_id: Uuid,
        patch: ServicePatch,
    ) -> Result<Service, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let service = tables
            .services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        apply_patch(patch, service);
        service.updated_at = Utc::now();
        Ok(service.clone())
    }

    async fn deactivate_idle_service(&self, service_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let busy = tables
            .bookings
            .iter()
            .any(|b| b.service_id == service_id && !b.status.is_terminal());
        if busy {
            return Ok(false);
        }
        match tables.services.iter_mut().find(|s| s.id == service_id) {
            Some(service) => {
                service.is_active = false;
                service.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl BookingExt for MemoryDb {
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned())
    }

    async fn get_booking_view(&self, booking_id: Uuid) -> Result<Option<BookingView>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .and_then(|b| tables.view(b)))
    }

    async fn get_booked_slots(
        &self,
        service_id: Uuid,
        booking_date: NaiveDate,
    ) -> Result<Vec<String>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .bookings
            .iter()
            .filter(|b| {
                b.service_id == service_id
                    && b.booking_date == booking_date
                    && b.status != BookingStatus::Cancelled
            })
            .map(|b| b.time_slot.clone())
            .collect())
    }

    async fn create_booking(
        &self,
        booking: NewBooking,
        tracking_text: &str,
    ) -> Result<SlotReservation, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();

        let taken = tables.bookings.iter().any(|b| {
            b.service_id == booking.service_id
                && b.booking_date == booking.booking_date
                && b.time_slot == booking.time_slot
                && b.status != BookingStatus::Cancelled
        });
        if taken {
            return Ok(SlotReservation::Taken);
        }

        let now = Utc::now();
        let row = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            service_id: booking.service_id,
            provider_id: booking.provider_id,
            booking_date: booking.booking_date,
            time_slot: booking.time_slot,
            address: booking.address,
            city: booking.city,
            urgency: booking.urgency,
            notes: booking.notes,
            status: BookingStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };
        // No rows are written unless the joined view resolves.
        let view = tables.view(&row).ok_or(sqlx::Error::RowNotFound)?;
        tables.bookings.push(row);
        tables.append_tracking(view.booking.id, tracking_text);

        Ok(SlotReservation::Reserved(view))
    }

    async fn apply_status_change(&self, change: StatusChange) -> Result<Option<Booking>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(booking) = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == change.booking_id && b.status == change.from)
        else {
            return Ok(None);
        };

        booking.status = change.to;
        if change.cancellation_reason.is_some() {
            booking.cancellation_reason = change.cancellation_reason.clone();
        }
        booking.updated_at = Utc::now();
        let updated = booking.clone();

        tables.append_tracking(updated.id, &change.tracking_text);
        if change.to == BookingStatus::Completed {
            if let Some(provider) = tables.providers.iter_mut().find(|p| p.id == updated.provider_id) {
                provider.total_jobs += 1;
            }
        }
        Ok(Some(updated))
    }

    async fn get_booking_tracking(&self, booking_id: Uuid) -> Result<Vec<BookingTracking>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .tracking
            .iter()
            .filter(|t| t.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn get_user_bookings(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BookingView>, i64), sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<&Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && status.map_or(true, |s| b.status == s))
            .collect();
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|b| tables.view(b))
            .collect();
        Ok((page, total))
    }

    async fn get_provider_bookings(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BookingView>, i64), sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<&Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.provider_id == provider_id && status.map_or(true, |s| b.status == s))
            .collect();
        rows.sort_by(|a, b| {
            a.booking_date
                .cmp(&b.booking_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|b| tables.view(b))
            .collect();
        Ok((page, total))
    }

    async fn get_booking_status_counts(&self, provider_id: Uuid) -> Result<Vec<StatusCount>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(BookingStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: tables
                    .bookings
                    .iter()
                    .filter(|b| b.provider_id == provider_id && b.status == status)
                    .count() as i64,
            })
            .filter(|c| c.count > 0)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(title: &str, price: f64, location: Option<&str>) -> Service {
        Service {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            title: title.to_string(),
            description: "Fixes leaking pipes and taps".to_string(),
            category: "Plumbing".to_string(),
            price,
            location: location.map(str::to_string),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn query_filters_on_price_range_and_location() {
        let query = ServiceQuery {
            min_price: Some(50.0),
            max_price: Some(100.0),
            location: Some("lagos".to_string()),
            ..Default::default()
        };

        assert!(matches_query(&query, &service("Pipe repair", 80.0, Some("Ikeja, Lagos"))));
        assert!(!matches_query(&query, &service("Pipe repair", 120.0, Some("Lagos"))));
        assert!(!matches_query(&query, &service("Pipe repair", 80.0, Some("Abuja"))));
        assert!(!matches_query(&query, &service("Pipe repair", 80.0, None)));
    }

    #[test]
    fn search_looks_at_title_and_description() {
        let leak = ServiceQuery {
            search: Some("LEAK".to_string()),
            ..Default::default()
        };
        assert!(matches_query(&leak, &service("Pipe repair", 80.0, None)));

        let roofing = ServiceQuery {
            search: Some("roofing".to_string()),
            ..Default::default()
        };
        assert!(!matches_query(&roofing, &service("Pipe repair", 80.0, None)));

        let mut hidden = service("Pipe repair", 80.0, None);
        hidden.is_active = false;
        assert!(!matches_query(&ServiceQuery::default(), &hidden));
    }

    #[test]
    fn patch_keeps_sets_and_clears_location() {
        let mut stored = service("Pipe repair", 80.0, Some("Lagos"));

        apply_patch(ServicePatch::default(), &mut stored);
        assert_eq!(stored.location.as_deref(), Some("Lagos"));

        apply_patch(
            ServicePatch {
                location: Some(Some("Abuja".into())),
                ..Default::default()
            },
            &mut stored,
        );
        assert_eq!(stored.location.as_deref(), Some("Abuja"));

        apply_patch(
            ServicePatch {
                location: Some(None),
                ..Default::default()
            },
            &mut stored,
        );
        assert_eq!(stored.location, None);
    }

    #[tokio::test]
    async fn failed_booking_view_leaves_no_rows_behind() {
        let db = MemoryDb::new();
        let (_, provider) = db.seed_provider("provider-1", "Bola");
        let listing = db.seed_service(provider.id, "Pipe repair", 80.0, true);

        let orphan = NewBooking {
            user_id: "never-synced".to_string(),
            service_id: listing.id,
            provider_id: provider.id,
            booking_date: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            time_slot: "10:00 AM".to_string(),
            address: None,
            city: None,
            urgency: Urgency::Normal,
            notes: None,
        };

        let err = db.create_booking(orphan, "Booking created").await.unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
        assert_eq!(db.booking_count(), 0);
        assert_eq!(db.tracking_count(), 0);
    }
}
