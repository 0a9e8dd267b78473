pub mod bookingdb;
pub mod db;
#[cfg(test)]
pub mod memorydb;
pub mod servicedb;
pub mod userdb;

use self::{bookingdb::BookingExt, db::StoreHealth, servicedb::CatalogExt, userdb::UserExt};

/// Everything the handlers and services need from persistence.
pub trait Store: UserExt + CatalogExt + BookingExt + StoreHealth + std::fmt::Debug + Send + Sync {}

impl<T> Store for T where
    T: UserExt + CatalogExt + BookingExt + StoreHealth + std::fmt::Debug + Send + Sync
{
}
