pub mod memory;
pub mod mongo;
pub mod records;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use records::{AppointmentRecord, CartRecord, OrderRecord, OrderStatus, UserRecord};

use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique index rejected the write
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("document encoding error: {0}")]
    Encode(#[from] bson::ser::Error),
}

/// Data access for the four collections.
///
/// Every method is one round trip; nothing here spans collections.
/// `owner: None` on the list methods means "all users".
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Fails with `StorageError::Duplicate` when the email is taken
    async fn insert_user(&self, user: &UserRecord) -> Result<(), StorageError>;

    /// Items of the user's cart, empty when no cart exists yet
    async fn cart_items(&self, user_id: &str) -> Result<Vec<Value>, StorageError>;

    /// Replace the cart wholesale, creating it if needed
    async fn replace_cart(&self, user_id: &str, items: &[Value]) -> Result<(), StorageError>;

    async fn insert_order(&self, order: &OrderRecord) -> Result<(), StorageError>;

    /// Newest first
    async fn list_orders(&self, owner: Option<&str>) -> Result<Vec<OrderRecord>, StorageError>;

    /// Returns the updated order, or `None` if no order has this id
    async fn set_order_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
    ) -> Result<Option<OrderRecord>, StorageError>;

    async fn insert_appointment(&self, appointment: &AppointmentRecord) -> Result<(), StorageError>;

    /// Sorted by appointment date, latest first
    async fn list_appointments(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<AppointmentRecord>, StorageError>;
}
