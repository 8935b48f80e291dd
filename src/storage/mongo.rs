use super::{
    AppointmentRecord, CartRecord, OrderRecord, OrderStatus, StorageError, Store, UserRecord,
};
use async_trait::async_trait;
use bson::{Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use serde_json::Value;
use tracing::info;

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed store over the `users`, `carts`, `orders` and
/// `appointments` collections
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<UserRecord>,
    carts: Collection<CartRecord>,
    orders: Collection<OrderRecord>,
    appointments: Collection<AppointmentRecord>,
}

impl MongoStore {
    /// Connect, ping the server, and make sure the indexes exist
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StorageError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;

        let store = Self::from_database(&db);
        store.ensure_indexes().await?;

        info!(database, "Connected to MongoDB");
        Ok(store)
    }

    pub fn from_database(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
            carts: db.collection("carts"),
            orders: db.collection("orders"),
            appointments: db.collection("appointments"),
        }
    }

    async fn ensure_indexes(&self) -> Result<(), StorageError> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.carts
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.orders
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "createdAt": -1 })
                    .build(),
            )
            .await?;
        self.appointments
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "date": -1 })
                    .build(),
            )
            .await?;

        Ok(())
    }
}

fn owner_filter(owner: Option<&str>) -> Document {
    match owner {
        Some(user_id) => doc! { "userId": user_id },
        None => doc! {},
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl Store for MongoStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), StorageError> {
        match self.users.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StorageError::Duplicate(user.email.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn cart_items(&self, user_id: &str) -> Result<Vec<Value>, StorageError> {
        let cart = self.carts.find_one(doc! { "userId": user_id }).await?;
        Ok(cart.map(|c| c.items).unwrap_or_default())
    }

    async fn replace_cart(&self, user_id: &str, items: &[Value]) -> Result<(), StorageError> {
        let items = bson::to_bson(items)?;
        self.carts
            .update_one(doc! { "userId": user_id }, doc! { "$set": { "items": items } })
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn insert_order(&self, order: &OrderRecord) -> Result<(), StorageError> {
        let document = bson::to_document(order)?;
        self.orders
            .clone_with_type::<Document>()
            .insert_one(document)
            .await?;
        Ok(())
    }

    async fn list_orders(&self, owner: Option<&str>) -> Result<Vec<OrderRecord>, StorageError> {
        let cursor = self
            .orders
            .find(owner_filter(owner))
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_order_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
    ) -> Result<Option<OrderRecord>, StorageError> {
        Ok(self
            .orders
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn insert_appointment(
        &self,
        appointment: &AppointmentRecord,
    ) -> Result<(), StorageError> {
        let document = bson::to_document(appointment)?;
        self.appointments
            .clone_with_type::<Document>()
            .insert_one(document)
            .await?;
        Ok(())
    }

    async fn list_appointments(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<AppointmentRecord>, StorageError> {
        let cursor = self
            .appointments
            .find(owner_filter(owner))
            .sort(doc! { "date": -1, "_id": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
