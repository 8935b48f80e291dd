use super::{AppointmentRecord, OrderRecord, OrderStatus, StorageError, Store, UserRecord};
use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process store for local runs and tests. Mirrors the unique email
/// index, the BSON encoding limits and the sort orders of `MongoStore`;
/// nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    users: Vec<UserRecord>,
    carts: HashMap<String, Vec<Value>>,
    orders: Vec<OrderRecord>,
    appointments: Vec<AppointmentRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(owner: Option<&str>, user_id: &str) -> bool {
    owner.is_none_or(|o| o == user_id)
}

/// Dates are usually strings; anything else sorts by its JSON text
fn date_key(date: &Value) -> String {
    match date {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StorageError::Duplicate(user.email.clone()));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn cart_items(&self, user_id: &str) -> Result<Vec<Value>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.carts.get(user_id).cloned().unwrap_or_default())
    }

    async fn replace_cart(&self, user_id: &str, items: &[Value]) -> Result<(), StorageError> {
        bson::to_bson(items)?;
        let mut inner = self.inner.write().await;
        inner.carts.insert(user_id.to_string(), items.to_vec());
        Ok(())
    }

    async fn insert_order(&self, order: &OrderRecord) -> Result<(), StorageError> {
        bson::to_document(order)?;
        self.inner.write().await.orders.push(order.clone());
        Ok(())
    }

    async fn list_orders(&self, owner: Option<&str>) -> Result<Vec<OrderRecord>, StorageError> {
        let inner = self.inner.read().await;
        let mut orders: Vec<OrderRecord> = inner
            .orders
            .iter()
            .filter(|o| owned_by(owner, &o.user_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn set_order_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
    ) -> Result<Option<OrderRecord>, StorageError> {
        let mut inner = self.inner.write().await;
        Ok(inner.orders.iter_mut().find(|o| o.id == id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }

    async fn insert_appointment(
        &self,
        appointment: &AppointmentRecord,
    ) -> Result<(), StorageError> {
        bson::to_document(appointment)?;
        self.inner.write().await.appointments.push(appointment.clone());
        Ok(())
    }

    async fn list_appointments(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<AppointmentRecord>, StorageError> {
        let inner = self.inner.read().await;
        let mut appointments: Vec<AppointmentRecord> = inner
            .appointments
            .iter()
            .filter(|a| owned_by(owner, &a.user_id))
            .cloned()
            .collect();
        appointments.sort_by_cached_key(|a| std::cmp::Reverse((date_key(&a.date), a.id)));
        Ok(appointments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime;
    use serde_json::json;

    fn appointment(user_id: &str, date: &str) -> AppointmentRecord {
        AppointmentRecord {
            id: ObjectId::new(),
            user_id: user_id.to_string(),
            name: json!("Ann"),
            email: json!("ann@example.com"),
            phone: json!("555-0100"),
            date: json!(date),
            time: json!("10:00"),
            service: json!("fitting"),
            address: Value::Null,
            store_location: Value::Null,
            payment_method: Value::Null,
            notes: Value::Null,
            created_at: DateTime::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let user = UserRecord::new("Ann".into(), "ann@example.com".into(), "h".into(), false);
        store.insert_user(&user).await.unwrap();

        let again = UserRecord::new("Other".into(), "ann@example.com".into(), "h".into(), false);
        assert!(matches!(
            store.insert_user(&again).await,
            Err(StorageError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn cart_is_replaced_not_merged() {
        let store = MemoryStore::new();
        assert!(store.cart_items("u1").await.unwrap().is_empty());

        store
            .replace_cart("u1", &[json!({"productId": "a"}), json!({"productId": "b"})])
            .await
            .unwrap();
        store
            .replace_cart("u1", &[json!({"productId": "c"})])
            .await
            .unwrap();

        assert_eq!(
            store.cart_items("u1").await.unwrap(),
            vec![json!({"productId": "c"})]
        );
        assert!(store.cart_items("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn values_bson_cannot_hold_are_refused_without_mutation() {
        let store = MemoryStore::new();
        store
            .replace_cart("u1", &[json!({"price": 10})])
            .await
            .unwrap();

        let result = store
            .replace_cart("u1", &[json!({"price": u64::MAX})])
            .await;
        assert!(matches!(result, Err(StorageError::Encode(_))));
        assert_eq!(
            store.cart_items("u1").await.unwrap(),
            vec![json!({"price": 10})]
        );

        let order = OrderRecord::new("u1".into(), vec![json!({"quantity": u64::MAX})], 1.0);
        assert!(matches!(
            store.insert_order(&order).await,
            Err(StorageError::Encode(_))
        ));
        assert!(store.list_orders(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_are_newest_first_and_filtered_by_owner() {
        let store = MemoryStore::new();
        let first = OrderRecord::new("u1".into(), vec![json!({})], 1.0);
        let second = OrderRecord::new("u2".into(), vec![json!({})], 2.0);
        let third = OrderRecord::new("u1".into(), vec![json!({})], 3.0);
        for order in [&first, &second, &third] {
            store.insert_order(order).await.unwrap();
        }

        let mine: Vec<ObjectId> = store
            .list_orders(Some("u1"))
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(mine, vec![third.id, first.id]);

        let all = store.list_orders(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, third.id);
    }

    #[tokio::test]
    async fn status_update_on_unknown_id_is_none() {
        let store = MemoryStore::new();
        let order = OrderRecord::new("u1".into(), vec![json!({})], 1.0);
        store.insert_order(&order).await.unwrap();

        let updated = store
            .set_order_status(order.id, OrderStatus::Dispatched)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Dispatched);

        let missing = store
            .set_order_status(ObjectId::new(), OrderStatus::Completed)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn appointments_sorted_by_date_descending() {
        let store = MemoryStore::new();
        for date in ["2024-05-01", "2024-07-15", "2024-06-10"] {
            store
                .insert_appointment(&appointment("u1", date))
                .await
                .unwrap();
        }
        store
            .insert_appointment(&appointment("u2", "2025-01-01"))
            .await
            .unwrap();

        let dates: Vec<Value> = store
            .list_appointments(Some("u1"))
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.date)
            .collect();
        assert_eq!(
            dates,
            vec![json!("2024-07-15"), json!("2024-06-10"), json!("2024-05-01")]
        );

        assert_eq!(
            store.list_appointments(None).await.unwrap()[0].date,
            json!("2025-01-01")
        );
    }
}
