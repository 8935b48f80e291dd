use crate::auth::{AdminPolicy, AuthError, TokenService};
use crate::config::AuthConfig;
use crate::storage::{
    AppointmentRecord, OrderRecord, OrderStatus, StorageError, Store, UserRecord,
};
use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub admin_policy: Arc<AdminPolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: &AuthConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenService::new(
                auth.jwt_secret.as_bytes(),
                chrono::Duration::days(auth.token_ttl_days),
            )),
            admin_policy: Arc::new(AdminPolicy::from_config(auth)),
        }
    }
}

/// JSON body extractor whose rejections render as `AppError`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

// ---------- Auth ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: Option<Value>,
}

/// Registration fields after trimming and email normalisation
#[derive(Debug, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub requested_admin: bool,
}

impl RegisterRequest {
    /// Trim, lowercase the email, and require all three fields
    pub fn validate(self) -> Result<Registration, String> {
        let name = self.name.unwrap_or_default().trim().to_string();
        let email = normalize_email(self.email.as_deref());
        let password = self.password.unwrap_or_default();

        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err("Name, email and password are required".to_string());
        }

        Ok(Registration {
            name,
            email,
            password,
            requested_admin: self.is_admin.as_ref().is_some_and(truthy),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// JSON truthiness: null, `false`, zero, `""` and empty containers are falsy
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub fn normalize_email(email: Option<&str>) -> String {
    email.unwrap_or_default().trim().to_lowercase()
}

/// The user as shown to clients; never carries the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

// ---------- Cart ----------

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    #[serde(default)]
    pub items: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<Value>,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct CartUpdatedResponse {
    pub message: String,
    pub total: f64,
}

/// Sum of price × quantity. Missing or non-numeric price counts as 0,
/// missing or non-numeric quantity as 1; non-object lines count as 0.
pub fn cart_total(items: &[Value]) -> f64 {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            let price = item.get("price").and_then(Value::as_f64).unwrap_or(0.0);
            let quantity = item.get("quantity").and_then(Value::as_f64).unwrap_or(1.0);
            price * quantity
        })
        .sum()
}

// ---------- Orders ----------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Option<Value>,
    #[serde(default)]
    pub total: Option<Value>,
}

impl CreateOrderRequest {
    /// Items must be a non-empty list and total a number
    pub fn validate(self) -> Result<(Vec<Value>, f64), String> {
        let missing = || "Items and total are required".to_string();

        let items = match self.items {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => return Err(missing()),
        };
        let total = self.total.as_ref().and_then(Value::as_f64).ok_or_else(missing)?;

        Ok((items, total))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<Value>,
}

impl UpdateStatusRequest {
    pub fn validate(&self) -> Result<OrderStatus, String> {
        self.status
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| "Invalid status".to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub items: Vec<Value>,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRecord> for OrderView {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id.to_hex(),
            user_id: order.user_id,
            items: order.items,
            total: order.total,
            status: order.status,
            created_at: order.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: OrderView,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderView>,
}

// ---------- Appointments ----------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAppointmentRequest {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub date: Option<Value>,
    pub time: Option<Value>,
    pub service: Option<Value>,
    pub address: Option<Value>,
    pub store_location: Option<Value>,
    pub payment_method: Option<Value>,
    pub notes: Option<Value>,
}

impl CreateAppointmentRequest {
    /// The six contact/scheduling fields must be truthy and not blank
    /// strings; every field is stored as sent, optional ones as null
    pub fn validate(self, user_id: &str) -> Result<AppointmentRecord, String> {
        fn required(field: Option<Value>) -> Result<Value, String> {
            field
                .filter(|v| truthy(v) && v.as_str().is_none_or(|s| !s.trim().is_empty()))
                .ok_or_else(|| "Please complete all required fields".to_string())
        }

        Ok(AppointmentRecord {
            id: bson::oid::ObjectId::new(),
            user_id: user_id.to_string(),
            name: required(self.name)?,
            email: required(self.email)?,
            phone: required(self.phone)?,
            date: required(self.date)?,
            time: required(self.time)?,
            service: required(self.service)?,
            address: self.address.unwrap_or_default(),
            store_location: self.store_location.unwrap_or_default(),
            payment_method: self.payment_method.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            created_at: bson::DateTime::now(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: Value,
    pub email: Value,
    pub phone: Value,
    pub date: Value,
    pub time: Value,
    pub service: Value,
    pub address: Value,
    pub store_location: Value,
    pub payment_method: Value,
    pub notes: Value,
    pub created_at: DateTime<Utc>,
}

impl From<AppointmentRecord> for AppointmentView {
    fn from(a: AppointmentRecord) -> Self {
        Self {
            id: a.id.to_hex(),
            user_id: a.user_id,
            name: a.name,
            email: a.email,
            phone: a.phone,
            date: a.date,
            time: a.time,
            service: a.service,
            address: a.address,
            store_location: a.store_location,
            payment_method: a.payment_method,
            notes: a.notes,
            created_at: a.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub appointment: AppointmentView,
}

#[derive(Debug, Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentView>,
}

// ---------- Common ----------

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            // Only client-supplied JSON can fall outside what BSON holds
            StorageError::Encode(e) => {
                AppError::BadRequest(format!("Unsupported value in request: {}", e))
            }
            e => AppError::Internal(format!("Storage failure: {}", e)),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::InvalidToken(_) => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            AuthError::PasswordHash => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(ErrorResponse {
            error: status.to_string(),
            message,
        }))
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cart_total_of_empty_cart_is_zero() {
        assert_eq!(cart_total(&[]), 0.0);
    }

    #[test]
    fn cart_total_sums_price_times_quantity() {
        let items = vec![
            json!({"productId": "veil", "price": 120.0, "quantity": 2}),
            json!({"productId": "gown", "price": 1500, "quantity": 1}),
            json!({"productId": "pins", "price": 2.5, "quantity": 4}),
        ];
        assert_eq!(cart_total(&items), 240.0 + 1500.0 + 10.0);
    }

    #[test]
    fn cart_total_defaults_missing_fields() {
        let items = vec![
            json!({"productId": "no-quantity", "price": 30}),
            json!({"productId": "no-price", "quantity": 5}),
            json!("not an object"),
        ];
        assert_eq!(cart_total(&items), 30.0);
    }

    #[test]
    fn register_request_normalises_email() {
        let request = RegisterRequest {
            name: Some("  Ann  ".into()),
            email: Some(" Ann@Example.COM ".into()),
            password: Some("pw".into()),
            is_admin: None,
        };
        let registration = request.validate().unwrap();
        assert_eq!(registration.name, "Ann");
        assert_eq!(registration.email, "ann@example.com");
        assert!(!registration.requested_admin);
    }

    #[test]
    fn register_request_requires_all_fields() {
        let request = RegisterRequest {
            name: Some("   ".into()),
            email: Some("ann@example.com".into()),
            password: Some("pw".into()),
            is_admin: Some(json!(true)),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn order_request_needs_items_and_numeric_total() {
        let ok = CreateOrderRequest {
            items: Some(json!([{"productId": "a"}])),
            total: Some(json!(10)),
        };
        assert_eq!(ok.validate().unwrap().1, 10.0);

        for (items, total) in [
            (Some(json!([])), Some(json!(10))),
            (None, Some(json!(10))),
            (Some(json!([{}])), None),
            (Some(json!([{}])), Some(json!("ten"))),
            (Some(json!({"not": "a list"})), Some(json!(1))),
        ] {
            assert!(CreateOrderRequest { items, total }.validate().is_err());
        }
    }

    #[test]
    fn status_request_accepts_only_known_values() {
        let parse = |v: Value| UpdateStatusRequest { status: Some(v) }.validate();
        assert_eq!(parse(json!("dispatched")), Ok(OrderStatus::Dispatched));
        assert!(parse(json!("cancelled")).is_err());
        assert!(parse(json!(3)).is_err());
        assert!(UpdateStatusRequest { status: None }.validate().is_err());
    }

    #[test]
    fn appointment_optional_fields_default_to_null() {
        let request = CreateAppointmentRequest {
            name: Some("Ann".into()),
            email: Some("ann@example.com".into()),
            phone: Some("555".into()),
            date: Some("2024-06-01".into()),
            time: Some("10:00".into()),
            service: Some("fitting".into()),
            ..Default::default()
        };
        let record = request.validate("u1").unwrap();
        assert_eq!(record.user_id, "u1");
        assert!(record.address.is_null());
        assert!(record.store_location.is_null());
        assert!(record.payment_method.is_null());
        assert!(record.notes.is_null());
    }

    #[test]
    fn appointment_missing_field_is_rejected() {
        let request = CreateAppointmentRequest {
            name: Some("Ann".into()),
            email: Some("ann@example.com".into()),
            phone: Some("".into()),
            date: Some("2024-06-01".into()),
            time: Some("10:00".into()),
            service: Some("fitting".into()),
            ..Default::default()
        };
        assert!(request.validate("u1").is_err());
    }

    #[test]
    fn truthiness_follows_json_values() {
        let truthy_values = [
            json!(true),
            json!(1),
            json!(-0.5),
            json!("no"),
            json!([0]),
            json!({"a": 1}),
        ];
        for value in truthy_values {
            assert!(truthy(&value), "{value}");
        }
        let falsy_values = [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!([]),
            json!({}),
        ];
        for value in falsy_values {
            assert!(!truthy(&value), "{value}");
        }
    }

    #[test]
    fn register_admin_request_is_truthy_not_strictly_boolean() {
        let request = |is_admin: Option<Value>| RegisterRequest {
            name: Some("Ann".into()),
            email: Some("ann@example.com".into()),
            password: Some("pw".into()),
            is_admin,
        };
        assert!(request(Some(json!("yes"))).validate().unwrap().requested_admin);
        assert!(request(Some(json!(1))).validate().unwrap().requested_admin);
        assert!(!request(Some(json!(0))).validate().unwrap().requested_admin);
        assert!(!request(Some(json!(""))).validate().unwrap().requested_admin);
        assert!(!request(None).validate().unwrap().requested_admin);
    }

    #[test]
    fn appointment_fields_keep_their_json_types() {
        let request = CreateAppointmentRequest {
            name: Some("Ann".into()),
            email: Some("ann@example.com".into()),
            phone: Some(json!(5551234)),
            date: Some("2024-06-01".into()),
            time: Some("10:00".into()),
            service: Some("fitting".into()),
            notes: Some(json!({"veil": true})),
            ..Default::default()
        };
        let record = request.validate("u1").unwrap();
        assert_eq!(record.phone, json!(5551234));
        assert_eq!(record.notes, json!({"veil": true}));
    }

    #[test]
    fn appointment_falsy_or_blank_required_field_is_rejected() {
        for phone in [json!(0), json!(false), json!([]), json!("   "), json!(null)] {
            let request = CreateAppointmentRequest {
                name: Some("Ann".into()),
                email: Some("ann@example.com".into()),
                phone: Some(phone.clone()),
                date: Some("2024-06-01".into()),
                time: Some("10:00".into()),
                service: Some("fitting".into()),
                ..Default::default()
            };
            assert!(request.validate("u1").is_err(), "{phone}");
        }
    }

    #[test]
    fn unencodable_values_are_a_client_error() {
        let encode_error = bson::to_bson(&json!({"price": u64::MAX})).unwrap_err();
        let error = AppError::from(StorageError::Encode(encode_error));
        assert!(matches!(error, AppError::BadRequest(_)));

        let duplicate = AppError::from(StorageError::Duplicate("ann@example.com".into()));
        assert!(matches!(duplicate, AppError::Internal(_)));
    }
}
