//! Stored document shapes. Field names match the collections' wire format.

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime,
}

impl UserRecord {
    pub fn new(name: String, email: String, password_hash: String, is_admin: bool) -> Self {
        Self {
            id: ObjectId::new(),
            name,
            email,
            password_hash,
            is_admin,
            created_at: DateTime::now(),
        }
    }
}

/// One cart per user, keyed by `userId`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Confirmed,
    Dispatched,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "dispatched" => Ok(Self::Dispatched),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub items: Vec<Value>,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime,
}

impl OrderRecord {
    /// A freshly placed order always starts out confirmed
    pub fn new(user_id: String, items: Vec<Value>, total: f64) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            items,
            total,
            status: OrderStatus::Confirmed,
            created_at: DateTime::now(),
        }
    }
}

/// Contact and scheduling fields are kept exactly as the client sent them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub name: Value,
    pub email: Value,
    pub phone: Value,
    pub date: Value,
    pub time: Value,
    pub service: Value,
    #[serde(default)]
    pub address: Value,
    #[serde(default)]
    pub store_location: Value,
    #[serde(default)]
    pub payment_method: Value,
    #[serde(default)]
    pub notes: Value,
    pub created_at: DateTime,
}
