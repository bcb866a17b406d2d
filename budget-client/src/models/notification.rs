use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Welcome,
    BudgetCreated,
    BudgetThreshold,
    BudgetDeleted,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Welcome => write!(f, "welcome"),
            NotificationType::BudgetCreated => write!(f, "budget_created"),
            NotificationType::BudgetThreshold => write!(f, "budget_threshold"),
            NotificationType::BudgetDeleted => write!(f, "budget_deleted"),
        }
    }
}

/// Structured payload attached to a notification, pointing at the
/// budget it concerns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first_notification: Option<bool>,
}

/// A discrete user-facing event. Identifiers are globally unique and
/// stable across fetch and push delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    #[serde(default)]
    pub data: NotificationData,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of the server-side notification list, with the
/// authoritative unread total.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub has_more: bool,
    pub total: u64,
    pub unread_count: u64,
}

/// Query parameters for the paginated notification fetch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}
