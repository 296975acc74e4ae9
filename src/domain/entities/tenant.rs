use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TenantId = i64;

/// A customer organization ("company") owning its own sessions and data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "_id")]
    pub id: TenantId,
    pub name: String,
    pub plan_id: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn new(id: TenantId, name: &str, plan_id: i32, due_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.to_string(),
            plan_id,
            due_date: Some(due_date),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}
