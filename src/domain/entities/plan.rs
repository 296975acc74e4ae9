use serde::{Deserialize, Serialize};

/// Subscription plan. Plans are keyed by a small, stable integer id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "_id")]
    pub id: i32,
    pub name: String,
    /// Seat count.
    pub users: u32,
    pub connections: u32,
    pub queues: u32,
    pub value: f64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Plan {
    pub fn new(id: i32, name: &str, users: u32, connections: u32, queues: u32, value: f64) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            name: name.to_string(),
            users,
            connections,
            queues,
            value,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}
