use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::TenantId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdministrativeUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<ObjectId>,
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile: String,
    #[serde(rename = "super")]
    pub is_super: bool,
    pub company_id: Option<TenantId>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AdministrativeUser {
    pub fn new_super(name: &str, email: &str, password_hash: String, company_id: TenantId) -> Self {
        let now = chrono::Utc::now();
        Self {
            mongo_id: None,
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            profile: "admin".to_string(),
            is_super: true,
            company_id: Some(company_id),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn filter_user(&self) -> FilteredUser {
        FilteredUser {
            id: self.id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
            is_super: self.is_super,
            company_id: self.company_id,
        }
    }
}

/// User view returned by the login endpoint; never carries the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile: String,
    #[serde(rename = "super")]
    pub is_super: bool,
    #[serde(rename = "companyId")]
    pub company_id: Option<TenantId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginUserSchema {
    pub email: String,
    pub password: String,
}
