//! Profile and permission tier models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse permission tier.
///
/// Tiers are totally ordered: `User < Manager < Admin`. Capability
/// checks compare against the minimum tier they need.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Manager,
    Admin,
}

impl Role {
    /// Parse a stored tier. Unknown values map to [`Role::User`] so a
    /// malformed row never grants elevated privilege.
    pub fn parse(value: &str) -> Role {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// True for `Manager` and `Admin`.
    pub fn is_manager(&self) -> bool {
        *self >= Role::Manager
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }
}

/// One profile per authenticated identity. The profile id equals the
/// identity id issued by the auth backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub active: bool,
    pub role: Role,
    /// Company the user primarily belongs to, if any.
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    /// `Some(Some(url))` = set, `Some(None)` = clear, `None` = no change.
    pub avatar_url: Option<Option<String>>,
    pub active: Option<bool>,
    pub role: Option<Role>,
    pub company_id: Option<Option<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(Role::User < Role::Manager);
        assert!(Role::Manager < Role::Admin);
        assert!(Role::Admin.is_manager());
        assert!(Role::Manager.is_manager());
        assert!(!Role::User.is_manager());
        assert!(!Role::Manager.is_admin());
    }

    #[test]
    fn unknown_tier_parses_as_user() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse(" Manager "), Role::Manager);
        assert_eq!(Role::parse("superuser"), Role::User);
        assert_eq!(Role::parse(""), Role::User);
    }
}
