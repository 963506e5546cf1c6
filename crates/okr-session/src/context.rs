//! Explicit per-session context threaded through selection and
//! aggregation.

use okr_core::models::profile::Profile;
use uuid::Uuid;

use crate::backend::Identity;
use crate::role::RoleState;

/// Snapshot of who is signed in and at which tier.
///
/// A fresh snapshot from [`SessionStore::context`](crate::SessionStore::context)
/// carries [`RoleState::Loading`]; run it through
/// [`RoleResolver::resolve_context`](crate::RoleResolver::resolve_context)
/// before handing it to a [`TenantSelector`](crate::TenantSelector).
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub role: RoleState,
}

impl SessionContext {
    pub fn new(identity: Option<Identity>, profile: Option<Profile>) -> Self {
        Self {
            identity,
            profile,
            role: RoleState::Loading,
        }
    }

    pub fn with_role(mut self, role: RoleState) -> Self {
        self.role = role;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.identity.as_ref().map(|i| i.id)
    }
}
