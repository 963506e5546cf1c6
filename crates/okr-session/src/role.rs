//! Permission tier resolution.

use okr_core::error::OkrError;
use okr_core::models::profile::Role;
use okr_core::repository::ProfileRepository;
use tracing::{debug, warn};

use crate::backend::Identity;
use crate::context::SessionContext;

/// Outcome of tier resolution.
///
/// `Loading` means "unknown". Callers gate on it instead of reading it
/// as the lowest tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleState {
    #[default]
    Loading,
    Resolved(Role),
}

impl RoleState {
    /// The resolved tier, or `None` while resolution is outstanding.
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleState::Loading => None,
            RoleState::Resolved(role) => Some(*role),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RoleState::Loading)
    }

    /// False while loading.
    pub fn is_manager(&self) -> bool {
        self.role().is_some_and(|r| r.is_manager())
    }

    /// False while loading.
    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(|r| r.is_admin())
    }
}

/// Maps an identity to its permission tier via the profile record.
///
/// Fails closed: anything short of a readable profile yields
/// [`Role::User`].
pub struct RoleResolver<P: ProfileRepository> {
    profiles: P,
}

impl<P: ProfileRepository> RoleResolver<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    pub async fn resolve(&self, identity: Option<&Identity>) -> RoleState {
        let Some(identity) = identity else {
            return RoleState::Resolved(Role::User);
        };

        match self.profiles.get_by_id(identity.id).await {
            Ok(profile) => {
                debug!(user_id = %identity.id, role = profile.role.as_str(), "Resolved role");
                RoleState::Resolved(profile.role)
            }
            Err(OkrError::NotFound { .. }) => {
                debug!(user_id = %identity.id, "No profile, defaulting to user tier");
                RoleState::Resolved(Role::User)
            }
            Err(e) => {
                warn!(user_id = %identity.id, error = %e, "Role lookup failed, defaulting to user tier");
                RoleState::Resolved(Role::User)
            }
        }
    }

    /// Resolve the tier for the context's identity and attach it.
    pub async fn resolve_context(&self, ctx: SessionContext) -> SessionContext {
        let role = self.resolve(ctx.identity.as_ref()).await;
        ctx.with_role(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_is_not_a_tier() {
        let state = RoleState::Loading;
        assert!(state.is_loading());
        assert_eq!(state.role(), None);
        assert!(!state.is_manager());
        assert!(!state.is_admin());
    }

    #[test]
    fn resolved_tiers_expose_capabilities() {
        assert!(RoleState::Resolved(Role::Manager).is_manager());
        assert!(!RoleState::Resolved(Role::Manager).is_admin());
        assert!(RoleState::Resolved(Role::Admin).is_manager());
        assert!(!RoleState::Resolved(Role::User).is_manager());
        assert_eq!(RoleState::Resolved(Role::User).role(), Some(Role::User));
    }

    #[test]
    fn default_state_is_loading() {
        assert_eq!(RoleState::default(), RoleState::Loading);
    }
}
