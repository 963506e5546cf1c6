//! Company (tenant) selection.
//!
//! The selector owns the company in focus for the session and the list
//! of companies the current identity may pick from. The selection is
//! persisted to durable client storage and read back on construction,
//! so a restarted client starts from the last known choice before the
//! first fetch completes.

use std::collections::HashSet;
use std::sync::Arc;

use okr_core::error::{OkrError, OkrResult};
use okr_core::models::company::Company;
use okr_core::models::profile::{Profile, Role};
use okr_core::repository::CompanyRepository;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::Identity;
use crate::context::SessionContext;
use crate::storage::{
    ADMIN_SELECTION_RESET_KEY, ClientStorage, LEGACY_SELECTED_COMPANY_KEY, SELECTED_COMPANY_KEY,
};

/// Display name for a selection restored from the legacy id-only key,
/// until a fetch supplies the real one.
pub const PROVISIONAL_COMPANY_NAME: &str = "Loading company";

/// The company in focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCompany {
    pub id: Uuid,
    pub name: String,
}

impl From<&Company> for SelectedCompany {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorState {
    /// Waiting for an identity with a resolved role.
    Uninitialized,
    /// Fetching the visible list.
    Loading,
    /// Settled. `None` means no company is in focus; for admins this
    /// is the "choose a company" prompt.
    Ready(Option<SelectedCompany>),
}

pub struct TenantSelector<C: CompanyRepository> {
    companies: C,
    durable: Arc<dyn ClientStorage>,
    session_storage: Arc<dyn ClientStorage>,
    state: SelectorState,
    current: Option<SelectedCompany>,
    /// Selection hidden by a failed fetch, reinstated by the next
    /// successful one.
    retained: Option<SelectedCompany>,
    visible: Vec<Company>,
}

impl<C: CompanyRepository> TenantSelector<C> {
    /// Create a selector, restoring the persisted selection.
    pub fn new(
        companies: C,
        durable: Arc<dyn ClientStorage>,
        session_storage: Arc<dyn ClientStorage>,
    ) -> Self {
        let current = load_selection(durable.as_ref());
        if let Some(selected) = &current {
            debug!(company_id = %selected.id, "Restored company selection");
        }
        Self {
            companies,
            durable,
            session_storage,
            state: SelectorState::Uninitialized,
            current,
            retained: None,
            visible: Vec::new(),
        }
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    /// The company in focus. Before the first reconcile this is the
    /// restored selection, possibly provisional.
    pub fn selected(&self) -> Option<&SelectedCompany> {
        self.current.as_ref()
    }

    /// Companies from the most recent fetch, in display order.
    pub fn visible(&self) -> &[Company] {
        &self.visible
    }

    /// Fetch the visible companies for `ctx` and settle the selection.
    ///
    /// Does nothing until the context has an identity and a resolved
    /// role. A failed fetch leaves an empty list and no selection in
    /// memory; durable storage keeps the last good choice and the next
    /// successful fetch reconciles against it.
    pub async fn reconcile(&mut self, ctx: &SessionContext) {
        let Some(identity) = ctx.identity.as_ref() else {
            return;
        };
        let Some(role) = ctx.role.role() else {
            debug!(user_id = %identity.id, "Role still loading, deferring company selection");
            return;
        };

        self.state = SelectorState::Loading;

        if role.is_admin() {
            self.apply_admin_fresh_session_rule(identity);
        }

        match self.fetch_visible(identity, ctx.profile.as_ref(), role).await {
            Ok(visible) => {
                self.visible = visible;
                if self.current.is_none() {
                    self.current = self.retained.take();
                }
                let next = self.reconcile_selection(role);
                if next != self.current {
                    if let Some(selected) = &next {
                        self.persist(selected);
                    }
                    info!(
                        user_id = %identity.id,
                        company_id = ?next.as_ref().map(|s| s.id),
                        "Company selection changed"
                    );
                }
                self.current = next;
            }
            Err(e) => {
                warn!(user_id = %identity.id, error = %e, "Failed to fetch visible companies");
                self.visible.clear();
                if let Some(previous) = self.current.take() {
                    self.retained = Some(previous);
                }
            }
        }

        self.state = SelectorState::Ready(self.current.clone());
    }

    /// Explicitly choose a company from the visible list.
    pub fn select(&mut self, company_id: Uuid) -> OkrResult<SelectedCompany> {
        let company = self
            .visible
            .iter()
            .find(|c| c.id == company_id)
            .ok_or(OkrError::TenantContext)?;

        let selected = SelectedCompany::from(company);
        self.persist(&selected);
        self.current = Some(selected.clone());
        self.retained = None;
        self.state = SelectorState::Ready(Some(selected.clone()));
        info!(company_id = %company_id, "Company selected");
        Ok(selected)
    }

    async fn fetch_visible(
        &self,
        identity: &Identity,
        profile: Option<&Profile>,
        role: Role,
    ) -> OkrResult<Vec<Company>> {
        let mut companies = if role.is_admin() {
            self.companies.list_active().await?
        } else {
            let mut companies = self.companies.list_for_member(identity.id).await?;
            if let Some(own_id) = profile.and_then(|p| p.company_id) {
                if !companies.iter().any(|c| c.id == own_id) {
                    match self.companies.get_by_id(own_id).await {
                        Ok(company) => companies.push(company),
                        Err(OkrError::NotFound { .. }) => {
                            debug!(company_id = %own_id, "Profile company no longer exists");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            companies
        };

        let mut seen = HashSet::new();
        companies.retain(|c| c.active && seen.insert(c.id));
        sort_by_display_name(&mut companies);
        Ok(companies)
    }

    fn reconcile_selection(&self, role: Role) -> Option<SelectedCompany> {
        let kept = self
            .current
            .as_ref()
            .and_then(|current| self.visible.iter().find(|c| c.id == current.id));

        match kept {
            Some(company) => Some(SelectedCompany::from(company)),
            None if role.is_admin() => None,
            None => self.visible.first().map(SelectedCompany::from),
        }
    }

    /// On an admin's first reconcile in a session, drop any carried
    /// over selection so they choose explicitly. Runs at most once per
    /// session.
    fn apply_admin_fresh_session_rule(&mut self, identity: &Identity) {
        if self.session_storage.get(ADMIN_SELECTION_RESET_KEY).is_some() {
            return;
        }

        if let Some(previous) = self.current.take().or_else(|| self.retained.take()) {
            info!(
                user_id = %identity.id,
                company_id = %previous.id,
                "Clearing carried-over admin selection"
            );
            for key in [SELECTED_COMPANY_KEY, LEGACY_SELECTED_COMPANY_KEY] {
                if let Err(e) = self.durable.remove(key) {
                    warn!(key, error = %e, "Failed to clear stored selection");
                }
            }
        }

        if let Err(e) = self.session_storage.set(ADMIN_SELECTION_RESET_KEY, "1") {
            warn!(error = %e, "Failed to set session marker");
        }
    }

    fn persist(&self, selected: &SelectedCompany) {
        let json = match serde_json::to_string(selected) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode company selection");
                return;
            }
        };
        if let Err(e) = self.durable.set(SELECTED_COMPANY_KEY, &json) {
            warn!(error = %e, "Failed to persist company selection");
        }
        if let Err(e) = self
            .durable
            .set(LEGACY_SELECTED_COMPANY_KEY, &selected.id.to_string())
        {
            warn!(error = %e, "Failed to persist legacy company id");
        }
    }
}

/// Read the persisted selection: the structured key first, then the
/// legacy id-only key as a provisional selection.
fn load_selection(storage: &dyn ClientStorage) -> Option<SelectedCompany> {
    if let Some(raw) = storage.get(SELECTED_COMPANY_KEY) {
        match serde_json::from_str::<SelectedCompany>(&raw) {
            Ok(selected) => return Some(selected),
            Err(e) => debug!(error = %e, "Ignoring unreadable stored selection"),
        }
    }

    let raw = storage.get(LEGACY_SELECTED_COMPANY_KEY)?;
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(SelectedCompany {
            id,
            name: PROVISIONAL_COMPANY_NAME.to_string(),
        }),
        Err(e) => {
            debug!(error = %e, "Ignoring unreadable legacy company id");
            None
        }
    }
}

/// Case-insensitive by display name, then by the raw name for a stable
/// order between names differing only in case.
fn sort_by_display_name(companies: &mut [Company]) {
    companies.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::storage::MemoryStorage;

    fn company(name: &str) -> Company {
        Company {
            id: Uuid::new_v4(),
            name: name.into(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sorts_names_case_insensitively() {
        let mut companies = vec![company("beta"), company("Alpha"), company("alpha"), company("Gamma")];
        sort_by_display_name(&mut companies);
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta", "Gamma"]);
    }

    #[test]
    fn structured_key_wins_over_legacy() {
        let storage = MemoryStorage::new();
        let id = Uuid::new_v4();
        storage
            .set(SELECTED_COMPANY_KEY, &format!(r#"{{"id":"{id}","name":"Acme"}}"#))
            .unwrap();
        storage
            .set(LEGACY_SELECTED_COMPANY_KEY, &Uuid::new_v4().to_string())
            .unwrap();

        let selected = load_selection(&storage).unwrap();
        assert_eq!(selected, SelectedCompany { id, name: "Acme".into() });
    }

    #[test]
    fn legacy_key_yields_provisional_selection() {
        let storage = MemoryStorage::new();
        let id = Uuid::new_v4();
        storage.set(LEGACY_SELECTED_COMPANY_KEY, &id.to_string()).unwrap();

        let selected = load_selection(&storage).unwrap();
        assert_eq!(selected.id, id);
        assert_eq!(selected.name, PROVISIONAL_COMPANY_NAME);
    }

    #[test]
    fn garbage_in_storage_is_ignored() {
        let storage = MemoryStorage::new();
        storage.set(SELECTED_COMPANY_KEY, "{not json").unwrap();
        storage.set(LEGACY_SELECTED_COMPANY_KEY, "not-a-uuid").unwrap();

        assert_eq!(load_selection(&storage), None);
    }
}
