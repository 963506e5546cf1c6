//! Client-side state kept on disk between `okr` runs.
//!
//! The selection lives in the storage file. The session marker lives in
//! a sibling `*.session.json` file, so one CLI "session" spans every run
//! until `okr sign-out`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use okr_core::repository::CompanyRepository;
use okr_session::storage::clear_selection;
use okr_session::{ClientStorage, FileStorage, TenantSelector};

pub struct LocalState {
    durable: Arc<dyn ClientStorage>,
    session_storage: Arc<dyn ClientStorage>,
}

impl LocalState {
    pub fn open(storage_path: &Path) -> anyhow::Result<Self> {
        let session_path = session_path(storage_path);
        let durable = FileStorage::open(storage_path)
            .with_context(|| format!("opening {}", storage_path.display()))?;
        let session_storage = FileStorage::open(&session_path)
            .with_context(|| format!("opening {}", session_path.display()))?;
        Ok(Self {
            durable: Arc::new(durable),
            session_storage: Arc::new(session_storage),
        })
    }

    pub fn selector<C: CompanyRepository>(&self, companies: C) -> TenantSelector<C> {
        TenantSelector::new(
            companies,
            Arc::clone(&self.durable),
            Arc::clone(&self.session_storage),
        )
    }

    /// Forget the selection and start a fresh session on the next run.
    pub fn sign_out(&self) {
        clear_selection(self.durable.as_ref(), self.session_storage.as_ref());
    }
}

/// `.okr/storage.json` -> `.okr/storage.session.json`
fn session_path(storage_path: &Path) -> PathBuf {
    let stem = storage_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "storage".into());
    storage_path.with_file_name(format!("{stem}.session.json"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use okr_core::models::company::{Company, CreateCompany};
    use okr_core::models::profile::{Profile, Role};
    use okr_db::repository::SurrealCompanyRepository;
    use okr_session::{Identity, RoleState, SessionContext};
    use surrealdb::Surreal;
    use surrealdb::engine::local::{Db, Mem};
    use uuid::Uuid;

    use super::*;

    async fn companies() -> SurrealCompanyRepository<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        okr_db::run_migrations(&db).await.unwrap();
        SurrealCompanyRepository::new(db)
    }

    async fn company(repo: &SurrealCompanyRepository<Db>, name: &str) -> Company {
        repo.create(CreateCompany {
            name: name.into(),
            active: true,
        })
        .await
        .unwrap()
    }

    fn admin() -> SessionContext {
        let id = Uuid::new_v4();
        let profile = Profile {
            id,
            email: "admin@example.com".into(),
            full_name: "Admin".into(),
            avatar_url: None,
            active: true,
            role: Role::Admin,
            company_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        SessionContext::new(
            Some(Identity {
                id,
                email: profile.email.clone(),
            }),
            Some(profile),
        )
        .with_role(RoleState::Resolved(Role::Admin))
    }

    #[test]
    fn session_file_sits_next_to_storage() {
        assert_eq!(
            session_path(Path::new(".okr/storage.json")),
            PathBuf::from(".okr/storage.session.json")
        );
    }

    #[tokio::test]
    async fn admin_selection_persists_across_runs_until_sign_out() {
        let dir = tempfile::tempdir().unwrap();
        let storage_path = dir.path().join("storage.json");
        let repo = companies().await;
        let acme = company(&repo, "Acme").await;
        let ctx = admin();

        // First run: fresh session, admin picks a company.
        let state = LocalState::open(&storage_path).unwrap();
        let mut selector = state.selector(repo.clone());
        selector.reconcile(&ctx).await;
        assert_eq!(selector.selected(), None);
        selector.select(acme.id).unwrap();

        // Later runs in the same session keep the choice.
        for _ in 0..2 {
            let state = LocalState::open(&storage_path).unwrap();
            let mut selector = state.selector(repo.clone());
            selector.reconcile(&ctx).await;
            assert_eq!(selector.selected().map(|s| s.id), Some(acme.id));
        }

        // After sign-out the next run is a fresh session again.
        LocalState::open(&storage_path).unwrap().sign_out();
        let state = LocalState::open(&storage_path).unwrap();
        let mut selector = state.selector(repo.clone());
        selector.reconcile(&ctx).await;
        assert_eq!(selector.selected(), None);
    }
}
