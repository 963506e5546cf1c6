//! OKR Session — authenticated session lifecycle, permission tier
//! resolution and company (tenant) selection.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod role;
pub mod session;
pub mod storage;
pub mod tenant;

pub use backend::{AuthBackend, AuthEvent, AuthSession, Identity};
pub use config::SessionConfig;
pub use context::SessionContext;
pub use error::SessionError;
pub use role::{RoleResolver, RoleState};
pub use session::{Navigation, SessionStore};
pub use storage::{ClientStorage, FileStorage, MemoryStorage};
pub use tenant::{SelectedCompany, SelectorState, TenantSelector};
