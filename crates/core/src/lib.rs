pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod store;
pub mod submission;
pub mod views;

pub use auth::{AuthError, Authenticator, Credentials, MockAuthenticator};
pub use domain::identity::Identity;
pub use domain::quote::{QuoteCategory, QuoteId, QuoteRecord, QuoteRequestForm, QuoteStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use lifecycle::{Actor, LifecyclePolicy, QuoteLifecycle};
pub use navigation::{AppShell, NavigationSignal, Page, SignalBus};
pub use session::IdentitySession;
pub use storage::{InMemoryStateStorage, StateStorage, StorageError, StoredState};
pub use store::{QuoteRecordStore, StoreEvent};
pub use submission::{SubmissionCoordinator, SubmissionOutcome};
pub use views::{
    AdminView, Confirmation, DeleteOutcome, ProfileProjection, ProfileView, QuoteFilter,
    QuoteMetrics,
};
