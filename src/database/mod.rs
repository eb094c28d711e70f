pub mod fault;
pub mod manager;
pub mod models;
pub mod repository;
pub mod url;

pub use fault::{FaultKind, StoreFault};
pub use manager::{
    DatabaseManager, HealthProbe, LifecycleState, MySqlStorePool, StoreClient, StorePool,
};
pub use repository::{MySqlUserStore, Page, UserStore};
pub use self::url::ConnectionUrl;
