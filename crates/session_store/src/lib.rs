mod error;
mod paths;
mod schema;
mod store;

pub use error::SessionStoreError;
pub use paths::{default_session_root, session_file_path, session_root, RELAY_HOME_ENV};
pub use schema::{StoredSession, EXPIRY_SKEW};
pub use store::SessionStore;
