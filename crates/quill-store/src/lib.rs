pub mod database;
pub mod error;
pub mod local;
pub mod schema;

pub use database::Database;
pub use error::StoreError;
pub use local::LocalStore;
