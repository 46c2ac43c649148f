pub mod context;
pub mod error;
pub mod loaders;
pub mod mutations;
pub mod schema;
pub mod subscriptions;
pub mod types;

pub use schema::{build_schema, ApiSchema};
