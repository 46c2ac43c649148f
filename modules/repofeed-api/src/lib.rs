pub mod deps;
pub mod graphql;
pub mod jwt;
pub mod routes;

pub use deps::ServerDeps;
