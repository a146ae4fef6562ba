pub mod auth;
pub mod error;
pub mod schema;
pub mod seed;
pub mod store;
pub mod sync;
