//! sea-orm entities for the directory database.

pub mod employee;
pub mod user;
pub mod user_identity;
pub mod user_secret;
