pub mod auth;
pub mod book;
pub mod id;
pub mod role;
pub mod transaction;
pub mod user;
pub mod value;
