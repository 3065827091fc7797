pub mod auth;
pub mod cart;
pub mod courses;
pub mod files;
pub mod lookups;
