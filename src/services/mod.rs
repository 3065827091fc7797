pub mod auth_service;
pub mod cart_service;
pub mod course_service;
pub mod file_service;
pub mod lookup_service;
