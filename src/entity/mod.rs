pub mod audit_logs;
pub mod categories;
pub mod course_files;
pub mod courses;
pub mod enrollments;
pub mod file_chunks;
pub mod languages;
pub mod revoked_tokens;
pub mod shopping_cart_courses;
pub mod shopping_carts;
pub mod stored_files;
pub mod topics;
pub mod users;
pub mod videos;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use course_files::Entity as CourseFiles;
pub use courses::Entity as Courses;
pub use enrollments::Entity as Enrollments;
pub use file_chunks::Entity as FileChunks;
pub use languages::Entity as Languages;
pub use revoked_tokens::Entity as RevokedTokens;
pub use shopping_cart_courses::Entity as ShoppingCartCourses;
pub use shopping_carts::Entity as ShoppingCarts;
pub use stored_files::Entity as StoredFiles;
pub use topics::Entity as Topics;
pub use users::Entity as Users;
pub use videos::Entity as Videos;
