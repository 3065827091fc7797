use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartList, CheckoutResult},
        courses::{CourseList, CreateCourseRequest, CreateTopicRequest, CreateVideoRequest, MyLearning},
        lookups::{CategoryList, LanguageList},
    },
    error::FieldError,
    models::{CartCourse, Category, CourseDetails, CourseListing, FileInfo, Language, Topic, User, Video},
    response::{ApiResponse, Meta},
    routes::{auth, cart, courses, files, health, lookups, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        lookups::list_categories,
        lookups::list_languages,
        courses::list_courses,
        courses::get_course,
        courses::create_course,
        courses::delete_course,
        courses::my_learning,
        cart::cart_list,
        cart::add_to_cart,
        cart::clear_cart,
        cart::remove_from_cart,
        cart::checkout,
        files::download_file
    ),
    components(
        schemas(
            User,
            Category,
            Language,
            FileInfo,
            CourseListing,
            CourseDetails,
            Topic,
            Video,
            CartCourse,
            FieldError,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            CartList,
            CheckoutResult,
            CreateCourseRequest,
            CreateTopicRequest,
            CreateVideoRequest,
            CourseList,
            MyLearning,
            CategoryList,
            LanguageList,
            params::Pagination,
            params::CourseSorting,
            health::HealthData,
            Meta,
            ApiResponse<CourseDetails>,
            ApiResponse<CourseList>,
            ApiResponse<CartList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and logout"),
        (name = "Lookups", description = "Categories and languages"),
        (name = "Courses", description = "Catalog and course authoring"),
        (name = "Cart", description = "Shopping cart endpoints"),
        (name = "Files", description = "Stored file downloads"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
