use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseSorting {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Title,
}

/// Catalog filters taken from the query string.
///
/// Pagination fields are kept inline: `serde(flatten)` breaks numeric parsing
/// of url-encoded values.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseQuery {
    /// Main category; also matches its sub-categories.
    pub category: Option<i32>,
    pub sub_category: Option<i32>,
    /// Case-insensitive search over title, subtitle and description.
    pub q: Option<String>,
    pub language: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sorting: Option<CourseSorting>,
}

impl CourseQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination { page: None, per_page: None };
        assert_eq!(p.normalize(), (1, 20, 0));

        let p = Pagination { page: Some(0), per_page: Some(1000) };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination { page: Some(3), per_page: Some(10) };
        assert_eq!(p.normalize(), (3, 10, 20));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let p = Pagination { page: Some(i64::MAX), per_page: Some(100) };
        let (page, per_page, offset) = p.normalize();
        assert_eq!((page, per_page), (i64::MAX, 100));
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn course_query_parses_from_query_string() {
        let uri: axum::http::Uri =
            "/api/courses?category=2&q=rust&min_price=100&page=2&sorting=price_desc"
                .parse()
                .unwrap();
        let axum::extract::Query(query) =
            axum::extract::Query::<CourseQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.category, Some(2));
        assert_eq!(query.q.as_deref(), Some("rust"));
        assert_eq!(query.min_price, Some(100));
        assert_eq!(query.sorting, Some(CourseSorting::PriceDesc));
        assert_eq!(query.pagination().normalize(), (2, 20, 20));
    }
}
