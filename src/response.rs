use serde::Serialize;
use utoipa::ToSchema;

/// Paging and count information attached to a response; absent fields are omitted.
#[derive(Debug, Serialize, ToSchema, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    /// Count of an unpaged collection.
    pub fn total(total: i64) -> Self {
        Self {
            total: Some(total),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Envelope shared by every JSON response: `{ message, data, meta }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Acknowledgement with an empty object payload, for operations that return nothing.
    pub fn done(message: impl Into<String>) -> Self {
        Self::success(message, serde_json::json!({}), Some(Meta::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_missing_meta_fields() {
        let body = serde_json::to_value(ApiResponse::success("OK", 3, Some(Meta::total(3)))).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "message": "OK", "data": 3, "meta": { "total": 3 } })
        );

        let body = serde_json::to_value(ApiResponse::done("Deleted")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "message": "Deleted", "data": {}, "meta": {} })
        );
    }

    #[test]
    fn paged_meta_carries_all_fields() {
        assert_eq!(
            Meta::new(2, 20, 41),
            Meta {
                page: Some(2),
                per_page: Some(20),
                total: Some(41)
            }
        );
    }
}
