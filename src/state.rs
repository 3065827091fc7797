use std::sync::Arc;

use crate::{blob_store::BlobStore, db::OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub blobs: Arc<dyn BlobStore>,
    pub jwt_secret: Arc<str>,
}
