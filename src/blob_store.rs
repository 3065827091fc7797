//! Chunked binary storage for uploaded course images and attachments.
//!
//! Content is split into fixed-size chunks stored next to a metadata row
//! holding the original file name and content type, so a download can replay
//! them as response headers.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    entity::{
        file_chunks::{ActiveModel as ChunkActive, Column as ChunkCol, Entity as FileChunks},
        stored_files::{ActiveModel as StoredFileActive, Entity as StoredFiles, Model as StoredFileModel},
    },
    error::AppError,
};

/// Same default chunk size GridFS buckets use.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub length: i64,
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub info: BlobInfo,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob {0} not found")]
    NotFound(Uuid),

    #[error("blob {id} is missing chunks: expected {expected}, found {found}")]
    Incomplete { id: Uuid, expected: i32, found: usize },

    #[error("blob too large")]
    TooLarge,

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound(_) => AppError::NotFound,
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<BlobInfo, BlobError>;

    async fn download(&self, id: Uuid) -> Result<StoredBlob, BlobError>;

    async fn delete(&self, id: Uuid) -> Result<(), BlobError>;
}

/// PostgreSQL-backed store: one `stored_files` row plus ordered `file_chunks`.
#[derive(Debug, Clone)]
pub struct PgBlobStore {
    orm: DatabaseConnection,
    chunk_size: usize,
}

impl PgBlobStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self::with_chunk_size(orm, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(orm: DatabaseConnection, chunk_size: usize) -> Self {
        Self {
            orm,
            chunk_size: chunk_size.max(1),
        }
    }
}

fn info_from_entity(model: &StoredFileModel) -> BlobInfo {
    BlobInfo {
        id: model.id,
        file_name: model.file_name.clone(),
        content_type: model.content_type.clone(),
        length: model.length,
    }
}

#[async_trait]
impl BlobStore for PgBlobStore {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<BlobInfo, BlobError> {
        let length = i64::try_from(bytes.len()).map_err(|_| BlobError::TooLarge)?;
        let chunk_count =
            i32::try_from(bytes.len().div_ceil(self.chunk_size)).map_err(|_| BlobError::TooLarge)?;
        let chunk_size = i32::try_from(self.chunk_size).map_err(|_| BlobError::TooLarge)?;

        let id = Uuid::new_v4();
        let txn = self.orm.begin().await?;

        let stored = StoredFileActive {
            id: Set(id),
            file_name: Set(file_name.to_string()),
            content_type: Set(content_type.to_string()),
            length: Set(length),
            chunk_size: Set(chunk_size),
            chunk_count: Set(chunk_count),
            metadata: Set(serde_json::json!({
                "file_name": file_name,
                "content_type": content_type,
            })),
            uploaded_at: NotSet,
        }
        .insert(&txn)
        .await?;

        for (n, chunk) in bytes.chunks(self.chunk_size).enumerate() {
            ChunkActive {
                file_id: Set(id),
                n: Set(n as i32),
                data: Set(chunk.to_vec()),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::debug!(blob_id = %id, file_name, length, chunk_count, "blob stored");
        Ok(info_from_entity(&stored))
    }

    async fn download(&self, id: Uuid) -> Result<StoredBlob, BlobError> {
        let stored = StoredFiles::find_by_id(id)
            .one(&self.orm)
            .await?
            .ok_or(BlobError::NotFound(id))?;

        let chunks = FileChunks::find()
            .filter(ChunkCol::FileId.eq(id))
            .order_by_asc(ChunkCol::N)
            .all(&self.orm)
            .await?;

        if chunks.len() != stored.chunk_count as usize {
            return Err(BlobError::Incomplete {
                id,
                expected: stored.chunk_count,
                found: chunks.len(),
            });
        }

        let mut bytes = Vec::with_capacity(stored.length.max(0) as usize);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk.data);
        }

        Ok(StoredBlob {
            info: info_from_entity(&stored),
            bytes,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), BlobError> {
        let result = StoredFiles::delete_by_id(id).exec(&self.orm).await?;
        if result.rows_affected == 0 {
            return Err(BlobError::NotFound(id));
        }
        Ok(())
    }
}

/// In-process store used by tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<Uuid, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<BlobInfo, BlobError> {
        let length = i64::try_from(bytes.len()).map_err(|_| BlobError::TooLarge)?;
        let info = BlobInfo {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            length,
        };
        self.blobs.write().await.insert(
            info.id,
            StoredBlob {
                info: info.clone(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(info)
    }

    async fn download(&self, id: Uuid) -> Result<StoredBlob, BlobError> {
        self.blobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BlobError::NotFound(id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), BlobError> {
        self.blobs
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(BlobError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_replays_metadata() {
        let store = MemoryBlobStore::new();
        let info = store
            .upload("notes.pdf", "application/pdf", b"%PDF-1.7")
            .await
            .unwrap();
        assert_eq!(info.length, 8);

        let blob = store.download(info.id).await.unwrap();
        assert_eq!(blob.info.file_name, "notes.pdf");
        assert_eq!(blob.info.content_type, "application/pdf");
        assert_eq!(blob.bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn memory_store_delete_then_download_is_not_found() {
        let store = MemoryBlobStore::new();
        let info = store.upload("a.txt", "text/plain", b"a").await.unwrap();
        store.delete(info.id).await.unwrap();

        assert!(matches!(
            store.download(info.id).await,
            Err(BlobError::NotFound(id)) if id == info.id
        ));
        assert!(store.is_empty().await);
    }

    #[test]
    fn missing_blob_maps_to_not_found() {
        let err: AppError = BlobError::NotFound(Uuid::new_v4()).into();
        assert!(matches!(err, AppError::NotFound));
    }
}
