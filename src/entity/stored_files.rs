use sea_orm::entity::prelude::*;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stored_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub length: i64,
    pub chunk_size: i32,
    pub chunk_count: i32,
    pub metadata: Value,
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::file_chunks::Entity")]
    FileChunks,
}

impl Related<super::file_chunks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileChunks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
