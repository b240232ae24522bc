//! File repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_entity::file::{CreateFileRecord, FileListing, FileQuery, FileRecord};

use super::FileStore;

/// PostgreSQL repository for file records.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append the WHERE clauses shared by the listing and its aggregates.
    fn push_filters(
        builder: &mut QueryBuilder<'_, Postgres>,
        owner_id: Uuid,
        query: &FileQuery,
    ) {
        builder.push(" WHERE owner_id = ");
        builder.push_bind(owner_id);
        builder.push(" AND NOT is_deleted");

        if let Some(folder_id) = query.folder_id {
            builder.push(" AND folder_id = ");
            builder.push_bind(folder_id);
        }

        if let Some(pattern) = &query.mime_type_pattern {
            match pattern.strip_suffix("/*") {
                Some(family) => {
                    builder.push(" AND mime_type LIKE ");
                    builder.push_bind(format!("{family}/%"));
                }
                None => {
                    builder.push(" AND mime_type = ");
                    builder.push_bind(pattern.clone());
                }
            }
        }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn create(&self, data: &CreateFileRecord) -> AppResult<FileRecord> {
        sqlx::query_as::<_, FileRecord>(
            "INSERT INTO files (id, owner_id, folder_id, file_name, original_name, \
             file_size, mime_type, object_key, object_container) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.owner_id)
        .bind(data.folder_id)
        .bind(&data.file_name)
        .bind(&data.original_name)
        .bind(data.file_size)
        .bind(&data.mime_type)
        .bind(&data.object_key)
        .bind(&data.object_container)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_object_key_key") =>
            {
                AppError::conflict(format!("Object key '{}' already exists", data.object_key))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
        })
    }

    async fn list(&self, owner_id: Uuid, query: &FileQuery) -> AppResult<FileListing> {
        let mut aggregate_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*), COALESCE(SUM(file_size), 0)::BIGINT FROM files");
        Self::push_filters(&mut aggregate_builder, owner_id, query);

        let (total_count, total_bytes): (i64, i64) = aggregate_builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to aggregate files", e)
            })?;

        let mut list_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT * FROM files");
        Self::push_filters(&mut list_builder, owner_id, query);
        list_builder.push(format!(
            " ORDER BY {} {}",
            query.sort_by.as_column(),
            query.sort_order.as_sql()
        ));
        list_builder.push(" LIMIT ");
        list_builder.push_bind(query.limit as i64);
        list_builder.push(" OFFSET ");
        list_builder.push_bind(query.offset as i64);

        let files = list_builder
            .build_query_as::<FileRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        Ok(FileListing {
            files,
            total_count: total_count.max(0) as u64,
            total_bytes: total_bytes.max(0) as u64,
        })
    }

    async fn list_by_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        limit: i64,
    ) -> AppResult<Vec<FileRecord>> {
        let query = match folder_id {
            Some(_) => {
                "SELECT * FROM files \
                 WHERE owner_id = $1 AND folder_id = $2 AND NOT is_deleted \
                 ORDER BY file_name ASC LIMIT $3"
            }
            None => {
                "SELECT * FROM files \
                 WHERE owner_id = $1 AND $2::uuid IS NULL AND folder_id IS NULL \
                 AND NOT is_deleted ORDER BY file_name ASC LIMIT $3"
            }
        };

        sqlx::query_as::<_, FileRecord>(query)
            .bind(owner_id)
            .bind(folder_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list folder files", e)
            })
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<FileRecord> {
        sqlx::query_as::<_, FileRecord>(
            "UPDATE files SET folder_id = $2, last_modified = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move file", e))?
        .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    async fn update_annotations(
        &self,
        id: Uuid,
        tags: Option<&[String]>,
        metadata: Option<&serde_json::Value>,
    ) -> AppResult<FileRecord> {
        sqlx::query_as::<_, FileRecord>(
            "UPDATE files SET tags = COALESCE($2, tags), metadata = COALESCE($3, metadata), \
             last_modified = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(tags.map(|t| t.to_vec()))
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update metadata", e))?
        .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    async fn mark_deleted(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET is_deleted = TRUE, last_modified = NOW() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to soft-delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }
}
