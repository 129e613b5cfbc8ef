use quiz_core::model::{Material, MaterialId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_material_row, u64_to_i64, write_err};
use crate::repository::{MaterialRepository, StorageError};

const MATERIAL_COLUMNS: &str = "id, user_id, name, original_name, file_path, file_size, mime_type, status, extracted_text, created_at";

#[async_trait::async_trait]
impl MaterialRepository for SqliteRepository {
    async fn insert_material(&self, material: &Material) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO materials (id, user_id, name, original_name, file_path, file_size, mime_type, status, extracted_text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(material.id().to_string())
        .bind(material.user_id().to_string())
        .bind(material.name())
        .bind(material.original_name())
        .bind(material.file_path())
        .bind(u64_to_i64("file_size", material.file_size())?)
        .bind(material.media_type().as_mime())
        .bind(material.status().as_str())
        .bind(material.extracted_text())
        .bind(material.created_at())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }

    async fn update_material(&self, material: &Material) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE materials
            SET status = ?1, extracted_text = ?2
            WHERE id = ?3
            ",
        )
        .bind(material.status().as_str())
        .bind(material.extracted_text())
        .bind(material.id().to_string())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_material(&self, id: MaterialId) -> Result<Option<Material>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_material_row).transpose()
    }

    async fn list_materials(&self, user_id: UserId) -> Result<Vec<Material>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE user_id = ?1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut materials = Vec::with_capacity(rows.len());
        for row in rows {
            materials.push(map_material_row(&row)?);
        }
        Ok(materials)
    }

    async fn delete_material(&self, id: MaterialId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM materials WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }
}
