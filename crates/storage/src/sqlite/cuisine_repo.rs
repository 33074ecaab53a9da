use course_core::model::{Cuisine, CuisineId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_cuisine_row};
use crate::repository::{CuisineRepository, StorageError};

#[async_trait::async_trait]
impl CuisineRepository for SqliteRepository {
    async fn upsert_cuisine(&self, cuisine: &Cuisine) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO cuisines (id, name, description, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description
            ",
        )
        .bind(id_to_i64("cuisine_id", cuisine.id().value())?)
        .bind(cuisine.name())
        .bind(cuisine.description())
        .bind(cuisine.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_cuisine(&self, id: CuisineId) -> Result<Option<Cuisine>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, description, created_at
            FROM cuisines WHERE id = ?1
            ",
        )
        .bind(id_to_i64("cuisine_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_cuisine_row).transpose()
    }

    async fn list_cuisines(&self) -> Result<Vec<Cuisine>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, created_at
            FROM cuisines
            ORDER BY name ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_cuisine_row).collect()
    }
}
