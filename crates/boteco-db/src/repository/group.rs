//! # Product Group Repository
//!
//! Product categories ("bebidas", "porções") and units of measure
//! ("UN", "KG") share one table; `kind` discriminates. The management
//! screen edits both through the same endpoints.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use boteco_core::{ProductGroup, ProductGroupKind};

#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GroupRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductGroup>> {
        let group = sqlx::query_as::<_, ProductGroup>(
            r#"
            SELECT id, nome, descricao, icone, sigla, kind, ativo,
                   created_at, updated_at
            FROM product_groups
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Lists groups, optionally filtered by kind.
    pub async fn list(&self, kind: Option<ProductGroupKind>) -> DbResult<Vec<ProductGroup>> {
        let groups = match kind {
            Some(kind) => {
                sqlx::query_as::<_, ProductGroup>(
                    r#"
                    SELECT id, nome, descricao, icone, sigla, kind, ativo,
                           created_at, updated_at
                    FROM product_groups
                    WHERE kind = ?1
                    ORDER BY nome COLLATE NOCASE
                    "#,
                )
                .bind(kind)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductGroup>(
                    r#"
                    SELECT id, nome, descricao, icone, sigla, kind, ativo,
                           created_at, updated_at
                    FROM product_groups
                    ORDER BY nome COLLATE NOCASE
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(groups)
    }

    pub async fn insert(&self, group: &ProductGroup) -> DbResult<()> {
        debug!(id = %group.id, nome = %group.nome, kind = ?group.kind, "Inserting group");

        sqlx::query(
            r#"
            INSERT INTO product_groups (
                id, nome, descricao, icone, sigla, kind, ativo,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&group.id)
        .bind(&group.nome)
        .bind(&group.descricao)
        .bind(&group.icone)
        .bind(&group.sigla)
        .bind(group.kind)
        .bind(group.ativo)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, group: &ProductGroup) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE product_groups SET
                nome = ?2, descricao = ?3, icone = ?4, sigla = ?5,
                ativo = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&group.id)
        .bind(&group.nome)
        .bind(&group.descricao)
        .bind(&group.icone)
        .bind(&group.sigla)
        .bind(group.ativo)
        .bind(group.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Grupo", &group.id));
        }

        Ok(())
    }

    /// Hard delete. Products keep their `grupo` tag as free text, so no
    /// FK cleanup is needed.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM product_groups WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Grupo", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    fn sample_group(id: &str, nome: &str, kind: ProductGroupKind) -> ProductGroup {
        let now = Utc::now();
        ProductGroup {
            id: id.into(),
            nome: nome.into(),
            descricao: None,
            icone: Some("🍺".into()),
            sigla: None,
            kind,
            ativo: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.groups();

        repo.insert(&sample_group("g1", "Bebidas", ProductGroupKind::Grupo))
            .await
            .unwrap();
        repo.insert(&sample_group("u1", "Quilograma", ProductGroupKind::Unidade))
            .await
            .unwrap();

        let grupos = repo.list(Some(ProductGroupKind::Grupo)).await.unwrap();
        assert_eq!(grupos.len(), 1);
        assert_eq!(grupos[0].nome, "Bebidas");

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.groups();

        repo.insert(&sample_group("g1", "Bebidas", ProductGroupKind::Grupo))
            .await
            .unwrap();
        repo.delete("g1").await.unwrap();

        assert!(repo.list(None).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete("g1").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
