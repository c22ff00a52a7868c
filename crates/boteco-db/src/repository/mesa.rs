//! # Mesa Repository
//!
//! Mesa registration and base status management.
//!
//! ## Occupancy Is Derived
//! The stored `status` column only ever holds `livre`, `reservada` or
//! `manutencao`. Whether a mesa is *occupied* is a fact about the sales
//! table (an open sale referencing it), surfaced here through
//! [`MesaRepository::occupied_mesa_ids`] so list views can join the two
//! without a per-mesa query.

use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{DbError, DbResult};
use boteco_core::{Mesa, MesaStatus};

#[derive(Debug, Clone)]
pub struct MesaRepository {
    pool: SqlitePool,
}

impl MesaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MesaRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Mesa>> {
        let mesa = sqlx::query_as::<_, Mesa>(
            r#"
            SELECT id, numero, nome, capacidade, kind, status, observacoes,
                   created_at, updated_at
            FROM mesas
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mesa)
    }

    /// Lists all mesas ordered by numero. The stored base status still
    /// needs to be combined with occupancy; see `occupied_mesa_ids`.
    pub async fn list(&self) -> DbResult<Vec<Mesa>> {
        let mesas = sqlx::query_as::<_, Mesa>(
            r#"
            SELECT id, numero, nome, capacidade, kind, status, observacoes,
                   created_at, updated_at
            FROM mesas
            ORDER BY CAST(numero AS INTEGER), numero
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(mesas)
    }

    /// IDs of mesas with an open sale, in one query.
    pub async fn occupied_mesa_ids(&self) -> DbResult<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT mesa FROM sales
            WHERE mesa IS NOT NULL AND status IN ('aberta', 'salva')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    /// Inserts a new mesa. `numero` is UNIQUE; a duplicate surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn insert(&self, mesa: &Mesa) -> DbResult<()> {
        debug!(id = %mesa.id, numero = %mesa.numero, "Inserting mesa");

        sqlx::query(
            r#"
            INSERT INTO mesas (
                id, numero, nome, capacidade, kind, status, observacoes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&mesa.id)
        .bind(&mesa.numero)
        .bind(&mesa.nome)
        .bind(mesa.capacidade)
        .bind(mesa.kind)
        .bind(mesa.status)
        .bind(mesa.observacoes.as_deref())
        .bind(mesa.created_at)
        .bind(mesa.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates the stored base status (`livre`, `reservada`,
    /// `manutencao`). `ocupada` is never written; it is derived.
    pub async fn set_base_status(&self, id: &str, status: MesaStatus) -> DbResult<()> {
        debug_assert!(status != MesaStatus::Ocupada);

        let result = sqlx::query("UPDATE mesas SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Mesa", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use boteco_core::MesaKind;
    use chrono::Utc;

    fn sample_mesa(id: &str, numero: &str) -> Mesa {
        let now = Utc::now();
        Mesa {
            id: id.into(),
            numero: numero.into(),
            nome: format!("Mesa {}", numero),
            capacidade: 4,
            kind: MesaKind::Interna,
            status: MesaStatus::Livre,
            observacoes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_numero_is_unique() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.mesas();

        repo.insert(&sample_mesa("m1", "5")).await.unwrap();
        let err = repo.insert(&sample_mesa("m2", "5")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_orders_numerically() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.mesas();

        repo.insert(&sample_mesa("m1", "10")).await.unwrap();
        repo.insert(&sample_mesa("m2", "2")).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all[0].numero, "2");
        assert_eq!(all[1].numero, "10");
    }

    #[tokio::test]
    async fn test_set_base_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.mesas();

        repo.insert(&sample_mesa("m1", "1")).await.unwrap();
        repo.set_base_status("m1", MesaStatus::Manutencao).await.unwrap();

        let mesa = repo.get_by_id("m1").await.unwrap().unwrap();
        assert_eq!(mesa.status, MesaStatus::Manutencao);

        assert!(matches!(
            repo.set_base_status("ghost", MesaStatus::Livre).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
