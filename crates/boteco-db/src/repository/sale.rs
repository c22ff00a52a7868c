//! # Sale Repository
//!
//! Persistence for the sale aggregate (sales + sale_items).
//!
//! ## Write Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Sale Persistence Strategy                               │
//! │                                                                         │
//! │  The aggregate is mutated in memory (boteco-core) and persisted        │
//! │  whole. Two guards keep concurrent PDV terminals honest:               │
//! │                                                                         │
//! │  1. VERSION CAS (save)                                                 │
//! │     UPDATE sales SET ..., version = version + 1                        │
//! │     WHERE id = ? AND version = ?                                       │
//! │     └── 0 rows affected → another terminal saved first → Conflict      │
//! │                                                                         │
//! │  2. ONE OPEN SALE PER MESA (insert)                                    │
//! │     INSERT ... SELECT ... WHERE NOT EXISTS (open sale on mesa)         │
//! │     └── 0 rows affected → mesa already occupied → Conflict             │
//! │     (backed by a partial UNIQUE index for belt-and-suspenders)         │
//! │                                                                         │
//! │  Items are replaced wholesale inside the same transaction, so a        │
//! │  reader never observes a sale whose items disagree with its totals.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use boteco_core::{Money, PaymentMethod, Sale, SaleItem, SaleKind, SaleStatus};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

/// Flat row shape of the `sales` table; items are loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    numero_comanda: String,
    kind: SaleKind,
    mesa: Option<String>,
    funcionario: String,
    cliente: Option<String>,
    nome_comanda: Option<String>,
    subtotal: Money,
    desconto_bps: i64,
    total: Money,
    status: SaleStatus,
    observacoes: Option<String>,
    forma_pagamento: Option<PaymentMethod>,
    valor_recebido: Option<Money>,
    troco: Option<Money>,
    finalizada_em: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl SaleRow {
    fn into_sale(self, itens: Vec<SaleItem>) -> Sale {
        Sale {
            id: self.id,
            numero_comanda: self.numero_comanda,
            kind: self.kind,
            mesa: self.mesa,
            funcionario: self.funcionario,
            cliente: self.cliente,
            nome_comanda: self.nome_comanda,
            itens,
            subtotal: self.subtotal,
            desconto_bps: self.desconto_bps as u32,
            total: self.total,
            status: self.status,
            observacoes: self.observacoes,
            forma_pagamento: self.forma_pagamento,
            valor_recebido: self.valor_recebido,
            troco: self.troco,
            finalizada_em: self.finalizada_em,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }
}

const SALE_COLUMNS: &str = r#"
    id, numero_comanda, kind, mesa, funcionario, cliente, nome_comanda,
    subtotal, desconto_bps, total, status, observacoes,
    forma_pagamento, valor_recebido, troco, finalizada_em,
    created_at, updated_at, version
"#;

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a sale by ID, with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let itens = self.load_items(&row.id).await?;
                Ok(Some(row.into_sale(itens)))
            }
            None => Ok(None),
        }
    }

    /// Lists sales, optionally filtered by status and kind, newest first.
    pub async fn list(
        &self,
        status: Option<SaleStatus>,
        kind: Option<SaleKind>,
    ) -> DbResult<Vec<Sale>> {
        let mut sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1=1");
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if kind.is_some() {
            sql.push_str(" AND kind = ?");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, SaleRow>(&sql);
        if let Some(status) = status {
            query = query.bind(status);
        }
        if let Some(kind) = kind {
            query = query.bind(kind);
        }

        let rows = query.fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    /// Lists finalized sales within an optional settlement-time window
    /// (the Caixa summary query), newest first.
    pub async fn list_finalizadas(
        &self,
        data_inicio: Option<DateTime<Utc>>,
        data_fim: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Sale>> {
        let mut sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE status = 'finalizada'"
        );
        if data_inicio.is_some() {
            sql.push_str(" AND finalizada_em >= ?");
        }
        if data_fim.is_some() {
            sql.push_str(" AND finalizada_em <= ?");
        }
        sql.push_str(" ORDER BY finalizada_em DESC");

        let mut query = sqlx::query_as::<_, SaleRow>(&sql);
        if let Some(inicio) = data_inicio {
            query = query.bind(inicio);
        }
        if let Some(fim) = data_fim {
            query = query.bind(fim);
        }

        let rows = query.fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    /// The open sale bound to a mesa, if any. At most one exists.
    pub async fn open_sale_for_mesa(&self, mesa_id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE mesa = ?1 AND status IN ('aberta', 'salva')
            "#
        ))
        .bind(mesa_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let itens = self.load_items(&row.id).await?;
                Ok(Some(row.into_sale(itens)))
            }
            None => Ok(None),
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Inserts a new sale with its items.
    ///
    /// For mesa-bound sales the insert is guarded so it only lands when
    /// the mesa has no open sale; losing that race yields
    /// [`DbError::Conflict`] and writes nothing.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, kind = ?sale.kind, "Inserting sale");

        let mut tx = self.pool.begin().await?;

        let result = match &sale.mesa {
            Some(mesa_id) => {
                // Guarded insert: lands only if the mesa is free
                sqlx::query(
                    r#"
                    INSERT INTO sales (
                        id, numero_comanda, kind, mesa, funcionario, cliente,
                        nome_comanda, subtotal, desconto_bps, total, status,
                        observacoes, forma_pagamento, valor_recebido, troco,
                        finalizada_em, created_at, updated_at, version
                    )
                    SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                           ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
                    WHERE NOT EXISTS (
                        SELECT 1 FROM sales
                        WHERE mesa = ?20 AND status IN ('aberta', 'salva')
                    )
                    "#,
                )
                .bind(&sale.id)
                .bind(&sale.numero_comanda)
                .bind(sale.kind)
                .bind(&sale.mesa)
                .bind(&sale.funcionario)
                .bind(&sale.cliente)
                .bind(&sale.nome_comanda)
                .bind(sale.subtotal)
                .bind(sale.desconto_bps as i64)
                .bind(sale.total)
                .bind(sale.status)
                .bind(&sale.observacoes)
                .bind(sale.forma_pagamento)
                .bind(sale.valor_recebido)
                .bind(sale.troco)
                .bind(sale.finalizada_em)
                .bind(sale.created_at)
                .bind(sale.updated_at)
                .bind(sale.version)
                .bind(mesa_id)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO sales (
                        id, numero_comanda, kind, mesa, funcionario, cliente,
                        nome_comanda, subtotal, desconto_bps, total, status,
                        observacoes, forma_pagamento, valor_recebido, troco,
                        finalizada_em, created_at, updated_at, version
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                              ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
                    "#,
                )
                .bind(&sale.id)
                .bind(&sale.numero_comanda)
                .bind(sale.kind)
                .bind(&sale.mesa)
                .bind(&sale.funcionario)
                .bind(&sale.cliente)
                .bind(&sale.nome_comanda)
                .bind(sale.subtotal)
                .bind(sale.desconto_bps as i64)
                .bind(sale.total)
                .bind(sale.status)
                .bind(&sale.observacoes)
                .bind(sale.forma_pagamento)
                .bind(sale.valor_recebido)
                .bind(sale.troco)
                .bind(sale.finalizada_em)
                .bind(sale.created_at)
                .bind(sale.updated_at)
                .bind(sale.version)
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            // Only the guarded path can hit this
            return Err(DbError::conflict(format!(
                "mesa {} already has an open sale",
                sale.mesa.as_deref().unwrap_or("?")
            )));
        }

        Self::insert_items(&mut tx, &sale.id, &sale.itens).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Persists the current state of a sale, compare-and-swap on the
    /// version the caller loaded.
    ///
    /// ## Returns
    /// The new version on success. [`DbError::Conflict`] when another
    /// writer saved the sale since it was loaded; nothing is written in
    /// that case.
    pub async fn save(&self, sale: &Sale) -> DbResult<i64> {
        debug!(id = %sale.id, version = sale.version, status = ?sale.status, "Saving sale");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                cliente = ?3,
                nome_comanda = ?4,
                subtotal = ?5,
                desconto_bps = ?6,
                total = ?7,
                status = ?8,
                observacoes = ?9,
                forma_pagamento = ?10,
                valor_recebido = ?11,
                troco = ?12,
                finalizada_em = ?13,
                updated_at = ?14,
                version = version + 1
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(&sale.id)
        .bind(sale.version)
        .bind(&sale.cliente)
        .bind(&sale.nome_comanda)
        .bind(sale.subtotal)
        .bind(sale.desconto_bps as i64)
        .bind(sale.total)
        .bind(sale.status)
        .bind(&sale.observacoes)
        .bind(sale.forma_pagamento)
        .bind(sale.valor_recebido)
        .bind(sale.troco)
        .bind(sale.finalizada_em)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing sale from a lost race
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM sales WHERE id = ?1")
                    .bind(&sale.id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match exists {
                Some(_) => DbError::conflict(format!(
                    "sale {} was modified concurrently (expected version {})",
                    sale.id, sale.version
                )),
                None => DbError::not_found("Venda", &sale.id),
            });
        }

        // Replace items wholesale in the same transaction
        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(&sale.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_items(&mut tx, &sale.id, &sale.itens).await?;

        tx.commit().await?;

        Ok(sale.version + 1)
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    async fn insert_items(
        tx: &mut Transaction<'_, Sqlite>,
        sale_id: &str,
        itens: &[SaleItem],
    ) -> DbResult<()> {
        for (position, item) in itens.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    sale_id, position, produto, nome_produto,
                    preco_unitario, quantidade, subtotal
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(sale_id)
            .bind(position as i64)
            .bind(&item.produto)
            .bind(&item.nome_produto)
            .bind(item.preco_unitario)
            .bind(item.quantidade)
            .bind(item.subtotal)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn load_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let itens = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT produto, nome_produto, preco_unitario, quantidade, subtotal
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(itens)
    }

    async fn hydrate(&self, rows: Vec<SaleRow>) -> DbResult<Vec<Sale>> {
        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let itens = self.load_items(&row.id).await?;
            sales.push(row.into_sale(itens));
        }
        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use boteco_core::{Mesa, MesaKind, MesaStatus, NewSale, Payment, Product};

    fn sample_product(id: &str, preco: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.into(),
            nome: format!("Produto {}", id),
            descricao: None,
            preco_custo: Money::zero(),
            preco_venda: Money::from_centavos(preco),
            grupo: None,
            unidade: None,
            estoque: 0,
            ativo: true,
            oculto: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_sale(kind: SaleKind, mesa: Option<&str>) -> Sale {
        Sale::new(
            NewSale {
                kind,
                mesa: mesa.map(String::from),
                funcionario: "func-1".into(),
                cliente: None,
                nome_comanda: None,
                desconto_bps: 0,
                observacoes: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    async fn insert_mesa(db: &Database, id: &str, numero: &str) {
        let now = Utc::now();
        db.mesas()
            .insert(&Mesa {
                id: id.into(),
                numero: numero.into(),
                nome: format!("Mesa {}", numero),
                capacidade: 4,
                kind: MesaKind::Interna,
                status: MesaStatus::Livre,
                observacoes: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        let now = Utc::now();

        let mut sale = new_sale(SaleKind::Balcao, None);
        sale.add_item(&sample_product("p1", 1050), 2, now).unwrap();
        sale.add_item(&sample_product("p2", 3500), 1, now).unwrap();

        repo.insert(&sale).await.unwrap();

        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.itens.len(), 2);
        assert_eq!(loaded.subtotal.centavos(), 2 * 1050 + 3500);
        assert_eq!(loaded.status, SaleStatus::Aberta);
        assert_eq!(loaded.version, 0);
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_replaces_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        let now = Utc::now();

        let mut sale = new_sale(SaleKind::Comanda, None);
        sale.add_item(&sample_product("p1", 500), 1, now).unwrap();
        repo.insert(&sale).await.unwrap();

        sale.add_item(&sample_product("p2", 900), 3, now).unwrap();
        let new_version = repo.save(&sale).await.unwrap();
        assert_eq!(new_version, 1);

        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.itens.len(), 2);
        assert_eq!(loaded.subtotal.centavos(), 500 + 3 * 900);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts_without_writing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        let now = Utc::now();

        let mut sale = new_sale(SaleKind::Comanda, None);
        sale.add_item(&sample_product("p1", 500), 1, now).unwrap();
        repo.insert(&sale).await.unwrap();

        // Terminal A saves first
        let mut terminal_a = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        terminal_a.add_item(&sample_product("p2", 700), 1, now).unwrap();
        repo.save(&terminal_a).await.unwrap();

        // Terminal B holds the stale version 0
        let mut terminal_b = sale.clone();
        terminal_b.add_item(&sample_product("p3", 900), 1, now).unwrap();
        let err = repo.save(&terminal_b).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        // Terminal A's write survived intact
        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert!(loaded.itens.iter().any(|i| i.produto == "p2"));
        assert!(!loaded.itens.iter().any(|i| i.produto == "p3"));
    }

    #[tokio::test]
    async fn test_second_open_sale_on_mesa_conflicts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        insert_mesa(&db, "m1", "5").await;

        repo.insert(&new_sale(SaleKind::Mesa, Some("m1"))).await.unwrap();

        let err = repo
            .insert(&new_sale(SaleKind::Mesa, Some("m1")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mesa_frees_up_after_settlement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        let now = Utc::now();
        insert_mesa(&db, "m1", "5").await;

        let mut sale = new_sale(SaleKind::Mesa, Some("m1"));
        sale.add_item(&sample_product("p1", 1500), 1, now).unwrap();
        repo.insert(&sale).await.unwrap();

        assert!(repo.open_sale_for_mesa("m1").await.unwrap().is_some());

        sale.settle(Payment::Pix, now).unwrap();
        repo.save(&sale).await.unwrap();

        assert!(repo.open_sale_for_mesa("m1").await.unwrap().is_none());
        // A new sale can now land on the mesa
        repo.insert(&new_sale(SaleKind::Mesa, Some("m1"))).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_kind() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        let now = Utc::now();

        let mut finalized = new_sale(SaleKind::Balcao, None);
        finalized.add_item(&sample_product("p1", 1000), 1, now).unwrap();
        finalized.settle(Payment::Card, now).unwrap();
        repo.insert(&finalized).await.unwrap();

        repo.insert(&new_sale(SaleKind::Comanda, None)).await.unwrap();

        let abertas = repo.list(Some(SaleStatus::Aberta), None).await.unwrap();
        assert_eq!(abertas.len(), 1);
        assert_eq!(abertas[0].kind, SaleKind::Comanda);

        let comandas = repo
            .list(Some(SaleStatus::Aberta), Some(SaleKind::Comanda))
            .await
            .unwrap();
        assert_eq!(comandas.len(), 1);

        let all = repo.list(None, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_list_finalizadas_date_window() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let early = Utc::now() - chrono::Duration::days(2);
        let late = Utc::now();

        for ts in [early, late] {
            let mut sale = new_sale(SaleKind::Balcao, None);
            sale.add_item(&sample_product("p1", 1000), 1, ts).unwrap();
            sale.settle(Payment::Card, ts).unwrap();
            repo.insert(&sale).await.unwrap();
        }

        let cutoff = Utc::now() - chrono::Duration::days(1);
        let recent = repo.list_finalizadas(Some(cutoff), None).await.unwrap();
        assert_eq!(recent.len(), 1);

        let all = repo.list_finalizadas(None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let none = repo
            .list_finalizadas(None, Some(cutoff - chrono::Duration::days(5)))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
