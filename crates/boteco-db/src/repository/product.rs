//! # Product Repository
//!
//! CRUD operations for the product catalog.
//!
//! Sale line items snapshot product name/price at add time, so updates
//! here never rewrite history.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use boteco_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, nome, descricao, preco_custo, preco_venda,
                   grupo, unidade, estoque, ativo, oculto,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products ordered by name. The PDV grid filters by
    /// group/visibility on its side.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, nome, descricao, preco_custo, preco_venda,
                   grupo, unidade, estoque, ativo, oculto,
                   created_at, updated_at
            FROM products
            ORDER BY nome COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, nome = %product.nome, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, nome, descricao, preco_custo, preco_venda,
                grupo, unidade, estoque, ativo, oculto,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.nome)
        .bind(&product.descricao)
        .bind(product.preco_custo)
        .bind(product.preco_venda)
        .bind(&product.grupo)
        .bind(&product.unidade)
        .bind(product.estoque)
        .bind(product.ativo)
        .bind(product.oculto)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product (full replacement by id).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                nome = ?2, descricao = ?3, preco_custo = ?4, preco_venda = ?5,
                grupo = ?6, unidade = ?7, estoque = ?8, ativo = ?9, oculto = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.nome)
        .bind(&product.descricao)
        .bind(product.preco_custo)
        .bind(product.preco_venda)
        .bind(&product.grupo)
        .bind(&product.unidade)
        .bind(product.estoque)
        .bind(product.ativo)
        .bind(product.oculto)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Produto", &product.id));
        }

        Ok(())
    }

    /// Soft delete. Line-item snapshots already preserve history; this
    /// just drops the product from the catalog.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query("UPDATE products SET ativo = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Produto", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use boteco_core::Money;
    use chrono::Utc;

    fn sample_product(id: &str, nome: &str) -> boteco_core::Product {
        let now = Utc::now();
        boteco_core::Product {
            id: id.to_string(),
            nome: nome.to_string(),
            descricao: Some("descricao".into()),
            preco_custo: Money::from_centavos(400),
            preco_venda: Money::from_centavos(1050),
            grupo: Some("bebidas".into()),
            unidade: Some("UN".into()),
            estoque: 24,
            ativo: true,
            oculto: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("p1", "Chopp")).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.nome, "Chopp");
        assert_eq!(found.preco_venda.centavos(), 1050);
        assert!(found.ativo);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("p1", "Porção de fritas")).await.unwrap();
        repo.insert(&sample_product("p2", "Caipirinha")).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].nome, "Caipirinha");
    }

    #[tokio::test]
    async fn test_deactivate_keeps_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("p1", "Chopp")).await.unwrap();
        repo.deactivate("p1").await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert!(!found.ativo);
        assert_eq!(found.nome, "Chopp");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let err = repo.update(&sample_product("ghost", "Nada")).await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::NotFound { .. }));
    }
}
