//! # Customer Repository
//!
//! Customer registration. Referenced by sales for attribution and for
//! the comanda display-name fallback.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use boteco_core::Customer;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, nome, endereco, telefone, email, cpf, ativo,
                   created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, nome, endereco, telefone, email, cpf, ativo,
                   created_at, updated_at
            FROM customers
            ORDER BY nome COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, nome = %customer.nome, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, nome, endereco, telefone, email, cpf, ativo,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.nome)
        .bind(&customer.endereco)
        .bind(&customer.telefone)
        .bind(&customer.email)
        .bind(&customer.cpf)
        .bind(customer.ativo)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing customer (full replacement by id).
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                nome = ?2, endereco = ?3, telefone = ?4, email = ?5,
                cpf = ?6, ativo = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.nome)
        .bind(&customer.endereco)
        .bind(&customer.telefone)
        .bind(&customer.email)
        .bind(&customer.cpf)
        .bind(customer.ativo)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cliente", &customer.id));
        }

        Ok(())
    }

    /// Soft delete. The row stays so finalized sales keep their
    /// customer attribution.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE customers SET ativo = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cliente", id));
        }

        Ok(())
    }
}
