//! # Employee Repository
//!
//! Employee registration. Every sale is attributed to an employee.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use boteco_core::Employee;

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, nome, cargo, telefone, ativo, created_at, updated_at
            FROM employees
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn list(&self) -> DbResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, nome, cargo, telefone, ativo, created_at, updated_at
            FROM employees
            ORDER BY nome COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, nome = %employee.nome, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, nome, cargo, telefone, ativo, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.nome)
        .bind(&employee.cargo)
        .bind(&employee.telefone)
        .bind(employee.ativo)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing employee (full replacement by id).
    pub async fn update(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Updating employee");

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                nome = ?2, cargo = ?3, telefone = ?4, ativo = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.nome)
        .bind(&employee.cargo)
        .bind(&employee.telefone)
        .bind(employee.ativo)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Funcionário", &employee.id));
        }

        Ok(())
    }

    /// Soft delete. The row stays so sale attribution keeps resolving.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE employees SET ativo = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Funcionário", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.employees();
        let now = Utc::now();

        repo.insert(&boteco_core::Employee {
            id: "e1".into(),
            nome: "João".into(),
            cargo: Some("Garçom".into()),
            telefone: None,
            ativo: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

        let found = repo.get_by_id("e1").await.unwrap().unwrap();
        assert_eq!(found.cargo.as_deref(), Some("Garçom"));
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.employees();
        let now = Utc::now();

        let mut employee = boteco_core::Employee {
            id: "e1".into(),
            nome: "João".into(),
            cargo: None,
            telefone: None,
            ativo: true,
            created_at: now,
            updated_at: now,
        };
        repo.insert(&employee).await.unwrap();

        employee.cargo = Some("Caixa".into());
        repo.update(&employee).await.unwrap();
        assert_eq!(
            repo.get_by_id("e1").await.unwrap().unwrap().cargo.as_deref(),
            Some("Caixa")
        );

        repo.deactivate("e1").await.unwrap();
        assert!(!repo.get_by_id("e1").await.unwrap().unwrap().ativo);
    }
}
