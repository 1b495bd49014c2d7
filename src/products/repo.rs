use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewProduct, Page, Product, ProductChanges};
use crate::error::AppError;

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn create(&self, owner_id: Uuid, product: NewProduct) -> Result<Product, AppError>;
    async fn list_all(&self, page: Page) -> Result<Vec<Product>, AppError>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, AppError>;
    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError>;
    /// Returns `None` if the row vanished before the write.
    async fn update(&self, id: Uuid, changes: ProductChanges)
        -> Result<Option<Product>, AppError>;
    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgProductRepo {
    db: PgPool,
}

impl PgProductRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT p.id, p.name, p.description, p.price, p.owner_id,
           u.username AS owner_username, p.created_at, p.updated_at
"#;

#[async_trait]
impl ProductRepo for PgProductRepo {
    async fn create(&self, owner_id: Uuid, product: NewProduct) -> Result<Product, AppError> {
        let sql = format!(
            r#"
            WITH p AS (
                INSERT INTO products (name, description, price, owner_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            {SELECT_PRODUCT}
            FROM p JOIN users u ON u.id = p.owner_id
            "#
        );
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(owner_id)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn list_all(&self, page: Page) -> Result<Vec<Product>, AppError> {
        // LIMIT NULL is LIMIT ALL in Postgres
        let sql = format!(
            r#"
            {SELECT_PRODUCT}
            FROM products p JOIN users u ON u.id = p.owner_id
            ORDER BY p.created_at ASC, p.id ASC
            LIMIT $1 OFFSET $2
            "#
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            r#"
            {SELECT_PRODUCT}
            FROM products p JOIN users u ON u.id = p.owner_id
            WHERE p.owner_id = $1
            ORDER BY p.created_at ASC, p.id ASC
            "#
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(owner_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let sql = format!(
            r#"
            {SELECT_PRODUCT}
            FROM products p JOIN users u ON u.id = p.owner_id
            WHERE p.id = $1
            "#
        );
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Option<Product>, AppError> {
        let sql = format!(
            r#"
            WITH p AS (
                UPDATE products
                   SET name        = COALESCE($2, name),
                       description = COALESCE($3, description),
                       price       = COALESCE($4, price),
                       updated_at  = now()
                 WHERE id = $1
                RETURNING *
            )
            {SELECT_PRODUCT}
            FROM p JOIN users u ON u.id = p.owner_id
            "#
        );
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.price)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
