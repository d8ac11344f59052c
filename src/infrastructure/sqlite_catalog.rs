//! SQLite-backed [`TargetCatalog`]

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::product::{ExternalProduct, UpsertRequest, UpsertResult};
use crate::infrastructure::catalog::TargetCatalog;
use crate::infrastructure::sync_error::CatalogError;

#[derive(Clone)]
pub struct SqliteCatalog {
    pool: Arc<SqlitePool>,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Publication status (`publish` or `draft`) of a SKU
    pub async fn status_of(&self, sku: &str) -> Result<Option<String>, CatalogError> {
        let row = sqlx::query("SELECT status FROM catalog_products WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("status")))
    }

    pub async fn is_on_sale(&self, sku: &str) -> Result<Option<bool>, CatalogError> {
        let row = sqlx::query("SELECT on_sale FROM catalog_products WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| r.get::<bool, _>("on_sale")))
    }

    /// Adds an already published product, bypassing the draft rule of [`TargetCatalog::upsert`].
    pub async fn seed(&self, product: &ExternalProduct) -> Result<(), CatalogError> {
        let sku = product.sku.as_deref().ok_or_else(|| CatalogError::Rejected {
            business_key: String::new(),
            reason: "missing SKU".to_string(),
        })?;
        let sale_price = product.sale_price.clone().unwrap_or_default();

        sqlx::query(
            r"
            INSERT INTO catalog_products (id, sku, name, regular_price, sale_price, on_sale, status)
            VALUES (?, ?, ?, ?, ?, ?, 'publish')
            ",
        )
        .bind(&product.id)
        .bind(sku)
        .bind(&product.name)
        .bind(product.regular_price.clone().unwrap_or_default())
        .bind(&sale_price)
        .bind(!sale_price.is_empty())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TargetCatalog for SqliteCatalog {
    async fn load_all(&self) -> Result<Vec<ExternalProduct>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, sku, name, regular_price, sale_price FROM catalog_products ORDER BY sku",
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ExternalProduct {
                id: row.get("id"),
                sku: row.get("sku"),
                name: row.get("name"),
                regular_price: row.get("regular_price"),
                sale_price: row.get("sale_price"),
            })
            .collect())
    }

    async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertResult, CatalogError> {
        if request.business_key.is_empty() {
            return Err(CatalogError::Rejected {
                business_key: String::new(),
                reason: "empty SKU".to_string(),
            });
        }

        let existing = sqlx::query("SELECT id FROM catalog_products WHERE sku = ?")
            .bind(&request.business_key)
            .fetch_optional(&*self.pool)
            .await?;

        if let Some(row) = existing {
            let id: String = row.get("id");
            sqlx::query(
                r"
                UPDATE catalog_products
                SET name = COALESCE(?, name), regular_price = ?, sale_price = ?, on_sale = ?, updated_at = ?
                WHERE id = ?
                ",
            )
            .bind(&request.full_name)
            .bind(&request.regular_price)
            .bind(&request.sale_price)
            .bind(request.on_sale)
            .bind(Utc::now())
            .bind(&id)
            .execute(&*self.pool)
            .await?;
            return Ok(UpsertResult::Updated { id });
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r"
            INSERT INTO catalog_products (id, sku, name, regular_price, sale_price, on_sale, status)
            VALUES (?, ?, ?, ?, ?, ?, 'draft')
            ",
        )
        .bind(&id)
        .bind(&request.business_key)
        .bind(request.insert_name())
        .bind(&request.regular_price)
        .bind(&request.sale_price)
        .bind(request.on_sale)
        .execute(&*self.pool)
        .await?;
        Ok(UpsertResult::Inserted { id })
    }
}
