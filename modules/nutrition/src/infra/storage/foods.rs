use std::sync::Arc;

use async_trait::async_trait;
use dbkit::{DbHandle, Param, Row};

use crate::contract::model::FoodItem;
use crate::domain::repo::{FoodCatalogRepository, PersistenceError};

/// Read-only view of `food_item`.
#[derive(Clone)]
pub struct SqlFoodCatalog {
    db: Arc<DbHandle>,
}

impl SqlFoodCatalog {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

fn to_item(row: &Row) -> dbkit::Result<FoodItem> {
    Ok(FoodItem {
        id: row.i64("id")?,
        name: row.string("name")?,
        category: row.string("category")?,
    })
}

#[async_trait]
impl FoodCatalogRepository for SqlFoodCatalog {
    async fn list_by_category(&self, category: &str) -> Result<Vec<FoodItem>, PersistenceError> {
        let rows = self
            .db
            .run(
                "SELECT id, name, category FROM food_item WHERE category = ? ORDER BY name, id",
                &[Param::from(category)],
            )
            .await?;
        Ok(rows.iter().map(to_item).collect::<dbkit::Result<_>>()?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FoodItem>, PersistenceError> {
        let rows = self
            .db
            .run(
                "SELECT id, name, category FROM food_item WHERE id = ?",
                &[Param::from(id)],
            )
            .await?;
        Ok(rows.first().map(to_item).transpose()?)
    }
}
