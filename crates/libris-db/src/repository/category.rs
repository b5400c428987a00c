//! # Category Repository
//!
//! Shelf categories. Deleting one leaves its books uncategorized
//! (`ON DELETE SET NULL`).

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::SearchTerm;
use libris_core::{Category, CategoryDraft};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Case-insensitive substring search over name and description.
    /// An empty term lists everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Category>> {
        let term = SearchTerm::new(term);
        if term.is_empty() {
            return self.list().await;
        }

        debug!(?term, "Searching categories");

        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|c| term.matches([Some(c.name.as_str()), c.description.as_deref()]))
            .collect())
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn create(&self, draft: CategoryDraft) -> DbResult<Category> {
        let draft = draft.validated()?;
        debug!(name = %draft.name, "Creating category");

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES (?1, ?2)
            RETURNING id, name, description
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&draft.name))?;

        info!(id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn update(&self, id: i64, draft: CategoryDraft) -> DbResult<Category> {
        let draft = draft.validated()?;
        debug!(id, name = %draft.name, "Updating category");

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET name = ?2, description = ?3
            WHERE id = ?1
            RETURNING id, name, description
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&draft.name))?
        .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category; its books keep existing without one.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    #[tokio::test]
    async fn test_create_and_search() {
        let db = test_support::db().await;
        let repo = db.categories();

        let poetry = repo
            .create(CategoryDraft {
                name: " Poetry ".to_string(),
                description: Some("Verse of all kinds".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(poetry.name, "Poetry");

        let found = repo.search("verse").await.unwrap();
        assert_eq!(found, vec![poetry]);
        assert_eq!(repo.search("").await.unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_reported() {
        let db = test_support::db().await;

        let err = db
            .categories()
            .create(CategoryDraft {
                name: "fiction".to_string(),
                description: None,
            })
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "category name");
                assert_eq!(value, "fiction");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_uncategorizes_books() {
        let db = test_support::db().await;
        let category = db
            .categories()
            .create(CategoryDraft {
                name: "Maps".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut draft = test_support::book("Atlas", 1);
        draft.category_id = Some(category.id);
        let book = db.books().create(draft).await.unwrap();

        db.categories().delete(category.id).await.unwrap();

        let book = db.books().get_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(book.category_id, None);
        assert!(matches!(
            db.categories().delete(category.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
