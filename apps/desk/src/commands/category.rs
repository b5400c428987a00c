//! # Category Commands

use crate::error::ApiError;
use crate::state::DbState;
use libris_core::validation::validate_search_query;
use libris_core::{Category, CategoryDraft};

pub async fn list_categories(db: &DbState) -> Result<Vec<Category>, ApiError> {
    Ok(db.inner().categories().list().await?)
}

pub async fn search_categories(db: &DbState, query: &str) -> Result<Vec<Category>, ApiError> {
    let query = validate_search_query(query)?;
    Ok(db.inner().categories().search(&query).await?)
}

pub async fn create_category(db: &DbState, draft: CategoryDraft) -> Result<Category, ApiError> {
    Ok(db.inner().categories().create(draft).await?)
}

pub async fn update_category(
    db: &DbState,
    id: i64,
    draft: CategoryDraft,
) -> Result<Category, ApiError> {
    Ok(db.inner().categories().update(id, draft).await?)
}

/// Deletes a category. Its books stay in the catalog, uncategorized.
pub async fn delete_category(db: &DbState, id: i64) -> Result<(), ApiError> {
    Ok(db.inner().categories().delete(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_default_categories_and_duplicate() {
        let db = DbState::in_memory().await.unwrap();
        assert_eq!(list_categories(&db).await.unwrap().len(), 8);

        let draft = CategoryDraft {
            name: "science".to_string(),
            description: None,
        };
        let err = create_category(&db, draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);

        assert_eq!(search_categories(&db, "fict").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let db = DbState::in_memory().await.unwrap();
        let draft = |name: &str| CategoryDraft {
            name: name.to_string(),
            description: Some("Verse and song".to_string()),
        };

        let poetry = create_category(&db, draft("Poetry")).await.unwrap();
        let renamed = update_category(&db, poetry.id, draft(" Verse ")).await.unwrap();
        assert_eq!(renamed.name, "Verse");
        assert_eq!(list_categories(&db).await.unwrap().len(), 9);

        delete_category(&db, poetry.id).await.unwrap();
        assert_eq!(list_categories(&db).await.unwrap().len(), 8);

        let err = update_category(&db, poetry.id, draft("Poetry")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
