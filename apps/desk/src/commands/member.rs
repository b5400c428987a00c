//! # Member Commands
//!
//! Membership screen actions.

use chrono::Utc;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::DbState;
use libris_core::validation::validate_search_query;
use libris_core::{IssueListing, Member, MemberDraft, Money};

/// A member with their loan history and what they owe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetail {
    pub member: Member,
    pub loans: Vec<IssueListing>,
    pub outstanding_fines: Money,
}

pub async fn list_members(db: &DbState) -> Result<Vec<Member>, ApiError> {
    Ok(db.inner().members().list().await?)
}

/// Searches name, email and phone. A blank query lists everything.
pub async fn search_members(db: &DbState, query: &str) -> Result<Vec<Member>, ApiError> {
    let query = validate_search_query(query)?;
    Ok(db.inner().members().search(&query).await?)
}

pub async fn get_member(db: &DbState, id: i64) -> Result<MemberDetail, ApiError> {
    let member = db
        .inner()
        .members()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Member", &id.to_string()))?;

    let loans = db.inner().issues().for_member(id, Utc::now()).await?;
    let outstanding_fines = db.inner().fines().outstanding_for_member(id).await?;

    Ok(MemberDetail {
        member,
        loans,
        outstanding_fines,
    })
}

pub async fn create_member(db: &DbState, draft: MemberDraft) -> Result<Member, ApiError> {
    Ok(db.inner().members().create(draft).await?)
}

pub async fn update_member(db: &DbState, id: i64, draft: MemberDraft) -> Result<Member, ApiError> {
    Ok(db.inner().members().update(id, draft).await?)
}

/// Deletes a member holding no books, along with their loan history.
pub async fn delete_member(db: &DbState, id: i64) -> Result<(), ApiError> {
    Ok(db.inner().members().delete(id).await?)
}
