//! # Fine Commands

use tracing::info;

use crate::error::ApiError;
use crate::state::DbState;
use libris_core::{Fine, FineListing, PaymentStatus, Session};

/// Fines newest first, optionally only paid or only unpaid.
pub async fn list_fines(
    db: &DbState,
    status: Option<PaymentStatus>,
) -> Result<Vec<FineListing>, ApiError> {
    Ok(db.inner().fines().list(status).await?)
}

/// Records payment of a fine taken at the desk.
pub async fn pay_fine(db: &DbState, session: &Session, fine_id: i64) -> Result<Fine, ApiError> {
    let fine = db.inner().fines().mark_paid(fine_id).await?;

    info!(
        fine_id,
        amount = %fine.amount(),
        received_by = %session.username,
        "pay_fine command"
    );
    Ok(fine)
}
