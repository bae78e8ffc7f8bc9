//! Entry API endpoints
use api_types::entry::{EntryDeleted, EntryKindView, EntryPayload, EntryView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{ENTRY_LIST_LIMIT, Entry, EntryKind, validate_create, validate_update};

use crate::{JsonBody, ServerError, server::Caller, server::ServerState};

fn entry_view(entry: Entry) -> EntryView {
    let kind = match entry.kind {
        EntryKind::Fuel(trip) => EntryKindView::Fuel {
            origin: trip.origin,
            destination: trip.destination,
            start_km: trip.start_km,
            end_km: trip.end_km,
            km: trip.km,
        },
        EntryKind::Expense(claim) => EntryKindView::Expense {
            amount_to_justify: claim.amount_to_justify,
        },
    };
    let details = entry.details;

    EntryView {
        id: entry.id.to_string(),
        kind,
        claimant_name: details.claimant_name,
        expense_date: details.expense_date,
        reason: details.reason,
        cost_center: details.cost_center,
        branch: details.branch,
        folio: details.folio,
        notes: details.notes,
        service_type: details.service_type.map(|kind| kind.as_str().to_string()),
        created_by: entry.created_by,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    }
}

pub async fn entry_new(
    Caller(caller): Caller,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<EntryPayload>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let new = validate_create(&caller, payload)?;
    let entry = state.engine.create_entry(new).await?;

    Ok((StatusCode::CREATED, Json(entry_view(entry))))
}

pub async fn list(
    Caller(caller): Caller,
    State(state): State<ServerState>,
) -> Result<Json<Vec<EntryView>>, ServerError> {
    let entries = state
        .engine
        .list_entries(&caller.user_id, ENTRY_LIST_LIMIT)
        .await?;

    Ok(Json(entries.into_iter().map(entry_view).collect()))
}

pub async fn get(
    Caller(caller): Caller,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state.engine.entry(&caller.user_id, &id).await?;

    Ok(Json(entry_view(entry)))
}

/// Replace an entry with a re-validated payload.
///
/// The payload is checked against the stored entry, so omitted optional
/// fields keep their stored values while switching `tipo` drops every field
/// of the previous variant.
pub async fn update(
    Caller(caller): Caller,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<EntryPayload>,
) -> Result<Json<EntryView>, ServerError> {
    let existing = state.engine.entry(&caller.user_id, &id).await?;
    let updated = validate_update(&existing, payload)?;
    let entry = state.engine.update_entry(&caller.user_id, &updated).await?;

    Ok(Json(entry_view(entry)))
}

pub async fn delete(
    Caller(caller): Caller,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EntryDeleted>, ServerError> {
    if !state.engine.delete_entry(&caller.user_id, &id).await? {
        return Err(engine::EngineError::KeyNotFound("entry".to_string()).into());
    }

    Ok(Json(EntryDeleted { ok: true }))
}
