//! Administrative handlers

use crate::error::ApiError;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use srm_types::{Acknowledgment, ClearRequest};

/// DELETE /api/limpiar — irreversibly erase every record and reset the
/// identity counter. Guarded by the shared static admin key; the key check
/// happens before any mutation.
pub async fn limpiar(
    State(state): State<AppState>,
    Json(req): Json<ClearRequest>,
) -> Result<Json<Acknowledgment>, ApiError> {
    if req.key != state.admin_key {
        return Err(ApiError::InvalidKey);
    }

    if let Err(e) = state.db.clear_empresas().await {
        tracing::error!("Failed to clear empresas: {:#}", e);
        return Err(ApiError::Internal("Error interno del servidor"));
    }

    tracing::info!("Tabla 'empresas' vaciada por administrador");

    Ok(Json(Acknowledgment::ok(
        "Base de datos vaciada correctamente.",
    )))
}
