//! Company record handlers

use crate::error::ApiError;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use srm_types::{Acknowledgment, Empresa, NuevaEmpresa};

/// GET /api/empresas — every record, most recent first. No pagination.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Empresa>>, ApiError> {
    match state.db.list_empresas().await {
        Ok(empresas) => Ok(Json(empresas)),
        Err(e) => {
            tracing::error!("Failed to list empresas: {:#}", e);
            Err(ApiError::Internal("Error al obtener empresas"))
        }
    }
}

/// POST /api/empresas — persist one submission.
///
/// Only presence of `session_id`, `nombre` and `correo` is checked; all
/// other fields pass through verbatim. Returns an acknowledgment, not the
/// created record.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NuevaEmpresa>,
) -> Result<(StatusCode, Json<Acknowledgment>), ApiError> {
    if !payload.is_complete() {
        return Err(ApiError::MissingFields);
    }

    if let Err(e) = state.db.insert_empresa(&payload).await {
        tracing::error!("Failed to insert empresa: {:#}", e);
        return Err(ApiError::Internal("Error interno del servidor"));
    }

    tracing::info!(
        "Empresa registrada: {} ({})",
        payload.nombre.as_deref().unwrap_or_default(),
        payload.tipo_empresa.as_deref().unwrap_or("sin tipo")
    );

    Ok((
        StatusCode::CREATED,
        Json(Acknowledgment::ok("Empresa guardada correctamente")),
    ))
}
