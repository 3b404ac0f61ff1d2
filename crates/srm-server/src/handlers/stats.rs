//! Aggregate statistics handler

use crate::error::ApiError;
use crate::storage::db::GroupColumn;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use srm_types::StatsResponse;

const RECENT_LIMIT: i64 = 5;

/// GET /api/stats — total count, grouped distributions and the five most
/// recent records.
///
/// Each part is one independent statement; under concurrent writes the parts
/// may reflect slightly different instants. Accepted tradeoff, not a bug.
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let result = async {
        let total_empresas = state.db.count_empresas().await?;
        let tipos = state.db.grouped_counts(GroupColumn::TipoEmpresa).await?;
        let herramientas = state.db.grouped_counts(GroupColumn::Herramientas).await?;
        let areas = state.db.grouped_counts(GroupColumn::AreaCritica).await?;
        let recientes = state.db.recent_empresas(RECENT_LIMIT).await?;

        Ok::<_, anyhow::Error>(StatsResponse {
            success: true,
            total_empresas,
            tipos,
            herramientas,
            areas,
            recientes,
        })
    }
    .await;

    match result {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            tracing::error!("Failed to build stats: {:#}", e);
            Err(ApiError::Internal("Error al generar estadísticas"))
        }
    }
}
