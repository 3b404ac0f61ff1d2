//! Aggregate statistics types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bucket of a grouped count. Records with a NULL or empty value for the
/// grouped column land in the "No especifica" bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: i64,
}

/// Reduced view of a recent record, for the audit trail in the stats body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmpresaReciente {
    pub nombre: String,
    pub tipo_empresa: Option<String>,
    pub fecha: DateTime<Utc>,
}

/// Full statistics response.
///
/// Assembled from independent statements; under concurrent writes the parts
/// may reflect slightly different instants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub total_empresas: i64,
    pub tipos: Vec<CategoryCount>,
    pub herramientas: Vec<CategoryCount>,
    pub areas: Vec<CategoryCount>,
    pub recientes: Vec<EmpresaReciente>,
}
