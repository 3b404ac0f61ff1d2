//! Company record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted form submission.
///
/// `id` and `fecha` are server-assigned; everything else is stored exactly as
/// submitted, including empty strings in the optional fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Empresa {
    pub id: i64,
    pub session_id: String,
    pub nombre: String,
    pub correo: String,
    pub whatsapp: Option<String>,
    pub tipo_empresa: Option<String>,
    pub herramientas: Option<String>,
    pub meta_6m: Option<String>,
    pub area_critica: Option<String>,
    pub empleados: Option<String>,
    pub fecha: DateTime<Utc>,
}

/// Creation payload as received over the wire.
///
/// Every field is optional at the deserialization layer so that a missing
/// required field produces a 400 with the registry's own message instead of a
/// body-rejection error. Presence of `session_id`, `nombre` and `correo` is
/// enforced in the handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NuevaEmpresa {
    pub session_id: Option<String>,
    pub nombre: Option<String>,
    pub correo: Option<String>,
    pub whatsapp: Option<String>,
    pub tipo_empresa: Option<String>,
    pub herramientas: Option<String>,
    pub meta_6m: Option<String>,
    pub area_critica: Option<String>,
    pub empleados: Option<String>,
}

impl NuevaEmpresa {
    /// Required fields present and non-empty.
    pub fn is_complete(&self) -> bool {
        fn filled(v: &Option<String>) -> bool {
            v.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
        }
        filled(&self.session_id) && filled(&self.nombre) && filled(&self.correo)
    }
}
