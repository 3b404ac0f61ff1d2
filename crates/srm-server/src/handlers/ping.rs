//! Liveness probe, used by external uptime monitors to keep the instance
//! warm.

pub async fn ping() -> &'static str {
    tracing::debug!("Ping recibido");
    "pong"
}
