//! SQLite database layer (embedded, no external dependencies)

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use srm_types::{CategoryCount, Empresa, EmpresaReciente, NuevaEmpresa};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Label used for records whose grouped column is NULL or empty.
pub const SIN_ESPECIFICAR: &str = "No especifica";

/// Columns the statistics endpoint groups by. Closed set so the column name
/// never comes from caller input.
#[derive(Debug, Clone, Copy)]
pub enum GroupColumn {
    TipoEmpresa,
    Herramientas,
    AreaCritica,
}

impl GroupColumn {
    fn as_sql(self) -> &'static str {
        match self {
            GroupColumn::TipoEmpresa => "tipo_empresa",
            GroupColumn::Herramientas => "herramientas",
            GroupColumn::AreaCritica => "area_critica",
        }
    }
}

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// Open the pool and run the idempotent migration.
    ///
    /// Accepts a sqlx SQLite connection string (`sqlite://path/to.db` or
    /// `sqlite::memory:`), creating the file if missing.
    pub async fn new(database_url: &str) -> Result<Self> {
        tracing::info!("Connecting to SQLite: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid DATABASE_URL: {database_url}"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {database_url}"))?;

        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&pool)
            .await
            .context("Connection probe failed")?;
        tracing::info!("SQLite {} connection established, running migrations...", version);

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database initialization complete");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS empresas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT,
                nombre TEXT,
                correo TEXT,
                whatsapp TEXT,
                tipo_empresa TEXT,
                herramientas TEXT,
                meta_6m TEXT,
                area_critica TEXT,
                empleados TEXT,
                fecha DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// All records, most recent first. `id` breaks ties within the same
    /// second.
    pub async fn list_empresas(&self) -> Result<Vec<Empresa>> {
        let rows: Vec<EmpresaRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, nombre, correo, whatsapp, tipo_empresa,
                   herramientas, meta_6m, area_critica, empleados, fecha
            FROM empresas
            ORDER BY fecha DESC, id DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Insert a validated record. Optional fields are stored verbatim,
    /// empty strings included.
    pub async fn insert_empresa(&self, empresa: &NuevaEmpresa) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO empresas (session_id, nombre, correo, whatsapp, tipo_empresa,
                                  herramientas, meta_6m, area_critica, empleados)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&empresa.session_id)
        .bind(&empresa.nombre)
        .bind(&empresa.correo)
        .bind(&empresa.whatsapp)
        .bind(&empresa.tipo_empresa)
        .bind(&empresa.herramientas)
        .bind(&empresa.meta_6m)
        .bind(&empresa.area_critica)
        .bind(&empresa.empleados)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Delete every record and reset the identity counter, so the next
    /// insert gets id 1 again. This is the only delete path.
    pub async fn clear_empresas(&self) -> Result<()> {
        sqlx::query("DELETE FROM empresas")
            .execute(&*self.pool)
            .await?;

        // sqlite_sequence exists because the table uses AUTOINCREMENT
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'empresas'")
            .execute(&*self.pool)
            .await?;

        Ok(())
    }

    pub async fn count_empresas(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM empresas")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }

    /// Record counts grouped by one free-text column, descending by count.
    /// NULL and empty values collapse into the sentinel bucket.
    pub async fn grouped_counts(&self, column: GroupColumn) -> Result<Vec<CategoryCount>> {
        let sql = format!(
            r#"
            SELECT COALESCE(NULLIF({col}, ''), '{sentinel}') AS label, COUNT(*) AS n
            FROM empresas
            GROUP BY label
            ORDER BY n DESC
            "#,
            col = column.as_sql(),
            sentinel = SIN_ESPECIFICAR,
        );

        let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(&*self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(label, count)| CategoryCount { label, count })
            .collect())
    }

    /// The five most recently created records, reduced to name, type and
    /// timestamp.
    pub async fn recent_empresas(&self, limit: i64) -> Result<Vec<EmpresaReciente>> {
        let rows: Vec<(String, Option<String>, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            r#"
            SELECT nombre, tipo_empresa, fecha
            FROM empresas
            ORDER BY fecha DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(nombre, tipo_empresa, fecha)| EmpresaReciente {
                nombre,
                tipo_empresa,
                fecha,
            })
            .collect())
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct EmpresaRow {
    id: i64,
    session_id: String,
    nombre: String,
    correo: String,
    whatsapp: Option<String>,
    tipo_empresa: Option<String>,
    herramientas: Option<String>,
    meta_6m: Option<String>,
    area_critica: Option<String>,
    empleados: Option<String>,
    fecha: chrono::DateTime<chrono::Utc>,
}

impl From<EmpresaRow> for Empresa {
    fn from(r: EmpresaRow) -> Self {
        Empresa {
            id: r.id,
            session_id: r.session_id,
            nombre: r.nombre,
            correo: r.correo,
            whatsapp: r.whatsapp,
            tipo_empresa: r.tipo_empresa,
            herramientas: r.herramientas,
            meta_6m: r.meta_6m,
            area_critica: r.area_critica,
            empleados: r.empleados,
            fecha: r.fecha,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fresh on-disk database per test. `sqlite::memory:` gives every pooled
    /// connection its own store, so a file is the safer fixture.
    pub(crate) async fn test_db() -> Database {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let path = std::env::temp_dir().join(format!(
            "srm-test-{}-{}.db",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_file(&path);
        Database::new(&format!("sqlite://{}", path.display()))
            .await
            .unwrap()
    }

    pub(crate) fn empresa(nombre: &str, tipo: Option<&str>) -> NuevaEmpresa {
        NuevaEmpresa {
            session_id: Some("s1".to_string()),
            nombre: Some(nombre.to_string()),
            correo: Some(format!("{}@x.com", nombre.to_lowercase())),
            tipo_empresa: tipo.map(|t| t.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_most_recent_first() {
        let db = test_db().await;

        db.insert_empresa(&empresa("Alpha", None)).await.unwrap();
        db.insert_empresa(&empresa("Beta", None)).await.unwrap();

        let all = db.list_empresas().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].nombre, "Beta");
        assert_eq!(all[1].nombre, "Alpha");
        assert!(all[0].id > all[1].id);
    }

    #[tokio::test]
    async fn test_optional_fields_stored_verbatim() {
        let db = test_db().await;

        let mut payload = empresa("Acme", Some("retail"));
        payload.empleados = Some(String::new());
        db.insert_empresa(&payload).await.unwrap();

        let all = db.list_empresas().await.unwrap();
        assert_eq!(all[0].tipo_empresa.as_deref(), Some("retail"));
        assert_eq!(all[0].empleados.as_deref(), Some(""));
        assert_eq!(all[0].whatsapp, None);
    }

    #[tokio::test]
    async fn test_clear_resets_identity() {
        let db = test_db().await;

        db.insert_empresa(&empresa("Alpha", None)).await.unwrap();
        db.insert_empresa(&empresa("Beta", None)).await.unwrap();

        db.clear_empresas().await.unwrap();
        assert_eq!(db.count_empresas().await.unwrap(), 0);

        db.insert_empresa(&empresa("Gamma", None)).await.unwrap();
        let all = db.list_empresas().await.unwrap();
        assert_eq!(all[0].id, 1);
    }

    #[tokio::test]
    async fn test_grouped_counts_sentinel_bucket() {
        let db = test_db().await;

        db.insert_empresa(&empresa("A", Some("retail"))).await.unwrap();
        db.insert_empresa(&empresa("B", Some("retail"))).await.unwrap();
        db.insert_empresa(&empresa("C", Some(""))).await.unwrap();
        db.insert_empresa(&empresa("D", None)).await.unwrap();

        let tipos = db.grouped_counts(GroupColumn::TipoEmpresa).await.unwrap();
        assert_eq!(tipos.len(), 2);
        assert_eq!(tipos[0].label, "retail");
        assert_eq!(tipos[0].count, 2);
        assert_eq!(tipos[1].label, SIN_ESPECIFICAR);
        assert_eq!(tipos[1].count, 2);

        let total: i64 = tipos.iter().map(|b| b.count).sum();
        assert_eq!(total, db.count_empresas().await.unwrap());
    }

    #[tokio::test]
    async fn test_recent_capped_and_ordered() {
        let db = test_db().await;

        for i in 0..7 {
            db.insert_empresa(&empresa(&format!("E{i}"), None))
                .await
                .unwrap();
        }

        let recientes = db.recent_empresas(5).await.unwrap();
        assert_eq!(recientes.len(), 5);
        assert_eq!(recientes[0].nombre, "E6");
        assert_eq!(recientes[4].nombre, "E2");
    }
}
