use rusqlite::Connection;
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

// load .env at module init if present
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Return the path to the analytics DB. Exposed so other submodules can open
/// short-lived connections. Honors PROYECCION_DB_PATH / PROYECCION_DB_URL env.
pub fn analytics_db_path() -> PathBuf {
    load_dotenv();
    if let Ok(p) = env::var("PROYECCION_DB_PATH") {
        PathBuf::from(p)
    } else if let Ok(p) = env::var("PROYECCION_DB_URL") {
        if p.starts_with("sqlite://") {
            PathBuf::from(p.trim_start_matches("sqlite://"))
        } else if p.starts_with("file://") {
            PathBuf::from(p.trim_start_matches("file://"))
        } else {
            // URL remota no soportada: se usa la ruta local por defecto
            PathBuf::from("analithics/analytics.db")
        }
    } else {
        PathBuf::from("analithics/analytics.db")
    }
}

/// Initialize the analytics DB (create dir + sqlite file + tables)
pub fn init_db() -> Result<(), Box<dyn Error>> {
    load_dotenv();
    let db_path = analytics_db_path();
    if let Some(dir) = db_path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let conn = Connection::open(db_path)?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS queries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            duration_ms INTEGER,
            student_id TEXT,
            curriculum TEXT,
            courses_count INTEGER,
            request_json TEXT,
            response_json TEXT,
            client_ip TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            query_type TEXT NOT NULL,
            params_json TEXT,
            result_json TEXT
        )",
        [],
    )?;
    Ok(())
}
