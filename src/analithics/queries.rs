use rusqlite::Connection;
use std::error::Error;

use crate::analithics::db::analytics_db_path;

/// Return a JSON array with the most requested curricula across all recorded
/// queries.
pub fn mallas_mas_solicitadas(limit: Option<usize>) -> Result<serde_json::Value, Box<dyn Error>> {
    use std::collections::HashMap;
    let conn = Connection::open(analytics_db_path())?;
    let mut stmt =
        conn.prepare("SELECT curriculum FROM queries WHERE curriculum IS NOT NULL")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for r in rows.flatten() {
        *counts.entry(r).or_default() += 1;
    }
    let mut v: Vec<(String, usize)> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let lim = limit.unwrap_or(20);
    let arr: Vec<serde_json::Value> = v
        .into_iter()
        .take(lim)
        .map(|(m, c)| serde_json::json!({"curriculum": m, "count": c}))
        .collect();
    let result = serde_json::Value::Array(arr);
    let params = serde_json::json!({"limit": limit});
    let _ = crate::analithics::save_report("mallas_mas_solicitadas", &params.to_string(), &result.to_string());
    Ok(result)
}

/// Count the distinct students that have requested a forecast.
pub fn count_students() -> Result<serde_json::Value, Box<dyn Error>> {
    let conn = Connection::open(analytics_db_path())?;
    let mut stmt =
        conn.prepare("SELECT DISTINCT student_id FROM queries WHERE student_id IS NOT NULL")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut cnt: usize = 0;
    for _ in rows {
        cnt += 1;
    }
    let result = serde_json::json!({"count_students": cnt});
    let _ = crate::analithics::save_report("count_students", "{}", &result.to_string());
    Ok(result)
}

/// Average duration of logged forecast requests, in milliseconds.
pub fn promedio_duracion_ms() -> Result<serde_json::Value, Box<dyn Error>> {
    let conn = Connection::open(analytics_db_path())?;
    let mut stmt =
        conn.prepare("SELECT duration_ms FROM queries WHERE duration_ms IS NOT NULL")?;
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
    let mut total: i64 = 0;
    let mut cnt: i64 = 0;
    for r in rows.flatten() {
        total += r;
        cnt += 1;
    }
    let promedio = if cnt > 0 { total as f64 / cnt as f64 } else { 0.0 };
    let result = serde_json::json!({"promedio_duracion_ms": promedio, "muestras": cnt});
    let _ = crate::analithics::save_report("promedio_duracion_ms", "{}", &result.to_string());
    Ok(result)
}
