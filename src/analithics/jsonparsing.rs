use serde_json::Value as JsonValue;
use std::error::Error;

use crate::api_json::ParametrosProyeccion;

/// ParsedFields represents the subset of fields we persist from a request.
pub struct ParsedFields {
    pub student_id: Option<String>,
    pub curriculum: Option<String>,
    pub courses_count: Option<i64>,
}

/// Try to parse `request_json` as `ParametrosProyeccion` and extract a few
/// fields. Falls back to heuristic JSON extraction if parsing fails.
pub fn extract_parsed_fields(request_json: &str) -> Result<ParsedFields, Box<dyn Error>> {
    let mut pf = ParsedFields {
        student_id: None,
        curriculum: None,
        courses_count: None,
    };

    if let Ok(parsed) = serde_json::from_str::<ParametrosProyeccion>(request_json) {
        if !parsed.student_id.is_empty() {
            pf.student_id = Some(parsed.student_id);
        }
        pf.curriculum = Some(parsed.curriculum);
        pf.courses_count = Some(parsed.courses.len() as i64);
        return Ok(pf);
    }

    // fallback: heuristic extraction
    if let Ok(v) = serde_json::from_str::<JsonValue>(request_json) {
        if let Some(s) = v.get("student_id").and_then(|x| x.as_str()) {
            pf.student_id = Some(s.to_string());
        }
        if let Some(c) = v.get("curriculum").and_then(|x| x.as_str()) {
            pf.curriculum = Some(c.to_string());
        }
        if let Some(cursos) = v.get("courses").and_then(|x| x.as_object()) {
            pf.courses_count = Some(cursos.len() as i64);
        }
    }
    Ok(pf)
}
