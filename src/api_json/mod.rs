use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DetalleCursado, RegistroEstudiante, TablaAlias};

/// Parámetros de entrada para una proyección individual
///
/// # Estructura del JSON esperado:
/// ```json
/// {
///   "student_id": "2021-0042",
///   "curriculum": "BScIT2020",
///   "courses": {
///     "CS101": { "grade": "B" },
///     "MA101": { "grade": "D" }
///   }
/// }
/// ```
///
/// # Campos:
/// - `student_id`: identificador del estudiante (opcional para `/proyeccion`,
///   requerido para guardar en `/students`)
/// - `curriculum`: id de la malla asignada (nombre de archivo sin `.json`)
/// - `courses`: historial de ramos cursados con su nota
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametrosProyeccion {
    #[serde(default)]
    pub student_id: String,
    pub curriculum: String,
    #[serde(default)]
    pub courses: BTreeMap<String, DetalleCursado>,
}

impl From<ParametrosProyeccion> for RegistroEstudiante {
    fn from(params: ParametrosProyeccion) -> Self {
        RegistroEstudiante {
            curriculum: params.curriculum,
            courses: params.courses,
        }
    }
}

pub fn parse_json_input(json_str: &str) -> Result<ParametrosProyeccion, serde_json::Error> {
    serde_json::from_str::<ParametrosProyeccion>(json_str)
}

/// Registro plano tal como lo exporta el sistema de matrícula: una fila por
/// inscripción, sin agrupar por estudiante.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistroPlano {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub curriculum: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub semester: Option<serde_json::Value>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub internal_course_id: Option<serde_json::Value>,
}

fn campo_presente(campo: Option<&str>) -> Option<&str> {
    campo.filter(|s| !s.trim().is_empty())
}

/// Reagrupa una lista plana de inscripciones en el mapa estudiante -> ramos
/// que consume el resto del sistema. Los registros sin `student_id`,
/// `curriculum` o `course_id` se descartan con aviso; el primer registro de
/// cada estudiante fija su malla.
pub fn reestructurar_registros(planos: &[RegistroPlano]) -> BTreeMap<String, RegistroEstudiante> {
    let mut resultado: BTreeMap<String, RegistroEstudiante> = BTreeMap::new();

    for registro in planos {
        let sid = campo_presente(registro.student_id.as_deref());
        let curriculum = campo_presente(registro.curriculum.as_deref());
        let course_id = campo_presente(registro.course_id.as_deref());
        let (Some(sid), Some(curriculum), Some(course_id)) = (sid, curriculum, course_id) else {
            eprintln!("WARN: registro de inscripción incompleto descartado: {:?}", registro);
            continue;
        };

        let entrada = resultado
            .entry(sid.to_string())
            .or_insert_with(RegistroEstudiante::default);
        if entrada.curriculum.is_empty() {
            entrada.curriculum = curriculum.to_string();
        }
        entrada.courses.insert(
            course_id.to_string(),
            DetalleCursado {
                grade: registro.grade.clone(),
                year: registro.year.clone(),
                semester: registro.semester.clone(),
                internal_course_id: registro.internal_course_id.clone(),
            },
        );
    }

    resultado
}

/// Normalización para comparar nombres visibles de ramos: sólo alfanuméricos
/// y espacios, minúsculas, espacios colapsados.
pub fn normalize_name(nombre: &str) -> String {
    nombre
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Umbral de similitud para el desempate difuso de nombres.
const UMBRAL_SIMILITUD: f64 = 0.90;

/// heurística: los códigos de ramo siempre llevan dígitos
pub fn parece_codigo(valor: &str) -> bool {
    valor.chars().any(|c| c.is_ascii_digit())
}

/// Resuelve un nombre visible de ramo al código que usa `malla_id` (o el
/// default de la entrada): primero igualdad normalizada, luego similitud
/// Jaro-Winkler sobre el umbral. Devuelve el primer código de la entrada
/// ganadora.
pub fn codigo_desde_nombre(nombre: &str, malla_id: &str, aliases: &TablaAlias) -> Option<String> {
    let objetivo = normalize_name(nombre);
    if objetivo.is_empty() {
        return None;
    }

    let mut mejor: Option<(f64, String)> = None;
    for entrada in aliases.values() {
        let Some(nombre_alias) = entrada.course_names.as_deref() else {
            continue;
        };
        let codigo = entrada
            .codigo_para(malla_id)
            .or_else(|| entrada.codigo_default());
        let Some(codigo) = codigo else { continue };
        let candidato = codigo.split('/').next().unwrap_or(codigo).to_string();

        let normalizado = normalize_name(nombre_alias);
        if normalizado == objetivo {
            return Some(candidato);
        }
        let similitud = strsim::jaro_winkler(&normalizado, &objetivo);
        if similitud >= UMBRAL_SIMILITUD
            && mejor.as_ref().map(|(m, _)| similitud > *m).unwrap_or(true)
        {
            mejor = Some((similitud, candidato));
        }
    }
    mejor.map(|(_, codigo)| codigo)
}

/// Reemplaza en los registros planos los `course_id` que no parecen códigos
/// (nombres completos tipeados a mano) por el código resuelto contra la tabla
/// de alias. Lo que no se puede resolver queda como estaba.
pub fn resolver_nombres_en_registros(
    planos: Vec<RegistroPlano>,
    aliases: &TablaAlias,
) -> Vec<RegistroPlano> {
    resolver_nombres_with_resolver(planos, |malla_id, nombre| {
        codigo_desde_nombre(nombre, malla_id, aliases)
    })
}

/// Versión parametrizable para pruebas: recibe el resolutor
/// `(malla_id, nombre) -> código` como función, lo que permite mockear sin
/// construir una tabla de alias completa.
pub fn resolver_nombres_with_resolver<F>(planos: Vec<RegistroPlano>, resolver: F) -> Vec<RegistroPlano>
where
    F: Fn(&str, &str) -> Option<String>,
{
    planos
        .into_iter()
        .map(|mut registro| {
            let malla = registro.curriculum.clone().unwrap_or_default();
            if let Some(course_id) = registro.course_id.as_deref() {
                if !course_id.trim().is_empty() && !parece_codigo(course_id) {
                    if let Some(codigo) = resolver(&malla, course_id) {
                        registro.course_id = Some(codigo);
                    }
                }
            }
            registro
        })
        .collect()
}
