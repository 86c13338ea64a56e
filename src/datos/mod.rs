//! Carga de la configuración JSON del sistema.
//!
//! Archivos esperados (relativos al directorio de configuración):
//! - `config.json`: calendario institucional + `GRADE_ORDER`
//! - `aliases.json`: tabla de alias (código interno -> códigos por malla)
//! - `1s.json`, `2s.json`, `ss.json`: ofertas por tipo de semestre
//! - `curricula/*.json`: una malla por archivo (id = nombre sin extensión)
//!
//! Los estudiantes viven aparte, en `<data>/students.json`.

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::models::{ConfigCalendario, Malla, RegistroEstudiante, TablaAlias};

/// Directorio por defecto con la configuración (relativo al repo)
pub const CONFIG_DIR: &str = "config";

/// Directorio por defecto con datos mutables (students.json)
pub const DATA_DIR: &str = "data";

/// Resuelve el directorio de configuración: variable de entorno si existe,
/// si no el directorio por defecto.
pub fn get_config_dir() -> PathBuf {
    if let Ok(ruta) = std::env::var("PROYECCION_CONFIG_DIR") {
        let p = PathBuf::from(ruta);
        if p.exists() {
            return p;
        }
        eprintln!("WARN: PROYECCION_CONFIG_DIR no existe: {:?}", p);
    }
    PathBuf::from(CONFIG_DIR)
}

/// Resuelve el directorio de datos mutables.
pub fn get_data_dir() -> PathBuf {
    if let Ok(ruta) = std::env::var("PROYECCION_DATA_DIR") {
        return PathBuf::from(ruta);
    }
    PathBuf::from(DATA_DIR)
}

/// Lee y parsea un archivo JSON tipado. Falla con mensaje si el archivo no
/// existe o no decodifica; el llamador decide si el error es fatal.
pub fn leer_json<T: DeserializeOwned>(ruta: &Path) -> Result<T, Box<dyn Error>> {
    if !ruta.exists() {
        return Err(format!("archivo no encontrado: {}", ruta.display()).into());
    }
    let contenido = fs::read_to_string(ruta)?;
    serde_json::from_str(&contenido)
        .map_err(|e| format!("no se pudo decodificar JSON de {}: {}", ruta.display(), e).into())
}

/// Configuración completa del sistema, cargada una sola vez por proceso y
/// compartida de sólo lectura con todos los componentes.
#[derive(Debug, Clone)]
pub struct DatosSistema {
    pub calendario: ConfigCalendario,
    pub aliases: TablaAlias,
    pub oferta_1: Vec<u32>,
    pub oferta_2: Vec<u32>,
    pub oferta_s: Vec<u32>,
    pub mallas: HashMap<String, Malla>,
    pub estudiantes: BTreeMap<String, RegistroEstudiante>,
}

/// Carga todas las mallas de un directorio. El id de cada malla es el nombre
/// del archivo sin `.json`.
pub fn cargar_mallas(dir: &Path) -> Result<HashMap<String, Malla>, Box<dyn Error>> {
    let mut mallas = HashMap::new();
    if !dir.exists() {
        return Ok(mallas);
    }
    let mut entradas: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    entradas.sort();
    for ruta in entradas {
        let id = match ruta.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        match leer_json::<Malla>(&ruta) {
            Ok(malla) => {
                mallas.insert(id, malla);
            }
            Err(e) => {
                // una malla corrupta no impide cargar las demás
                eprintln!("WARN: malla '{}' descartada: {}", id, e);
            }
        }
    }
    Ok(mallas)
}

/// Carga la configuración completa. Cualquier colección requerida ausente o
/// corrupta devuelve error; el arranque del servidor lo trata como fatal.
pub fn cargar_datos(config_dir: &Path, data_dir: &Path) -> Result<DatosSistema, Box<dyn Error>> {
    let calendario: ConfigCalendario = leer_json(&config_dir.join("config.json"))?;
    let aliases: TablaAlias = leer_json(&config_dir.join("aliases.json"))?;
    let oferta_1: Vec<u32> = leer_json(&config_dir.join("1s.json"))?;
    let oferta_2: Vec<u32> = leer_json(&config_dir.join("2s.json"))?;
    let oferta_s: Vec<u32> = leer_json(&config_dir.join("ss.json"))?;
    let mallas = cargar_mallas(&config_dir.join("curricula"))?;
    let estudiantes: BTreeMap<String, RegistroEstudiante> =
        leer_json(&data_dir.join("students.json"))?;

    // el calendario debe ser interpretable antes de aceptar peticiones
    calendario.periodo_actual()?;

    println!(
        "[datos] configuración cargada: {} alias, ofertas {}/{}/{}, {} mallas, {} estudiantes",
        aliases.len(),
        oferta_1.len(),
        oferta_2.len(),
        oferta_s.len(),
        mallas.len(),
        estudiantes.len()
    );

    Ok(DatosSistema {
        calendario,
        aliases,
        oferta_1,
        oferta_2,
        oferta_s,
        mallas,
        estudiantes,
    })
}

/// Variante con los directorios por defecto (o sus overrides de entorno).
pub fn cargar_datos_default() -> Result<DatosSistema, Box<dyn Error>> {
    cargar_datos(&get_config_dir(), &get_data_dir())
}
