// Estructuras de datos principales del sistema de proyección académica

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;

/// Orden de notas: etiqueta -> rango ordinal. Etiquetas desconocidas valen 0.
pub type OrdenNotas = HashMap<String, i64>;

/// Tabla de alias completa, indexada por código interno numérico.
/// El `BTreeMap` fija el orden de recorrido (ascendente por código interno),
/// que es el orden de desempate en la canonicalización.
pub type TablaAlias = BTreeMap<u32, AliasEntry>;

/// Entrada de la tabla de alias. Todos los códigos alcanzables desde una
/// entrada (en cualquier malla, separados por '/') son equivalentes entre sí
/// para efectos de avance curricular.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Nombre visible del ramo
    #[serde(default)]
    pub course_names: Option<String>,
    /// Mapa malla -> código de ramo. Incluye la clave especial "default",
    /// usada cuando la malla no define un código propio.
    #[serde(flatten)]
    pub codigos: BTreeMap<String, String>,
}

impl AliasEntry {
    /// Código específico de la malla, si existe y no está vacío.
    pub fn codigo_para(&self, malla_id: &str) -> Option<&str> {
        self.codigos
            .get(malla_id)
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }

    /// Código "default" de la entrada, si existe y no está vacío.
    pub fn codigo_default(&self) -> Option<&str> {
        self.codigos
            .get("default")
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }
}

/// Ítem de la lista `courses` de una malla: un ramo core (`course`) o un
/// grupo de elección (`choice`). `semester`, `pre` y `pg` aplican al ítem
/// completo en ambos casos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemMalla {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<GrupoEleccion>,
    pub semester: i64,
    #[serde(default)]
    pub pre: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pg: Option<String>,
}

/// Grupo de elección: aprobar cualquiera de las opciones satisface el
/// placeholder del grupo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrupoEleccion {
    pub placeholder: String,
    #[serde(default)]
    pub courses: Vec<RefRamo>,
}

/// Referencia a un ramo dentro de un grupo o de un pool de electivos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefRamo {
    pub course: String,
    #[serde(default)]
    pub pre: Vec<String>,
}

/// Cupo de electivo declarado en un semestre concreto de la malla.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotElectivo {
    pub placeholder: String,
    pub semester: i64,
}

/// Bloque de electivos de especialidad: pool de ramos + cupos por semestre.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloqueElectivosMajor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pg: Option<String>,
    #[serde(default)]
    pub courses: Vec<RefRamo>,
    #[serde(default)]
    pub slots: Vec<SlotElectivo>,
}

/// Bloque de electivos libres: sólo cupos por semestre.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloqueElectivosLibres {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pg: Option<String>,
    #[serde(default)]
    pub slots: Vec<SlotElectivo>,
}

/// Malla curricular completa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Malla {
    pub curriculum_name: String,
    #[serde(default)]
    pub courses: Vec<ItemMalla>,
    #[serde(default)]
    pub major_electives: BloqueElectivosMajor,
    #[serde(default)]
    pub free_electives: BloqueElectivosLibres,
}

impl Malla {
    /// Ramos core indexados por código.
    pub fn mapa_core(&self) -> HashMap<&str, &ItemMalla> {
        self.courses
            .iter()
            .filter_map(|item| item.course.as_deref().map(|c| (c, item)))
            .collect()
    }

    /// Grupos de elección indexados por placeholder.
    pub fn mapa_elecciones(&self) -> HashMap<&str, &ItemMalla> {
        self.courses
            .iter()
            .filter_map(|item| {
                item.choice
                    .as_ref()
                    .map(|grupo| (grupo.placeholder.as_str(), item))
            })
            .collect()
    }
}

/// Detalle de un ramo cursado en el historial del estudiante. Las columnas
/// `year`/`semester`/`internal_course_id` vienen del importador de registros
/// y se conservan tal cual; el núcleo sólo usa `grade`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetalleCursado {
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_course_id: Option<serde_json::Value>,
}

/// Registro de un estudiante: malla asignada + ramos cursados con nota.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistroEstudiante {
    #[serde(default)]
    pub curriculum: String,
    #[serde(default)]
    pub courses: BTreeMap<String, DetalleCursado>,
}

/// Configuración de calendario institucional. `current_semester` acepta
/// número o string numérico (los archivos históricos traen ambos).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCalendario {
    pub current_year: String,
    pub current_semester: serde_json::Value,
    #[serde(rename = "GRADE_ORDER", default)]
    pub grade_order: OrdenNotas,
}

/// Punto de partida de la simulación, derivado de `ConfigCalendario`.
#[derive(Debug, Clone, Copy)]
pub struct PeriodoActual {
    pub anio: i64,
    pub semestre: i64,
}

impl ConfigCalendario {
    /// Primer año del período académico actual ("2023-2024" -> 2023).
    pub fn anio_actual(&self) -> Result<i64, Box<dyn Error>> {
        let primero = self.current_year.split('-').next().unwrap_or("").trim();
        primero
            .parse::<i64>()
            .map_err(|_| format!("current_year inválido: '{}'", self.current_year).into())
    }

    /// Número de semestre actual (1, 2 o 3).
    pub fn semestre_actual(&self) -> Result<i64, Box<dyn Error>> {
        match &self.current_semester {
            serde_json::Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| format!("current_semester inválido: {}", n).into()),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("current_semester inválido: '{}'", s).into()),
            otro => Err(format!("current_semester inválido: {}", otro).into()),
        }
    }

    pub fn periodo_actual(&self) -> Result<PeriodoActual, Box<dyn Error>> {
        Ok(PeriodoActual {
            anio: self.anio_actual()?,
            semestre: self.semestre_actual()?,
        })
    }
}

/// Detalle de un ramo en la salida: objeto rico si el código aparece en la
/// tabla de alias, o el código crudo tal cual (placeholders, ramos fuera de
/// alias, marcador de electivo libre).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetalleRamo {
    Conocido {
        name: String,
        internal_code: u32,
        course_id: String,
    },
    Codigo(String),
}

impl DetalleRamo {
    /// Identificador con el que el ramo entra al conjunto de aprobados de la
    /// simulación.
    pub fn course_id(&self) -> &str {
        match self {
            DetalleRamo::Conocido { course_id, .. } => course_id,
            DetalleRamo::Codigo(codigo) => codigo,
        }
    }
}

/// Ítem agendado en un semestre proyectado: un ramo/placeholder concreto o un
/// cupo de electivo con su lista de opciones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemProyectado {
    Ramo(DetalleRamo),
    Opciones(BTreeMap<String, Vec<DetalleRamo>>),
}

/// Un semestre con al menos un ítem agendado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemestreProyectado {
    pub academic_year: String,
    pub semester: String,
    pub courses: Vec<ItemProyectado>,
}

/// Resultado final por estudiante. Las claves van en inglés: es el formato
/// que consumen los clientes existentes del servicio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultadoEstudiante {
    pub passed_courses: Vec<String>,
    pub failed_courses_to_retake: Vec<String>,
    pub pending_core_courses: Vec<String>,
    pub pending_choice_placeholders: Vec<String>,
    pub pending_major_electives: i64,
    pub pending_free_electives: i64,
    pub forecast: Vec<SemestreProyectado>,
}

/// Salida por estudiante: resultado completo o error estructurado (malla no
/// cargada). El error por estudiante no aborta el batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SalidaEstudiante {
    Resultado(ResultadoEstudiante),
    Error { error: String },
}
