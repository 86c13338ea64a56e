//! Evaluación del avance curricular de un estudiante contra su malla.
//!
//! Cada ramo cursado se canonicaliza y se clasifica en exactamente una
//! categoría, en orden estricto de prioridad: core, electivo de especialidad,
//! grupo de elección, electivo libre. En paralelo se acumula el conjunto de
//! códigos internos aprobados, que alimenta la deduplicación entre mallas.

use std::collections::{BTreeMap, HashSet};

use crate::models::{DetalleCursado, Malla, OrdenNotas};
use crate::resolver::ResolverRamos;

/// Nota mínima de aprobación cuando la malla no declara una.
pub const NOTA_APROBACION_BASE: &str = "D";

/// ¿La nota alcanza el umbral según el orden configurado? Notas desconocidas
/// (o ausentes) valen 0.
pub fn nota_aprueba(nota: Option<&str>, nota_minima: &str, orden: &OrdenNotas) -> bool {
    let rango = nota.and_then(|n| orden.get(n)).copied().unwrap_or(0);
    let minimo = orden.get(nota_minima).copied().unwrap_or(0);
    rango >= minimo
}

/// Avance acumulado de un estudiante sobre una malla.
#[derive(Debug, Default, Clone)]
pub struct Avance {
    pub core_aprobados: HashSet<String>,
    pub core_reprobados: HashSet<String>,
    pub elecciones_aprobadas: HashSet<String>,
    pub major_aprobados: HashSet<String>,
    pub libres_aprobados: i64,
    /// Códigos internos con nota sobre el umbral base, independiente de la
    /// categoría en que cayó el ramo.
    pub internos_aprobados: HashSet<u32>,
}

/// Clasifica el historial completo de un estudiante.
pub fn evaluar_avance(
    cursados: &BTreeMap<String, DetalleCursado>,
    malla: &Malla,
    orden_notas: &OrdenNotas,
    resolver: &ResolverRamos,
) -> Avance {
    let malla_id = &malla.curriculum_name;
    let core = malla.mapa_core();
    let pool_major: HashSet<&str> = malla
        .major_electives
        .courses
        .iter()
        .map(|r| r.course.as_str())
        .collect();
    let pg_major = malla
        .major_electives
        .pg
        .as_deref()
        .unwrap_or(NOTA_APROBACION_BASE);
    let pg_libre = malla
        .free_electives
        .pg
        .as_deref()
        .unwrap_or(NOTA_APROBACION_BASE);

    let mut avance = Avance::default();

    for (codigo_cursado, detalle) in cursados {
        let nota = detalle.grade.as_deref();

        // la equivalencia entre mallas se registra sobre el código crudo,
        // contra el umbral base, caiga donde caiga el ramo
        if let Some(interno) = resolver.codigo_interno(codigo_cursado) {
            if nota_aprueba(nota, NOTA_APROBACION_BASE, orden_notas) {
                avance.internos_aprobados.insert(interno);
            }
        }

        let canonico = resolver.ramo_canonico(codigo_cursado, malla_id);

        // 1) core: aprueba o queda para repetir
        if let Some(item) = core.get(canonico.as_str()) {
            let pg = item.pg.as_deref().unwrap_or(NOTA_APROBACION_BASE);
            if nota_aprueba(nota, pg, orden_notas) {
                avance.core_aprobados.insert(canonico);
            } else {
                avance.core_reprobados.insert(canonico);
            }
            continue;
        }

        // 2) electivo de especialidad: sólo se registra la aprobación
        if pool_major.contains(canonico.as_str()) {
            if nota_aprueba(nota, pg_major, orden_notas) {
                avance.major_aprobados.insert(canonico);
            }
            continue;
        }

        // 3) grupo de elección: la pertenencia contabiliza el ramo aunque
        // repruebe, para que no caiga a electivo libre
        let mut contabilizado = false;
        for item in &malla.courses {
            let Some(grupo) = &item.choice else { continue };
            if grupo.courses.iter().any(|r| r.course == canonico) {
                let pg = item.pg.as_deref().unwrap_or(NOTA_APROBACION_BASE);
                if nota_aprueba(nota, pg, orden_notas) {
                    avance.elecciones_aprobadas.insert(grupo.placeholder.clone());
                }
                contabilizado = true;
                break;
            }
        }
        if contabilizado {
            continue;
        }

        // 4) electivo libre: cualquier aprobación no clasificada arriba
        if nota_aprueba(nota, pg_libre, orden_notas) {
            avance.libres_aprobados += 1;
        }
    }

    avance
}
