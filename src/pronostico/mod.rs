//! Proyección de los semestres futuros de un estudiante.
//!
//! Simulación voraz de horizonte fijo: 6 años, 3 períodos por año (dos
//! semestres regulares + un semestre de verano). En cada período se agendan,
//! en orden de prioridad, repeticiones, ramos core declarados para ese
//! semestre, grupos de elección, cupos de electivo de especialidad y cupos de
//! electivo libre. Los requisitos que el horizonte no alcanza a ubicar quedan
//! reportados en los campos `pending_*`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::models::{
    DetalleRamo, ItemProyectado, Malla, OrdenNotas, PeriodoActual, RegistroEstudiante,
    ResultadoEstudiante, SalidaEstudiante, SemestreProyectado,
};
use crate::progreso::{Avance, evaluar_avance};
use crate::resolver::ResolverRamos;

/// Períodos por año académico: dos semestres regulares + verano.
pub const SEMESTRES_POR_ANIO: i64 = 3;

/// Años simulados hacia adelante.
pub const ANIOS_PROYECTADOS: i64 = 6;

/// Año ancla de la numeración absoluta de semestres de las mallas.
const ANIO_EPOCA: i64 = 2023;

/// Marcador de cupo de electivo libre en la proyección.
pub const MARCADOR_ELECTIVO_LIBRE: &str = "free-elective";

/// Proyección completa de un estudiante. Si la malla asignada no está cargada
/// se devuelve el error estructurado por estudiante; el batch continúa.
pub fn generar_proyeccion(
    estudiante: &RegistroEstudiante,
    mallas: &HashMap<String, Malla>,
    orden_notas: &OrdenNotas,
    resolver: &ResolverRamos,
    periodo: PeriodoActual,
) -> SalidaEstudiante {
    let malla_id = &estudiante.curriculum;
    let malla = match mallas.get(malla_id) {
        Some(m) if !malla_id.is_empty() => m,
        _ => {
            return SalidaEstudiante::Error {
                error: format!("Curriculum '{}' not found or not loaded.", malla_id),
            };
        }
    };

    let avance = evaluar_avance(&estudiante.courses, malla, orden_notas, resolver);
    let resultado = simular(malla, &avance, resolver, periodo);
    SalidaEstudiante::Resultado(resultado)
}

/// Proyección del batch completo. Cada estudiante es independiente; el orden
/// de iteración no afecta ningún resultado individual.
pub fn proyectar_todos(
    estudiantes: &BTreeMap<String, RegistroEstudiante>,
    mallas: &HashMap<String, Malla>,
    orden_notas: &OrdenNotas,
    resolver: &ResolverRamos,
    periodo: PeriodoActual,
) -> BTreeMap<String, SalidaEstudiante> {
    estudiantes
        .iter()
        .map(|(id, registro)| {
            (
                id.clone(),
                generar_proyeccion(registro, mallas, orden_notas, resolver, periodo),
            )
        })
        .collect()
}

fn simular(
    malla: &Malla,
    avance: &Avance,
    resolver: &ResolverRamos,
    periodo: PeriodoActual,
) -> ResultadoEstudiante {
    let nombre_malla = &malla.curriculum_name;
    let core = malla.mapa_core();
    let elecciones = malla.mapa_elecciones();

    // Pendientes iniciales. BTreeSet: el recorrido dentro de cada pasada debe
    // ser determinista (dos pendientes pueden compartir código interno).
    let mut core_pendientes: BTreeSet<String> = core
        .keys()
        .filter(|c| {
            !avance.core_aprobados.contains(**c) && !avance.core_reprobados.contains(**c)
        })
        .map(|c| c.to_string())
        .collect();
    let mut elecciones_pendientes: BTreeSet<String> = elecciones
        .keys()
        .filter(|p| !avance.elecciones_aprobadas.contains(**p))
        .map(|p| p.to_string())
        .collect();
    let mut repeticiones: BTreeSet<String> = avance.core_reprobados.iter().cloned().collect();

    let slots_major = &malla.major_electives.slots;
    let slots_libres = &malla.free_electives.slots;
    let mut slots_major_pendientes: i64 =
        slots_major.len() as i64 - avance.major_aprobados.len() as i64;
    let mut slots_libres_pendientes: i64 = slots_libres.len() as i64 - avance.libres_aprobados;

    // pool de electivos aún no aprobados, en el orden en que la malla los lista
    let pool_major: Vec<_> = malla
        .major_electives
        .courses
        .iter()
        .filter(|r| !avance.major_aprobados.contains(&r.course))
        .collect();

    // aprobados acumulados de la simulación: historial + lo agendado.
    // Los ramos concretos entran al cierre de cada período; los placeholders
    // de cupos entran al agendarse.
    let mut aprobados_sim: HashSet<String> = avance
        .core_aprobados
        .iter()
        .chain(avance.major_aprobados.iter())
        .chain(avance.elecciones_aprobadas.iter())
        .cloned()
        .collect();
    let mut internos_proyectados: HashSet<u32> = HashSet::new();

    let mut proyeccion: Vec<SemestreProyectado> = Vec::new();

    for i in 0..(SEMESTRES_POR_ANIO * ANIOS_PROYECTADOS) {
        let desplazamiento = periodo.semestre - 1 + i;
        let sem_del_anio = desplazamiento % SEMESTRES_POR_ANIO + 1;
        let anio_academico = periodo.anio + desplazamiento / SEMESTRES_POR_ANIO;
        let etiqueta_anio = format!("{}-{}", anio_academico, anio_academico + 1);
        let etiqueta_oferta = if sem_del_anio == SEMESTRES_POR_ANIO {
            "s".to_string()
        } else {
            sem_del_anio.to_string()
        };
        // numeración absoluta de la malla: dos semestres regulares por año;
        // el verano comparte número con el semestre regular que lo sigue
        let numero_semestre = (anio_academico - ANIO_EPOCA) * 2 + sem_del_anio;
        let oferta = resolver.oferta(&etiqueta_oferta, nombre_malla);

        let mut agendados: Vec<ItemProyectado> = Vec::new();

        let duplicado = |interno: Option<u32>, proyectados: &HashSet<u32>| -> bool {
            interno
                .map(|c| avance.internos_aprobados.contains(&c) || proyectados.contains(&c))
                .unwrap_or(false)
        };

        // 1) repeticiones: cualquier reprobado ofertado con requisitos al día
        let mut repeticiones_sig: BTreeSet<String> = BTreeSet::new();
        for ramo in &repeticiones {
            let interno = resolver.codigo_interno(ramo);
            let prereqs_ok = core
                .get(ramo.as_str())
                .map(|item| item.pre.iter().all(|p| aprobados_sim.contains(p)))
                .unwrap_or(true);
            if oferta.contains(ramo) && prereqs_ok && !duplicado(interno, &internos_proyectados) {
                agendados.push(ItemProyectado::Ramo(resolver.detalle_ramo(ramo)));
                if let Some(c) = interno {
                    internos_proyectados.insert(c);
                }
            } else {
                repeticiones_sig.insert(ramo.clone());
            }
        }
        repeticiones = repeticiones_sig;

        // 2) core declarado para este número de semestre
        let mut core_pendientes_sig: BTreeSet<String> = BTreeSet::new();
        for ramo in &core_pendientes {
            let mut agendado = false;
            if let Some(item) = core.get(ramo.as_str()) {
                let interno = resolver.codigo_interno(ramo);
                if item.semester == numero_semestre
                    && item.pre.iter().all(|p| aprobados_sim.contains(p))
                    && oferta.contains(ramo)
                    && !duplicado(interno, &internos_proyectados)
                {
                    agendados.push(ItemProyectado::Ramo(resolver.detalle_ramo(ramo)));
                    if let Some(c) = interno {
                        internos_proyectados.insert(c);
                    }
                    agendado = true;
                }
            }
            if !agendado {
                core_pendientes_sig.insert(ramo.clone());
            }
        }
        core_pendientes = core_pendientes_sig;

        // 3) grupos de elección: sin chequeo de oferta (la opción concreta se
        // decide después)
        let mut elecciones_sig: BTreeSet<String> = BTreeSet::new();
        for placeholder in &elecciones_pendientes {
            let mut agendado = false;
            if let Some(item) = elecciones.get(placeholder.as_str()) {
                if item.semester == numero_semestre
                    && item.pre.iter().all(|p| aprobados_sim.contains(p))
                {
                    agendados.push(ItemProyectado::Ramo(DetalleRamo::Codigo(
                        placeholder.clone(),
                    )));
                    agendado = true;
                }
            }
            if !agendado {
                elecciones_sig.insert(placeholder.clone());
            }
        }
        elecciones_pendientes = elecciones_sig;

        // 4) cupos de electivo de especialidad: un ítem multi-opción por cupo
        let mut opciones_usadas_periodo: HashSet<u32> = HashSet::new();
        for slot in slots_major.iter().filter(|s| s.semester == numero_semestre) {
            if slots_major_pendientes <= 0 {
                continue;
            }
            let mut opciones: Vec<DetalleRamo> = Vec::new();
            let mut internos_en_opciones: HashSet<u32> = HashSet::new();
            for referencia in &pool_major {
                let interno = resolver.codigo_interno(&referencia.course);
                let repetido = duplicado(interno, &internos_proyectados)
                    || interno
                        .map(|c| {
                            internos_en_opciones.contains(&c)
                                || opciones_usadas_periodo.contains(&c)
                        })
                        .unwrap_or(false);
                if referencia.pre.iter().all(|p| aprobados_sim.contains(p))
                    && oferta.contains(&referencia.course)
                    && !repetido
                {
                    opciones.push(resolver.detalle_ramo(&referencia.course));
                    if let Some(c) = interno {
                        internos_en_opciones.insert(c);
                    }
                }
            }
            if !opciones.is_empty() {
                opciones_usadas_periodo.extend(internos_en_opciones.iter().copied());
                let mut item = BTreeMap::new();
                item.insert(slot.placeholder.clone(), opciones);
                agendados.push(ItemProyectado::Opciones(item));
                slots_major_pendientes -= 1;
                aprobados_sim.insert(slot.placeholder.clone());
            }
        }

        // 5) cupos de electivo libre: marcador genérico
        for slot in slots_libres.iter().filter(|s| s.semester == numero_semestre) {
            if slots_libres_pendientes > 0 {
                agendados.push(ItemProyectado::Ramo(DetalleRamo::Codigo(
                    MARCADOR_ELECTIVO_LIBRE.to_string(),
                )));
                slots_libres_pendientes -= 1;
                aprobados_sim.insert(slot.placeholder.clone());
            }
        }

        // cierre del período: los ramos concretos recién agendados quedan
        // disponibles como requisito desde el período siguiente
        if !agendados.is_empty() {
            for item in &agendados {
                match item {
                    ItemProyectado::Ramo(detalle) => {
                        aprobados_sim.insert(detalle.course_id().to_string());
                    }
                    ItemProyectado::Opciones(_) => {}
                }
            }
            proyeccion.push(SemestreProyectado {
                academic_year: etiqueta_anio,
                semester: sem_del_anio.to_string(),
                courses: agendados,
            });
        }
    }

    let passed_courses: BTreeSet<String> = avance
        .core_aprobados
        .iter()
        .chain(avance.major_aprobados.iter())
        .chain(avance.elecciones_aprobadas.iter())
        .cloned()
        .collect();
    let failed_courses_to_retake: BTreeSet<String> = avance.core_reprobados.iter().cloned().collect();
    let pending_core_courses: BTreeSet<String> =
        core_pendientes.union(&repeticiones).cloned().collect();

    ResultadoEstudiante {
        passed_courses: passed_courses.into_iter().collect(),
        failed_courses_to_retake: failed_courses_to_retake.into_iter().collect(),
        pending_core_courses: pending_core_courses.into_iter().collect(),
        pending_choice_placeholders: elecciones_pendientes.into_iter().collect(),
        pending_major_electives: slots_major_pendientes,
        pending_free_electives: slots_libres_pendientes,
        forecast: proyeccion,
    }
}
