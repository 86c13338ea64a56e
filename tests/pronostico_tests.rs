use std::collections::{BTreeMap, HashMap};

use proyeccion::models::*;
use proyeccion::pronostico::generar_proyeccion;
use proyeccion::resolver::ResolverRamos;

fn orden_notas() -> OrdenNotas {
    [("F", 0), ("D", 1), ("C", 2), ("B", 3), ("A", 4)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v as i64))
        .collect()
}

fn alias(nombre: &str, codigos: &[(&str, &str)]) -> AliasEntry {
    AliasEntry {
        course_names: Some(nombre.to_string()),
        codigos: codigos
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn tabla_alias() -> TablaAlias {
    let mut tabla = TablaAlias::new();
    tabla.insert(1, alias("Cálculo I", &[("default", "MA101")]));
    tabla.insert(2, alias("Programación", &[("default", "CS101")]));
    tabla.insert(3, alias("Redes", &[("default", "NW210")]));
    tabla.insert(4, alias("Física", &[("default", "FI100")]));
    tabla.insert(5, alias("Ingeniería de Software", &[("default", "SE300")]));
    tabla.insert(6, alias("Arquitectura de Software", &[("default", "SE301")]));
    tabla
}

fn core(codigo: &str, semester: i64, pre: &[&str], pg: Option<&str>) -> ItemMalla {
    ItemMalla {
        course: Some(codigo.to_string()),
        choice: None,
        semester,
        pre: pre.iter().map(|p| p.to_string()).collect(),
        pg: pg.map(|p| p.to_string()),
    }
}

fn malla_prueba() -> Malla {
    Malla {
        curriculum_name: "BScIT2020".to_string(),
        courses: vec![
            core("MA101", 1, &[], None),
            core("CS101", 1, &[], Some("C")),
            core("NW210", 2, &["CS101"], None),
            core("FI100", 3, &[], None),
            ItemMalla {
                course: None,
                choice: Some(GrupoEleccion {
                    placeholder: "hum-1".to_string(),
                    courses: vec![
                        RefRamo {
                            course: "HU200".to_string(),
                            pre: vec![],
                        },
                        RefRamo {
                            course: "HU201".to_string(),
                            pre: vec![],
                        },
                    ],
                }),
                semester: 2,
                pre: vec![],
                pg: None,
            },
        ],
        major_electives: BloqueElectivosMajor {
            pg: None,
            courses: vec![
                RefRamo {
                    course: "SE300".to_string(),
                    pre: vec![],
                },
                RefRamo {
                    course: "SE301".to_string(),
                    pre: vec![],
                },
            ],
            slots: vec![SlotElectivo {
                placeholder: "major-1".to_string(),
                semester: 3,
            }],
        },
        free_electives: BloqueElectivosLibres {
            pg: None,
            slots: vec![SlotElectivo {
                placeholder: "free-1".to_string(),
                semester: 3,
            }],
        },
    }
}

fn entorno() -> (HashMap<String, Malla>, ResolverRamos) {
    let mut mallas = HashMap::new();
    mallas.insert("BScIT2020".to_string(), malla_prueba());
    // todo ofertado en los dos semestres regulares; el verano queda vacío
    let oferta: Vec<u32> = vec![1, 2, 3, 4, 5, 6];
    let resolver = ResolverRamos::new(tabla_alias(), oferta.clone(), oferta, vec![]);
    (mallas, resolver)
}

fn estudiante(curriculum: &str, cursos: &[(&str, &str)]) -> RegistroEstudiante {
    RegistroEstudiante {
        curriculum: curriculum.to_string(),
        courses: cursos
            .iter()
            .map(|(c, g)| {
                (
                    c.to_string(),
                    DetalleCursado {
                        grade: Some(g.to_string()),
                        ..Default::default()
                    },
                )
            })
            .collect(),
    }
}

fn periodo_2023_1() -> PeriodoActual {
    PeriodoActual {
        anio: 2023,
        semestre: 1,
    }
}

fn resultado(salida: SalidaEstudiante) -> ResultadoEstudiante {
    match salida {
        SalidaEstudiante::Resultado(r) => r,
        SalidaEstudiante::Error { error } => panic!("se esperaba resultado, llegó error: {}", error),
    }
}

fn codigos_de(entrada: &SemestreProyectado) -> Vec<String> {
    entrada
        .courses
        .iter()
        .map(|item| match item {
            ItemProyectado::Ramo(d) => d.course_id().to_string(),
            ItemProyectado::Opciones(mapa) => mapa.keys().next().cloned().unwrap_or_default(),
        })
        .collect()
}

fn aparece_en_proyeccion(resultado: &ResultadoEstudiante, codigo: &str) -> bool {
    resultado
        .forecast
        .iter()
        .any(|sem| codigos_de(sem).iter().any(|c| c == codigo))
}

#[test]
fn estudiante_nuevo_recibe_plan_completo() {
    let (mallas, resolver) = entorno();
    let est = estudiante("BScIT2020", &[]);
    let r = resultado(generar_proyeccion(
        &est,
        &mallas,
        &orden_notas(),
        &resolver,
        periodo_2023_1(),
    ));

    assert_eq!(r.forecast.len(), 4, "plan: 2023-1, 2023-2, verano, 2024-1");

    // primer semestre: los dos ramos sin requisitos
    assert_eq!(r.forecast[0].academic_year, "2023-2024");
    assert_eq!(r.forecast[0].semester, "1");
    let sem1 = codigos_de(&r.forecast[0]);
    assert!(sem1.contains(&"MA101".to_string()) && sem1.contains(&"CS101".to_string()));
    assert!(!sem1.contains(&"NW210".to_string()), "NW210 está declarado para el semestre 2");

    // segundo semestre: NW210 (su requisito CS101 quedó agendado el período
    // anterior) y el grupo de elección
    let sem2 = codigos_de(&r.forecast[1]);
    assert!(sem2.contains(&"NW210".to_string()));
    assert!(sem2.contains(&"hum-1".to_string()));

    // verano: el cupo libre entra (no chequea oferta); el de especialidad no
    // porque el verano no oferta nada
    assert_eq!(r.forecast[2].semester, "3");
    let verano = codigos_de(&r.forecast[2]);
    assert_eq!(verano, vec!["free-elective".to_string()]);

    // 2024 semestre 1 comparte numeración con el verano: caen FI100 y el cupo
    // de especialidad con sus dos opciones
    assert_eq!(r.forecast[3].academic_year, "2024-2025");
    assert_eq!(r.forecast[3].semester, "1");
    let sem4 = codigos_de(&r.forecast[3]);
    assert!(sem4.contains(&"FI100".to_string()));
    assert!(sem4.contains(&"major-1".to_string()));
    let opciones = r.forecast[3]
        .courses
        .iter()
        .find_map(|item| match item {
            ItemProyectado::Opciones(mapa) => mapa.get("major-1"),
            _ => None,
        })
        .expect("el cupo major-1 debe traer opciones");
    assert_eq!(opciones.len(), 2);

    // nada queda pendiente tras el horizonte
    assert!(r.pending_core_courses.is_empty());
    assert!(r.pending_choice_placeholders.is_empty());
    assert_eq!(r.pending_major_electives, 0);
    assert_eq!(r.pending_free_electives, 0);
}

#[test]
fn requisito_insatisfacible_bloquea_el_ramo_todo_el_horizonte() {
    // QX999 no existe en alias ni ofertas: nunca se puede agendar, así que
    // NW210 (que lo exige) tampoco, por muchos semestres que pasen
    let (mut mallas, resolver) = entorno();
    let malla = mallas.get_mut("BScIT2020").unwrap();
    malla.courses.push(core("QX999", 1, &[], None));
    for item in malla.courses.iter_mut() {
        if item.course.as_deref() == Some("NW210") {
            item.pre = vec!["QX999".to_string()];
        }
    }

    let est = estudiante("BScIT2020", &[]);
    let r = resultado(generar_proyeccion(
        &est,
        &mallas,
        &orden_notas(),
        &resolver,
        periodo_2023_1(),
    ));

    assert!(!aparece_en_proyeccion(&r, "NW210"));
    assert!(!aparece_en_proyeccion(&r, "QX999"));
    assert!(r.pending_core_courses.contains(&"NW210".to_string()));
    assert!(r.pending_core_courses.contains(&"QX999".to_string()));
}

#[test]
fn reprobado_se_reagenda_y_sigue_en_la_lista_de_reprobados() {
    let (mallas, resolver) = entorno();
    let est = estudiante("BScIT2020", &[("MA101", "F")]);
    let r = resultado(generar_proyeccion(
        &est,
        &mallas,
        &orden_notas(),
        &resolver,
        periodo_2023_1(),
    ));

    assert_eq!(r.failed_courses_to_retake, vec!["MA101".to_string()]);
    let sem1 = codigos_de(&r.forecast[0]);
    assert!(sem1.contains(&"MA101".to_string()), "la repetición entra apenas hay oferta");
    assert!(!r.pending_core_courses.contains(&"MA101".to_string()));
}

#[test]
fn historial_aprobado_no_se_reagenda() {
    let (mallas, resolver) = entorno();
    let est = estudiante(
        "BScIT2020",
        &[("MA101", "A"), ("CS101", "B"), ("HU200", "C")],
    );
    let r = resultado(generar_proyeccion(
        &est,
        &mallas,
        &orden_notas(),
        &resolver,
        periodo_2023_1(),
    ));

    assert_eq!(
        r.passed_courses,
        vec!["CS101".to_string(), "MA101".to_string(), "hum-1".to_string()]
    );
    assert!(!aparece_en_proyeccion(&r, "MA101"));
    assert!(!aparece_en_proyeccion(&r, "CS101"));
    assert!(!aparece_en_proyeccion(&r, "hum-1"));
    // NW210 entra en su semestre declarado: el requisito ya está aprobado
    let sem2 = codigos_de(&r.forecast[0]);
    assert_eq!(r.forecast[0].semester, "2");
    assert!(sem2.contains(&"NW210".to_string()));
}

#[test]
fn malla_desconocida_produce_error_estructurado() {
    let (mallas, resolver) = entorno();
    let est = estudiante("BScIT1999", &[]);
    match generar_proyeccion(&est, &mallas, &orden_notas(), &resolver, periodo_2023_1()) {
        SalidaEstudiante::Error { error } => {
            assert_eq!(error, "Curriculum 'BScIT1999' not found or not loaded.");
        }
        SalidaEstudiante::Resultado(_) => panic!("una malla desconocida debe producir error"),
    }

    let sin_malla = estudiante("", &[]);
    assert!(matches!(
        generar_proyeccion(&sin_malla, &mallas, &orden_notas(), &resolver, periodo_2023_1()),
        SalidaEstudiante::Error { .. }
    ));
}

#[test]
fn inicio_en_segundo_semestre_respeta_la_numeracion() {
    let (mallas, resolver) = entorno();
    let est = estudiante("BScIT2020", &[]);
    let r = resultado(generar_proyeccion(
        &est,
        &mallas,
        &orden_notas(),
        &resolver,
        PeriodoActual {
            anio: 2023,
            semestre: 2,
        },
    ));

    // la simulación arranca en el número absoluto 2: el grupo de elección del
    // semestre 2 entra de inmediato, y los ramos declarados para el número 1
    // ya no calzan con ningún período futuro (quedan pendientes)
    assert_eq!(r.forecast[0].academic_year, "2023-2024");
    assert_eq!(r.forecast[0].semester, "2");
    let primero = codigos_de(&r.forecast[0]);
    assert!(primero.contains(&"hum-1".to_string()));
    assert!(!primero.contains(&"MA101".to_string()));

    assert!(!aparece_en_proyeccion(&r, "MA101"));
    assert!(!aparece_en_proyeccion(&r, "CS101"));
    assert!(r.pending_core_courses.contains(&"MA101".to_string()));
    assert!(r.pending_core_courses.contains(&"CS101".to_string()));
}

#[test]
fn horizonte_es_de_18_periodos() {
    // un ramo declarado fuera del alcance del horizonte jamás aparece
    let (mut mallas, resolver) = entorno();
    let malla = mallas.get_mut("BScIT2020").unwrap();
    malla.courses.push(core("ZZ400", 99, &[], None));

    let est = estudiante("BScIT2020", &[]);
    let r = resultado(generar_proyeccion(
        &est,
        &mallas,
        &orden_notas(),
        &resolver,
        periodo_2023_1(),
    ));

    assert!(!aparece_en_proyeccion(&r, "ZZ400"));
    assert!(r.pending_core_courses.contains(&"ZZ400".to_string()));
    // ningún período proyectado queda fuera de los 6 años simulados
    for sem in &r.forecast {
        let anio: i64 = sem.academic_year[..4].parse().unwrap();
        assert!((2023..2023 + 6).contains(&anio));
    }
}
