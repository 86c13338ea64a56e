//! Mismo insumo, misma salida: la proyección no depende del reloj, de la
//! semilla de los HashMap ni del orden en que se recorre el batch.

use std::collections::{BTreeMap, HashMap};

use proyeccion::models::*;
use proyeccion::pronostico::proyectar_todos;
use proyeccion::resolver::ResolverRamos;

fn orden_notas() -> OrdenNotas {
    [("F", 0), ("D", 1), ("C", 2), ("B", 3), ("A", 4)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v as i64))
        .collect()
}

fn tabla_alias() -> TablaAlias {
    let mut tabla = TablaAlias::new();
    for (interno, nombre, codigo) in [
        (1, "Cálculo I", "MA101"),
        (2, "Programación", "CS101"),
        (3, "Redes", "NW210"),
        (4, "Física", "FI100"),
        (5, "Ingeniería de Software", "SE300"),
    ] {
        tabla.insert(
            interno,
            AliasEntry {
                course_names: Some(nombre.to_string()),
                codigos: [("default".to_string(), codigo.to_string())]
                    .into_iter()
                    .collect(),
            },
        );
    }
    tabla
}

fn malla_prueba() -> Malla {
    let core = |codigo: &str, semester: i64, pre: &[&str]| ItemMalla {
        course: Some(codigo.to_string()),
        choice: None,
        semester,
        pre: pre.iter().map(|p| p.to_string()).collect(),
        pg: None,
    };
    Malla {
        curriculum_name: "BScIT2020".to_string(),
        courses: vec![
            core("MA101", 1, &[]),
            core("CS101", 1, &[]),
            core("NW210", 2, &["CS101"]),
            core("FI100", 3, &["MA101"]),
        ],
        major_electives: BloqueElectivosMajor {
            pg: None,
            courses: vec![RefRamo {
                course: "SE300".to_string(),
                pre: vec![],
            }],
            slots: vec![SlotElectivo {
                placeholder: "major-1".to_string(),
                semester: 4,
            }],
        },
        free_electives: BloqueElectivosLibres {
            pg: None,
            slots: vec![SlotElectivo {
                placeholder: "free-1".to_string(),
                semester: 4,
            }],
        },
    }
}

fn estudiantes() -> BTreeMap<String, RegistroEstudiante> {
    let est = |curriculum: &str, cursos: &[(&str, &str)]| RegistroEstudiante {
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
    };
    let mut mapa = BTreeMap::new();
    mapa.insert("est-1".to_string(), est("BScIT2020", &[]));
    mapa.insert("est-2".to_string(), est("BScIT2020", &[("MA101", "F"), ("CS101", "A")]));
    mapa.insert("est-3".to_string(), est("BScIT2020", &[("MA101", "A"), ("ZZ999", "B")]));
    mapa.insert("est-4".to_string(), est("SinMalla", &[]));
    mapa
}

fn correr_batch() -> String {
    let mut mallas = HashMap::new();
    mallas.insert("BScIT2020".to_string(), malla_prueba());
    let oferta: Vec<u32> = vec![1, 2, 3, 4, 5];
    let resolver = ResolverRamos::new(tabla_alias(), oferta.clone(), oferta, vec![]);
    let periodo = PeriodoActual {
        anio: 2023,
        semestre: 1,
    };
    let resultados = proyectar_todos(&estudiantes(), &mallas, &orden_notas(), &resolver, periodo);
    serde_json::to_string_pretty(&resultados).expect("la salida siempre serializa")
}

#[test]
fn corridas_repetidas_producen_salida_identica() {
    let primera = correr_batch();
    for _ in 0..5 {
        assert_eq!(primera, correr_batch());
    }
}

#[test]
fn resolver_compartido_y_resolver_frio_coinciden() {
    let mut mallas = HashMap::new();
    mallas.insert("BScIT2020".to_string(), malla_prueba());
    let oferta: Vec<u32> = vec![1, 2, 3, 4, 5];
    let periodo = PeriodoActual {
        anio: 2023,
        semestre: 1,
    };

    // un resolver reutilizado (cachés calientes tras la primera corrida)
    let compartido = ResolverRamos::new(tabla_alias(), oferta.clone(), oferta.clone(), vec![]);
    let caliente = {
        let _ = proyectar_todos(&estudiantes(), &mallas, &orden_notas(), &compartido, periodo);
        proyectar_todos(&estudiantes(), &mallas, &orden_notas(), &compartido, periodo)
    };

    // contra un resolver recién construido
    let frio_resolver = ResolverRamos::new(tabla_alias(), oferta.clone(), oferta, vec![]);
    let frio = proyectar_todos(&estudiantes(), &mallas, &orden_notas(), &frio_resolver, periodo);

    assert_eq!(
        serde_json::to_string(&caliente).unwrap(),
        serde_json::to_string(&frio).unwrap()
    );
}

#[test]
fn el_error_por_estudiante_no_contamina_al_resto() {
    let batch: BTreeMap<String, SalidaEstudiante> = serde_json::from_str(&correr_batch()).unwrap();
    assert!(matches!(batch["est-4"], SalidaEstudiante::Error { .. }));
    assert!(matches!(batch["est-1"], SalidaEstudiante::Resultado(_)));
    assert!(matches!(batch["est-2"], SalidaEstudiante::Resultado(_)));
}
