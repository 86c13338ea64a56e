use actix_cors::Cors;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, web};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;

use crate::api_json::{
    ParametrosProyeccion, RegistroPlano, parse_json_input, reestructurar_registros,
    resolver_nombres_en_registros,
};
use crate::datos::{self, DatosSistema};
use crate::models::{PeriodoActual, RegistroEstudiante};
use crate::progreso::evaluar_avance;
use crate::pronostico::{generar_proyeccion, proyectar_todos};
use crate::resolver::ResolverRamos;
use crate::rutacritica::{analizar_ruta_critica, filtrar_pendientes};

/// Estado compartido del servidor: configuración inmutable + resolver con sus
/// cachés, construidos una vez al arranque.
pub struct AppState {
    pub datos: DatosSistema,
    pub resolver: ResolverRamos,
    pub periodo: PeriodoActual,
}

/// POST /proyeccion
/// Proyección individual: recibe `ParametrosProyeccion` y devuelve el
/// resultado (o el error estructurado por estudiante).
async fn proyeccion_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let body_value = body.into_inner();
    let json_str = match serde_json::to_string(&body_value) {
        Ok(s) => s,
        Err(e) => {
            return HttpResponse::BadRequest().json(json!({"error": format!("invalid JSON body: {}", e)}));
        }
    };

    let params = match parse_json_input(&json_str) {
        Ok(p) => p,
        Err(e) => {
            return HttpResponse::BadRequest().json(json!({"error": format!("failed to parse input: {}", e)}));
        }
    };

    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    let start = std::time::Instant::now();

    let registro: RegistroEstudiante = params.into();
    let salida = generar_proyeccion(
        &registro,
        &state.datos.mallas,
        &state.datos.calendario.grade_order,
        &state.resolver,
        state.periodo,
    );

    let duration_ms = start.elapsed().as_millis() as i64;
    let resp_ser = serde_json::to_string(&salida).unwrap_or_else(|_| String::from("{}"));
    tokio::task::spawn_blocking(move || {
        let _ = crate::analithics::log_query(&json_str, &resp_ser, duration_ms, &client_ip);
    });

    HttpResponse::Ok().json(salida)
}

/// GET /proyeccion/all
/// Proyección del batch completo cargado desde `students.json`. El trabajo es
/// CPU-bound: corre en `spawn_blocking` acotado por un semáforo global.
async fn proyeccion_all_handler(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    static GLOBAL_SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();
    let sem = GLOBAL_SEM
        .get_or_init(|| Arc::new(Semaphore::new(std::cmp::max(1, num_cpus::get()))))
        .clone();

    let permit = match sem.acquire_owned().await {
        Ok(p) => p,
        Err(_) => {
            return HttpResponse::InternalServerError().json(json!({"error": "failed to acquire semaphore"}));
        }
    };

    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    let start = std::time::Instant::now();

    let state_block = state.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        proyectar_todos(
            &state_block.datos.estudiantes,
            &state_block.datos.mallas,
            &state_block.datos.calendario.grade_order,
            &state_block.resolver,
            state_block.periodo,
        )
    });

    let resultados = match handle.await {
        Ok(r) => r,
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)}));
        }
    };

    let duration_ms = start.elapsed().as_millis() as i64;
    let resp_ser = serde_json::to_string(&resultados).unwrap_or_else(|_| String::from("{}"));
    let req_resumen = json!({"batch": true, "students": resultados.len()}).to_string();
    tokio::task::spawn_blocking(move || {
        let _ = crate::analithics::log_query(&req_resumen, &resp_ser, duration_ms, &client_ip);
    });

    HttpResponse::Ok().json(resultados)
}

fn ruta_students() -> PathBuf {
    datos::get_data_dir().join("students.json")
}

fn leer_students_disco() -> BTreeMap<String, RegistroEstudiante> {
    let ruta = ruta_students();
    if !ruta.exists() {
        return BTreeMap::new();
    }
    match std::fs::read_to_string(&ruta) {
        Ok(contenido) if !contenido.trim().is_empty() => {
            match serde_json::from_str::<BTreeMap<String, RegistroEstudiante>>(&contenido) {
                Ok(mapa) => mapa,
                Err(_) => {
                    // archivo inválido: se parte de cero
                    BTreeMap::new()
                }
            }
        }
        _ => BTreeMap::new(),
    }
}

fn escribir_students_disco(
    estudiantes: &BTreeMap<String, RegistroEstudiante>,
) -> Result<(), Box<dyn Error>> {
    let ruta = ruta_students();
    if let Some(dir) = ruta.parent() {
        create_dir_all(dir)?;
    }
    let texto = serde_json::to_string_pretty(estudiantes)?;
    let mut archivo = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&ruta)?;
    archivo.write_all(texto.as_bytes())?;
    Ok(())
}

/// POST /students
/// Guarda (o sustituye) el registro de un estudiante en `students.json`.
async fn save_student_handler(body: web::Json<serde_json::Value>) -> impl Responder {
    let body_value = body.into_inner();
    let json_str = match serde_json::to_string(&body_value) {
        Ok(s) => s,
        Err(e) => {
            return HttpResponse::BadRequest().json(json!({"error": format!("invalid JSON body: {}", e)}));
        }
    };

    let params: ParametrosProyeccion = match parse_json_input(&json_str) {
        Ok(p) => p,
        Err(e) => {
            return HttpResponse::BadRequest().json(json!({"error": format!("failed to parse input: {}", e)}));
        }
    };

    if params.student_id.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "student_id is required"}));
    }

    let mut estudiantes = leer_students_disco();
    let student_id = params.student_id.clone();
    estudiantes.insert(student_id, params.into());

    match escribir_students_disco(&estudiantes) {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "ok", "count": estudiantes.len()})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("failed to write students: {}", e)})),
    }
}

/// POST /students/import
/// Importa una lista plana de inscripciones (formato del sistema de
/// matrícula): resuelve nombres tipeados a códigos, reagrupa por estudiante y
/// fusiona el resultado en `students.json`.
async fn import_students_handler(
    state: web::Data<AppState>,
    body: web::Json<Vec<RegistroPlano>>,
) -> impl Responder {
    let planos = body.into_inner();
    let total_registros = planos.len();
    let resueltos = resolver_nombres_en_registros(planos, &state.datos.aliases);
    let agrupados = reestructurar_registros(&resueltos);

    let mut estudiantes = leer_students_disco();
    let importados = agrupados.len();
    for (id, registro) in agrupados {
        estudiantes.insert(id, registro);
    }

    match escribir_students_disco(&estudiantes) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "registros": total_registros,
            "estudiantes_importados": importados,
            "count": estudiantes.len()
        })),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("failed to write students: {}", e)})),
    }
}

/// GET /config
/// Resumen de la configuración cargada (conteos + muestras, sin volcar todo).
async fn config_handler(state: web::Data<AppState>) -> impl Responder {
    let mut alias_sample: Vec<serde_json::Value> = Vec::new();
    for (codigo_interno, entrada) in state.datos.aliases.iter().take(20) {
        alias_sample.push(json!({
            "internal_code": codigo_interno,
            "course_names": entrada.course_names,
            "codigos": entrada.codigos,
        }));
    }

    let mut mallas: Vec<&String> = state.datos.mallas.keys().collect();
    mallas.sort();

    HttpResponse::Ok().json(json!({
        "current_year": state.datos.calendario.current_year,
        "current_semester": state.datos.calendario.current_semester,
        "aliases_count": state.datos.aliases.len(),
        "aliases_sample": alias_sample,
        "ofertas": {
            "1": state.datos.oferta_1.len(),
            "2": state.datos.oferta_2.len(),
            "s": state.datos.oferta_s.len(),
        },
        "mallas": mallas,
        "students_count": state.datos.estudiantes.len(),
    }))
}

/// GET /rutacritica/{malla}
/// Análisis de ruta crítica de prerequisitos para una malla cargada. Con
/// `?student=<id>` el análisis se restringe a los ramos core que ese
/// estudiante aún no aprueba.
async fn rutacritica_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let malla_id = path.into_inner();
    let malla = match state.datos.mallas.get(&malla_id) {
        Some(m) => m,
        None => {
            return HttpResponse::NotFound()
                .json(json!({"error": format!("Curriculum '{}' not found or not loaded.", malla_id)}));
        }
    };

    let nodos = match analizar_ruta_critica(malla) {
        Ok(n) => n,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("critical path failed: {}", e)}));
        }
    };

    if let Some(student_id) = query.get("student") {
        let registro = match state.datos.estudiantes.get(student_id) {
            Some(r) => r,
            None => {
                return HttpResponse::NotFound()
                    .json(json!({"error": format!("student '{}' not found", student_id)}));
            }
        };
        let avance = evaluar_avance(
            &registro.courses,
            malla,
            &state.datos.calendario.grade_order,
            &state.resolver,
        );
        let pendientes: std::collections::BTreeSet<String> = malla
            .mapa_core()
            .keys()
            .filter(|c| !avance.core_aprobados.contains(**c))
            .map(|c| c.to_string())
            .collect();
        let filtrados = filtrar_pendientes(&nodos, &pendientes);
        return HttpResponse::Ok().json(json!({
            "curriculum": malla_id,
            "student": student_id,
            "courses": filtrados,
        }));
    }

    HttpResponse::Ok().json(json!({"curriculum": malla_id, "courses": nodos}))
}

/// GET /analithics/resumen
async fn analithics_handler() -> impl Responder {
    let mallas = crate::analithics::mallas_mas_solicitadas(Some(10)).unwrap_or(json!([]));
    let estudiantes = crate::analithics::count_students().unwrap_or(json!({}));
    let duracion = crate::analithics::promedio_duracion_ms().unwrap_or(json!({}));
    HttpResponse::Ok().json(json!({
        "mallas_mas_solicitadas": mallas,
        "count_students": estudiantes,
        "promedio_duracion_ms": duracion,
    }))
}

async fn help_handler() -> impl Responder {
    // Example ParametrosProyeccion to show expected format for POST /proyeccion
    let example = json!({
        "student_id": "2021-0042",
        "curriculum": "BScIT2020",
        "courses": {
            "CS101": {"grade": "B"},
            "MA101": {"grade": "D"}
        }
    });

    let help = json!({
        "description": "API de proyección académica. POST /proyeccion evalúa un estudiante contra su malla y simula los semestres restantes. GET /proyeccion/all proyecta el batch completo de students.json.",
        "post_example": example,
        "routes": {
            "POST /proyeccion": "proyección individual",
            "GET /proyeccion/all": "proyección del batch completo",
            "POST /students": "guardar/sustituir un estudiante en students.json",
            "POST /students/import": "importar inscripciones planas (lista de registros)",
            "GET /config": "resumen de la configuración cargada",
            "GET /rutacritica/{malla}": "ruta crítica de prerequisitos de la malla",
            "GET /analithics/resumen": "agregados de uso",
        },
        "note": "Los códigos de ramo se canonicalizan contra la tabla de alias; los nombres tipeados en /students/import se resuelven por similitud."
    });

    HttpResponse::Ok().json(help)
}

pub async fn run_server(bind_addr: &str) -> std::io::Result<()> {
    // configuración requerida ausente o corrupta: abortar sin salida parcial
    let datos_sistema = match datos::cargar_datos_default() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let periodo = match datos_sistema.calendario.periodo_actual() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let resolver = ResolverRamos::desde_datos(&datos_sistema);

    if let Err(e) = crate::analithics::init_db() {
        eprintln!("WARN: analithics no disponible: {}", e);
    }

    let state = web::Data::new(AppState {
        datos: datos_sistema,
        resolver,
        periodo,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .route("/proyeccion", web::post().to(proyeccion_handler))
            .route("/proyeccion/all", web::get().to(proyeccion_all_handler))
            .route("/students", web::post().to(save_student_handler))
            .route("/students/import", web::post().to(import_students_handler))
            .route("/config", web::get().to(config_handler))
            .route("/rutacritica/{malla}", web::get().to(rutacritica_handler))
            .route("/analithics/resumen", web::get().to(analithics_handler))
            .route("/help", web::get().to(help_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}
