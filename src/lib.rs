// Biblioteca raíz del crate `proyeccion`.
// Reexporta los módulos principales y la función de conveniencia
// `run_server` que levanta la API sobre la configuración cargada.
pub mod analithics;
pub mod api_json;
pub mod datos;
pub mod models;
pub mod progreso;
pub mod pronostico;
pub mod resolver;
pub mod rutacritica;
pub mod server;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
