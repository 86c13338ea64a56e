// --- Sistema de Proyección Académica - Archivo principal ---

use proyeccion::run_server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    println!("=== Sistema de Proyección Académica (API) ===");
    let bind = std::env::var("PROYECCION_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    println!("Iniciando servidor en http://{}", bind);
    run_server(&bind).await
}
