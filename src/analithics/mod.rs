pub mod db;
pub mod insertions;
pub mod jsonparsing;
pub mod queries;

pub use db::init_db;
pub use insertions::{log_query, save_report};
pub use queries::{count_students, mallas_mas_solicitadas, promedio_duracion_ms};
