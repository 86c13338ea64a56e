//! Resolución de identidad de ramos: alias, códigos internos y ofertas.
//!
//! Un mismo ramo aparece con códigos distintos según la malla y el período.
//! La tabla de alias agrupa todos esos códigos bajo un código interno
//! numérico; este módulo construye los índices inversos una sola vez y cachea
//! las resoluciones por malla, de modo que las evaluaciones por estudiante
//! trabajen con lookups O(1).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::models::{DetalleRamo, TablaAlias};

/// Separador de códigos alternativos dentro de una misma entrada de alias.
const SEPARADOR: char = '/';

fn split_codigos(codigos: &str) -> impl Iterator<Item = &str> {
    codigos.split(SEPARADOR).filter(|c| !c.is_empty())
}

#[derive(Debug, Clone)]
struct DetalleAlias {
    codigo_interno: u32,
    nombre: String,
}

/// Resolver de identidad de ramos. Se construye una vez a partir de la tabla
/// de alias y las tres ofertas; después es de sólo lectura (los cachés son
/// idempotentes y se comparten detrás de `Arc`).
pub struct ResolverRamos {
    aliases: TablaAlias,
    ofertas: HashMap<String, HashSet<u32>>,
    detalle_por_codigo: HashMap<String, DetalleAlias>,
    interno_por_codigo: HashMap<String, u32>,
    cache_ofertas: Mutex<HashMap<(String, String), Arc<HashSet<String>>>>,
    cache_canonico: Mutex<HashMap<(String, String), String>>,
}

impl ResolverRamos {
    pub fn new(
        aliases: TablaAlias,
        oferta_1: Vec<u32>,
        oferta_2: Vec<u32>,
        oferta_s: Vec<u32>,
    ) -> Self {
        let mut ofertas: HashMap<String, HashSet<u32>> = HashMap::new();
        ofertas.insert("1".to_string(), oferta_1.into_iter().collect());
        ofertas.insert("2".to_string(), oferta_2.into_iter().collect());
        ofertas.insert("s".to_string(), oferta_s.into_iter().collect());

        // Índices inversos: la primera entrada (en orden ascendente de código
        // interno) que define un código gana; un código repartido entre dos
        // entradas es dato ambiguo y se reporta.
        let mut detalle_por_codigo: HashMap<String, DetalleAlias> = HashMap::new();
        let mut interno_por_codigo: HashMap<String, u32> = HashMap::new();
        for (codigo_interno, entrada) in &aliases {
            let nombre = entrada
                .course_names
                .clone()
                .unwrap_or_else(|| "N/A".to_string());
            for codigos in entrada.codigos.values() {
                for codigo in split_codigos(codigos) {
                    match interno_por_codigo.get(codigo) {
                        Some(previo) if *previo != *codigo_interno => {
                            eprintln!(
                                "WARN: código '{}' definido por las entradas {} y {}; se conserva la primera",
                                codigo, previo, codigo_interno
                            );
                        }
                        Some(_) => {}
                        None => {
                            interno_por_codigo.insert(codigo.to_string(), *codigo_interno);
                            detalle_por_codigo.insert(
                                codigo.to_string(),
                                DetalleAlias {
                                    codigo_interno: *codigo_interno,
                                    nombre: nombre.clone(),
                                },
                            );
                        }
                    }
                }
            }
        }

        ResolverRamos {
            aliases,
            ofertas,
            detalle_por_codigo,
            interno_por_codigo,
            cache_ofertas: Mutex::new(HashMap::new()),
            cache_canonico: Mutex::new(HashMap::new()),
        }
    }

    /// Constructor desde la configuración ya cargada.
    pub fn desde_datos(datos: &crate::datos::DatosSistema) -> Self {
        ResolverRamos::new(
            datos.aliases.clone(),
            datos.oferta_1.clone(),
            datos.oferta_2.clone(),
            datos.oferta_s.clone(),
        )
    }

    /// Detalle rico para un código conocido; los códigos fuera de la tabla
    /// (placeholders, ramos históricos sin alias) se devuelven tal cual.
    pub fn detalle_ramo(&self, course_id: &str) -> DetalleRamo {
        match self.detalle_por_codigo.get(course_id) {
            Some(d) => DetalleRamo::Conocido {
                name: d.nombre.clone(),
                internal_code: d.codigo_interno,
                course_id: course_id.to_string(),
            },
            None => DetalleRamo::Codigo(course_id.to_string()),
        }
    }

    /// Código interno del ramo, si la tabla de alias lo conoce.
    pub fn codigo_interno(&self, course_id: &str) -> Option<u32> {
        self.interno_por_codigo.get(course_id).copied()
    }

    /// Conjunto de códigos canónicos ofertados para `malla_id` en el semestre
    /// indicado ("1", "2" o "s"). Para cada código interno ofertado se toma el
    /// código específico de la malla o el default, y se separan las
    /// alternativas. Cacheado por `(semestre, malla)`.
    pub fn oferta(&self, semestre: &str, malla_id: &str) -> Arc<HashSet<String>> {
        let clave = (semestre.to_string(), malla_id.to_string());
        {
            let cache = self.cache_ofertas.lock().expect("cache de ofertas envenenado");
            if let Some(existente) = cache.get(&clave) {
                return Arc::clone(existente);
            }
        }

        let mut resultado: HashSet<String> = HashSet::new();
        if let Some(internos) = self.ofertas.get(semestre) {
            for interno in internos {
                let Some(entrada) = self.aliases.get(interno) else {
                    continue;
                };
                let codigo = entrada
                    .codigo_para(malla_id)
                    .or_else(|| entrada.codigo_default());
                if let Some(codigo) = codigo {
                    for parte in split_codigos(codigo) {
                        resultado.insert(parte.to_string());
                    }
                }
            }
        }

        let arc = Arc::new(resultado);
        let mut cache = self.cache_ofertas.lock().expect("cache de ofertas envenenado");
        cache.insert(clave, Arc::clone(&arc));
        arc
    }

    /// Código canónico de un ramo cursado, visto desde `malla_id`: el código
    /// con el que la malla escribe ese ramo en sus requisitos. Recorre la
    /// tabla en orden; la primera entrada que contiene el código gana. Un
    /// código que ninguna entrada conoce es canónico de sí mismo. Cacheado
    /// por `(código, malla)`.
    pub fn ramo_canonico(&self, codigo_estudiante: &str, malla_id: &str) -> String {
        let clave = (codigo_estudiante.to_string(), malla_id.to_string());
        {
            let cache = self
                .cache_canonico
                .lock()
                .expect("cache de canónicos envenenado");
            if let Some(existente) = cache.get(&clave) {
                return existente.clone();
            }
        }

        let mut resultado = codigo_estudiante.to_string();
        for entrada in self.aliases.values() {
            let codigo_malla = entrada.codigo_para(malla_id);
            if let Some(cm) = codigo_malla {
                if split_codigos(cm).any(|c| c == codigo_estudiante) {
                    resultado = cm.to_string();
                    break;
                }
            }
            if let Some(cd) = entrada.codigo_default() {
                if split_codigos(cd).any(|c| c == codigo_estudiante) {
                    resultado = codigo_malla.unwrap_or(cd).to_string();
                    break;
                }
            }
        }

        let mut cache = self
            .cache_canonico
            .lock()
            .expect("cache de canónicos envenenado");
        cache.insert(clave, resultado.clone());
        resultado
    }
}
