//! Ruta crítica sobre el grafo de prerequisitos de una malla.
//!
//! Construye el grafo dirigido prerequisito -> dependiente con los ramos core
//! y calcula, por ramo, el largo de la cadena de requisitos más larga que lo
//! alcanza y la que nace de él. Los ramos sobre alguna cadena de largo máximo
//! quedan marcados como críticos: atrasarlos atrasa el plan completo.

use std::collections::{BTreeSet, HashMap};
use std::error::Error;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::models::Malla;

#[derive(Debug, Clone, Serialize)]
pub struct NodoCritico {
    pub course: String,
    /// Largo de la cadena de prerequisitos más larga que termina en el ramo.
    pub profundidad: i64,
    pub critico: bool,
}

/// Análisis completo de la malla. Un ciclo en los prerequisitos devuelve
/// error (los datos no se validan más allá de eso).
pub fn analizar_ruta_critica(malla: &Malla) -> Result<Vec<NodoCritico>, Box<dyn Error>> {
    let mut grafo: DiGraph<String, ()> = DiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

    for item in &malla.courses {
        if let Some(codigo) = item.course.as_deref() {
            if !indices.contains_key(codigo) {
                let idx = grafo.add_node(codigo.to_string());
                indices.insert(codigo, idx);
            }
        }
    }

    // aristas prerequisito -> dependiente; los requisitos que apuntan a
    // placeholders u otros códigos fuera del core no generan arista
    for item in &malla.courses {
        let Some(codigo) = item.course.as_deref() else {
            continue;
        };
        let hasta = indices[codigo];
        for pre in &item.pre {
            if let Some(&desde) = indices.get(pre.as_str()) {
                if desde != hasta && grafo.find_edge(desde, hasta).is_none() {
                    grafo.add_edge(desde, hasta, ());
                }
            }
        }
    }

    let orden = toposort(&grafo, None).map_err(|ciclo| {
        format!(
            "ciclo de prerequisitos detectado en '{}' ({})",
            grafo[ciclo.node_id()],
            malla.curriculum_name
        )
    })?;

    // profundidad hacia atrás (cadena más larga que llega al ramo)
    let mut hacia_atras: HashMap<NodeIndex, i64> = HashMap::new();
    for idx in &orden {
        let p = grafo
            .neighbors_directed(*idx, Direction::Incoming)
            .map(|v| hacia_atras.get(&v).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        hacia_atras.insert(*idx, p);
    }

    // profundidad hacia adelante (cadena más larga que nace del ramo)
    let mut hacia_adelante: HashMap<NodeIndex, i64> = HashMap::new();
    for idx in orden.iter().rev() {
        let p = grafo
            .neighbors_directed(*idx, Direction::Outgoing)
            .map(|v| hacia_adelante.get(&v).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        hacia_adelante.insert(*idx, p);
    }

    let maximo = grafo
        .node_indices()
        .map(|idx| hacia_atras[&idx] + hacia_adelante[&idx])
        .max()
        .unwrap_or(0);

    let mut nodos: Vec<NodoCritico> = grafo
        .node_indices()
        .map(|idx| NodoCritico {
            course: grafo[idx].clone(),
            profundidad: hacia_atras[&idx],
            critico: maximo > 0 && hacia_atras[&idx] + hacia_adelante[&idx] == maximo,
        })
        .collect();
    nodos.sort_by(|a, b| {
        b.profundidad
            .cmp(&a.profundidad)
            .then_with(|| a.course.cmp(&b.course))
    });
    Ok(nodos)
}

/// Restringe el análisis a un conjunto de ramos pendientes (los aprobados ya
/// no aportan a la criticidad que le queda al estudiante).
pub fn filtrar_pendientes(analisis: &[NodoCritico], pendientes: &BTreeSet<String>) -> Vec<NodoCritico> {
    analisis
        .iter()
        .filter(|n| pendientes.contains(&n.course))
        .cloned()
        .collect()
}
