//! # Configuração do Projetor
//!
//! Todos os campos têm valores padrão; um arquivo JSON pode sobrescrever
//! apenas o que precisar:
//!
//! ```json
//! { "no_entity_marker": "O", "sentiment": { "scheme": "explicit", "tables": { "3": [-1.0, null, 1.0] } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

type WeightTables = BTreeMap<usize, Vec<Option<f64>>>;

/// Como os pesos das classes de sentimento são escolhidos para `N` classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum SentimentWeighting {
    /// Pesos lineares de -1 (primeira classe) a +1 (última).
    #[default]
    Linear,
    /// Tabelas explícitas por número de classes; `null` marca uma classe
    /// que não pode ser projetada numa escala numérica.
    Explicit {
        /// Chaves JSON são strings ("3"); convertidas para o número de classes.
        #[serde(deserialize_with = "class_count_keys")]
        tables: WeightTables,
        /// Usa pesos lineares quando não há tabela para `N`.
        #[serde(default)]
        fallback_linear: bool,
    },
}

fn class_count_keys<'de, D>(deserializer: D) -> std::result::Result<WeightTables, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<Option<f64>>>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, weights)| match key.trim().parse::<usize>() {
            Ok(size) => Ok((size, weights)),
            Err(_) => Err(D::Error::custom(format!(
                "número de classes inválido '{}' na tabela de sentimento",
                key
            ))),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Rótulo NER que indica "não é entidade".
    pub no_entity_marker: String,
    /// Tipo de relação reservado para "não é relação".
    pub non_relation_marker: String,
    /// Rótulo da relação gramatical raiz.
    pub root_relation: String,
    /// Com `true`, relações de dependência só são aceitas se existirem no
    /// tagset canônico; rótulos desconhecidos descartam a aresta.
    pub strict_dependency_tags: bool,
    pub sentiment: SentimentWeighting,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            no_entity_marker: "O".to_string(),
            non_relation_marker: "_NR".to_string(),
            root_relation: "root".to_string(),
            strict_dependency_tags: true,
            sentiment: SentimentWeighting::Linear,
        }
    }
}

impl ProjectorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}
