//! # Documento Pré-anotado
//!
//! Contrato de entrada: tudo o que o motor de anotação externo produz para um
//! documento, já calculado. O projetor apenas lê estas estruturas.
//!
//! ## Convenções de índice
//!
//! | Estrutura            | Base | Fim       |
//! |----------------------|------|-----------|
//! | Offsets de token     | 0    | exclusivo |
//! | Grafo de dependência | 1    | -         |
//! | Menção de correferência (sentença e tokens) | 1 | exclusivo |
//! | Argumento de relação (tokens da sentença)   | 0 | exclusivo |

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Token como emitido pelo motor externo, com rótulos brutos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    /// Offset de caractere inicial (inclusivo).
    pub start: usize,
    /// Offset de caractere final (exclusivo).
    pub end: usize,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub ner: Option<String>,
    #[serde(default)]
    pub lemma: Option<String>,
}

impl RawToken {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    pub fn with_ner(mut self, ner: impl Into<String>) -> Self {
        self.ner = Some(ner.into());
        self
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    /// Tokens com comprimento não positivo são descartados pelo projetor.
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

/// Aresta governante → dependente (índices 1-based na sentença).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub governor: usize,
    pub dependent: usize,
    /// Nome curto da relação gramatical (ex: "nsubj").
    pub relation: String,
}

/// Grafo de dependências básicas de uma sentença.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub edges: Vec<DependencyEdge>,
    #[serde(default)]
    pub roots: Vec<usize>,
}

impl DependencyGraph {
    /// `true` se o token (1-based) é um nó do grafo.
    pub fn contains(&self, index: usize) -> bool {
        self.roots.contains(&index)
            || self
                .edges
                .iter()
                .any(|e| e.governor == index || e.dependent == index)
    }

    /// Arestas de entrada seguidas das arestas de saída do nó.
    pub fn incident(&self, index: usize) -> impl Iterator<Item = &DependencyEdge> {
        let incoming = self.edges.iter().filter(move |e| e.dependent == index);
        let outgoing = self
            .edges
            .iter()
            .filter(move |e| e.governor == index && e.dependent != index);
        incoming.chain(outgoing)
    }

    /// Raiz declarada em `roots` ou dependente da raiz virtual (governante 0).
    pub fn is_root(&self, index: usize) -> bool {
        self.roots.contains(&index)
            || self
                .edges
                .iter()
                .any(|e| e.governor == 0 && e.dependent == index)
    }
}

/// Argumento de relação: intervalo de tokens da sentença (0-based, fim exclusivo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    pub start: usize,
    pub end: usize,
}

/// Relação extraída entre entidades de uma sentença.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationMention {
    #[serde(rename = "type")]
    pub relation_type: String,
    /// Distribuição de probabilidade sobre os tipos de relação possíveis.
    #[serde(default)]
    pub type_probabilities: HashMap<String, f64>,
    #[serde(default)]
    pub arguments: Vec<EntityMention>,
}

/// Menção de correferência (sentença e tokens 1-based, fim exclusivo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorefMention {
    pub sentence: usize,
    pub start: usize,
    pub end: usize,
}

impl CorefMention {
    pub fn new(sentence: usize, start: usize, end: usize) -> Self {
        Self {
            sentence,
            start,
            end,
        }
    }
}

/// Cadeia de menções que se referem à mesma entidade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorefChain {
    pub representative: CorefMention,
    /// Menções em ordem textual.
    pub mentions: Vec<CorefMention>,
}

/// Anotações brutas de uma sentença.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceAnnotations {
    pub tokens: Vec<RawToken>,
    #[serde(default)]
    pub dependencies: Option<DependencyGraph>,
    /// Probabilidades das classes de sentimento, em ordem de classe.
    #[serde(default)]
    pub sentiment: Option<Vec<f64>>,
    #[serde(default)]
    pub relations: Vec<RelationMention>,
}

impl SentenceAnnotations {
    pub fn new(tokens: Vec<RawToken>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }
}

/// Documento completo produzido pelo motor de anotação.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    #[serde(default)]
    pub sentences: Vec<SentenceAnnotations>,
    /// Cadeias de correferência por id.
    #[serde(default)]
    pub coref_chains: BTreeMap<u32, CorefChain>,
}
