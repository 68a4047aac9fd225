//! # Anotações
//!
//! Valores tipados anexados aos spans do [`AnalysedText`](crate::model::AnalysedText).
//! Referências a outros spans (parceiro de dependência, menções
//! correferentes, argumentos de relação) são [`SpanId`]s: apenas consulta,
//! nunca posse.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::SpanId;
use crate::tagset::TagRef;

/// Tipo de anotação reconhecido pelo projetor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Pos,
    Ner,
    Morpho,
    Dependency,
    Coref,
    Sentiment,
    EntityRelation,
}

/// Lema de um token e a classe gramatical que o originou.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorphoFeatures {
    pub lemma: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<TagRef>,
}

/// Relação de dependência vista a partir do token que a carrega.
///
/// `partner == None` apenas para a relação raiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyRelation {
    pub tag: TagRef,
    /// `true` se o token anotado é o dependente da relação.
    pub is_dependent: bool,
    pub partner: Option<SpanId>,
}

/// Menção correferente: os spans das demais menções da mesma cadeia.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorefFeature {
    pub is_representative: bool,
    pub mentions: BTreeSet<SpanId>,
}

/// Relação tipada entre duas ou mais entidades de uma sentença.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRelation {
    pub relation_type: String,
    /// Probabilidade atribuída ao próprio tipo da relação, em [0, 1].
    pub confidence: f64,
    pub entities: BTreeSet<SpanId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Annotation {
    Pos(TagRef),
    Ner(TagRef),
    Morpho(MorphoFeatures),
    Dependency(DependencyRelation),
    Coref(CorefFeature),
    Sentiment(f64),
    EntityRelation(EntityRelation),
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Pos(_) => AnnotationKind::Pos,
            Annotation::Ner(_) => AnnotationKind::Ner,
            Annotation::Morpho(_) => AnnotationKind::Morpho,
            Annotation::Dependency(_) => AnnotationKind::Dependency,
            Annotation::Coref(_) => AnnotationKind::Coref,
            Annotation::Sentiment(_) => AnnotationKind::Sentiment,
            Annotation::EntityRelation(_) => AnnotationKind::EntityRelation,
        }
    }
}
