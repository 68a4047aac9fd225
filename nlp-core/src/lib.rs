//! # nlp-core — Projeção de Anotações Linguísticas em um Modelo de Spans
//!
//! Motores de NLP externos produzem, para um texto, tokens com POS/NER/lema,
//! grafos de dependência, distribuições de sentimento, relações entre
//! entidades e cadeias de correferência. Este crate projeta essa saída
//! heterogênea sobre um único modelo uniforme: o [`AnalysedText`], um texto
//! com spans em camadas (sentença ⊃ chunk ⊃ token), cada span carregando
//! anotações tipadas.
//!
//! ## Fluxo
//!
//! 1.  **Entrada**: texto bruto + [`AnnotatedDocument`] (ou um
//!     [`AnnotationEngine`] registrado no [`Analyzer`]).
//! 2.  **Tags** ([`registry`], [`tagset`]): rótulos brutos viram tags
//!     canônicas do idioma ou, na falta delas, tags ad-hoc compartilhadas.
//! 3.  **Projeção** ([`pipeline`]): tokens, entidades fundidas ([`chunker`]),
//!     lemas, dependências, sentimento ([`sentiment`]),
//!     relações e correferência.
//! 4.  **Saída**: [`AnalysedText`].
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use nlp_core::{AnnotatedDocument, Projector, ProjectorConfig, RawToken, SentenceAnnotations, TagSetRegistry};
//!
//! let projector = Projector::new(Arc::new(TagSetRegistry::with_defaults()), ProjectorConfig::default());
//! let doc = AnnotatedDocument {
//!     sentences: vec![SentenceAnnotations::new(vec![
//!         RawToken::new(0, 3).with_pos("NNP").with_ner("PER"),
//!         RawToken::new(4, 9).with_pos("NNP").with_ner("PERSON"),
//!     ])],
//!     ..AnnotatedDocument::default()
//! };
//!
//! let at = projector.project("en", "Ada Byron", &doc).unwrap();
//! let chunk = at.chunks()[0];
//! assert_eq!(at.span_text(chunk.id), Some("Ada Byron"));
//! assert_eq!(chunk.ner().unwrap().tag, "PERSON");
//! ```

pub mod analyzer;
pub mod annotation;
pub mod chunker;
pub mod config;
mod coref;
mod dependency;
pub mod document;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod registry;
mod relation;
pub mod sentiment;
pub mod tagset;

pub use analyzer::{Analyzer, AnnotationEngine, EngineError};
pub use annotation::{
    Annotation, AnnotationKind, CorefFeature, DependencyRelation, EntityRelation, MorphoFeatures,
};
pub use config::{ProjectorConfig, SentimentWeighting};
pub use document::{
    AnnotatedDocument, CorefChain, CorefMention, DependencyEdge, DependencyGraph, EntityMention,
    RawToken, RelationMention, SentenceAnnotations,
};
pub use error::{Error, Result};
pub use model::{AnalysedText, Span, SpanId, SpanKind};
pub use pipeline::Projector;
pub use registry::{TagResolver, TagSetRegistry};
pub use tagset::{same_tag, LanguageTagSets, Tag, TagKind, TagRef, TagSet};
