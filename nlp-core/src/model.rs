//! # Modelo de Spans em Camadas
//!
//! O [`AnalysedText`] é o contêiner onde todos os componentes do projetor
//! escrevem: o texto original e seus spans (sentenças, chunks e tokens),
//! cada um com zero ou mais [`Annotation`]s.
//!
//! ## Identidade
//!
//! Um span é identificado pelo tipo e pelo intervalo `[start, end)` de
//! caracteres. Adicionar o mesmo intervalo duas vezes devolve o span já
//! existente ("get-or-create"), de modo que tokens criados pelo projetor de
//! dependências, de correferência ou de relações são sempre os mesmos.
//!
//! Offsets contam caracteres Unicode (não bytes).

use std::collections::HashMap;

use serde::Serialize;

use crate::annotation::{
    Annotation, AnnotationKind, CorefFeature, DependencyRelation, EntityRelation, MorphoFeatures,
};
use crate::error::{Error, Result};
use crate::tagset::TagRef;

/// Handle para um span de um [`AnalysedText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SpanId(usize);

impl SpanId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Tipo estrutural do span. A ordem define o desempate em ordem de documento
/// (o span que envolve vem antes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Sentence,
    Chunk,
    Token,
}

#[derive(Debug, Clone, Serialize)]
pub struct Span {
    pub id: SpanId,
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
    pub annotations: Vec<Annotation>,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// `true` se `other` está contido neste span.
    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn annotations_of(&self, kind: AnnotationKind) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.kind() == kind)
    }

    pub fn pos(&self) -> Option<&TagRef> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Pos(tag) => Some(tag),
            _ => None,
        })
    }

    pub fn ner(&self) -> Option<&TagRef> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Ner(tag) => Some(tag),
            _ => None,
        })
    }

    pub fn morpho(&self) -> Option<&MorphoFeatures> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Morpho(m) => Some(m),
            _ => None,
        })
    }

    pub fn sentiment(&self) -> Option<f64> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Sentiment(v) => Some(*v),
            _ => None,
        })
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &DependencyRelation> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::Dependency(d) => Some(d),
            _ => None,
        })
    }

    pub fn coref(&self) -> impl Iterator<Item = &CorefFeature> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::Coref(c) => Some(c),
            _ => None,
        })
    }

    pub fn relations(&self) -> impl Iterator<Item = &EntityRelation> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::EntityRelation(r) => Some(r),
            _ => None,
        })
    }
}

/// Texto analisado: o texto original mais todos os spans projetados.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysedText {
    text: String,
    spans: Vec<Span>,
    /// Offset em bytes de cada caractere, mais o comprimento total no fim.
    #[serde(skip)]
    byte_offsets: Vec<usize>,
    #[serde(skip)]
    index: HashMap<(SpanKind, usize, usize), SpanId>,
}

impl AnalysedText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut byte_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        byte_offsets.push(text.len());
        Self {
            text,
            spans: Vec::new(),
            byte_offsets,
            index: HashMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Comprimento do texto em caracteres.
    pub fn char_len(&self) -> usize {
        self.byte_offsets.len() - 1
    }

    pub fn add_token(&mut self, start: usize, end: usize) -> Result<SpanId> {
        self.add_span(SpanKind::Token, start, end)
    }

    pub fn add_chunk(&mut self, start: usize, end: usize) -> Result<SpanId> {
        self.add_span(SpanKind::Chunk, start, end)
    }

    pub fn add_sentence(&mut self, start: usize, end: usize) -> Result<SpanId> {
        self.add_span(SpanKind::Sentence, start, end)
    }

    /// Devolve o span existente para `(kind, start, end)` ou cria um novo.
    pub fn add_span(&mut self, kind: SpanKind, start: usize, end: usize) -> Result<SpanId> {
        if start >= end || end > self.char_len() {
            return Err(Error::InvalidSpan {
                start,
                end,
                len: self.char_len(),
            });
        }
        if let Some(id) = self.index.get(&(kind, start, end)) {
            return Ok(*id);
        }
        let id = SpanId(self.spans.len());
        self.spans.push(Span {
            id,
            kind,
            start,
            end,
            annotations: Vec::new(),
        });
        self.index.insert((kind, start, end), id);
        Ok(id)
    }

    pub fn find(&self, kind: SpanKind, start: usize, end: usize) -> Option<SpanId> {
        self.index.get(&(kind, start, end)).copied()
    }

    pub fn get(&self, id: SpanId) -> Option<&Span> {
        self.spans.get(id.0)
    }

    pub fn add_annotation(&mut self, id: SpanId, annotation: Annotation) -> Result<()> {
        let span = self
            .spans
            .get_mut(id.0)
            .ok_or_else(|| Error::invalid_input(format!("span desconhecido {:?}", id)))?;
        span.annotations.push(annotation);
        Ok(())
    }

    /// Trecho do texto coberto pelo span.
    pub fn span_text(&self, id: SpanId) -> Option<&str> {
        let span = self.get(id)?;
        let from = self.byte_offsets[span.start];
        let to = self.byte_offsets[span.end];
        Some(&self.text[from..to])
    }

    /// Número total de spans (de todos os tipos).
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Todos os spans em ordem de documento: início crescente, fim decrescente,
    /// sentença antes de chunk antes de token.
    pub fn spans(&self) -> Vec<&Span> {
        let mut spans: Vec<&Span> = self.spans.iter().collect();
        spans.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.kind.cmp(&b.kind))
        });
        spans
    }

    fn spans_of(&self, kind: SpanKind) -> Vec<&Span> {
        self.spans().into_iter().filter(|s| s.kind == kind).collect()
    }

    pub fn sentences(&self) -> Vec<&Span> {
        self.spans_of(SpanKind::Sentence)
    }

    pub fn chunks(&self) -> Vec<&Span> {
        self.spans_of(SpanKind::Chunk)
    }

    pub fn tokens(&self) -> Vec<&Span> {
        self.spans_of(SpanKind::Token)
    }

    /// Spans de um tipo contidos em `outer` (em ordem de documento).
    pub fn enclosed(&self, outer: SpanId, kind: SpanKind) -> Vec<&Span> {
        match self.get(outer) {
            Some(outer) => self
                .spans_of(kind)
                .into_iter()
                .filter(|s| s.id != outer.id && outer.encloses(s))
                .collect(),
            None => Vec::new(),
        }
    }
}
