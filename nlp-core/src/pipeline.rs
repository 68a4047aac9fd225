//! # Projetor — Orquestrador da Projeção
//!
//! O [`Projector`] recebe um [`AnnotatedDocument`] (saída do motor externo) e
//! preenche um [`AnalysedText`]. A passada é estritamente sequencial:
//!
//! 1. **Por sentença, por token**: span do token, POS, NER (fusão em chunks),
//!    lema e dependências.
//! 2. **Por sentença**: span da sentença, sentimento e relações.
//! 3. **Por documento**: cadeias de correferência, depois que todos os spans
//!    já existem.
//!
//! Anomalias de token (comprimento não positivo), de aresta ou de tag são
//! registradas em log e ignoradas; referências inconsistentes no documento
//! abortam a projeção com erro.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::annotation::{Annotation, MorphoFeatures};
use crate::chunker::{ClosedRun, NerChunker};
use crate::config::ProjectorConfig;
use crate::coref;
use crate::dependency;
use crate::document::{AnnotatedDocument, RawToken, SentenceAnnotations};
use crate::error::Result;
use crate::model::AnalysedText;
use crate::registry::{TagResolver, TagSetRegistry};
use crate::relation;
use crate::sentiment::SentimentAggregator;
use crate::tagset::TagKind;

/// Projeta documentos pré-anotados no modelo de spans.
///
/// Compartilhável entre threads: o único estado mutável é o registro de
/// tags, que já é seguro para acesso concorrente.
#[derive(Debug, Clone)]
pub struct Projector {
    registry: Arc<TagSetRegistry>,
    config: ProjectorConfig,
}

impl Projector {
    pub fn new(registry: Arc<TagSetRegistry>, config: ProjectorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<TagSetRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Executa a projeção completa de um documento.
    pub fn project(
        &self,
        language: &str,
        text: &str,
        document: &AnnotatedDocument,
    ) -> Result<AnalysedText> {
        let resolver = self.registry.resolver(language)?;
        let mut at = AnalysedText::new(text);
        let mut sentiment = SentimentAggregator::new(&self.config.sentiment);
        let dependencies = dependency::enabled(&resolver, &self.config);
        if !dependencies {
            debug!(
                "Sem tagset de relações gramaticais para '{}': dependências ignoradas",
                resolver.language()
            );
        }

        for (idx, sentence) in document.sentences.iter().enumerate() {
            self.project_sentence(
                &mut at,
                &resolver,
                &mut sentiment,
                sentence,
                idx,
                dependencies,
            )?;
        }

        coref::project_chains(&mut at, &document.sentences, &document.coref_chains)?;
        Ok(at)
    }

    fn project_sentence(
        &self,
        at: &mut AnalysedText,
        resolver: &TagResolver,
        sentiment: &mut SentimentAggregator<'_>,
        sentence: &SentenceAnnotations,
        sentence_idx: usize,
        dependencies: bool,
    ) -> Result<()> {
        let tokens = &sentence.tokens;
        let graph = sentence.dependencies.as_ref().filter(|_| dependencies);
        let mut chunker: NerChunker<usize> = NerChunker::new();
        let mut bounds: Option<(usize, usize)> = None;

        for (i, raw) in tokens.iter().enumerate() {
            if !raw.is_valid() {
                warn!(
                    "Token ilegal start:{}/end:{} -> ignorado",
                    raw.start, raw.end
                );
                continue;
            }
            let token = at.add_token(raw.start, raw.end)?;
            bounds = Some(match bounds {
                None => (raw.start, raw.end),
                Some((start, _)) => (start, raw.end),
            });

            let pos_tag = match non_empty(&raw.pos) {
                Some(pos) => {
                    let tag = resolver.resolve(TagKind::Pos, pos)?;
                    at.add_annotation(token, Annotation::Pos(Arc::clone(&tag)))?;
                    Some(tag)
                }
                None => None,
            };
            debug!(
                " > '{}' pos: {:?}",
                at.span_text(token).unwrap_or_default(),
                pos_tag.as_ref().map(|t| t.tag.as_str())
            );

            let ner_tag = match non_empty(&raw.ner) {
                Some(ne) if ne != self.config.no_entity_marker => {
                    Some(resolver.resolve(TagKind::Ner, ne)?)
                }
                _ => None,
            };
            if let Some(run) = chunker.push(i, ner_tag) {
                add_ner_chunk(at, tokens, run)?;
            }

            if let Some(lemma) = non_empty(&raw.lemma) {
                if at.span_text(token) != Some(lemma) {
                    let morpho = MorphoFeatures {
                        lemma: lemma.to_string(),
                        pos: pos_tag,
                    };
                    at.add_annotation(token, Annotation::Morpho(morpho))?;
                }
            }

            if let Some(graph) = graph {
                dependency::project_token(at, resolver, &self.config, graph, tokens, token, i + 1)?;
            }
        }
        if let Some(run) = chunker.finish() {
            add_ner_chunk(at, tokens, run)?;
        }

        let Some((start, end)) = bounds else {
            warn!(
                "Sentença {} sem tokens válidos -> sentimento e relações ignorados",
                sentence_idx + 1
            );
            return Ok(());
        };
        let sent = at.add_sentence(start, end)?;

        if let Some(probabilities) = &sentence.sentiment {
            if let Some(value) = sentiment.sentiment(probabilities) {
                at.add_annotation(sent, Annotation::Sentiment(value))?;
            }
        }

        relation::project_relations(at, &self.config, tokens, &sentence.relations, sent)?;
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Cria o chunk de uma entidade fechada pela máquina de estados.
fn add_ner_chunk(at: &mut AnalysedText, tokens: &[RawToken], run: ClosedRun<usize>) -> Result<()> {
    let ClosedRun { start, end, tag } = run;
    let chunk = at.add_chunk(tokens[start].start, tokens[end].end)?;
    debug!(" - entidade {:?} | tag: {}", at.span_text(chunk), tag.tag);
    at.add_annotation(chunk, Annotation::Ner(tag))
}
