//! # Projeção de Dependências
//!
//! Para cada token presente no grafo da sentença, as arestas de entrada e de
//! saída viram anotações [`DependencyRelation`] no próprio token:
//!
//! - token governante: parceiro = dependente, `is_dependent = false`;
//! - token dependente: parceiro = governante, `is_dependent = true`.
//!
//! Um token raiz recebe ainda uma relação `root` sem parceiro. O span parceiro
//! é obtido com o mesmo get-or-create do modelo, logo é o mesmo span do token.

use tracing::{debug, warn};

use crate::annotation::{Annotation, DependencyRelation};
use crate::config::ProjectorConfig;
use crate::document::{DependencyGraph, RawToken};
use crate::error::{Error, Result};
use crate::model::{AnalysedText, SpanId};
use crate::registry::TagResolver;
use crate::tagset::{TagKind, TagRef};

/// Resolve o rótulo da relação gramatical segundo o modo configurado.
fn relation_tag(resolver: &TagResolver, config: &ProjectorConfig, label: &str) -> Option<TagRef> {
    if label.is_empty() {
        return None;
    }
    if config.strict_dependency_tags {
        resolver.canonical(TagKind::Dependency, label)
    } else {
        resolver.resolve(TagKind::Dependency, label).ok()
    }
}

/// `true` se as dependências podem ser projetadas para o idioma.
pub(crate) fn enabled(resolver: &TagResolver, config: &ProjectorConfig) -> bool {
    !config.strict_dependency_tags || resolver.has_canonical(TagKind::Dependency)
}

/// Anexa ao `token` (posição 1-based `index` na sentença) as relações do grafo.
pub(crate) fn project_token(
    at: &mut AnalysedText,
    resolver: &TagResolver,
    config: &ProjectorConfig,
    graph: &DependencyGraph,
    tokens: &[RawToken],
    token: SpanId,
    index: usize,
) -> Result<()> {
    if !graph.contains(index) {
        // normalmente pontuação
        return Ok(());
    }

    for edge in graph.incident(index) {
        let (partner_index, is_dependent) = if edge.governor == index {
            (edge.dependent, false)
        } else {
            (edge.governor, true)
        };
        if partner_index == 0 {
            // aresta da raiz virtual: tratada abaixo
            continue;
        }
        let Some(tag) = relation_tag(resolver, config, &edge.relation) else {
            warn!("Relação gramatical sem tag para '{}'!", edge.relation);
            continue;
        };
        let partner = tokens.get(partner_index - 1).ok_or_else(|| {
            Error::invalid_document(format!(
                "aresta {} -> {} referencia o token {} de uma sentença com {} tokens",
                edge.governor,
                edge.dependent,
                partner_index,
                tokens.len()
            ))
        })?;
        if !partner.is_valid() {
            warn!(
                "Parceiro de dependência com start:{}/end:{} inválido -> ignorado",
                partner.start, partner.end
            );
            continue;
        }
        let partner = at.add_token(partner.start, partner.end)?;
        debug!(" - dep {} [{}] partner {:?}", tag.tag, if is_dependent { "dep" } else { "gov" }, partner);
        at.add_annotation(
            token,
            Annotation::Dependency(DependencyRelation {
                tag,
                is_dependent,
                partner: Some(partner),
            }),
        )?;
    }

    if graph.is_root(index) {
        let root = match resolver.canonical(TagKind::Dependency, &config.root_relation) {
            Some(tag) => tag,
            None => resolver.resolve(TagKind::Dependency, &config.root_relation)?,
        };
        at.add_annotation(
            token,
            Annotation::Dependency(DependencyRelation {
                tag: root,
                is_dependent: false,
                partner: None,
            }),
        )?;
    }
    Ok(())
}
