//! # Projeção de Relações entre Entidades
//!
//! Cada menção de relação de uma sentença (exceto o marcador de
//! "não-relação", `_NR` por padrão) vira uma [`EntityRelation`] anexada ao
//! span da sentença. A confiança é a probabilidade que o extrator atribuiu
//! ao próprio tipo da relação.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::annotation::{Annotation, EntityRelation};
use crate::config::ProjectorConfig;
use crate::document::{EntityMention, RawToken, RelationMention};
use crate::error::{Error, Result};
use crate::model::{AnalysedText, SpanId};

/// Span de um argumento: chunk se cobre mais de um token, token caso contrário.
///
/// `None` se o argumento não cobre nenhum caractere.
fn argument_span(
    at: &mut AnalysedText,
    tokens: &[RawToken],
    arg: &EntityMention,
) -> Result<Option<SpanId>> {
    if arg.start >= arg.end {
        warn!("Argumento de relação vazio [{}, {}) -> ignorado", arg.start, arg.end);
        return Ok(None);
    }
    if arg.end > tokens.len() {
        return Err(Error::invalid_document(format!(
            "argumento de relação [{}, {}) fora da sentença com {} tokens",
            arg.start,
            arg.end,
            tokens.len()
        )));
    }
    let first = &tokens[arg.start];
    let last = &tokens[arg.end - 1];
    if first.start >= last.end {
        warn!(
            "Argumento de relação com start:{}/end:{} inválido -> ignorado",
            first.start, last.end
        );
        return Ok(None);
    }
    let span = if arg.end - arg.start > 1 {
        at.add_chunk(first.start, last.end)?
    } else {
        at.add_token(first.start, last.end)?
    };
    Ok(Some(span))
}

/// Anexa à `sentence` uma anotação por menção de relação.
pub(crate) fn project_relations(
    at: &mut AnalysedText,
    config: &ProjectorConfig,
    tokens: &[RawToken],
    relations: &[RelationMention],
    sentence: SpanId,
) -> Result<()> {
    for relation in relations {
        if relation.relation_type == config.non_relation_marker {
            continue;
        }
        let confidence = relation
            .type_probabilities
            .get(&relation.relation_type)
            .copied()
            .unwrap_or(0.0);

        let mut entities = BTreeSet::new();
        for arg in &relation.arguments {
            if let Some(span) = argument_span(at, tokens, arg)? {
                entities.insert(span);
            }
        }
        debug!(
            " - relação {} ({:.2}) entre {} entidades",
            relation.relation_type,
            confidence,
            entities.len()
        );
        at.add_annotation(
            sentence,
            Annotation::EntityRelation(EntityRelation {
                relation_type: relation.relation_type.clone(),
                confidence,
                entities,
            }),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpanKind;
    use std::collections::HashMap;

    const TEXT: &str = "Steve Jobs lived in Palo Alto";

    fn tokens() -> Vec<RawToken> {
        vec![
            RawToken::new(0, 5),
            RawToken::new(6, 10),
            RawToken::new(11, 16),
            RawToken::new(17, 19),
            RawToken::new(20, 24),
            RawToken::new(25, 29),
        ]
    }

    fn mention(kind: &str, probs: &[(&str, f64)], args: &[(usize, usize)]) -> RelationMention {
        RelationMention {
            relation_type: kind.to_string(),
            type_probabilities: probs
                .iter()
                .map(|(k, p)| (k.to_string(), *p))
                .collect::<HashMap<_, _>>(),
            arguments: args
                .iter()
                .map(|&(start, end)| EntityMention { start, end })
                .collect(),
        }
    }

    #[test]
    fn test_confidence_is_own_type_probability() {
        let mut at = AnalysedText::new(TEXT);
        let sent = at.add_sentence(0, 29).unwrap();
        let rel = mention(
            "Located_In",
            &[("Located_In", 0.83), ("Live_In", 0.1), ("_NR", 0.07)],
            &[(0, 2), (4, 6)],
        );
        project_relations(&mut at, &ProjectorConfig::default(), &tokens(), &[rel], sent).unwrap();

        let rels: Vec<&EntityRelation> = at.get(sent).unwrap().relations().collect();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relation_type, "Located_In");
        assert!((rels[0].confidence - 0.83).abs() < 1e-12);

        let jobs = at.find(SpanKind::Chunk, 0, 10).unwrap();
        let palo_alto = at.find(SpanKind::Chunk, 20, 29).unwrap();
        let expected: BTreeSet<SpanId> = [jobs, palo_alto].into_iter().collect();
        assert_eq!(rels[0].entities, expected);
    }

    #[test]
    fn test_non_relation_skipped() {
        let mut at = AnalysedText::new(TEXT);
        let sent = at.add_sentence(0, 29).unwrap();
        let rel = mention("_NR", &[("_NR", 0.99)], &[(0, 1), (5, 6)]);
        project_relations(&mut at, &ProjectorConfig::default(), &tokens(), &[rel], sent).unwrap();
        assert_eq!(at.get(sent).unwrap().relations().count(), 0);
        // nenhum span de argumento criado
        assert_eq!(at.len(), 1);
    }

    #[test]
    fn test_single_token_arguments_and_duplicates() {
        let mut at = AnalysedText::new(TEXT);
        let sent = at.add_sentence(0, 29).unwrap();
        let rels = vec![
            mention("Live_In", &[("Live_In", 0.6)], &[(1, 2), (1, 2), (5, 6)]),
            mention("Work_For", &[], &[(0, 2), (5, 6)]),
        ];
        project_relations(&mut at, &ProjectorConfig::default(), &tokens(), &rels, sent).unwrap();

        let out: Vec<&EntityRelation> = at.get(sent).unwrap().relations().collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].entities.len(), 2);
        assert!(out[0]
            .entities
            .contains(&at.find(SpanKind::Token, 6, 10).unwrap()));
        assert_eq!(out[1].confidence, 0.0);
    }

    #[test]
    fn test_argument_out_of_range() {
        let mut at = AnalysedText::new(TEXT);
        let sent = at.add_sentence(0, 29).unwrap();
        let rel = mention("Live_In", &[], &[(5, 7)]);
        let err = project_relations(&mut at, &ProjectorConfig::default(), &tokens(), &[rel], sent)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }
}
