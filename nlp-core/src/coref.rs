//! # Projeção de Correferência
//!
//! Cada cadeia com duas ou mais menções gera, em **todas** as suas menções,
//! uma [`CorefFeature`] com os spans das outras menções. Cadeias com uma
//! única menção contêm apenas a menção representativa e são ignoradas.
//! Menções sobre tokens inválidos (já descartados na projeção dos tokens)
//! são ignoradas com aviso; a regra das duas menções vale para as restantes.
//!
//! Executado depois de todas as sentenças: os spans referenciados são os
//! mesmos (get-or-create) criados durante a projeção de tokens e entidades.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::annotation::{Annotation, CorefFeature};
use crate::document::{CorefChain, CorefMention, SentenceAnnotations};
use crate::error::{Error, Result};
use crate::model::{AnalysedText, SpanId};

/// Span de uma menção: token se cobre um único token, chunk caso contrário.
///
/// `None` se a menção não cobre nenhum caractere.
pub(crate) fn mention_span(
    at: &mut AnalysedText,
    sentences: &[SentenceAnnotations],
    mention: &CorefMention,
) -> Result<Option<SpanId>> {
    let sentence = mention
        .sentence
        .checked_sub(1)
        .and_then(|i| sentences.get(i))
        .ok_or_else(|| {
            Error::invalid_document(format!(
                "menção referencia a sentença {} de {}",
                mention.sentence,
                sentences.len()
            ))
        })?;
    let tokens = &sentence.tokens;
    if mention.start == 0 || mention.end <= mention.start || mention.end - 1 > tokens.len() {
        return Err(Error::invalid_document(format!(
            "menção com tokens [{}, {}) inválida para sentença {} com {} tokens",
            mention.start,
            mention.end,
            mention.sentence,
            tokens.len()
        )));
    }
    let first = &tokens[mention.start - 1];
    let last = &tokens[mention.end - 2];
    if first.start >= last.end {
        warn!(
            "Menção de correferência com start:{}/end:{} inválida -> ignorada",
            first.start, last.end
        );
        return Ok(None);
    }
    let span = if mention.end - mention.start > 1 {
        at.add_chunk(first.start, last.end)?
    } else {
        at.add_token(first.start, last.end)?
    };
    Ok(Some(span))
}

/// Anexa as features de correferência de todas as cadeias.
pub(crate) fn project_chains(
    at: &mut AnalysedText,
    sentences: &[SentenceAnnotations],
    chains: &BTreeMap<u32, CorefChain>,
) -> Result<()> {
    for (id, chain) in chains {
        if chain.mentions.len() < 2 {
            continue;
        }
        let mut mentions: Vec<(&CorefMention, SpanId)> = Vec::with_capacity(chain.mentions.len());
        for mention in &chain.mentions {
            if let Some(span) = mention_span(at, sentences, mention)? {
                mentions.push((mention, span));
            }
        }
        if mentions.len() < 2 {
            debug!(" - coref #{}: menos de duas menções válidas -> ignorada", id);
            continue;
        }

        for &(mention, span) in &mentions {
            let siblings: BTreeSet<SpanId> = mentions
                .iter()
                .filter(|(other, _)| *other != mention)
                .map(|(_, s)| *s)
                .collect();
            let is_representative = *mention == chain.representative;
            debug!(" - coref #{} {:?} repr={} siblings={}", id, span, is_representative, siblings.len());
            at.add_annotation(
                span,
                Annotation::Coref(CorefFeature {
                    is_representative,
                    mentions: siblings,
                }),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawToken;
    use crate::model::SpanKind;

    // "Barack Obama was born in Hawaii. He was elected president."
    fn sentences() -> Vec<SentenceAnnotations> {
        vec![
            SentenceAnnotations::new(vec![
                RawToken::new(0, 6),
                RawToken::new(7, 12),
                RawToken::new(13, 16),
                RawToken::new(17, 21),
                RawToken::new(22, 24),
                RawToken::new(25, 31),
                RawToken::new(31, 32),
            ]),
            SentenceAnnotations::new(vec![
                RawToken::new(33, 35),
                RawToken::new(36, 39),
                RawToken::new(40, 47),
                RawToken::new(48, 57),
                RawToken::new(57, 58),
            ]),
        ]
    }

    const TEXT: &str = "Barack Obama was born in Hawaii. He was elected president.";

    #[test]
    fn test_mention_spans() {
        let mut at = AnalysedText::new(TEXT);
        let sents = sentences();
        let obama = mention_span(&mut at, &sents, &CorefMention::new(1, 1, 3)).unwrap().unwrap();
        let he = mention_span(&mut at, &sents, &CorefMention::new(2, 1, 2)).unwrap().unwrap();
        assert_eq!(at.get(obama).unwrap().kind, SpanKind::Chunk);
        assert_eq!(at.span_text(obama), Some("Barack Obama"));
        assert_eq!(at.get(he).unwrap().kind, SpanKind::Token);
        assert_eq!(at.span_text(he), Some("He"));
    }

    #[test]
    fn test_invalid_mentions() {
        let mut at = AnalysedText::new(TEXT);
        let sents = sentences();
        for m in [
            CorefMention::new(0, 1, 2),
            CorefMention::new(3, 1, 2),
            CorefMention::new(1, 0, 1),
            CorefMention::new(1, 2, 2),
            CorefMention::new(2, 5, 7),
        ] {
            assert!(matches!(
                mention_span(&mut at, &sents, &m),
                Err(Error::InvalidDocument(_))
            ));
        }
    }

    #[test]
    fn test_chain_symmetry() {
        let mut at = AnalysedText::new(TEXT);
        let sents = sentences();
        let obama = CorefMention::new(1, 1, 3);
        let he = CorefMention::new(2, 1, 2);
        let president = CorefMention::new(2, 4, 5);
        let mut chains = BTreeMap::new();
        chains.insert(
            7,
            CorefChain {
                representative: obama,
                mentions: vec![obama, he, president],
            },
        );
        project_chains(&mut at, &sents, &chains).unwrap();

        let ids: Vec<SpanId> = [obama, he, president]
            .iter()
            .map(|m| mention_span(&mut at, &sents, m).unwrap().unwrap())
            .collect();
        let mut representatives = 0;
        for (i, id) in ids.iter().enumerate() {
            let features: Vec<&CorefFeature> = at.get(*id).unwrap().coref().collect();
            assert_eq!(features.len(), 1);
            let expected: BTreeSet<SpanId> =
                ids.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, s)| *s).collect();
            assert_eq!(features[0].mentions, expected);
            if features[0].is_representative {
                representatives += 1;
            }
        }
        assert_eq!(representatives, 1);
        assert!(at.get(ids[0]).unwrap().coref().next().unwrap().is_representative);
    }

    #[test]
    fn test_degenerate_mentions_dropped() {
        // "Ann me", com um token vazio entre as palavras
        let sents = vec![SentenceAnnotations::new(vec![
            RawToken::new(0, 3),
            RawToken::new(3, 3),
            RawToken::new(4, 6),
        ])];
        let ann = CorefMention::new(1, 1, 2);
        let empty = CorefMention::new(1, 2, 3);
        let me = CorefMention::new(1, 3, 4);

        let mut at = AnalysedText::new("Ann me");
        assert_eq!(mention_span(&mut at, &sents, &empty).unwrap(), None);

        let mut chains = BTreeMap::new();
        chains.insert(1, CorefChain { representative: ann, mentions: vec![ann, empty, me] });
        chains.insert(2, CorefChain { representative: empty, mentions: vec![empty, me] });
        project_chains(&mut at, &sents, &chains).unwrap();

        let ann_span = at.find(SpanKind::Token, 0, 3).unwrap();
        let me_span = at.find(SpanKind::Token, 4, 6).unwrap();
        let ann_coref: Vec<&CorefFeature> = at.get(ann_span).unwrap().coref().collect();
        let me_coref: Vec<&CorefFeature> = at.get(me_span).unwrap().coref().collect();
        // a cadeia 2 fica com uma única menção válida
        assert_eq!(ann_coref.len(), 1);
        assert_eq!(me_coref.len(), 1);
        assert!(ann_coref[0].is_representative);
        assert_eq!(ann_coref[0].mentions, BTreeSet::from([me_span]));
        assert_eq!(me_coref[0].mentions, BTreeSet::from([ann_span]));
        assert_eq!(at.len(), 2);
    }

    #[test]
    fn test_singleton_chain_ignored() {
        let mut at = AnalysedText::new(TEXT);
        let sents = sentences();
        let obama = CorefMention::new(1, 1, 3);
        let mut chains = BTreeMap::new();
        chains.insert(
            1,
            CorefChain {
                representative: obama,
                mentions: vec![obama],
            },
        );
        project_chains(&mut at, &sents, &chains).unwrap();
        assert!(at.is_empty());
    }
}
