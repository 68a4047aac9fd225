//! # Fusão de Entidades Nomeadas
//!
//! Máquina de estados que percorre os tokens de uma sentença e agrupa tokens
//! contíguos com a **mesma** tag NER em um único chunk.
//!
//! ```text
//!          tag X                      tag X
//!   Idle ─────────▶ InRun(X) ──────────────▶ InRun(X)  (estende o fim)
//!    ▲                 │
//!    │  nenhuma tag    │ tag Y ≠ X: fecha X, abre Y
//!    └─────────────────┘
//! ```
//!
//! A igualdade é a identidade da tag resolvida ([`same_tag`]): rótulos brutos
//! diferentes que resolvem para a mesma tag canônica se fundem; tags
//! diferentes nunca se fundem, mesmo adjacentes.
//!
//! A máquina não conhece o modelo de spans: `H` é qualquer handle de token.

use crate::tagset::{same_tag, TagRef};

#[derive(Debug, Clone)]
pub enum RunState<H> {
    Idle,
    InRun { start: H, end: H, tag: TagRef },
}

impl<H> Default for RunState<H> {
    fn default() -> Self {
        RunState::Idle
    }
}

/// Sequência de tokens fechada com a tag comum.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedRun<H> {
    pub start: H,
    pub end: H,
    pub tag: TagRef,
}

#[derive(Debug, Clone)]
pub struct NerChunker<H> {
    state: RunState<H>,
}

impl<H: Copy> Default for NerChunker<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy> NerChunker<H> {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> &RunState<H> {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, RunState::Idle)
    }

    /// Processa o próximo token; devolve a sequência fechada por ele, se houver.
    pub fn push(&mut self, token: H, tag: Option<TagRef>) -> Option<ClosedRun<H>> {
        let mut closed = None;
        if let RunState::InRun { tag: run_tag, .. } = &self.state {
            let same = tag.as_ref().map_or(false, |t| same_tag(t, run_tag));
            if !same {
                closed = self.finish();
            }
        }
        if let Some(tag) = tag {
            self.state = match std::mem::take(&mut self.state) {
                RunState::Idle => RunState::InRun {
                    start: token,
                    end: token,
                    tag,
                },
                RunState::InRun { start, .. } => RunState::InRun {
                    start,
                    end: token,
                    tag,
                },
            };
        }
        closed
    }

    /// Fecha a sequência aberta (fim da sentença).
    pub fn finish(&mut self) -> Option<ClosedRun<H>> {
        match std::mem::take(&mut self.state) {
            RunState::Idle => None,
            RunState::InRun { start, end, tag } => Some(ClosedRun { start, end, tag }),
        }
    }
}
