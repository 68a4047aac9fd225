//! # Tags e Vocabulários (TagSets)
//!
//! Uma [`Tag`] identifica uma categoria linguística canônica (classe gramatical,
//! tipo de entidade ou relação gramatical). Tags canônicas pertencem a um
//! [`TagSet`] fechado por idioma; rótulos desconhecidos viram tags *ad-hoc*
//! (ver [`crate::registry`]).
//!
//! ## Formato de configuração
//!
//! Tagsets adicionais são carregados de JSON:
//!
//! ```json
//! {
//!   "languages": {
//!     "de": {
//!       "pos": { "name": "STTS", "tags": [{ "tag": "NN", "category": "Noun" }] },
//!       "ner": { "name": "CoNLL", "tags": [{ "tag": "I-PER", "category": "Person", "aliases": ["PER"] }] }
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dimensão de anotação a que uma tag pertence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    /// Classe gramatical (POS).
    Pos,
    /// Tipo de entidade nomeada.
    Ner,
    /// Relação gramatical de dependência.
    Dependency,
}

impl TagKind {
    pub fn name(&self) -> &'static str {
        match self {
            TagKind::Pos => "POS",
            TagKind::Ner => "NER",
            TagKind::Dependency => "dependency",
        }
    }

    pub fn all() -> [TagKind; 3] {
        [TagKind::Pos, TagKind::Ner, TagKind::Dependency]
    }
}

/// Tag canônica ou ad-hoc.
///
/// Tags são compartilhadas via [`TagRef`]; a igualdade usada na fusão de
/// entidades é a identidade do `Arc` (ver [`same_tag`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Rótulo (ex: "NN", "PERSON", "nsubj").
    pub tag: String,
    pub kind: TagKind,
    /// Categoria independente de idioma (ex: "Noun", "Person").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `true` se a tag foi criada em tempo de execução para um rótulo desconhecido.
    #[serde(default)]
    pub adhoc: bool,
}

/// Referência compartilhada para uma tag.
pub type TagRef = Arc<Tag>;

impl Tag {
    pub fn new(kind: TagKind, tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            kind,
            category: None,
            adhoc: false,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Tag "nua" criada para um rótulo que nenhum tagset conhece.
    pub(crate) fn adhoc(kind: TagKind, tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            kind,
            category: None,
            adhoc: true,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.category {
            Some(cat) => write!(f, "{} ({})", self.tag, cat),
            None => write!(f, "{}", self.tag),
        }
    }
}

/// Identidade de tag: duas referências são a mesma tag se apontam para a mesma instância.
pub fn same_tag(a: &TagRef, b: &TagRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// Vocabulário fechado de tags canônicas para uma dimensão de anotação.
///
/// Vários rótulos externos podem apontar para a mesma tag (aliases).
#[derive(Debug, Clone)]
pub struct TagSet {
    name: String,
    kind: TagKind,
    tags: HashMap<String, TagRef>,
}

impl TagSet {
    pub fn new(name: impl Into<String>, kind: TagKind) -> Self {
        Self {
            name: name.into(),
            kind,
            tags: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// Registra uma tag sob o próprio rótulo e retorna a referência canônica.
    pub fn add(&mut self, tag: Tag) -> Result<TagRef> {
        if tag.kind != self.kind {
            return Err(Error::config(format!(
                "tag '{}' ({}) não pertence ao tagset {} ({})",
                tag.tag,
                tag.kind.name(),
                self.name,
                self.kind.name()
            )));
        }
        let key = tag.tag.clone();
        let tag = Arc::new(tag);
        self.tags.insert(key, Arc::clone(&tag));
        Ok(tag)
    }

    /// Faz `alias` resolver para a tag já registrada `canonical`.
    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: &str) -> Result<()> {
        let tag = self.tags.get(canonical).cloned().ok_or_else(|| {
            Error::config(format!(
                "alias para tag desconhecida '{}' no tagset {}",
                canonical, self.name
            ))
        })?;
        self.tags.insert(alias.into(), tag);
        Ok(())
    }

    pub fn get(&self, raw: &str) -> Option<&TagRef> {
        self.tags.get(raw)
    }

    /// Todos os rótulos reconhecidos, incluindo aliases.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Número de rótulos reconhecidos (incluindo aliases).
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    fn from_entry(kind: TagKind, entry: &TagSetEntry) -> Result<Self> {
        let mut set = TagSet::new(entry.name.clone(), kind);
        for t in &entry.tags {
            if t.tag.is_empty() {
                return Err(Error::config(format!("rótulo vazio no tagset {}", entry.name)));
            }
            let mut tag = Tag::new(kind, t.tag.clone());
            tag.category = t.category.clone();
            set.add(tag)?;
            for alias in &t.aliases {
                set.add_alias(alias.clone(), &t.tag)?;
            }
        }
        Ok(set)
    }
}

/// Os três tagsets canônicos de um idioma (qualquer um pode faltar).
#[derive(Debug, Clone, Default)]
pub struct LanguageTagSets {
    pub pos: Option<TagSet>,
    pub ner: Option<TagSet>,
    pub dependency: Option<TagSet>,
}

impl LanguageTagSets {
    pub fn get(&self, kind: TagKind) -> Option<&TagSet> {
        match kind {
            TagKind::Pos => self.pos.as_ref(),
            TagKind::Ner => self.ner.as_ref(),
            TagKind::Dependency => self.dependency.as_ref(),
        }
    }

    /// Tagsets embutidos para inglês: Penn Treebank, classes do Stanford NER
    /// e dependências básicas de Stanford.
    pub fn english() -> Self {
        Self {
            pos: Some(build_set("Penn Treebank", TagKind::Pos, PENN_TREEBANK, &[])),
            ner: Some(build_set("Stanford NER", TagKind::Ner, STANFORD_NER, NER_ALIASES)),
            dependency: Some(build_set(
                "Stanford Dependencies",
                TagKind::Dependency,
                STANFORD_DEPENDENCIES,
                &[],
            )),
        }
    }
}

fn build_set(
    name: &str,
    kind: TagKind,
    tags: &[(&str, &str)],
    aliases: &[(&str, &str)],
) -> TagSet {
    let mut set = TagSet::new(name, kind);
    for (tag, category) in tags {
        let key = tag.to_string();
        set.tags
            .insert(key, Arc::new(Tag::new(kind, *tag).with_category(*category)));
    }
    for (alias, canonical) in aliases {
        if let Some(tag) = set.tags.get(*canonical).cloned() {
            set.tags.insert(alias.to_string(), tag);
        }
    }
    set
}

// --- Formato JSON --------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub tag: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagSetEntry {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<TagEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageTagSetsEntry {
    #[serde(default)]
    pub pos: Option<TagSetEntry>,
    #[serde(default)]
    pub ner: Option<TagSetEntry>,
    #[serde(default)]
    pub dependency: Option<TagSetEntry>,
}

/// Conteúdo de um arquivo de tagsets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagSetFile {
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageTagSetsEntry>,
}

impl TagSetFile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converte o arquivo em tagsets prontos para registro.
    pub fn build(&self) -> Result<Vec<(String, LanguageTagSets)>> {
        self.languages
            .iter()
            .map(|(lang, entry)| {
                let sets = LanguageTagSets {
                    pos: entry
                        .pos
                        .as_ref()
                        .map(|s| TagSet::from_entry(TagKind::Pos, s))
                        .transpose()?,
                    ner: entry
                        .ner
                        .as_ref()
                        .map(|s| TagSet::from_entry(TagKind::Ner, s))
                        .transpose()?,
                    dependency: entry
                        .dependency
                        .as_ref()
                        .map(|s| TagSet::from_entry(TagKind::Dependency, s))
                        .transpose()?,
                };
                Ok((lang.clone(), sets))
            })
            .collect()
    }
}

// --- Vocabulários embutidos ----------------------------------------------

/// Penn Treebank (rótulo, categoria).
const PENN_TREEBANK: &[(&str, &str)] = &[
    ("CC", "Conjunction"),
    ("CD", "Quantifier"),
    ("DT", "Determiner"),
    ("EX", "Pronoun"),
    ("FW", "Foreign"),
    ("IN", "Adposition"),
    ("JJ", "Adjective"),
    ("JJR", "Adjective"),
    ("JJS", "Adjective"),
    ("LS", "Residual"),
    ("MD", "Verb"),
    ("NN", "Noun"),
    ("NNS", "Noun"),
    ("NNP", "Noun"),
    ("NNPS", "Noun"),
    ("PDT", "Determiner"),
    ("POS", "Residual"),
    ("PRP", "Pronoun"),
    ("PRP$", "Pronoun"),
    ("RB", "Adverb"),
    ("RBR", "Adverb"),
    ("RBS", "Adverb"),
    ("RP", "Adposition"),
    ("SYM", "Residual"),
    ("TO", "Adposition"),
    ("UH", "Interjection"),
    ("VB", "Verb"),
    ("VBD", "Verb"),
    ("VBG", "Verb"),
    ("VBN", "Verb"),
    ("VBP", "Verb"),
    ("VBZ", "Verb"),
    ("WDT", "Determiner"),
    ("WP", "Pronoun"),
    ("WP$", "Pronoun"),
    ("WRB", "Adverb"),
    ("#", "Punctuation"),
    ("$", "Punctuation"),
    ("''", "Punctuation"),
    ("``", "Punctuation"),
    ("(", "Punctuation"),
    (")", "Punctuation"),
    ("-LRB-", "Punctuation"),
    ("-RRB-", "Punctuation"),
    (",", "Punctuation"),
    (".", "Punctuation"),
    (":", "Punctuation"),
];

const STANFORD_NER: &[(&str, &str)] = &[
    ("PERSON", "Person"),
    ("LOCATION", "Place"),
    ("ORGANIZATION", "Organization"),
    ("MISC", "Misc"),
    ("DATE", "Date"),
    ("TIME", "Time"),
    ("MONEY", "Money"),
    ("PERCENT", "Percent"),
];

const NER_ALIASES: &[(&str, &str)] = &[
    ("PER", "PERSON"),
    ("LOC", "LOCATION"),
    ("ORG", "ORGANIZATION"),
];

const STANFORD_DEPENDENCIES: &[(&str, &str)] = &[
    ("root", "Root"),
    ("dep", "Dependent"),
    ("aux", "Auxiliary"),
    ("auxpass", "Auxiliary"),
    ("cop", "Auxiliary"),
    ("arg", "Argument"),
    ("agent", "Argument"),
    ("comp", "Complement"),
    ("acomp", "Complement"),
    ("ccomp", "Complement"),
    ("xcomp", "Complement"),
    ("obj", "Object"),
    ("dobj", "Object"),
    ("iobj", "Object"),
    ("pobj", "Object"),
    ("subj", "Subject"),
    ("nsubj", "Subject"),
    ("nsubjpass", "Subject"),
    ("csubj", "Subject"),
    ("csubjpass", "Subject"),
    ("xsubj", "Subject"),
    ("cc", "Coordination"),
    ("conj", "Coordination"),
    ("preconj", "Coordination"),
    ("expl", "Expletive"),
    ("mod", "Modifier"),
    ("amod", "Modifier"),
    ("appos", "Modifier"),
    ("advcl", "Modifier"),
    ("advmod", "Modifier"),
    ("vmod", "Modifier"),
    ("rcmod", "Modifier"),
    ("quantmod", "Modifier"),
    ("nn", "Modifier"),
    ("npadvmod", "Modifier"),
    ("tmod", "Modifier"),
    ("num", "Modifier"),
    ("number", "Modifier"),
    ("prep", "Modifier"),
    ("poss", "Modifier"),
    ("possessive", "Modifier"),
    ("prt", "Modifier"),
    ("neg", "Modifier"),
    ("det", "Determiner"),
    ("predet", "Determiner"),
    ("mark", "Marker"),
    ("mwe", "Multiword"),
    ("parataxis", "Parataxis"),
    ("goeswith", "Parataxis"),
    ("discourse", "Discourse"),
    ("punct", "Punctuation"),
    ("ref", "Referent"),
    ("sdep", "Dependent"),
];
