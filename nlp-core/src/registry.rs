//! # Registro de Tagsets e Resolução de Tags
//!
//! O [`TagSetRegistry`] guarda, por idioma, os tagsets canônicos e os mapas de
//! tags ad-hoc. Ambos vivem enquanto o processo viver e são compartilhados por
//! todos os documentos projetados em paralelo.
//!
//! ## Resolução
//!
//! [`TagResolver::resolve`] segue sempre a mesma ordem:
//! 1. tagset canônico do idioma (se existir);
//! 2. mapa ad-hoc do idioma;
//! 3. cria uma tag ad-hoc nova, insere no mapa e registra em `info`.
//!
//! A inserção ad-hoc acontece sob lock de escrita após nova consulta, então o
//! mesmo rótulo nunca gera duas tags diferentes, e uma tag inserida fica
//! visível para todas as consultas seguintes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};
use crate::tagset::{LanguageTagSets, Tag, TagKind, TagRef, TagSetFile};

static LANGUAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}([-_][a-z0-9]{1,8})*$").expect("regex de idioma válida"));

/// Normaliza o código de idioma (idiomas não diferenciam maiúsculas).
pub fn normalize_language(language: &str) -> Result<String> {
    let lang = language.trim().to_lowercase();
    if lang.is_empty() {
        return Err(Error::invalid_input("o idioma não pode ser vazio"));
    }
    if !LANGUAGE_RE.is_match(&lang) {
        return Err(Error::invalid_input(format!(
            "código de idioma inválido '{}'",
            language
        )));
    }
    Ok(lang)
}

type TagMap = RwLock<HashMap<String, TagRef>>;

/// Mapas ad-hoc de um idioma, um por dimensão.
#[derive(Debug, Default)]
struct AdhocTags {
    pos: TagMap,
    ner: TagMap,
    dependency: TagMap,
}

impl AdhocTags {
    fn map(&self, kind: TagKind) -> &TagMap {
        match kind {
            TagKind::Pos => &self.pos,
            TagKind::Ner => &self.ner,
            TagKind::Dependency => &self.dependency,
        }
    }
}

/// Registro de tagsets por idioma, com tempo de vida do processo.
#[derive(Debug, Default)]
pub struct TagSetRegistry {
    canonical: RwLock<HashMap<String, Arc<LanguageTagSets>>>,
    adhoc: RwLock<HashMap<String, Arc<AdhocTags>>>,
}

impl TagSetRegistry {
    /// Registro vazio: todos os idiomas operam apenas com tags ad-hoc.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro com os tagsets embutidos (inglês).
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry
            .canonical
            .write()
            .insert("en".to_string(), Arc::new(LanguageTagSets::english()));
        registry
    }

    /// Registra os tagsets canônicos de um idioma.
    ///
    /// Uma tag, uma vez resolvida, nunca é trocada por outra instância: falha
    /// se o idioma já tem tagsets canônicos ou se algum rótulo novo já foi
    /// criado como tag ad-hoc. Tags ad-hoc existentes são mantidas.
    pub fn register(&self, language: &str, sets: LanguageTagSets) -> Result<()> {
        let lang = normalize_language(language)?;
        let mut canonical = self.canonical.write();
        if canonical.contains_key(&lang) {
            return Err(Error::config(format!(
                "tagsets canônicos de '{}' já registrados",
                lang
            )));
        }
        if let Some(adhoc) = self.adhoc.read().get(&lang) {
            for kind in TagKind::all() {
                let Some(set) = sets.get(kind) else {
                    continue;
                };
                let minted = adhoc.map(kind).read();
                if let Some(label) = set.labels().find(|label| minted.contains_key(*label)) {
                    return Err(Error::config(format!(
                        "rótulo {} '{}' já criado como tag ad-hoc para '{}'",
                        kind.name(),
                        label,
                        lang
                    )));
                }
            }
        }
        canonical.insert(lang, Arc::new(sets));
        Ok(())
    }

    /// Registra todos os idiomas de um arquivo JSON de tagsets.
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let json = std::fs::read_to_string(path.as_ref())?;
        self.load_json_str(&json)
    }

    pub fn load_json_str(&self, json: &str) -> Result<usize> {
        let built = TagSetFile::from_json_str(json)?.build()?;
        let count = built.len();
        for (lang, sets) in built {
            self.register(&lang, sets)?;
        }
        Ok(count)
    }

    /// Idiomas com tagsets canônicos, em ordem alfabética.
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.canonical.read().keys().cloned().collect();
        langs.sort();
        langs
    }

    pub fn is_configured(&self, language: &str) -> bool {
        normalize_language(language)
            .map(|lang| self.canonical.read().contains_key(&lang))
            .unwrap_or(false)
    }

    /// Obtém o resolvedor de tags de um idioma.
    ///
    /// Sem tagset canônico o resolvedor trabalha apenas com tags ad-hoc.
    pub fn resolver(&self, language: &str) -> Result<TagResolver> {
        let lang = normalize_language(language)?;
        let canonical = self.canonical.read().get(&lang).cloned();
        let adhoc = {
            let guard = self.adhoc.upgradable_read();
            match guard.get(&lang) {
                Some(adhoc) => Arc::clone(adhoc),
                None => {
                    let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
                    Arc::clone(guard.entry(lang.clone()).or_default())
                }
            }
        };
        Ok(TagResolver {
            language: lang,
            canonical,
            adhoc,
        })
    }
}

/// Resolvedor de tags para um único idioma.
///
/// Barato de clonar; compartilha os mapas ad-hoc com o registro.
#[derive(Debug, Clone)]
pub struct TagResolver {
    language: String,
    canonical: Option<Arc<LanguageTagSets>>,
    adhoc: Arc<AdhocTags>,
}

impl TagResolver {
    pub fn language(&self) -> &str {
        &self.language
    }

    /// `true` se o idioma possui tagset canônico para a dimensão.
    pub fn has_canonical(&self, kind: TagKind) -> bool {
        self.canonical
            .as_ref()
            .map_or(false, |sets| sets.get(kind).is_some())
    }

    /// Consulta apenas o tagset canônico.
    pub fn canonical(&self, kind: TagKind, raw: &str) -> Option<TagRef> {
        self.canonical
            .as_ref()
            .and_then(|sets| sets.get(kind))
            .and_then(|set| set.get(raw))
            .cloned()
    }

    /// Consulta canônico e ad-hoc sem criar nada.
    pub fn lookup(&self, kind: TagKind, raw: &str) -> Option<TagRef> {
        self.canonical(kind, raw)
            .or_else(|| self.adhoc.map(kind).read().get(raw).cloned())
    }

    /// Resolve um rótulo externo, criando uma tag ad-hoc se necessário.
    pub fn resolve(&self, kind: TagKind, raw: &str) -> Result<TagRef> {
        if raw.is_empty() {
            return Err(Error::invalid_input(format!(
                "rótulo {} vazio para o idioma {}",
                kind.name(),
                self.language
            )));
        }
        if let Some(tag) = self.canonical(kind, raw) {
            return Ok(tag);
        }
        let map = self.adhoc.map(kind);
        if let Some(tag) = map.read().get(raw) {
            return Ok(Arc::clone(tag));
        }
        let guard = map.upgradable_read();
        if let Some(tag) = guard.get(raw) {
            return Ok(Arc::clone(tag));
        }
        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        let tag = guard.entry(raw.to_string()).or_insert_with(|| {
            info!("Tag {} não mapeada '{}' para o idioma {}", kind.name(), raw, self.language);
            Arc::new(Tag::adhoc(kind, raw))
        });
        Ok(Arc::clone(tag))
    }

    /// Tags ad-hoc criadas até agora, ordenadas pelo rótulo.
    pub fn adhoc_tags(&self, kind: TagKind) -> Vec<TagRef> {
        let mut tags: Vec<TagRef> = self.adhoc.map(kind).read().values().cloned().collect();
        tags.sort_by(|a, b| a.tag.cmp(&b.tag));
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagset::same_tag;
    use std::thread;

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("EN").unwrap(), "en");
        assert_eq!(normalize_language(" pt-BR ").unwrap(), "pt-br");
        assert!(normalize_language("").is_err());
        assert!(normalize_language("english language").is_err());
    }

    #[test]
    fn test_resolve_canonical_first() {
        let registry = TagSetRegistry::with_defaults();
        let resolver = registry.resolver("en").unwrap();
        let nn = resolver.resolve(TagKind::Pos, "NN").unwrap();
        assert!(!nn.adhoc);
        assert_eq!(nn.category.as_deref(), Some("Noun"));
        assert!(resolver.adhoc_tags(TagKind::Pos).is_empty());
    }

    #[test]
    fn test_adhoc_minted_once() {
        let registry = TagSetRegistry::with_defaults();
        let resolver = registry.resolver("en").unwrap();
        let first = resolver.resolve(TagKind::Ner, "NATIONALITY").unwrap();
        let second = resolver.resolve(TagKind::Ner, "NATIONALITY").unwrap();
        assert!(first.adhoc);
        assert!(same_tag(&first, &second));
        assert_eq!(resolver.adhoc_tags(TagKind::Ner).len(), 1);
    }

    #[test]
    fn test_adhoc_visible_across_resolvers() {
        let registry = TagSetRegistry::new();
        let a = registry.resolver("DE").unwrap();
        let minted = a.resolve(TagKind::Pos, "ART").unwrap();
        let b = registry.resolver("de").unwrap();
        let seen = b.lookup(TagKind::Pos, "ART").unwrap();
        assert!(same_tag(&minted, &seen));
        assert!(!b.has_canonical(TagKind::Pos));
    }

    #[test]
    fn test_adhoc_scoped_by_language_and_kind() {
        let registry = TagSetRegistry::new();
        let en = registry.resolver("en").unwrap();
        let fr = registry.resolver("fr").unwrap();
        let a = en.resolve(TagKind::Pos, "X").unwrap();
        let b = fr.resolve(TagKind::Pos, "X").unwrap();
        let c = en.resolve(TagKind::Ner, "X").unwrap();
        assert!(!same_tag(&a, &b));
        assert!(!same_tag(&a, &c));
    }

    #[test]
    fn test_empty_raw_tag_rejected() {
        let registry = TagSetRegistry::new();
        let resolver = registry.resolver("en").unwrap();
        assert!(matches!(
            resolver.resolve(TagKind::Pos, ""),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_concurrent_resolution_mints_single_tag() {
        let registry = Arc::new(TagSetRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let resolver = registry.resolver("it").unwrap();
                    (0..50)
                        .map(|i| resolver.resolve(TagKind::Pos, &format!("T{}", i % 5)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<TagRef>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for run in &results[1..] {
            for (a, b) in run.iter().zip(&results[0]) {
                assert!(same_tag(a, b));
            }
        }
        let resolver = registry.resolver("it").unwrap();
        assert_eq!(resolver.adhoc_tags(TagKind::Pos).len(), 5);
    }

    #[test]
    fn test_register_rejects_label_already_minted() {
        let registry = TagSetRegistry::new();
        let resolver = registry.resolver("es").unwrap();
        let minted = resolver.resolve(TagKind::Pos, "NC").unwrap();

        let err = registry
            .load_json_str(
                r#"{"languages": {"es": {"pos": {"name": "EAGLES", "tags": [{"tag": "VM"}, {"tag": "NC"}]}}}}"#,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!registry.is_configured("es"));

        let again = registry.resolver("es").unwrap().resolve(TagKind::Pos, "NC").unwrap();
        assert!(same_tag(&minted, &again));
    }

    #[test]
    fn test_register_rejects_alias_already_minted() {
        let registry = TagSetRegistry::new();
        registry.resolver("es").unwrap().resolve(TagKind::Ner, "PER").unwrap();
        let err = registry
            .load_json_str(
                r#"{"languages": {"es": {"ner": {"name": "CoNLL", "tags": [{"tag": "I-PER", "aliases": ["PER"]}]}}}}"#,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_register_twice_rejected() {
        let registry = TagSetRegistry::with_defaults();
        let nn = registry.resolver("en").unwrap().resolve(TagKind::Pos, "NN").unwrap();
        let err = registry.register("EN", LanguageTagSets::english()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let again = registry.resolver("en").unwrap().resolve(TagKind::Pos, "NN").unwrap();
        assert!(same_tag(&nn, &again));
    }

    #[test]
    fn test_adhoc_hit_returns_minted_instance_under_readers() {
        let registry = Arc::new(TagSetRegistry::new());
        let minted = registry.resolver("pt").unwrap().resolve(TagKind::Ner, "PESSOA").unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let resolver = registry.resolver("pt").unwrap();
                    (0..100)
                        .map(|_| resolver.resolve(TagKind::Ner, "PESSOA").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for tag in handle.join().unwrap() {
                assert!(same_tag(&tag, &minted));
            }
        }
    }

    #[test]
    fn test_register_keeps_adhoc_tags() {
        let registry = TagSetRegistry::new();
        let minted = registry
            .resolver("es")
            .unwrap()
            .resolve(TagKind::Pos, "NC")
            .unwrap();
        registry
            .load_json_str(r#"{"languages": {"es": {"pos": {"name": "EAGLES", "tags": [{"tag": "VM"}]}}}}"#)
            .unwrap();
        let resolver = registry.resolver("es").unwrap();
        assert!(resolver.has_canonical(TagKind::Pos));
        assert!(same_tag(&minted, &resolver.lookup(TagKind::Pos, "NC").unwrap()));
        assert_eq!(registry.languages(), vec!["es".to_string()]);
    }
}
