//! Configuração do servidor a partir do `.env` e de variáveis de ambiente.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use nlp_core::{Analyzer, ProjectorConfig, TagSetRegistry};
use tracing::info;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Configuração resolvida do servidor.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Endereço de escuta (`NLP_WEB_ADDR`).
    pub addr: SocketAddr,
    /// Arquivo JSON com tagsets adicionais (`NLP_TAGSETS`).
    pub tagsets: Option<PathBuf>,
    /// Arquivo JSON com a configuração do projetor (`NLP_PROJECTOR_CONFIG`).
    pub projector_config: Option<PathBuf>,
    /// Workers do pool de projeção (`NLP_WORKERS`, 0 = número de CPUs).
    pub workers: usize,
}

impl Settings {
    /// Carrega a configuração do ambiente, com `.env` opcional.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("NLP_WEB_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("NLP_WEB_ADDR inválido: '{}'", addr))?;
        let workers: usize = match lookup("NLP_WORKERS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("NLP_WORKERS inválido: '{}'", v))?,
            None => 0,
        };
        let path = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        Ok(Self {
            addr,
            tagsets: path("NLP_TAGSETS"),
            projector_config: path("NLP_PROJECTOR_CONFIG"),
            workers,
        })
    }

    /// Monta o analisador: tagsets embutidos + arquivo opcional, config opcional.
    pub fn build_analyzer(&self) -> anyhow::Result<Analyzer> {
        let registry = TagSetRegistry::with_defaults();
        if let Some(path) = &self.tagsets {
            let count = registry
                .load_json(path)
                .with_context(|| format!("carregando tagsets de {}", path.display()))?;
            info!("{} idioma(s) carregado(s) de {}", count, path.display());
        }
        let config = match &self.projector_config {
            Some(path) => ProjectorConfig::load(path)
                .with_context(|| format!("carregando configuração de {}", path.display()))?,
            None => ProjectorConfig::default(),
        };
        Analyzer::new(Arc::new(registry), config, self.workers).context("criando o pool de projeção")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert!(s.tagsets.is_none());
        assert!(s.projector_config.is_none());
        assert_eq!(s.workers, 0);
        let analyzer = s.build_analyzer().unwrap();
        assert_eq!(analyzer.projector().registry().languages(), vec!["en".to_string()]);
    }

    #[test]
    fn test_overrides_and_invalid_addr() {
        let s = settings(&[("NLP_WEB_ADDR", "127.0.0.1:8080"), ("NLP_TAGSETS", " ")]).unwrap();
        assert_eq!(s.addr.port(), 8080);
        assert!(s.tagsets.is_none());
        assert!(settings(&[("NLP_WEB_ADDR", "localhost")]).is_err());
        assert_eq!(settings(&[("NLP_WORKERS", "3")]).unwrap().workers, 3);
        assert!(settings(&[("NLP_WORKERS", "muitos")]).is_err());
    }

    #[test]
    fn test_explicit_sentiment_config_file_loads() {
        let path = std::env::temp_dir().join(format!("nlp-web-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"sentiment": {"scheme": "explicit", "tables": {"3": [-1.0, null, 1.0]}}}"#,
        )
        .unwrap();
        let s = settings(&[("NLP_PROJECTOR_CONFIG", path.to_str().unwrap())]).unwrap();
        let analyzer = s.build_analyzer();
        std::fs::remove_file(&path).ok();
        let analyzer = analyzer.unwrap();
        assert!(matches!(
            analyzer.projector().config().sentiment,
            nlp_core::SentimentWeighting::Explicit { .. }
        ));
    }

    #[test]
    fn test_missing_tagset_file_fails() {
        let s = settings(&[("NLP_TAGSETS", "/nao/existe/tagsets.json")]).unwrap();
        assert!(s.build_analyzer().is_err());
    }
}
