//! # Erros do nlp-core
//!
//! Apenas violações de contrato e falhas do processamento em segundo plano
//! chegam ao chamador. Anomalias de token, aresta ou tag são absorvidas
//! localmente (com log) e nunca aparecem aqui.

use thiserror::Error;

/// Alias de `Result` usado em todo o crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Erro retornado pelas operações do crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Entrada inválida (idioma vazio, tag vazia, texto ausente...).
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    /// Nenhum pipeline/tagset configurado para o idioma.
    #[error("O idioma '{language}' não é suportado (suportados: {supported:?})")]
    UnsupportedLanguage {
        language: String,
        supported: Vec<String>,
    },

    /// Span fora dos limites do texto ou com comprimento não positivo.
    #[error("Span inválido [{start}, {end}) para texto com {len} caracteres")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// O documento anotado referencia sentenças ou tokens inexistentes.
    #[error("Documento inconsistente: {0}")]
    InvalidDocument(String),

    /// Falha dentro da tarefa em segundo plano (motor de anotação ou projeção).
    #[error("Falha ao processar um texto em '{language}': {cause}")]
    Processing {
        language: String,
        cause: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// O chamador deixou de receber o resultado da tarefa em segundo plano.
    #[error("Interrompido enquanto processava um texto em '{language}'")]
    Interrupted { language: String },

    /// Configuração inválida (tagsets, pesos de sentimento...).
    #[error("Configuração inválida: {0}")]
    Config(String),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Cria um erro de entrada inválida.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Cria um erro de documento inconsistente.
    #[must_use]
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    /// Cria um erro de configuração.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Envolve uma falha da tarefa em segundo plano com o idioma de contexto.
    pub fn processing(
        language: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Processing {
            language: language.into(),
            cause: source.to_string(),
            source: Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_language_lists_supported() {
        let err = Error::UnsupportedLanguage {
            language: "xx".into(),
            supported: vec!["de".into(), "en".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'xx'"));
        assert!(msg.contains("\"de\""));
        assert!(msg.contains("\"en\""));
    }

    #[test]
    fn test_processing_keeps_source() {
        let cause: Box<dyn std::error::Error + Send + Sync> = "modelo ausente".into();
        let err = Error::processing("en", cause);
        assert!(err.to_string().contains("'en'"));
        assert!(err.to_string().contains("modelo ausente"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
