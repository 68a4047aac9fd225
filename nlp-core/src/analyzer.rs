//! # Analisador — Motores de Anotação por Idioma
//!
//! Associa a cada idioma um [`AnnotationEngine`] (o motor externo que produz o
//! [`AnnotatedDocument`]) e executa anotação + projeção em um pool de threads
//! dedicado. O chamador espera o resultado em um canal; se o canal fechar sem
//! resposta, a espera termina com [`Error::Interrupted`].
//!
//! ```text
//!   analyse(lang, text)
//!        │  valida entrada / idioma
//!        ▼
//!   pool rayon ──▶ engine.annotate(text) ──▶ Projector::project ──▶ canal
//! ```

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};

use parking_lot::RwLock;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::config::ProjectorConfig;
use crate::document::AnnotatedDocument;
use crate::error::{Error, Result};
use crate::model::AnalysedText;
use crate::pipeline::Projector;
use crate::registry::{normalize_language, TagSetRegistry};

/// Erro opaco devolvido por um motor de anotação.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// Motor externo que anota um texto completo.
pub trait AnnotationEngine: Send + Sync {
    fn annotate(&self, text: &str) -> std::result::Result<AnnotatedDocument, EngineError>;
}

impl<F> AnnotationEngine for F
where
    F: Fn(&str) -> std::result::Result<AnnotatedDocument, EngineError> + Send + Sync,
{
    fn annotate(&self, text: &str) -> std::result::Result<AnnotatedDocument, EngineError> {
        self(text)
    }
}

type EngineRef = Arc<dyn AnnotationEngine>;

/// Ponto de entrada de alto nível: texto bruto → [`AnalysedText`].
pub struct Analyzer {
    projector: Arc<Projector>,
    pipelines: RwLock<HashMap<String, EngineRef>>,
    pool: ThreadPool,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("languages", &self.supported())
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl Analyzer {
    /// Cria um analisador com `threads` workers (0 = número de CPUs).
    pub fn new(registry: Arc<TagSetRegistry>, config: ProjectorConfig, threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("nlp-analyzer-{}", i))
            .build()
            .map_err(|e| Error::config(format!("pool de threads: {}", e)))?;
        Ok(Self {
            projector: Arc::new(Projector::new(registry, config)),
            pipelines: RwLock::new(HashMap::new()),
            pool,
        })
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Registra o motor de um idioma; devolve o motor substituído, se houver.
    pub fn set_pipeline(
        &self,
        language: &str,
        engine: Arc<dyn AnnotationEngine>,
    ) -> Result<Option<Arc<dyn AnnotationEngine>>> {
        let lang = normalize_language(language)?;
        let old = self.pipelines.write().insert(lang.clone(), engine);
        if old.is_some() {
            info!("Motor de anotação para '{}' substituído", lang);
        } else {
            info!("Motor de anotação registrado para '{}'", lang);
        }
        Ok(old)
    }

    pub fn get_pipeline(&self, language: &str) -> Option<Arc<dyn AnnotationEngine>> {
        let lang = normalize_language(language).ok()?;
        self.pipelines.read().get(&lang).cloned()
    }

    pub fn is_supported(&self, language: &str) -> bool {
        self.get_pipeline(language).is_some()
    }

    /// Idiomas com motor registrado, em ordem alfabética.
    pub fn supported(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.pipelines.read().keys().cloned().collect();
        langs.sort();
        langs
    }

    fn engine_for(&self, language: &str) -> Result<(String, EngineRef)> {
        let lang = normalize_language(language)?;
        match self.pipelines.read().get(&lang) {
            Some(engine) => Ok((lang, Arc::clone(engine))),
            None => Err(Error::UnsupportedLanguage {
                language: lang,
                supported: self.supported(),
            }),
        }
    }

    /// Anota e projeta um texto no pool de workers, bloqueando até o fim.
    pub fn analyse(&self, language: &str, text: &str) -> Result<AnalysedText> {
        let (lang, engine) = self.engine_for(language)?;
        let (tx, rx) = mpsc::channel();
        let projector = Arc::clone(&self.projector);
        let text = text.to_string();
        let job_lang = lang.clone();
        self.pool.spawn(move || {
            let result = run_job(&projector, engine.as_ref(), &job_lang, &text);
            if tx.send(result).is_err() {
                warn!("Resultado da análise em '{}' descartado: chamador ausente", job_lang);
            }
        });
        rx.recv().map_err(|_| Error::Interrupted { language: lang })?
    }

    /// Analisa vários textos do mesmo idioma em paralelo, preservando a ordem.
    pub fn analyse_batch(&self, language: &str, texts: &[&str]) -> Result<Vec<Result<AnalysedText>>> {
        let (lang, engine) = self.engine_for(language)?;
        debug!("Lote de {} textos em '{}'", texts.len(), lang);
        let projector = &self.projector;
        Ok(self.pool.install(|| {
            texts
                .par_iter()
                .map(|text| run_job(projector, engine.as_ref(), &lang, text))
                .collect()
        }))
    }

    /// Projeta no pool um documento já anotado, sem passar pelo motor.
    pub fn project(&self, language: &str, text: &str, document: &AnnotatedDocument) -> Result<AnalysedText> {
        let lang = normalize_language(language)?;
        let projector = &self.projector;
        self.pool
            .install(|| guarded(&lang, || projector.project(&lang, text, document)))
    }
}

fn run_job(
    projector: &Projector,
    engine: &dyn AnnotationEngine,
    language: &str,
    text: &str,
) -> Result<AnalysedText> {
    guarded(language, || {
        let document = engine
            .annotate(text)
            .map_err(|e| Error::processing(language, e))?;
        projector.project(language, text, &document)
    })
}

/// Executa `job` isolando pânicos, que viram [`Error::Processing`].
fn guarded<F>(language: &str, job: F) -> Result<AnalysedText>
where
    F: FnOnce() -> Result<AnalysedText>,
{
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(result) => result,
        Err(payload) => {
            let cause = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "pânico no motor de anotação".to_string());
            warn!("Pânico ao processar texto em '{}': {}", language, cause);
            Err(Error::Processing {
                language: language.to_string(),
                cause,
                source: None,
            })
        }
    }
}
