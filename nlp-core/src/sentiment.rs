//! # Agregação de Sentimento
//!
//! O classificador externo produz, por sentença, uma distribuição de
//! probabilidade sobre `N` classes ordenadas (ex: muito negativo … muito
//! positivo). O valor escalar é a combinação linear
//!
//! $$ s = \sum_i p_i \cdot w_i $$
//!
//! definida apenas se todos os pesos $w_i$ existirem. Os pesos dependem
//! somente de `N` e são calculados uma vez por documento para cada `N`.

use std::collections::HashMap;

use tracing::debug;

use crate::config::SentimentWeighting;

/// Peso de cada classe; `None` marca uma classe sem valor numérico.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassWeights(Vec<Option<f64>>);

impl ClassWeights {
    pub fn new(weights: Vec<Option<f64>>) -> Self {
        Self(weights)
    }

    /// Pesos lineares de -1 a +1. Com menos de duas classes não há escala.
    pub fn linear(size: usize) -> Self {
        if size < 2 {
            return Self(vec![None; size]);
        }
        let step = 2.0 / (size - 1) as f64;
        Self((0..size).map(|i| Some(-1.0 + step * i as f64)).collect())
    }

    pub fn for_size(weighting: &SentimentWeighting, size: usize) -> Self {
        match weighting {
            SentimentWeighting::Linear => Self::linear(size),
            SentimentWeighting::Explicit {
                tables,
                fallback_linear,
            } => match tables.get(&size) {
                Some(table) if table.len() == size => Self(table.clone()),
                _ if *fallback_linear => Self::linear(size),
                _ => Self(vec![None; size]),
            },
        }
    }

    pub fn index_weight(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Soma ponderada das probabilidades; `None` se algum peso estiver indefinido.
pub fn aggregate(probabilities: &[f64], weights: &ClassWeights) -> Option<f64> {
    if probabilities.is_empty() {
        return None;
    }
    let mut value = 0.0;
    for (idx, p) in probabilities.iter().enumerate() {
        value += p * weights.index_weight(idx)?;
    }
    value.is_finite().then_some(value)
}

/// Agregador com cache de pesos por número de classes (um por documento).
#[derive(Debug)]
pub struct SentimentAggregator<'a> {
    weighting: &'a SentimentWeighting,
    cache: HashMap<usize, ClassWeights>,
}

impl<'a> SentimentAggregator<'a> {
    pub fn new(weighting: &'a SentimentWeighting) -> Self {
        Self {
            weighting,
            cache: HashMap::new(),
        }
    }

    pub fn sentiment(&mut self, probabilities: &[f64]) -> Option<f64> {
        let size = probabilities.len();
        let weighting = self.weighting;
        let weights = self.cache.entry(size).or_insert_with(|| {
            debug!(" - {} classes de sentimento detectadas", size);
            ClassWeights::for_size(weighting, size)
        });
        let value = aggregate(probabilities, weights);
        debug!(" - sentimento: {:?} [classes: {:?}]", value, probabilities);
        value
    }

    /// Quantos tamanhos de distribuição distintos já foram vistos.
    pub fn cached_sizes(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_linear_five_classes() {
        let w = ClassWeights::linear(5);
        let expected = [-1.0, -0.5, 0.0, 0.5, 1.0];
        for (i, e) in expected.iter().enumerate() {
            assert!(approx(w.index_weight(i).unwrap(), *e));
        }
    }

    #[test]
    fn test_symmetric_distribution_is_neutral() {
        let w = ClassWeights::linear(5);
        let value = aggregate(&[0.1, 0.2, 0.4, 0.2, 0.1], &w).unwrap();
        assert!(approx(value, 0.0));
    }

    #[test]
    fn test_negative_distribution() {
        let w = ClassWeights::linear(5);
        let value = aggregate(&[0.4, 0.2, 0.2, 0.1, 0.1], &w).unwrap();
        assert!(approx(value, -0.35));
    }

    #[test]
    fn test_undefined_weight_suppresses_value() {
        let w = ClassWeights::new(vec![Some(-1.0), None, Some(1.0)]);
        assert_eq!(aggregate(&[0.2, 0.5, 0.3], &w), None);
        assert_eq!(aggregate(&[1.0], &ClassWeights::linear(1)), None);
        assert_eq!(aggregate(&[], &ClassWeights::linear(0)), None);
    }

    #[test]
    fn test_explicit_tables_and_fallback() {
        let mut tables = BTreeMap::new();
        tables.insert(2, vec![Some(-2.0), Some(2.0)]);
        let strict = SentimentWeighting::Explicit {
            tables: tables.clone(),
            fallback_linear: false,
        };
        assert_eq!(ClassWeights::for_size(&strict, 2).index_weight(1), Some(2.0));
        assert_eq!(ClassWeights::for_size(&strict, 3).index_weight(0), None);

        let lenient = SentimentWeighting::Explicit {
            tables,
            fallback_linear: true,
        };
        assert_eq!(ClassWeights::for_size(&lenient, 3).index_weight(0), Some(-1.0));
    }

    #[test]
    fn test_aggregator_caches_per_size() {
        let weighting = SentimentWeighting::Linear;
        let mut agg = SentimentAggregator::new(&weighting);
        assert!(approx(agg.sentiment(&[0.0, 1.0]).unwrap(), 1.0));
        assert!(approx(agg.sentiment(&[1.0, 0.0]).unwrap(), -1.0));
        assert_eq!(agg.cached_sizes(), 1);
        assert!(approx(agg.sentiment(&[0.0, 0.0, 1.0]).unwrap(), 1.0));
        assert_eq!(agg.cached_sizes(), 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Com pesos lineares o valor fica sempre em [-1, 1] para distribuições válidas.
            #[test]
            fn linear_value_bounded(raw in prop::collection::vec(0.0f64..1.0, 2..8)) {
                let total: f64 = raw.iter().sum();
                prop_assume!(total > 1e-6);
                let probs: Vec<f64> = raw.iter().map(|p| p / total).collect();
                let value = aggregate(&probs, &ClassWeights::linear(probs.len())).unwrap();
                prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&value));
            }

            /// Inverter a distribuição inverte o sinal do sentimento.
            #[test]
            fn reversed_distribution_negates(probs in prop::collection::vec(0.0f64..1.0, 2..8)) {
                let weights = ClassWeights::linear(probs.len());
                let forward = aggregate(&probs, &weights).unwrap();
                let reversed: Vec<f64> = probs.iter().rev().copied().collect();
                let backward = aggregate(&reversed, &weights).unwrap();
                prop_assert!((forward + backward).abs() < 1e-9);
            }
        }
    }
}
