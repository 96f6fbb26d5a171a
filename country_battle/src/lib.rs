mod config;
pub mod manual;
pub mod match_log;
pub mod model;
pub mod repository;

use log::{debug, info};

pub use crate::config::*;
use crate::match_log::MatchLog;
use crate::model::{Classifier, Scaler};

/// The model-based strategy: a trained classifier, with an optional scaler
/// applied to the feature differences first.
pub struct ModelStrategy {
    pub classifier: Box<dyn Classifier>,
    pub scaler: Option<Box<dyn Scaler>>,
}

impl ModelStrategy {
    pub fn new(classifier: Box<dyn Classifier>, scaler: Option<Box<dyn Scaler>>) -> ModelStrategy {
        ModelStrategy { classifier, scaler }
    }

    /// Applies the scaler (if any) and the classifier to a feature difference.
    ///
    /// Returns the vector that was fed to the classifier and the label.
    pub fn classify(&self, difference: &FeatureVector) -> (FeatureVector, u32) {
        let scaled = match &self.scaler {
            Some(scaler) => scaler.transform(difference),
            None => *difference,
        };
        let label = self.classifier.predict(&scaled);
        (scaled, label)
    }
}

/// How to decide the winner of a battle.
pub enum Strategy {
    Model(ModelStrategy),
    Formula(FormulaConstants),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Model(_) => "model",
            Strategy::Formula(_) => "formula",
        }
    }
}

/// The element-wise difference of the statistics of two countries.
pub fn feature_difference(stats_a: &CountryStats, stats_b: &CountryStats) -> FeatureVector {
    let fa = stats_a.features();
    let fb = stats_b.features();
    let mut res: FeatureVector = [0.0; NUM_FEATURES];
    for i in 0..NUM_FEATURES {
        res[i] = fa[i] - fb[i];
    }
    res
}

/// The composite score of a country under the weighted formula.
pub fn formula_score(stats: &CountryStats, constants: &FormulaConstants) -> f64 {
    FormulaConstants::WEIGHT_GDP * (stats.gdp / constants.gdp_max)
        + FormulaConstants::WEIGHT_MILITARY * (stats.military / constants.military_max)
        + FormulaConstants::WEIGHT_LITERACY * (stats.literacy / 100.0)
        + FormulaConstants::WEIGHT_BIRTH * (stats.birth / constants.birth_max)
        + FormulaConstants::WEIGHT_DEATH * (1.0 - stats.death / constants.death_max)
}

/// The side-by-side values of two countries, for the comparison chart.
pub fn compare_features(
    stats_a: &CountryStats,
    stats_b: &CountryStats,
    constants: &FormulaConstants,
) -> Vec<FeatureComparison> {
    let fa = stats_a.features();
    let fb = stats_b.features();
    let maxima = constants.maxima();
    FEATURE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| FeatureComparison {
            name: name.to_string(),
            value_a: fa[i],
            value_b: fb[i],
            normalized_a: fa[i] / maxima[i],
            normalized_b: fb[i] / maxima[i],
        })
        .collect()
}

/// Decides the winner of a battle between two countries.
///
/// Arguments:
/// * `country_a`, `stats_a` the first country and its statistics
/// * `country_b`, `stats_b` the second country and its statistics
/// * `strategy` the way to pick the winner
/// * `log` if provided, the result is appended to it
///
/// With the formula, the first country must have a strictly higher score to win:
/// ties go to the second country.
pub fn run_battle(
    country_a: &str,
    stats_a: &CountryStats,
    country_b: &str,
    stats_b: &CountryStats,
    strategy: &Strategy,
    log: Option<&mut MatchLog>,
) -> Result<BattleResult, BattleErrors> {
    if country_a == country_b {
        return Err(BattleErrors::InvalidInput(country_a.to_string()));
    }

    let (a_wins, details) = match strategy {
        Strategy::Formula(constants) => {
            let score_a = formula_score(stats_a, constants);
            let score_b = formula_score(stats_b, constants);
            debug!(
                "run_battle: scores {}: {} {}: {}",
                country_a, score_a, country_b, score_b
            );
            (score_a > score_b, BattleDetails::Formula { score_a, score_b })
        }
        Strategy::Model(ms) => {
            let difference = feature_difference(stats_a, stats_b);
            let (scaled, label) = ms.classify(&difference);
            debug!(
                "run_battle: difference: {:?} scaled: {:?} label: {}",
                difference, scaled, label
            );
            (
                label == 1,
                BattleDetails::Model {
                    difference,
                    scaled,
                    label,
                },
            )
        }
    };

    let winner = if a_wins { country_a } else { country_b };
    info!(
        "Battle {} vs {} ({}): winner {}",
        country_a,
        country_b,
        strategy.name(),
        winner
    );
    let result = MatchResult {
        country_a: country_a.to_string(),
        country_b: country_b.to_string(),
        winner: winner.to_string(),
    };
    if let Some(l) = log {
        l.append(result.clone());
    }
    Ok(BattleResult { result, details })
}
