// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Number of statistics compared in a battle.
pub const NUM_FEATURES: usize = 5;

/// A vector of statistics, or differences of statistics, in the order
/// gdp, military, literacy, birth, death.
pub type FeatureVector = [f64; NUM_FEATURES];

/// The names of the features, in the same order as a `FeatureVector`.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = ["gdp", "military", "literacy", "birth", "death"];

/// The statistics of one country.
///
/// All the values are non-negative, and the literacy is a percentage.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct CountryStats {
    pub gdp: f64,
    pub military: f64,
    pub literacy: f64,
    pub birth: f64,
    pub death: f64,
}

impl CountryStats {
    /// Builds the statistics, clamping the values to their valid ranges.
    pub fn new(gdp: f64, military: f64, literacy: f64, birth: f64, death: f64) -> CountryStats {
        CountryStats {
            gdp: non_negative(gdp),
            military: non_negative(military),
            literacy: non_negative(literacy).min(100.0),
            birth: non_negative(birth),
            death: non_negative(death),
        }
    }

    pub fn features(&self) -> FeatureVector {
        [self.gdp, self.military, self.literacy, self.birth, self.death]
    }
}

fn non_negative(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

/// The names of the columns that hold the statistics in a dataset.
///
/// Datasets come in different flavours: the raw factbook exports have long
/// labels, the cleaned exports use short names. All the lookups go through
/// this mapping.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnMapping {
    pub country: String,
    pub gdp: String,
    pub military: String,
    pub literacy: String,
    pub birth: String,
    pub death: String,
}

impl ColumnMapping {
    pub const COUNTRY: &'static str = "Country";

    /// The labels of the factbook export.
    pub const VERBOSE: [&'static str; NUM_FEATURES] = [
        "Economy: Real GDP (purchasing power parity)",
        "Military and Security: Military expenditures",
        "People and Society: Literacy - total population",
        "People and Society: Birth rate",
        "People and Society: Death rate",
    ];

    /// The labels of the cleaned export.
    pub const SHORT: [&'static str; NUM_FEATURES] = FEATURE_NAMES;

    pub fn verbose() -> ColumnMapping {
        ColumnMapping::from_labels(ColumnMapping::COUNTRY, &ColumnMapping::VERBOSE)
    }

    pub fn short() -> ColumnMapping {
        ColumnMapping::from_labels(ColumnMapping::COUNTRY, &ColumnMapping::SHORT)
    }

    fn from_labels(country: &str, labels: &[&str; NUM_FEATURES]) -> ColumnMapping {
        ColumnMapping {
            country: country.to_string(),
            gdp: labels[0].to_string(),
            military: labels[1].to_string(),
            literacy: labels[2].to_string(),
            birth: labels[3].to_string(),
            death: labels[4].to_string(),
        }
    }

    /// Picks the flavour of columns that matches the header.
    ///
    /// The short names are tried first, then the verbose labels. If none of
    /// them fully matches, the verbose labels are returned and the
    /// repository will report which column is missing.
    pub fn detect(header: &[String]) -> ColumnMapping {
        let short = ColumnMapping::short();
        if short.missing_column(header).is_none() {
            return short;
        }
        ColumnMapping::verbose()
    }

    /// The stat columns, in feature order.
    pub fn stat_columns(&self) -> [&str; NUM_FEATURES] {
        [
            self.gdp.as_str(),
            self.military.as_str(),
            self.literacy.as_str(),
            self.birth.as_str(),
            self.death.as_str(),
        ]
    }

    /// The first column of the mapping that is not in the header.
    pub fn missing_column(&self, header: &[String]) -> Option<String> {
        std::iter::once(self.country.as_str())
            .chain(self.stat_columns())
            .find(|col| !header.iter().any(|h| h.trim() == *col))
            .map(|col| col.to_string())
    }
}

// ******** Output data structures *********

/// The outcome of one battle.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct MatchResult {
    pub country_a: String,
    pub country_b: String,
    // Always one of country_a or country_b
    pub winner: String,
}

/// How the winner was decided.
#[derive(PartialEq, Debug, Clone)]
pub enum BattleDetails {
    Formula {
        score_a: f64,
        score_b: f64,
    },
    Model {
        difference: FeatureVector,
        scaled: FeatureVector,
        label: u32,
    },
}

#[derive(PartialEq, Debug, Clone)]
pub struct BattleResult {
    pub result: MatchResult,
    pub details: BattleDetails,
}

impl BattleResult {
    pub fn winner(&self) -> &str {
        self.result.winner.as_str()
    }
}

/// One line of the comparison chart between two countries.
#[derive(PartialEq, Debug, Clone)]
pub struct FeatureComparison {
    pub name: String,
    pub value_a: f64,
    pub value_b: f64,
    /// Values divided by the maxima of the formula, suitable for a bar chart.
    pub normalized_a: f64,
    pub normalized_b: f64,
}

/// Errors that prevent a battle from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BattleErrors {
    /// No country with this exact name in the dataset.
    NotFound(String),
    /// The same country was selected twice.
    InvalidInput(String),
    /// A column expected by the mapping is absent from the dataset.
    MissingColumn(String),
    /// A classifier or scaler artifact does not have the expected shape.
    InvalidModel(String),
    InvalidConstants(String),
}

impl Error for BattleErrors {}

impl Display for BattleErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BattleErrors::NotFound(name) => write!(f, "country not found: {}", name),
            BattleErrors::InvalidInput(name) => {
                write!(f, "choose different countries (got {} twice)", name)
            }
            BattleErrors::MissingColumn(col) => write!(f, "missing column in dataset: {}", col),
            BattleErrors::InvalidModel(msg) => write!(f, "invalid model artifact: {}", msg),
            BattleErrors::InvalidConstants(msg) => {
                write!(f, "invalid normalization constants: {}", msg)
            }
        }
    }
}

// ********* Configuration **********

/// The normalization constants of the scoring formula.
///
/// They are calibrated on the extremes observed in the cleaned dataset:
/// GDP in billions of dollars (PPP), military expenditures in percent of GDP,
/// birth and death rates per 1000 people.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct FormulaConstants {
    pub gdp_max: f64,
    pub military_max: f64,
    pub birth_max: f64,
    pub death_max: f64,
}

impl FormulaConstants {
    pub const DEFAULT: FormulaConstants = FormulaConstants {
        gdp_max: 30_000.0,
        military_max: 10.0,
        birth_max: 50.0,
        death_max: 20.0,
    };

    pub const WEIGHT_GDP: f64 = 0.30;
    pub const WEIGHT_MILITARY: f64 = 0.25;
    pub const WEIGHT_LITERACY: f64 = 0.20;
    pub const WEIGHT_BIRTH: f64 = 0.15;
    pub const WEIGHT_DEATH: f64 = 0.10;

    /// Checks that all the maxima can be used as divisors.
    pub fn new(
        gdp_max: f64,
        military_max: f64,
        birth_max: f64,
        death_max: f64,
    ) -> Result<FormulaConstants, BattleErrors> {
        for (name, x) in [
            ("gdpMax", gdp_max),
            ("militaryMax", military_max),
            ("birthMax", birth_max),
            ("deathMax", death_max),
        ] {
            if !(x.is_finite() && x > 0.0) {
                return Err(BattleErrors::InvalidConstants(format!(
                    "{} must be a positive number, got {}",
                    name, x
                )));
            }
        }
        Ok(FormulaConstants {
            gdp_max,
            military_max,
            birth_max,
            death_max,
        })
    }

    /// The maxima in feature order. Literacy is a percentage.
    pub fn maxima(&self) -> FeatureVector {
        [
            self.gdp_max,
            self.military_max,
            100.0,
            self.birth_max,
            self.death_max,
        ]
    }
}

impl Default for FormulaConstants {
    fn default() -> Self {
        FormulaConstants::DEFAULT
    }
}
