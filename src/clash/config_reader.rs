use std::fs;
use std::path::Path;

use crate::clash::io_common::resolve_path;
use crate::clash::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "sessionName")]
    pub session_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    /// The number of recent battles to report.
    #[serde(rename = "historySize")]
    pub history_size: Option<usize>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnsConfig {
    pub country: Option<String>,
    pub gdp: Option<String>,
    pub military: Option<String>,
    pub literacy: Option<String>,
    pub birth: Option<String>,
    pub death: Option<String>,
}

impl ColumnsConfig {
    /// Fills the columns that are not specified with the ones of the default mapping.
    pub fn to_mapping(&self, default: &ColumnMapping) -> ColumnMapping {
        let pick = |x: &Option<String>, d: &String| x.clone().unwrap_or_else(|| d.clone());
        ColumnMapping {
            country: pick(&self.country, &default.country),
            gdp: pick(&self.gdp, &default.gdp),
            military: pick(&self.military, &default.military),
            literacy: pick(&self.literacy, &default.literacy),
            birth: pick(&self.birth, &default.birth),
            death: pick(&self.death, &default.death),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// "csv" or "xlsx"
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub columns: Option<ColumnsConfig>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// "formula" or "model"
    pub mode: String,
    #[serde(rename = "modelPath")]
    pub model_path: Option<String>,
    #[serde(rename = "scalerPath")]
    pub scaler_path: Option<String>,
    #[serde(rename = "gdpMax")]
    pub gdp_max: Option<f64>,
    #[serde(rename = "militaryMax")]
    pub military_max: Option<f64>,
    #[serde(rename = "birthMax")]
    pub birth_max: Option<f64>,
    #[serde(rename = "deathMax")]
    pub death_max: Option<f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            mode: "formula".to_string(),
            model_path: None,
            scaler_path: None,
            gdp_max: None,
            military_max: None,
            birth_max: None,
            death_max: None,
        }
    }
}

impl StrategyConfig {
    pub fn constants(&self) -> ClashResult<FormulaConstants> {
        let d = FormulaConstants::DEFAULT;
        FormulaConstants::new(
            self.gdp_max.unwrap_or(d.gdp_max),
            self.military_max.unwrap_or(d.military_max),
            self.birth_max.unwrap_or(d.birth_max),
            self.death_max.unwrap_or(d.death_max),
        )
        .context(BattleSnafu {})
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(rename = "countryA")]
    pub country_a: String,
    #[serde(rename = "countryB")]
    pub country_b: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ClashConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSource")]
    pub data_source: DataSource,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub battles: Vec<BattleConfig>,
}

impl ClashConfig {
    /// The paths of the files, relative to the given directory.
    pub fn resolve_paths(&mut self, root: &Path) {
        self.data_source.file_path = resolve_path(root, &self.data_source.file_path);
        self.strategy.model_path = self
            .strategy
            .model_path
            .as_ref()
            .map(|p| resolve_path(root, p));
        self.strategy.scaler_path = self
            .strategy
            .scaler_path
            .as_ref()
            .map(|p| resolve_path(root, p));
        self.output_settings.output_path = self
            .output_settings
            .output_path
            .as_ref()
            .map(|p| match p.as_str() {
                "stdout" => p.clone(),
                _ => resolve_path(root, p),
            });
    }
}

pub fn read_config(path: &str) -> ClashResult<ClashConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: ClashConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let root = Path::new(path).parent().context(MissingParentDirSnafu { path })?;
    config.resolve_paths(root);
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> ClashResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
