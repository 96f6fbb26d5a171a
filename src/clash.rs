use log::{debug, info, warn};

use country_battle::match_log::MatchLog;
use country_battle::repository::StatsRepository;
use country_battle::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::clash::config_reader::*;
use crate::clash::io_common::{simplify_file_name, Dataset};

pub mod config_reader;
pub mod flags;
mod io_common;
mod io_csv;
mod io_excel;
mod io_model;

#[derive(Debug, Snafu)]
pub enum ClashError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {worksheet} not found in {path}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("Dataset {path} is empty"))]
    EmptyDataset { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not find the directory of {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("{source}"))]
    Battle { source: BattleErrors },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ClashResult<T> = Result<T, ClashError>;

/// Everything needed to run battles, loaded once at startup.
pub struct Session {
    pub name: String,
    pub dataset: String,
    pub repository: StatsRepository,
    pub strategy: Strategy,
    /// Used by the formula, and to normalize the comparison chart.
    pub constants: FormulaConstants,
    pub history_size: usize,
    pub model_digest: Option<String>,
    pub scaler_digest: Option<String>,
}

fn read_dataset(source: &DataSource) -> ClashResult<Dataset> {
    let path = source.file_path.as_str();
    info!("Attempting to read dataset {:?}", path);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_dataset(path),
        "xlsx" => io_excel::read_xlsx_dataset(path, source.excel_worksheet_name.as_deref()),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

pub fn load_repository(source: &DataSource) -> ClashResult<StatsRepository> {
    let dataset = read_dataset(source)?;
    let detected = ColumnMapping::detect(&dataset.header);
    let mapping = match &source.columns {
        Some(cols) => cols.to_mapping(&detected),
        None => detected,
    };
    debug!("load_repository: mapping: {:?}", mapping);
    let repo = StatsRepository::from_records(&dataset.header, &dataset.rows, &mapping)
        .context(BattleSnafu {})?;
    if repo.is_empty() {
        return Err(ClashError::EmptyDataset {
            path: source.file_path.clone(),
        });
    }
    Ok(repo)
}

/// The strategy, with the digests of the artifacts it was read from.
pub fn load_strategy(
    config: &StrategyConfig,
) -> ClashResult<(Strategy, Option<String>, Option<String>)> {
    match config.mode.as_str() {
        "formula" => Ok((Strategy::Formula(config.constants()?), None, None)),
        "model" => {
            let model_path = match &config.model_path {
                Some(p) => p,
                None => whatever!("The model strategy requires a model file"),
            };
            let classifier = io_model::read_classifier(model_path)?;
            let scaler = match &config.scaler_path {
                Some(p) => Some(io_model::read_scaler(p)?),
                None => None,
            };
            let scaler_digest = scaler.as_ref().map(|s| s.digest.clone());
            let strategy = Strategy::Model(ModelStrategy::new(
                classifier.value,
                scaler.map(|s| s.value),
            ));
            Ok((strategy, Some(classifier.digest), scaler_digest))
        }
        x => whatever!("Unknown strategy {:?}, expected formula or model", x),
    }
}

pub fn load_session(config: &ClashConfig, repository: StatsRepository) -> ClashResult<Session> {
    let (strategy, model_digest, scaler_digest) = load_strategy(&config.strategy)?;
    let dataset = simplify_file_name(config.data_source.file_path.as_str());
    Ok(Session {
        name: config
            .output_settings
            .session_name
            .clone()
            .unwrap_or_else(|| dataset.clone()),
        dataset,
        repository,
        strategy,
        constants: config.strategy.constants()?,
        history_size: config
            .output_settings
            .history_size
            .unwrap_or(MatchLog::SIDEBAR_SIZE),
        model_digest,
        scaler_digest,
    })
}

fn stats_to_json(cs: &CountryStats) -> JSValue {
    json!({
        "gdp": cs.gdp,
        "military": cs.military,
        "literacy": cs.literacy,
        "birth": cs.birth,
        "death": cs.death,
    })
}

fn details_to_json(details: &BattleDetails) -> JSValue {
    match details {
        BattleDetails::Formula { score_a, score_b } => json!({
            "strategy": "formula",
            "scoreA": score_a,
            "scoreB": score_b,
        }),
        BattleDetails::Model {
            difference,
            scaled,
            label,
        } => json!({
            "strategy": "model",
            "difference": difference.to_vec(),
            "scaled": scaled.to_vec(),
            "label": label,
        }),
    }
}

fn comparison_to_json(cmp: &[FeatureComparison]) -> Vec<JSValue> {
    cmp.iter()
        .map(|c| {
            json!({
                "stat": c.name,
                "valueA": c.value_a,
                "valueB": c.value_b,
                "normalizedA": c.normalized_a,
                "normalizedB": c.normalized_b,
            })
        })
        .collect()
}

fn match_result_to_json(mr: &MatchResult) -> JSValue {
    json!({
        "countryA": mr.country_a,
        "countryB": mr.country_b,
        "winner": mr.winner,
    })
}

fn run_one_battle(
    session: &Session,
    battle: &BattleConfig,
    log: &mut MatchLog,
) -> Result<JSValue, BattleErrors> {
    let a = battle.country_a.as_str();
    let b = battle.country_b.as_str();
    // Same country on both sides: rejected before any lookup.
    if a == b {
        return Err(BattleErrors::InvalidInput(a.to_string()));
    }
    let stats_a = session.repository.get_stats(a)?;
    let stats_b = session.repository.get_stats(b)?;
    let res = run_battle(a, &stats_a, b, &stats_b, &session.strategy, Some(log))?;
    let cmp = compare_features(&stats_a, &stats_b, &session.constants);
    Ok(json!({
        "countryA": a,
        "countryB": b,
        "winner": res.winner(),
        "statsA": stats_to_json(&stats_a),
        "statsB": stats_to_json(&stats_b),
        "codeA": flags::country_code_or_unknown(a),
        "codeB": flags::country_code_or_unknown(b),
        "flagA": flags::flag_source(a).describe(),
        "flagB": flags::flag_source(b).describe(),
        "details": details_to_json(&res.details),
        "comparison": comparison_to_json(&cmp),
    }))
}

/// Runs all the battles in order and assembles the summary.
///
/// A battle with an unknown country or the same country twice is reported
/// in the summary and does not stop the session.
pub fn run_session(session: &Session, battles: &[BattleConfig], log: &mut MatchLog) -> JSValue {
    let mut results: Vec<JSValue> = Vec::new();
    for battle in battles {
        match run_one_battle(session, battle, log) {
            Ok(js) => results.push(js),
            Err(e) => {
                warn!(
                    "Battle {} vs {} skipped: {}",
                    battle.country_a, battle.country_b, e
                );
                results.push(json!({
                    "countryA": battle.country_a,
                    "countryB": battle.country_b,
                    "error": e.to_string(),
                }));
            }
        }
    }
    let recent: Vec<JSValue> = log
        .recent(session.history_size)
        .into_iter()
        .map(match_result_to_json)
        .collect();

    let mut session_js = json!({
        "name": session.name,
        "strategy": session.strategy.name(),
        "dataset": session.dataset,
    });
    if let Some(d) = &session.model_digest {
        session_js["modelDigest"] = json!(d);
    }
    if let Some(d) = &session.scaler_digest {
        session_js["scalerDigest"] = json!(d);
    }
    json!({
        "session": session_js,
        "battles": results,
        "recent": recent,
    })
}

/// Compares the summary with a reference summary, and prints the differences if any.
pub fn check_reference(pretty_js_stats: &str, reference_path: &str) -> ClashResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return Err(ClashError::ReferenceMismatch {
            path: reference_path.to_string(),
        });
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

fn write_summary(pretty_js_stats: &str, out: Option<&str>) -> ClashResult<()> {
    match out {
        None | Some("stdout") | Some("") => {
            println!("{}", pretty_js_stats);
            Ok(())
        }
        Some(path) => {
            info!("Writing summary to {}", path);
            fs::write(path, pretty_js_stats).context(WritingOutputSnafu { path })
        }
    }
}

/// The provider of a dataset, from the extension of its file.
fn provider_for_path(path: &str) -> String {
    if path.ends_with(".xlsx") { "xlsx" } else { "csv" }.to_string()
}

/// Builds the configuration from the configuration file (if any), then applies the
/// options of the command line on top of it.
pub fn config_from_args(args: &Args) -> ClashResult<ClashConfig> {
    let mut config = match (&args.config, &args.data) {
        (Some(p), _) => read_config(p)?,
        (None, Some(d)) => ClashConfig {
            output_settings: OutputSettings::default(),
            data_source: DataSource {
                provider: provider_for_path(d),
                file_path: d.clone(),
                excel_worksheet_name: None,
                columns: None,
            },
            strategy: StrategyConfig::default(),
            battles: Vec::new(),
        },
        (None, None) => whatever!("No dataset provided: use --config or --data"),
    };

    if let Some(d) = &args.data {
        config.data_source.file_path = d.clone();
        config.data_source.provider = provider_for_path(d);
    }
    if let Some(t) = &args.input_type {
        config.data_source.provider = t.clone();
    }
    if let Some(w) = &args.excel_worksheet_name {
        config.data_source.excel_worksheet_name = Some(w.clone());
    }
    if let Some(s) = &args.strategy {
        config.strategy.mode = s.clone();
    }
    if let Some(m) = &args.model {
        config.strategy.model_path = Some(m.clone());
    }
    if let Some(s) = &args.scaler {
        config.strategy.scaler_path = Some(s.clone());
    }
    if let Some(o) = &args.out {
        config.output_settings.output_path = Some(o.clone());
    }
    match (&args.country_a, &args.country_b) {
        (Some(a), Some(b)) => {
            config.battles = vec![BattleConfig {
                country_a: a.clone(),
                country_b: b.clone(),
            }];
        }
        (None, None) => {}
        _ => whatever!("Both --country-a and --country-b must be provided"),
    }
    Ok(config)
}

pub fn run_clash(args: &Args) -> ClashResult<()> {
    let config = config_from_args(args)?;
    info!("config: {:?}", config);

    let repository = load_repository(&config.data_source)?;
    if args.list {
        for c in repository.countries() {
            println!("{}", c);
        }
        return Ok(());
    }
    if config.battles.is_empty() {
        whatever!(
            "No battle to run: use --country-a and --country-b, \
            or list battles in the configuration"
        );
    }

    let session = load_session(&config, repository)?;
    let mut log = MatchLog::new();
    let summary = run_session(&session, &config.battles, &mut log);
    info!("Played {} battles", log.len());

    let pretty_js_stats = serde_json::to_string_pretty(&summary).context(SerializingJsonSnafu {})?;
    write_summary(
        pretty_js_stats.as_str(),
        config.output_settings.output_path.as_deref(),
    )?;

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        check_reference(pretty_js_stats.as_str(), reference_p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    const CSV: &str = "\
Country,gdp,military,literacy,birth,death
Atlantia,\"1,000\",5,90,10,5
Borduria,500,2.5%,80,12,6
Carpania,,oops,70
Duchy,500,2.5,80,12,6
";

    fn write_session(dir: &Path, strategy: &str, battles: &str) -> String {
        fs::write(dir.join("countries.csv"), CSV).unwrap();
        fs::write(
            dir.join("model.json"),
            r#"{"kind": "linear", "coefficients": [0, 0, 1, 0, 0], "intercept": 0}"#,
        )
        .unwrap();
        let config = format!(
            r#"{{
                "outputSettings": {{"sessionName": "test", "historySize": 2}},
                "dataSource": {{"provider": "csv", "filePath": "countries.csv"}},
                "strategy": {strategy},
                "battles": {battles}
            }}"#
        );
        let p = dir.join("config.json");
        fs::write(&p, config).unwrap();
        p.display().to_string()
    }

    fn run(config_path: &str) -> (JSValue, MatchLog) {
        let config = read_config(config_path).unwrap();
        let repo = load_repository(&config.data_source).unwrap();
        let session = load_session(&config, repo).unwrap();
        let mut log = MatchLog::new();
        let js = run_session(&session, &config.battles, &mut log);
        (js, log)
    }

    const BATTLES: &str = r#"[
        {"countryA": "Atlantia", "countryB": "Borduria"},
        {"countryA": "Borduria", "countryB": "Atlantia"},
        {"countryA": "Borduria", "countryB": "Duchy"},
        {"countryA": "Atlantia", "countryB": "Atlantia"},
        {"countryA": "Atlantia", "countryB": "Utopia"},
        {"countryA": "Carpania", "countryB": "Duchy"},
        {"countryA": "Utopia", "countryB": "Utopia"}
    ]"#;

    #[test]
    fn formula_session() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let p = write_session(
            dir.path(),
            r#"{"mode": "formula", "gdpMax": 1000, "militaryMax": 10,
                "birthMax": 20, "deathMax": 10}"#,
            BATTLES,
        );
        let (js, log) = run(&p);

        assert_eq!(js["session"]["name"], "test");
        assert_eq!(js["session"]["strategy"], "formula");
        assert_eq!(js["session"]["dataset"], "countries.csv");
        assert!(js["session"].get("modelDigest").is_none());

        let battles = js["battles"].as_array().unwrap();
        assert_eq!(battles.len(), 7);
        assert_eq!(battles[0]["winner"], "Atlantia");
        // Same country wins when the sides are swapped.
        assert_eq!(battles[1]["winner"], "Atlantia");
        // Identical statistics: the second country wins.
        assert_eq!(battles[2]["winner"], "Duchy");
        assert_eq!(
            battles[3]["error"],
            "choose different countries (got Atlantia twice)"
        );
        assert_eq!(battles[4]["error"], "country not found: Utopia");
        // Picking the same country twice is reported even when it is unknown.
        assert_eq!(
            battles[6]["error"],
            "choose different countries (got Utopia twice)"
        );
        assert_eq!(battles[5]["winner"], "Duchy");
        assert_eq!(battles[5]["statsA"]["gdp"], 0.0);
        assert_eq!(battles[5]["statsA"]["death"], 0.0);
        assert_eq!(battles[0]["statsA"]["gdp"], 1000.0);
        assert_eq!(battles[0]["flagA"], "placeholder");
        assert_eq!(battles[0]["codeB"], "unknown");
        assert_eq!(battles[0]["comparison"][0]["normalizedB"], 0.5);

        // Only the valid battles are logged.
        assert_eq!(log.len(), 4);
        let recent = js["recent"].as_array().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0]["countryA"], "Carpania");
        assert_eq!(recent[1]["countryA"], "Borduria");
        assert_eq!(recent[1]["winner"], "Duchy");
    }

    #[test]
    fn model_session() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_session(
            dir.path(),
            r#"{"mode": "model", "modelPath": "model.json"}"#,
            BATTLES,
        );
        let (js, _) = run(&p);
        assert_eq!(js["session"]["strategy"], "model");
        assert_eq!(
            js["session"]["modelDigest"].as_str().map(|s| s.len()),
            Some(64)
        );
        let battles = js["battles"].as_array().unwrap();
        // The model only looks at the literacy difference.
        assert_eq!(battles[0]["winner"], "Atlantia");
        assert_eq!(battles[0]["details"]["label"], 1);
        assert_eq!(battles[0]["details"]["difference"][2], 10.0);
        assert_eq!(battles[1]["winner"], "Atlantia");
        assert_eq!(battles[2]["winner"], "Duchy");
    }

    #[test]
    fn missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_session(
            dir.path(),
            r#"{"mode": "model", "modelPath": "nothing.json"}"#,
            "[]",
        );
        let config = read_config(&p).unwrap();
        let repo = load_repository(&config.data_source).unwrap();
        assert!(matches!(
            load_session(&config, repo),
            Err(ClashError::OpeningJson { .. })
        ));
    }

    #[test]
    fn reference_check() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_session(dir.path(), r#"{"mode": "formula"}"#, BATTLES);
        let (js, _) = run(&p);
        let pretty = serde_json::to_string_pretty(&js).unwrap();
        let ref_p = dir.path().join("expected_summary.json");
        fs::write(&ref_p, &pretty).unwrap();
        let ref_s = ref_p.display().to_string();
        assert!(check_reference(&pretty, &ref_s).is_ok());

        let other = pretty.replace("Borduria", "Syldavia");
        assert!(matches!(
            check_reference(&other, &ref_s),
            Err(ClashError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn command_line_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_session(dir.path(), r#"{"mode": "formula"}"#, BATTLES);
        let args = Args::parse_from([
            "clash",
            "--config",
            p.as_str(),
            "--country-a",
            "Duchy",
            "--country-b",
            "Borduria",
            "--strategy",
            "model",
            "--model",
            "other.json",
            "--out",
            "stdout",
        ]);
        let config = config_from_args(&args).unwrap();
        assert_eq!(
            config.battles,
            vec![BattleConfig {
                country_a: "Duchy".to_string(),
                country_b: "Borduria".to_string()
            }]
        );
        assert_eq!(config.strategy.mode, "model");
        assert_eq!(config.strategy.model_path.as_deref(), Some("other.json"));
        assert_eq!(config.output_settings.output_path.as_deref(), Some("stdout"));
        assert!(config.data_source.file_path.ends_with("countries.csv"));
    }

    #[test]
    fn data_only_arguments() {
        let args = Args::parse_from(["clash", "--data", "stats.xlsx", "--country-a", "Chile"]);
        assert!(config_from_args(&args).is_err());

        let args = Args::parse_from(["clash", "-d", "stats.xlsx"]);
        let config = config_from_args(&args).unwrap();
        assert_eq!(config.data_source.provider, "xlsx");
        assert_eq!(config.strategy.mode, "formula");
        assert!(config.battles.is_empty());

        let args = Args::parse_from(["clash", "--list"]);
        assert!(config_from_args(&args).is_err());
    }

    #[test]
    fn data_argument_sets_provider() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.json");
        fs::write(
            &p,
            r#"{"dataSource": {"provider": "xlsx", "filePath": "countries.xlsx"}}"#,
        )
        .unwrap();
        let p = p.display().to_string();

        let config = config_from_args(&Args::parse_from(["clash", "-c", p.as_str()])).unwrap();
        assert_eq!(config.data_source.provider, "xlsx");

        let args = Args::parse_from(["clash", "-c", p.as_str(), "--data", "other.csv"]);
        let config = config_from_args(&args).unwrap();
        assert_eq!(config.data_source.provider, "csv");
        assert_eq!(config.data_source.file_path, "other.csv");

        // An explicit input type wins over the extension.
        let args = Args::parse_from([
            "clash",
            "-c",
            p.as_str(),
            "--data",
            "other.csv",
            "--input-type",
            "xlsx",
        ]);
        let config = config_from_args(&args).unwrap();
        assert_eq!(config.data_source.provider, "xlsx");
    }

    #[test]
    fn unknown_provider_and_strategy() {
        let source = DataSource {
            provider: "parquet".to_string(),
            file_path: "x".to_string(),
            excel_worksheet_name: None,
            columns: None,
        };
        assert!(matches!(
            load_repository(&source),
            Err(ClashError::Whatever { .. })
        ));
        let sc = StrategyConfig {
            mode: "coin".to_string(),
            ..Default::default()
        };
        assert!(load_strategy(&sc).is_err());
    }

    #[test]
    fn wrong_columns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("c.csv"), "Name,GDP\nX,1\n").unwrap();
        let source = DataSource {
            provider: "csv".to_string(),
            file_path: dir.path().join("c.csv").display().to_string(),
            excel_worksheet_name: None,
            columns: None,
        };
        match load_repository(&source) {
            Err(ClashError::Battle {
                source: BattleErrors::MissingColumn(c),
            }) => assert_eq!(c, "Country"),
            _ => panic!("expected a missing column"),
        }
    }
}
