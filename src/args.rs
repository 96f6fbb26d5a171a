use clap::Parser;

/// This program picks the winner of a battle between two countries, based on their statistics.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the session in JSON format: dataset, strategy and battles.
    /// For more information about the file format, read the documentation of the country_battle crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the outcome of a session in JSON format. If provided, clash will
    /// check that the output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the session will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The dataset with the statistics of the countries. Setting this option overrides what may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub data: Option<String>,

    /// (csv or xlsx) The type of the dataset. Inferred from the file extension by default.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// The first country of the battle.
    #[clap(long, value_parser)]
    pub country_a: Option<String>,

    /// The second country of the battle. It wins in case of a tie.
    #[clap(long, value_parser)]
    pub country_b: Option<String>,

    /// (formula or model, default formula) How to decide the winner.
    #[clap(long, value_parser)]
    pub strategy: Option<String>,

    /// (file path) The trained classifier, in JSON format. Required by the model strategy.
    #[clap(long, value_parser)]
    pub model: Option<String>,

    /// (file path, optional) The scaler applied before the classifier, in JSON format.
    #[clap(long, value_parser)]
    pub scaler: Option<String>,

    /// If passed as an argument, prints the names of the countries in the dataset and exits.
    #[clap(long, takes_value = false)]
    pub list: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
