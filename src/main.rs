use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

mod args;
mod clash;

fn init_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() {
    let args = args::Args::parse();
    init_logger(args.verbose);
    info!("args: {:?}", args);

    if let Err(e) = clash::run_clash(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {:?}", bt);
        }
        std::process::exit(1);
    }
}
