mod args;
mod survey;

use clap::Parser;
use log::{info, LevelFilter};

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args {:?}", args);

    if let Err(e) = survey::run(&args) {
        survey::report_error(&e);
        std::process::exit(1);
    }
}
