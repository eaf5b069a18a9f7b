#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
use chrono::Utc;
use common::{
    logging,
    util::{path_or_relative_to_project_root, write_serializable_to_json},
    StreeError, StreeResult,
};
use executables::benchmark::{run_benchmark, BenchConfig};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
struct Cli {
    #[structopt(
        long = "config",
        parse(from_os_str),
        help = "Dhall config. Defaults to config/benchmark/default.dhall"
    )]
    config_path: Option<PathBuf>,
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output_path: Option<PathBuf>,
}

impl Cli {
    fn config_path(&self) -> StreeResult<PathBuf> {
        path_or_relative_to_project_root(
            self.config_path.as_ref(),
            "config/benchmark/default.dhall",
        )
    }

    fn output_path(&self) -> StreeResult<PathBuf> {
        path_or_relative_to_project_root(
            self.output_path.as_ref(),
            &format!("data/benchmark/{}.json", Utc::now().to_rfc3339()),
        )
    }
}

fn main() -> StreeResult<()> {
    logging::init_logging()?;

    let args = Cli::from_args();
    log::info!("CLI Arguments {:?}", args);

    let config = BenchConfig::from_file(args.config_path()?)
        .map_err(StreeError::rethrow_with("Could not read the benchmark config"))?;
    log::info!("{:?}", config);

    let results = run_benchmark(&config)?;
    for result in &results {
        log::info!(
            "{} {} n={}: build {:.6}s, {} queries {:.6}s, {} updates {:.6}s (mean)",
            result.element_type,
            result.function,
            result.size,
            result.build.mean,
            config.operations,
            result.query.mean,
            config.operations,
            result.update.mean
        );
    }

    let output_path = args.output_path()?;
    write_serializable_to_json(&results, &output_path)?;
    log::info!("Wrote results to {}", output_path.display());
    Ok(())
}
