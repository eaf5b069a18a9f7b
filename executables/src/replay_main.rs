#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
use chrono::Utc;
use common::{
    logging,
    util::{path_or_relative_to_project_root, read_json_from_path, write_serializable_to_json},
    StreeError, StreeResult,
};
use executables::replay::{replay, Outcome, Script};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
struct Cli {
    #[structopt(parse(from_os_str), help = "JSON script with source, function and operations")]
    script_path: PathBuf,
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output_path: Option<PathBuf>,
}

fn output_path(args: &Cli) -> StreeResult<PathBuf> {
    let mut file_name: String = format!("{}-", Utc::now().to_rfc3339());
    match args.script_path.file_name().and_then(|name| name.to_str()) {
        Some(name) => file_name.push_str(name),
        None => file_name.push_str("replay.json"),
    }
    path_or_relative_to_project_root(
        args.output_path.as_ref(),
        &format!("data/replay/{}", &file_name),
    )
}

fn main() -> StreeResult<()> {
    logging::init_logging()?;

    let args = Cli::from_args();
    log::info!("CLI Arguments {:?}", args);

    let script: Script = read_json_from_path(&args.script_path)
        .map_err(StreeError::rethrow_with("Could not read the script"))?;
    log::info!(
        "Replaying {} operations on {} elements",
        script.operations.len(),
        script.source.len()
    );

    let result = replay(&script)?;
    let failed = result
        .outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Outcome::Error(_)))
        .count();
    log::info!(
        "Replayed on a {} {} tree, {} of {} operations failed",
        result.element_type,
        result.function,
        failed,
        result.outcomes.len()
    );

    let output_path = output_path(&args)?;
    write_serializable_to_json(&result, &output_path)?;
    log::info!("Wrote outcomes to {}", output_path.display());
    Ok(())
}
