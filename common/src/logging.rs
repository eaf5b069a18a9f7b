//! helper functions for the logging backend
use crate::util::find_project_root;
use crate::StreeResult;
use flexi_logger::{self, writers::FileLogWriter, Duplicate, LogTarget, Logger};
use log::Level::Warn;
use std::fs;

/// Creates a logging backend
/// By default all logs with Info or higher are written to a logfile in the folder `logs` at the project root.
/// All logs with level at least Info are also written to stdout.
/// Logs with level at least Error are also written to stderr.
/// The default level can be overridden with `RUST_LOG`.
///
/// logs can be written via log::{error!, warn!, info!, debug!, trace!}
pub fn init_logging() -> StreeResult<()> {
    let mut output_dir = find_project_root()?;
    output_dir.push("logs");
    fs::create_dir_all(&output_dir)?;

    let file_writer = FileLogWriter::builder()
        .directory(output_dir)
        .format(flexi_logger::colored_opt_format)
        .try_build()
        .map_err(|error| format!("Could not open the log file: {}", error))?;

    Logger::with_env_or_str("info")
        .format(flexi_logger::colored_opt_format)
        .log_target(LogTarget::Writer(Box::new(file_writer)))
        .duplicate_to_stdout(Duplicate::Info)
        .duplicate_to_stderr(Duplicate::Error)
        .start()
        .map_err(|error| format!("Logging initialization failed: {}", error))?;
    log_panics::init();
    Ok(())
}

/// Creates a logging backend for use in testing
/// By default all logs with Warn or higher are printed to stdout.
pub fn init_test_logging() {
    if !log::log_enabled!(Warn) {
        // A second test thread may have won the race, which is fine.
        if let Err(error) = Logger::with_env_or_str("warn")
            .format(flexi_logger::colored_opt_format)
            .start()
        {
            eprintln!("Logging initialization skipped: {}", error);
        }
    }
}
