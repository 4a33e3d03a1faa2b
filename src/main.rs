//! cfgsplice CLI binary entry point.
//! Builds a patch request from flags or a JSON document, runs it and prints
//! the result.

use cfgsplice::apply::{apply_patch, Mode};
use cfgsplice::cli::{Cli, Commands};
use cfgsplice::config::{self, Effective};
use cfgsplice::error::PatchError;
use cfgsplice::models::PatchRequest;
use cfgsplice::{output, utils};
use clap::Parser;
use serde_json::Value as Json;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let code = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::Patch {
            file,
            section,
            data,
            data_file,
            athlete,
            preserve,
            dry_run,
            diff,
            output,
        } => {
            let eff = setup(output.as_deref());
            let req = load_section_data(data.as_deref(), data_file.as_deref()).map(|data| {
                PatchRequest {
                    file_path: Some(file),
                    section_name: Some(section),
                    section_data: Some(data),
                    is_athlete: athlete,
                    preserve_nested_keys: preserve,
                }
            });
            let mode = if dry_run || diff { Mode::Preview } else { Mode::Write };
            run(req, &eff, mode, diff)
        }
        Commands::Apply {
            request,
            dry_run,
            output,
        } => {
            let eff = setup(output.as_deref());
            let mode = if dry_run { Mode::Preview } else { Mode::Write };
            run(load_request(request.as_deref()), &eff, mode, false)
        }
    };
    std::process::exit(code);
}

/// Resolve configuration and install the log subscriber.
fn setup(cli_output: Option<&str>) -> Effective {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let eff = config::resolve_effective(&cwd, cli_output);

    // RUST_LOG wins over the config file's `log` level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&eff.log))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Some(err) = &eff.load_error {
        let file = eff
            .config_file
            .as_deref()
            .map(utils::rel_to_wd)
            .unwrap_or_else(|| "config".to_string());
        eprintln!(
            "{} ignoring {} ({}); using defaults.",
            utils::note_prefix(),
            file,
            err
        );
    }
    eff
}

fn run(req: Result<PatchRequest, PatchError>, eff: &Effective, mode: Mode, diff: bool) -> i32 {
    let result = req.and_then(|mut req| {
        if let Some(section) = req.section_name.as_deref() {
            let defaults = eff.preserve_for(section).to_vec();
            config::merge_preserve(&mut req.preserve_nested_keys, &defaults);
        }
        apply_patch(&req, mode)
    });
    match result {
        Ok(outcome) => {
            output::print_outcome(&outcome, &eff.output, diff);
            0
        }
        Err(err) => {
            output::print_error(&err, &eff.output);
            if err.status() >= 500 {
                1
            } else {
                2
            }
        }
    }
}

/// Section data from `--data` (JSON) or `--data-file` (JSON, or YAML by
/// extension).
fn load_section_data(inline: Option<&str>, file: Option<&str>) -> Result<Json, PatchError> {
    if let Some(s) = inline {
        return serde_json::from_str(s)
            .map_err(|e| PatchError::InvalidSectionData(format!("--data is not valid JSON: {}", e)));
    }
    let Some(file) = file else {
        return Err(PatchError::MissingParameters(vec!["sectionData"]));
    };
    let path = Path::new(file);
    let text = fs::read_to_string(path).map_err(|e| {
        PatchError::InvalidRequest(format!("cannot read data file {}: {}", file, e))
    })?;
    let is_yaml = path
        .extension()
        .is_some_and(|e| e == "yaml" || e == "yml");
    if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| {
            PatchError::InvalidSectionData(format!("{} is not valid YAML: {}", file, e))
        })
    } else {
        serde_json::from_str(&text).map_err(|e| {
            PatchError::InvalidSectionData(format!("{} is not valid JSON: {}", file, e))
        })
    }
}

/// Patch request from a file, or stdin when `path` is absent or `-`.
fn load_request(path: Option<&str>) -> Result<PatchRequest, PatchError> {
    let text = match path {
        Some(p) if p != "-" => fs::read_to_string(p)
            .map_err(|e| PatchError::InvalidRequest(format!("cannot read {}: {}", p, e)))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| PatchError::InvalidRequest(format!("cannot read stdin: {}", e)))?;
            buf
        }
    };
    serde_json::from_str(&text)
        .map_err(|e| PatchError::InvalidRequest(format!("request is not valid JSON: {}", e)))
}
