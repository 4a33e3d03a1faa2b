//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cfgsplice",
    version,
    about = "Comment-preserving YAML section patcher",
    long_about = "cfgsplice replaces one named section of a YAML configuration file while leaving every other line, comment and blank line untouched.\n\nConfiguration precedence: CLI > cfgsplice.toml > defaults.",
    after_help = "Examples:\n  cfgsplice patch --file config.yaml --section general --data '{\"theme\":\"dark\"}'\n  cfgsplice patch --file config.yaml --section appearance.dashboard --data-file layout.json --diff\n  cfgsplice apply --request request.json --output json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current cfgsplice version.")]
    Version,
    /// Patch one section of a file
    #[command(
        about = "Patch one section",
        long_about = "Replace the body of one section with new data. A backup of the original is taken before writing unless disabled in settings. --diff implies --dry-run.",
        after_help = "Examples:\n  cfgsplice patch --file config.yaml --section general --data '{\"units\":\"metric\"}'\n  cfgsplice patch --file config.yaml --section athlete --data-file athlete.yaml --dry-run\n  cfgsplice patch --file config.yaml --section appearance --preserve dashboard --data-file appearance.json"
    )]
    Patch {
        #[arg(long, help = "Path to the YAML file to patch")]
        file: String,
        #[arg(long, help = "Section name: key, parent.child, or athlete")]
        section: String,
        #[arg(long, conflicts_with = "data_file", required_unless_present = "data_file", help = "Section data as a JSON object")]
        data: Option<String>,
        #[arg(long, help = "Read section data from a JSON file (YAML when the extension is .yaml/.yml)")]
        data_file: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Target general.athlete regardless of --section")]
        athlete: bool,
        #[arg(long = "preserve", value_name = "KEY", help = "Child key to keep verbatim (top-level sections only); repeatable")]
        preserve: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print the patched document without backup or write")]
        dry_run: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print the changed region (implies --dry-run)")]
        diff: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Run a JSON patch request
    #[command(
        about = "Run a patch request",
        long_about = "Read a patch request ({filePath, sectionName, sectionData, isAthlete?, preserveNestedKeys?}) as JSON and run it.",
        after_help = "Examples:\n  cfgsplice apply --request request.json\n  cat request.json | cfgsplice apply --output json"
    )]
    Apply {
        #[arg(long, help = "Request file, or - for stdin (default: stdin)")]
        request: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Compute the result without backup or write")]
        dry_run: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
