//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::engine::Direction;
use crate::profile::{ButtonId, KnobId};

/// Bravo sync - drive Honeycomb Bravo lights and controls from X-Plane.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "bravo", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "BRAVO_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, env = "BRAVO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder of aircraft profiles
    #[arg(long, short = 'p', global = true)]
    pub profiles_dir: Option<PathBuf>,

    /// Simulator web API base URL (overrides the settings file)
    #[arg(long, global = true, env = "BRAVO_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Sync ===
    /// Sync panel lights with the simulator until interrupted
    Run(RunArgs),

    // === Profiles ===
    /// Load and compile every profile, reporting problems
    Check(CheckArgs),

    /// Show which profile an aircraft identity selects
    Select(SelectArgs),

    /// Create a profile from default.yaml
    Create(CreateArgs),

    // === Controls ===
    /// Fire a button's commands against the running simulator
    Press(PressArgs),

    /// Turn an autopilot knob against the running simulator
    Turn(TurnArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run without the panel, logging indicator changes only
    #[arg(long)]
    pub no_panel: bool,

    /// Remember the resolved profiles folder in the settings file
    #[arg(long)]
    pub remember: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Aircraft ICAO code or name
    pub identity: String,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// File name of the new profile, without extension
    #[arg(value_name = "FILE_STEM")]
    pub file_stem: String,

    /// Profile display name
    #[arg(long)]
    pub name: String,

    /// Profile description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Aircraft selector (repeatable)
    #[arg(long = "selector", short = 's')]
    pub selectors: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct PressArgs {
    /// Button (hdg, nav, alt, apr, vs, ap, ias, rev)
    pub button: ButtonId,

    /// Fire the double-click commands
    #[arg(long)]
    pub double: bool,

    /// Aircraft identity to select the profile with (defaults to the loaded aircraft)
    #[arg(long)]
    pub aircraft: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TurnArgs {
    /// Knob (ap_hdg, ap_vs, ap_alt, ap_ias, ap_crs)
    pub knob: KnobId,

    /// Direction (up or down)
    pub direction: Direction,

    /// Number of detents
    #[arg(long, short = 'n', default_value = "1")]
    pub count: u32,

    /// Aircraft identity to select the profile with (defaults to the loaded aircraft)
    #[arg(long)]
    pub aircraft: Option<String>,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
