//! Bravo sync CLI - drive Honeycomb Bravo lights and controls from X-Plane.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use bravo::cli::{self, Cli, Commands};
use bravo::config::{ProfilesDirCandidates, Settings, resolve_profiles_dir};
use bravo::engine::{ActiveProfile, ClickKind, Engine};
use bravo::error::{BravoError, Result};
use bravo::output::{
    CheckSummary, Output, OutputMode, ProfileCheck, ProfileIssue, Selection, VersionInfo,
};
use bravo::panel::{BravoPanel, LedBank, Panel};
use bravo::profile::{self, ProfileStore, TEMPLATE_FILE};
use bravo::runner::SyncLoop;
use bravo::telemetry::http::XPlaneWebApi;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> bool {
        option_env!("VERGEN_GIT_DIRTY") == Some("true")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    // Handle no-color flag or non-TTY
    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    bravo::logging::init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let out = OutputMode::from_cli(&cli).into_output();
    if let Err(e) = run(&cli, out.as_ref()) {
        out.error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, out: &dyn Output) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Run(args)) => cmd_run(cli, args, out),
        Some(Commands::Check(args)) => cmd_check(cli, args, out),
        Some(Commands::Select(args)) => cmd_select(cli, args, out),
        Some(Commands::Create(args)) => cmd_create(cli, args, out),
        Some(Commands::Press(args)) => cmd_press(cli, args, out),
        Some(Commands::Turn(args)) => cmd_turn(cli, args, out),
        Some(Commands::Version) => cmd_version(out),
        Some(Commands::Completions(args)) => cmd_completions(args),
    }
}

// === Quick Start ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    commands: [(&'static str, &'static str); 6],
    output_modes: [&'static str; 3],
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    let commands = [
        ("bravo run", "Sync the panel with the simulator"),
        ("bravo check", "Validate every profile"),
        ("bravo select <ICAO>", "Show which profile an aircraft selects"),
        (
            "bravo create <FILE> --name <NAME> --selector <ICAO>",
            "New profile from default.yaml",
        ),
        ("bravo press <BUTTON> [--double]", "Fire a button's commands"),
        ("bravo turn <KNOB> <up|down>", "Turn an autopilot knob"),
    ];

    if cli.use_json() {
        let help = RobotQuickStart {
            tool: "bravo",
            version: build_info::VERSION,
            description: "Profile-driven sync between X-Plane and the Honeycomb Bravo",
            commands,
            output_modes: [
                "--format=text (default)",
                "--robot or --format=json",
                "--format=json-compact",
            ],
        };
        println!("{}", serde_json::to_string_pretty(&help).unwrap_or_default());
    } else {
        println!(
            "{} {} - Honeycomb Bravo sync\n",
            console::style("bravo").bold().cyan(),
            build_info::VERSION
        );
        println!("{}", console::style("QUICK START").bold().underlined());
        println!();
        for (command, what) in commands {
            println!("  {:<52} {what}", console::style(command).green());
        }
    }
    Ok(())
}

// === Shared Setup ===

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load_or_default(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        settings.api_url.clone_from(url);
    }
    Ok(settings)
}

fn settings_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(Settings::default_path)
}

fn profiles_dir(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let candidates =
        ProfilesDirCandidates::from_process(cli.profiles_dir.clone(), settings.profiles_dir.clone());
    resolve_profiles_dir(&candidates)
}

fn load_store(cli: &Cli, settings: &Settings) -> Result<ProfileStore> {
    ProfileStore::load_dir(profiles_dir(cli, settings)?)
}

/// Engine wired to the simulator's web API with the store as catalog.
fn connect_engine(settings: &Settings, store: &ProfileStore) -> Result<Engine> {
    let api = XPlaneWebApi::new(&settings.api_url, settings.request_timeout())?;
    info!(url = api.base_url(), "Using simulator web API");
    let engine = Engine::new(Arc::new(api));
    engine.set_catalog(store.profiles().to_vec());
    Ok(engine)
}

/// Activate a profile for `aircraft`, or for whatever the simulator has loaded.
fn activate(engine: &Engine, aircraft: Option<&str>) -> Result<String> {
    match aircraft {
        Some(identity) => engine.select_profile(identity),
        None => engine.select_for_loaded_aircraft(),
    }
}

// === Commands ===

fn cmd_run(cli: &Cli, args: &cli::RunArgs, out: &dyn Output) -> Result<()> {
    let mut settings = load_settings(cli)?;
    let store = load_store(cli, &settings)?;
    if !cli.quiet {
        out.profiles_status(&store.status());
    }

    if args.remember {
        if let Some(path) = settings_path(cli) {
            settings.profiles_dir = Some(store.dir().to_path_buf());
            settings.save(&path)?;
        }
    }

    let engine = connect_engine(&settings, &store)?;
    let bank = LedBank::new();
    engine.bind_outputs(bank.bindings());

    let panel = if args.no_panel {
        None
    } else {
        match BravoPanel::open() {
            Ok(device) => Some(Panel::new(device)),
            Err(e @ BravoError::PanelNotFound) => {
                out.warning(&format!("{e}; continuing without the panel"));
                None
            }
            Err(e) => return Err(e),
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    spawn_interrupt_watcher(Arc::clone(&stop))?;

    if !cli.quiet {
        out.info("Syncing with the simulator (Ctrl+C to stop)");
    }
    let summary = SyncLoop::new(&engine, bank, panel, settings.tick_interval())
        .run(&stop, |name, identity| out.profile_activated(name, Some(identity)));
    debug!(?summary, "Run finished");

    if !cli.quiet {
        out.success(&format!(
            "Stopped after {} ticks ({} profile switches)",
            summary.ticks, summary.profile_switches
        ));
    }
    Ok(())
}

/// Set `stop` on Ctrl+C.
fn spawn_interrupt_watcher(stop: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, stopping");
                    stop.store(true, Ordering::SeqCst);
                }
            });
        })?;
    Ok(())
}

fn cmd_check(cli: &Cli, args: &cli::CheckArgs, out: &dyn Output) -> Result<()> {
    let settings = load_settings(cli)?;
    let dir = profiles_dir(cli, &settings)?;
    let files = profile::profile_files(&dir)?;

    let checks: Vec<ProfileCheck> = files
        .iter()
        .map(|file| check_profile(file, args.strict))
        .collect();
    let summary = CheckSummary::from_checks(&checks);
    out.check_results(&checks, &summary);

    if summary.is_success() {
        Ok(())
    } else {
        Err(BravoError::Other(format!(
            "{} of {} profiles failed validation",
            summary.invalid, summary.total
        )))
    }
}

fn check_profile(file: &std::path::Path, strict: bool) -> ProfileCheck {
    let mut check = ProfileCheck::new(file);
    let profile = match profile::read_profile(file) {
        Ok(profile) => profile,
        Err(e) => {
            check.add_error(ProfileIssue::error(e.to_string()));
            return check;
        }
    };
    check.name = Some(profile.name().to_string());

    if profile.name().trim().is_empty() {
        check.add_warning("metadata.name is empty");
    }
    let is_template = file.file_name().is_some_and(|n| n == TEMPLATE_FILE);
    if profile.selectors().iter().all(|s| s.trim().is_empty()) && !is_template {
        check.add_warning("no selectors, the profile is never selected automatically");
    }

    if let Err(e) = ActiveProfile::compile(profile, None) {
        let mut issue = ProfileIssue::error(e.to_string());
        if let Some(suggestion) = e.suggestion() {
            issue = issue.with_suggestion(suggestion);
        }
        check.add_error(issue);
    }

    if strict && !check.issues.is_empty() {
        check.valid = false;
    }
    check
}

fn cmd_select(cli: &Cli, args: &cli::SelectArgs, out: &dyn Output) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = load_store(cli, &settings)?;
    let index = profile::select_profile(store.profiles(), &args.identity)?;

    out.selection(&Selection {
        identity: args.identity.clone(),
        index,
        name: store.profiles()[index].name().to_string(),
        file: store.files()[index].display().to_string(),
    });
    Ok(())
}

fn cmd_create(cli: &Cli, args: &cli::CreateArgs, out: &dyn Output) -> Result<()> {
    let settings = load_settings(cli)?;
    let mut store = load_store(cli, &settings)?;
    let path =
        store.create_from_default(&args.file_stem, &args.name, &args.description, &args.selectors)?;
    out.profile_created(&path);
    Ok(())
}

fn cmd_press(cli: &Cli, args: &cli::PressArgs, out: &dyn Output) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = load_store(cli, &settings)?;
    let engine = connect_engine(&settings, &store)?;
    let name = activate(&engine, args.aircraft.as_deref())?;

    let click = if args.double {
        ClickKind::Double
    } else {
        ClickKind::Single
    };
    let report = engine.on_button(args.button, click);
    let target = format!("{} ({click:?})", args.button);
    if report.is_empty() {
        out.warning(&format!("{target} has no commands in profile '{name}'"));
        return Ok(());
    }
    out.dispatch(&target, &report);
    dispatch_result(&target, report.failed)
}

fn cmd_turn(cli: &Cli, args: &cli::TurnArgs, out: &dyn Output) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = load_store(cli, &settings)?;
    let engine = connect_engine(&settings, &store)?;
    let name = activate(&engine, args.aircraft.as_deref())?;

    let report = engine.on_knob(args.knob, args.direction, args.count);
    let target = format!("{} {} x{}", args.knob, args.direction, args.count);
    if report.is_empty() {
        out.warning(&format!("{} is not bound in profile '{name}'", args.knob));
        return Ok(());
    }
    out.dispatch(&target, &report);
    dispatch_result(&target, report.failed)
}

fn dispatch_result(target: &str, failed: usize) -> Result<()> {
    if failed == 0 {
        return Ok(());
    }
    Err(BravoError::Dispatch {
        command: target.to_string(),
        reason: format!("{failed} action(s) failed"),
    })
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(out: &dyn Output) -> Result<()> {
    out.version_info(&VersionInfo {
        version: build_info::VERSION,
        git_sha: build_info::git_sha(),
        git_dirty: build_info::git_dirty(),
        build_timestamp: build_info::build_timestamp(),
        rustc_version: build_info::rustc_semver(),
        target: build_info::target(),
    });
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "bravo", &mut io::stdout());
    Ok(())
}
