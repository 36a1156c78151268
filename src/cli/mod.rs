//! CLI subcommands — install, plan, status, start, stop, validate, init,
//! completions.

use crate::core::{executor, planner, profile, recipe, state, types};
use crate::shell;
use crate::steps;
use crate::ui;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "cimentar",
    version,
    about = "Host provisioner for the Code Execution API — idempotent steps, BLAKE3 step ledger, provenance events"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the host end to end
    Install {
        /// Profile override file (stock defaults when omitted)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// State directory (ledger + event log)
        #[arg(long, default_value = "/var/lib/cimentar")]
        state_dir: PathBuf,

        /// Re-apply steps whose presence check passes
        #[arg(long)]
        force: bool,

        /// Show what would run without mutating the host
        #[arg(long)]
        dry_run: bool,

        /// Run a single step (the privilege guard still applies)
        #[arg(long)]
        step: Option<String>,
    },

    /// Show what an install run would do
    Plan {
        /// Profile override file
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Show the step ledger and the service's active state
    Status {
        /// Profile override file
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// State directory
        #[arg(long, default_value = "/var/lib/cimentar")]
        state_dir: PathBuf,
    },

    /// Start the service
    Start {
        /// Profile override file
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Stop the service
    Stop {
        /// Profile override file
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Validate a profile file without touching the host
    Validate {
        /// Path to cimentar.yaml
        #[arg(short, long, default_value = "cimentar.yaml")]
        file: PathBuf,
    },

    /// Write a default cimentar.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Install {
            profile,
            state_dir,
            force,
            dry_run,
            step,
        } => cmd_install(profile.as_deref(), &state_dir, force, dry_run, step.as_deref()),
        Commands::Plan { profile } => cmd_plan(profile.as_deref()),
        Commands::Status { profile, state_dir } => cmd_status(profile.as_deref(), &state_dir),
        Commands::Start { profile } => cmd_start(profile.as_deref()),
        Commands::Stop { profile } => cmd_stop(profile.as_deref()),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Init { path } => cmd_init(&path),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "cimentar",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Load the effective profile and validate it, listing errors on stderr.
fn load_and_validate(path: Option<&Path>) -> Result<types::InstallProfile, String> {
    let loaded = profile::load_profile(path)?;
    let errors = profile::validate_profile(&loaded);
    if errors.is_empty() {
        return Ok(loaded);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} validation error(s)", errors.len()))
}

fn cmd_install(
    profile_path: Option<&Path>,
    state_dir: &Path,
    force: bool,
    dry_run: bool,
    step: Option<&str>,
) -> Result<(), String> {
    let profile = load_and_validate(profile_path)?;
    let styles = ui::styles();

    ui::header(&styles, &format!("{} Installer", profile.display_name));
    println!(
        "This run provisions the host and installs to {}.",
        profile.install_dir.display()
    );

    if dry_run {
        let plan = planner::plan(&profile)?;
        print_plan(&plan);
        println!("Dry run — no changes applied.");
        return Ok(());
    }

    if let Some(id) = step {
        if recipe::find(id).is_none() {
            return Err(format!("unknown step '{}' — see `cimentar plan`", id));
        }
    }

    let cfg = executor::RunConfig {
        profile: &profile,
        state_dir,
        force,
        step_filter: step,
    };
    let summary = executor::run(&cfg, &styles)?;

    // The banner prints even when steps failed: the run finished, the
    // failures are in the notes above and in the ledger.
    ui::header(&styles, "Installation Complete");
    println!(
        "{} is installed at {}.",
        profile.display_name,
        profile.install_dir.display()
    );
    println!("Service endpoint: {}", profile.endpoint);
    let [start, stop, status] = profile.control_script_names();
    println!(
        "Control commands: {}, {}, {} (in {})",
        start,
        stop,
        status,
        profile.bin_dir.display()
    );
    println!();
    if summary.steps_failed > 0 {
        ui::warn(
            &styles,
            &format!(
                "{} step(s) failed — see the notes above, then re-run `cimentar install`.",
                summary.steps_failed
            ),
        );
    }
    println!(
        "{} converged, {} satisfied, {} failed ({:.1}s)",
        summary.steps_converged,
        summary.steps_satisfied,
        summary.steps_failed,
        summary.total_duration.as_secs_f64()
    );
    Ok(())
}

fn cmd_plan(profile_path: Option<&Path>) -> Result<(), String> {
    let profile = load_and_validate(profile_path)?;
    let plan = planner::plan(&profile)?;
    print_plan(&plan);
    Ok(())
}

/// Display a plan to stdout.
fn print_plan(plan: &types::ProvisionPlan) {
    println!("Planning: {} ({} steps)", plan.project, plan.steps.len());
    println!();

    for step in &plan.steps {
        let symbol = match step.action {
            types::PlanAction::Install => "+",
            types::PlanAction::Sync => "~",
            types::PlanAction::Satisfied => " ",
            types::PlanAction::Blocked => "!",
        };
        println!("  {} {}", symbol, step.description);
    }

    println!();
    println!(
        "Plan: {} to install, {} to sync, {} satisfied, {} blocked.",
        plan.to_install, plan.to_sync, plan.satisfied, plan.blocked
    );
    if plan.blocked > 0 {
        println!("A blocked guard stops the run — re-run with sudo.");
    }
}

fn cmd_status(profile_path: Option<&Path>, state_dir: &Path) -> Result<(), String> {
    let profile = load_and_validate(profile_path)?;

    match state::load_ledger(state_dir)? {
        None => println!("No state found. Run `cimentar install` first."),
        Some(ledger) => {
            println!("Project: {} (host {})", ledger.project, ledger.host);
            println!("  Generated: {}", ledger.generated_at);
            println!("  Generator: {}", ledger.generator);
            println!("  Steps: {}", ledger.steps.len());

            for (id, record) in &ledger.steps {
                let duration = record
                    .duration_seconds
                    .map(|d| format!(" ({:.2}s)", d))
                    .unwrap_or_default();
                println!("    {}: {}{}", id, record.status, duration);
            }
            println!();
        }
    }

    let active = shell::check_passes(&steps::launch::probe_script(&profile))?;
    println!(
        "Service {}: {}",
        profile.service_name,
        if active { "active" } else { "inactive" }
    );
    Ok(())
}

fn cmd_start(profile_path: Option<&Path>) -> Result<(), String> {
    let profile = load_and_validate(profile_path)?;
    println!("Starting {}...", profile.display_name);
    shell::converge(&steps::launch::start_script(&profile))
        .map_err(|e| format!("service start failed: {}", e))?;
    println!("{} is running at {}", profile.display_name, profile.endpoint);
    Ok(())
}

fn cmd_stop(profile_path: Option<&Path>) -> Result<(), String> {
    let profile = load_and_validate(profile_path)?;
    println!("Stopping {}...", profile.display_name);
    shell::converge(&steps::launch::stop_script(&profile))
        .map_err(|e| format!("service stop failed: {}", e))?;
    println!("{} has been stopped.", profile.display_name);
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let loaded = profile::parse_profile_file(file)?;
    let errors = profile::validate_profile(&loaded);

    if errors.is_empty() {
        println!(
            "OK: {} → {} (service {})",
            loaded.name,
            loaded.install_dir.display(),
            loaded.service_name
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join("cimentar.yaml");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }

    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create dir {}: {}", path.display(), e))?;
    std::fs::write(&config_path, profile::default_profile_template())
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized cimentar profile at {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_valid_profile() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("project");
        cmd_init(&sub).unwrap();

        let written = sub.join("cimentar.yaml");
        assert!(written.exists());
        // The template must round-trip through validate
        cmd_validate(&written).unwrap();
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cimentar.yaml"), "exists").unwrap();
        let result = cmd_init(dir.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("already exists"));
    }

    #[test]
    fn test_validate_invalid_profile() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cimentar.yaml");
        std::fs::write(
            &file,
            "version: \"2.0\"\ninstall_dir: relative/path\n",
        )
        .unwrap();
        let result = cmd_validate(&file);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("validation error"));
    }

    #[test]
    fn test_validate_missing_file() {
        let result = cmd_validate(Path::new("/nonexistent/cimentar.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_and_validate_defaults() {
        let profile = load_and_validate(None).unwrap();
        assert_eq!(profile.name, "code-execution-api");
    }

    #[test]
    fn test_install_rejects_unknown_step() {
        let dir = tempfile::tempdir().unwrap();
        let result = cmd_install(None, dir.path(), false, false, Some("bogus-step"));
        // Rejected before the executor runs — nothing is written.
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("unknown step"));
        assert!(!dir.path().join("ledger.yaml").exists());
    }

    #[test]
    fn test_install_dry_run_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        cmd_install(None, dir.path(), false, true, None).unwrap();
        assert!(!dir.path().join("ledger.yaml").exists());
        assert!(!dir.path().join("events.jsonl").exists());
    }

    #[test]
    fn test_plan_command_runs() {
        cmd_plan(None).unwrap();
    }

    #[test]
    fn test_status_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        cmd_status(None, dir.path()).unwrap();
    }

    #[test]
    fn test_status_with_ledger() {
        use crate::core::types::{StepKind, StepRecord, StepStatus};
        let dir = tempfile::tempdir().unwrap();

        let mut ledger = state::new_ledger("code-execution-api");
        ledger.steps.insert(
            "service-unit".to_string(),
            StepRecord {
                kind: StepKind::ServiceUnit,
                status: StepStatus::Converged,
                applied_at: Some("2026-08-04T10:00:00Z".to_string()),
                duration_seconds: Some(0.8),
                hash: "blake3:abc".to_string(),
                detail: None,
            },
        );
        ledger.steps.insert(
            "service-launch".to_string(),
            StepRecord {
                kind: StepKind::ServiceLaunch,
                status: StepStatus::Failed,
                applied_at: Some("2026-08-04T10:00:12Z".to_string()),
                duration_seconds: None,
                hash: String::new(),
                detail: Some("unit inactive".to_string()),
            },
        );
        state::save_ledger(dir.path(), &ledger).unwrap();

        cmd_status(None, dir.path()).unwrap();
    }

    #[test]
    fn test_print_plan_symbols() {
        use crate::core::types::{PlanAction, PlannedStep, ProvisionPlan, StepKind};
        let plan = ProvisionPlan {
            project: "code-execution-api".to_string(),
            steps: vec![
                PlannedStep {
                    id: "container-runtime".to_string(),
                    kind: StepKind::ContainerRuntime,
                    action: PlanAction::Install,
                    description: "install Docker Engine".to_string(),
                },
                PlannedStep {
                    id: "project-archive".to_string(),
                    kind: StepKind::ProjectArchive,
                    action: PlanAction::Sync,
                    description: "fetch and sync".to_string(),
                },
                PlannedStep {
                    id: "privilege".to_string(),
                    kind: StepKind::Privilege,
                    action: PlanAction::Blocked,
                    description: "require administrator privileges".to_string(),
                },
            ],
            to_install: 1,
            to_sync: 1,
            satisfied: 0,
            blocked: 1,
        };
        // Just verify it doesn't panic — output goes to stdout
        print_plan(&plan);
    }

    #[test]
    fn test_dispatch_validate() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cimentar.yaml");
        std::fs::write(&file, profile::default_profile_template()).unwrap();
        dispatch(Commands::Validate { file }).unwrap();
    }

    #[test]
    fn test_dispatch_init() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("dispatch-init");
        dispatch(Commands::Init { path: sub.clone() }).unwrap();
        assert!(sub.join("cimentar.yaml").exists());
    }

    #[test]
    fn test_dispatch_status() {
        let dir = tempfile::tempdir().unwrap();
        dispatch(Commands::Status {
            profile: None,
            state_dir: dir.path().to_path_buf(),
        })
        .unwrap();
    }
}
