//! Core types: the install profile, the step vocabulary, the step ledger,
//! and provenance events. All persisted types derive Serialize/Deserialize
//! for YAML (profile, ledger) or JSONL (events) roundtripping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Install profile
// ============================================================================

/// The desired state of the host — every target value the provisioner
/// interpolates. Compiled-in defaults describe the stock deployment; an
/// optional `cimentar.yaml` may override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallProfile {
    /// Schema version (must be "1.0")
    #[serde(default = "default_version")]
    pub version: String,

    /// Project identifier (unit name, ledger key)
    #[serde(default = "default_name")]
    pub name: String,

    /// Human-readable project name for console messages
    #[serde(default = "default_display_name")]
    pub display_name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Project source archive (zip with exactly one top-level directory)
    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// Optional sha256 pin for the project archive. Unset means the
    /// download is trusted as-is.
    #[serde(default)]
    pub archive_sha256: Option<String>,

    /// Where the project tree is installed
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Miniconda prefix
    #[serde(default = "default_conda_root")]
    pub conda_root: PathBuf,

    #[serde(default = "default_conda_installer_url")]
    pub conda_installer_url: String,

    /// Optional sha256 pin for the Miniconda installer
    #[serde(default)]
    pub conda_installer_sha256: Option<String>,

    /// Named conda environment for the service
    #[serde(default = "default_env_name")]
    pub env_name: String,

    /// Pinned interpreter for fresh environments
    #[serde(default = "default_python_version")]
    pub python_version: String,

    /// Dependency manifest, relative to the install dir
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// systemd unit name (without the .service suffix)
    #[serde(default = "default_name")]
    pub service_name: String,

    /// Where the unit file is written
    #[serde(default = "default_unit_dir")]
    pub unit_dir: PathBuf,

    /// Where the control scripts are written
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,

    /// Control scripts are named `<prefix>-start`, `<prefix>-stop`,
    /// `<prefix>-status`
    #[serde(default = "default_control_prefix")]
    pub control_prefix: String,

    /// Docker apt signing key. Fetched without fingerprint verification —
    /// the upstream publishes no pin for it.
    #[serde(default = "default_docker_key_url")]
    pub docker_key_url: String,

    #[serde(default = "default_docker_repo_url")]
    pub docker_repo_url: String,

    #[serde(default = "default_keyring_path")]
    pub keyring_path: PathBuf,

    #[serde(default = "default_apt_source_path")]
    pub apt_source_path: PathBuf,

    /// Where the service answers once up
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Fixed pause between unit start and the liveness probe
    #[serde(default = "default_start_wait_secs")]
    pub start_wait_secs: u64,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_name() -> String {
    "code-execution-api".to_string()
}

fn default_display_name() -> String {
    "Code Execution API".to_string()
}

fn default_archive_url() -> String {
    "https://github.com/SohamMhatre09/Code-Execution-API/archive/refs/heads/main.zip".to_string()
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("/opt/code-execution-api")
}

fn default_conda_root() -> PathBuf {
    PathBuf::from("/opt/miniconda3")
}

fn default_conda_installer_url() -> String {
    "https://repo.anaconda.com/miniconda/Miniconda3-latest-Linux-x86_64.sh".to_string()
}

fn default_env_name() -> String {
    "code_execution_api".to_string()
}

fn default_python_version() -> String {
    "3.11".to_string()
}

fn default_manifest() -> String {
    "requirements.txt".to_string()
}

fn default_unit_dir() -> PathBuf {
    PathBuf::from("/etc/systemd/system")
}

fn default_bin_dir() -> PathBuf {
    PathBuf::from("/usr/local/bin")
}

fn default_control_prefix() -> String {
    "code-api".to_string()
}

fn default_docker_key_url() -> String {
    "https://download.docker.com/linux/ubuntu/gpg".to_string()
}

fn default_docker_repo_url() -> String {
    "https://download.docker.com/linux/ubuntu".to_string()
}

fn default_keyring_path() -> PathBuf {
    PathBuf::from("/etc/apt/keyrings/docker.gpg")
}

fn default_apt_source_path() -> PathBuf {
    PathBuf::from("/etc/apt/sources.list.d/docker.list")
}

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_start_wait_secs() -> u64 {
    10
}

impl Default for InstallProfile {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            display_name: default_display_name(),
            description: None,
            archive_url: default_archive_url(),
            archive_sha256: None,
            install_dir: default_install_dir(),
            conda_root: default_conda_root(),
            conda_installer_url: default_conda_installer_url(),
            conda_installer_sha256: None,
            env_name: default_env_name(),
            python_version: default_python_version(),
            manifest: default_manifest(),
            service_name: default_name(),
            unit_dir: default_unit_dir(),
            bin_dir: default_bin_dir(),
            control_prefix: default_control_prefix(),
            docker_key_url: default_docker_key_url(),
            docker_repo_url: default_docker_repo_url(),
            keyring_path: default_keyring_path(),
            apt_source_path: default_apt_source_path(),
            endpoint: default_endpoint(),
            start_wait_secs: default_start_wait_secs(),
        }
    }
}

impl InstallProfile {
    /// Full path of the systemd unit file.
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(format!("{}.service", self.service_name))
    }

    /// Full path of the dependency manifest inside the install dir.
    pub fn manifest_path(&self) -> PathBuf {
        self.install_dir.join(&self.manifest)
    }

    /// The conda binary inside the managed prefix.
    pub fn conda_bin(&self) -> PathBuf {
        self.conda_root.join("bin").join("conda")
    }

    /// Names of the three control scripts, in start/stop/status order.
    pub fn control_script_names(&self) -> [String; 3] {
        [
            format!("{}-start", self.control_prefix),
            format!("{}-stop", self.control_prefix),
            format!("{}-status", self.control_prefix),
        ]
    }
}

// ============================================================================
// Steps
// ============================================================================

/// The eight provisioning steps, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Privilege,
    ContainerRuntime,
    PythonDistribution,
    ProjectArchive,
    PythonEnvironment,
    ServiceUnit,
    ControlScripts,
    ServiceLaunch,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Privilege => write!(f, "privilege"),
            Self::ContainerRuntime => write!(f, "container-runtime"),
            Self::PythonDistribution => write!(f, "python-distribution"),
            Self::ProjectArchive => write!(f, "project-archive"),
            Self::PythonEnvironment => write!(f, "python-environment"),
            Self::ServiceUnit => write!(f, "service-unit"),
            Self::ControlScripts => write!(f, "control-scripts"),
            Self::ServiceLaunch => write!(f, "service-launch"),
        }
    }
}

/// What a failure of the step does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Stop immediately, exit non-zero.
    Fatal,
    /// Report and keep going — later steps may still be useful.
    Continue,
}

/// When the step mutates the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converge {
    /// Pure guard — never mutates, must pass.
    CheckOnly,
    /// Presence-checked install: apply only when the check fails.
    IfMissing,
    /// Unconditional re-sync on every run.
    Always,
}

// ============================================================================
// Step ledger
// ============================================================================

/// Outcome of a step as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Satisfied,
    Converged,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied => write!(f, "SATISFIED"),
            Self::Converged => write!(f, "CONVERGED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Per-step ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub kind: StepKind,
    pub status: StepStatus,

    #[serde(default)]
    pub applied_at: Option<String>,

    #[serde(default)]
    pub duration_seconds: Option<f64>,

    /// BLAKE3 fingerprint of the desired state the step converged to
    pub hash: String,

    /// Error text for failed steps, artifact hashes for fetches
    #[serde(default)]
    pub detail: Option<String>,
}

/// The host's step ledger — one file per state dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepLedger {
    pub schema: String,
    pub project: String,
    pub host: String,
    pub generated_at: String,
    pub generator: String,
    pub steps: IndexMap<String, StepRecord>,
}

// ============================================================================
// Plan
// ============================================================================

/// What a run would do to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// Missing — would install.
    Install,
    /// Unconditional step — would re-sync.
    Sync,
    /// Presence check passes — nothing to do.
    Satisfied,
    /// A check-only guard is failing; the run would abort here.
    Blocked,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "INSTALL"),
            Self::Sync => write!(f, "SYNC"),
            Self::Satisfied => write!(f, "SATISFIED"),
            Self::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// A single planned step.
#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub id: String,
    pub kind: StepKind,
    pub action: PlanAction,
    pub description: String,
}

/// Full plan for a run.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub project: String,
    pub steps: Vec<PlannedStep>,
    pub to_install: u32,
    pub to_sync: u32,
    pub satisfied: u32,
    pub blocked: u32,
}

// ============================================================================
// Provenance events
// ============================================================================

/// Provenance event for the JSONL event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProvisionEvent {
    RunStarted {
        run_id: String,
        generator: String,
    },
    StepStarted {
        step: String,
    },
    StepSatisfied {
        step: String,
    },
    StepConverged {
        step: String,
        duration_seconds: f64,
        hash: String,
    },
    StepFailed {
        step: String,
        error: String,
    },
    RunCompleted {
        run_id: String,
        steps_converged: u32,
        steps_satisfied: u32,
        steps_failed: u32,
        total_seconds: f64,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: ProvisionEvent,
}

// ============================================================================
// Run summary
// ============================================================================

/// Result of a full provisioning run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps_converged: u32,
    pub steps_satisfied: u32,
    pub steps_failed: u32,
    pub total_duration: std::time::Duration,
}

// ============================================================================
// Tests
// ============================================================================
