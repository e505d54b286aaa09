use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "rag-console",
    version,
    about = "Operator console for the Redmine RAG control plane"
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    pub api_base_url: String,

    #[arg(long, global = true, default_value_t = 15_000)]
    pub timeout_ms: u64,

    #[arg(long, global = true, default_value = ".cache/rag-console/view_state.sqlite")]
    pub state_db: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runtime health and job counters.
    Overview(OverviewArgs),
    /// Trigger and inspect sync jobs.
    Sync(SyncArgs),
    /// Ask grounded questions and explore citations.
    Ask(AskArgs),
    /// Metrics, eval artifacts and extraction.
    Metrics(MetricsArgs),
    /// Health checks, backup, maintenance and the release checklist.
    Ops(OpsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct OverviewArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Keep refreshing until interrupted.
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SyncCommand {
    Trigger(SyncTriggerArgs),
    Jobs(SyncJobsArgs),
    Show(SyncJobArgs),
    Retry(SyncJobArgs),
    Watch(SyncWatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SyncTriggerArgs {
    /// Comma-separated project ids; empty means backend defaults.
    #[arg(long)]
    pub project_scope: Option<String>,

    #[arg(long = "module")]
    pub modules: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SyncJobsArgs {
    /// One of all, queued, running, finished, failed.
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Keep refreshing until interrupted.
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SyncJobArgs {
    /// Defaults to the job selected in the persisted sync view.
    pub job_id: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SyncWatchArgs {
    pub job_id: Option<String>,

    /// Defaults to the job detail refresh interval.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    #[arg(long, default_value_t = 200)]
    pub max_polls: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[command(subcommand)]
    pub command: AskCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AskCommand {
    Run(AskRunArgs),
    History(AskHistoryArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CitationSortArg {
    IdAsc,
    SourceType,
    SnippetLengthDesc,
}

#[derive(Args, Debug, Clone)]
pub struct AskRunArgs {
    #[arg(long)]
    pub query: Option<String>,

    /// Replay the n-th entry of the ask history (0 is the newest).
    #[arg(long, conflicts_with = "query")]
    pub replay: Option<usize>,

    #[arg(long, default_value = "1")]
    pub project_ids: String,

    #[arg(long, default_value = "")]
    pub tracker_ids: String,

    #[arg(long, default_value = "")]
    pub status_ids: String,

    #[arg(long, default_value = "5")]
    pub top_k: String,

    /// YYYY-MM-DD, inclusive.
    #[arg(long, default_value = "")]
    pub from_date: String,

    /// YYYY-MM-DD, inclusive.
    #[arg(long, default_value = "")]
    pub to_date: String,

    #[arg(long, value_enum, default_value_t = CitationSortArg::IdAsc)]
    pub sort: CitationSortArg,

    #[arg(long, default_value = "all")]
    pub source_type: String,

    #[arg(long, default_value = "")]
    pub search: String,

    /// Only show the evidence cited by this claim index.
    #[arg(long)]
    pub claim: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AskHistoryArgs {
    #[arg(long, default_value_t = false)]
    pub clear: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub command: MetricsCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum MetricsCommand {
    Summary(MetricsSummaryArgs),
    Evals(ViewArgs),
    Extract(ExtractArgs),
    Export(MetricsExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Keep refreshing until interrupted.
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsWindowArgs {
    #[arg(long, default_value = "")]
    pub project_ids: String,

    #[arg(long)]
    pub from_date: Option<String>,

    #[arg(long)]
    pub to_date: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Comma-separated issue ids; empty extracts every issue.
    #[arg(long, default_value = "")]
    pub issue_ids: String,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsSummaryArgs {
    #[command(flatten)]
    pub window: MetricsWindowArgs,

    /// Keep refreshing until interrupted.
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsExportArgs {
    #[command(flatten)]
    pub window: MetricsWindowArgs,

    #[arg(long, default_value = "metrics_export.json")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct OpsArgs {
    #[command(subcommand)]
    pub command: OpsCommand,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CheckStatusFilter {
    All,
    Ok,
    Warn,
    Fail,
}

impl CheckStatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum OpsCommand {
    Health(OpsHealthArgs),
    Env(ViewArgs),
    Runs(OpsRunsArgs),
    Backup(OpsBackupArgs),
    Maintenance,
    Checklist(ChecklistArgs),
}

#[derive(Args, Debug, Clone)]
pub struct OpsHealthArgs {
    #[arg(long, value_enum, default_value_t = CheckStatusFilter::All)]
    pub status: CheckStatusFilter,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OpsRunsArgs {
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Keep refreshing until interrupted.
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OpsBackupArgs {
    #[arg(long, default_value = "backups")]
    pub output_dir: String,
}

#[derive(Args, Debug, Clone)]
pub struct ChecklistArgs {
    /// 1-based item number to mark done.
    #[arg(long = "check")]
    pub check: Vec<usize>,

    /// 1-based item number to mark pending.
    #[arg(long = "uncheck")]
    pub uncheck: Vec<usize>,

    #[arg(long, default_value_t = false)]
    pub reset: bool,
}
