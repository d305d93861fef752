use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kubeview",
    version,
    about = "A terminal dashboard for Kubernetes clusters."
)]
pub struct CliArgs {
    /// Path to a kubeconfig file; defaults to the usual discovery chain
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Refresh interval in milliseconds
    #[arg(long, default_value_t = 5_000)]
    pub refresh_ms: u64,

    /// Start in a specific namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Start with all namespaces selected
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}
