use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use sysinfo::{Disks, System};
use tokio::process::Command as TokioCommand;

use crate::model::{DiskUsage, HostLogKind, HostSnapshot};

/// Samples CPU, memory and disk usage of the machine running the dashboard.
/// Blocks for a short interval so the CPU delta has two measurement points;
/// callers run it on a blocking thread.
pub fn sample() -> HostSnapshot {
    let mut system = System::new_all();
    system.refresh_cpu_usage();
    std::thread::sleep(Duration::from_millis(200));
    system.refresh_cpu_usage();
    system.refresh_memory();

    let cpu_percent = system.global_cpu_usage();
    let total_memory = system.total_memory();
    let memory_percent = if total_memory == 0 {
        0.0
    } else {
        system.used_memory() as f32 / total_memory as f32 * 100.0
    };

    let disks = Disks::new_with_refreshed_list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let free = disk.available_space();
            DiskUsage {
                mount: disk.mount_point().display().to_string(),
                total_bytes: total,
                used_bytes: total.saturating_sub(free),
                free_bytes: free,
            }
        })
        .collect();

    HostSnapshot {
        cpu_percent,
        memory_percent,
        disks,
    }
}

/// Tails the requested journal on the host. Only the last 200 lines are
/// pulled so the output fits a scrollback pane.
pub async fn run_log_command(kind: HostLogKind) -> Result<String> {
    let mut cmd = TokioCommand::new("journalctl");
    cmd.arg("-n").arg("200").arg("--no-pager");
    if let Some(unit) = kind.unit() {
        cmd.arg("-u").arg(unit);
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let output = cmd
        .output()
        .await
        .with_context(|| format!("failed to run journalctl for {}", kind.title()))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let rendered = if stderr.trim().is_empty() {
        stdout.to_string()
    } else if stdout.trim().is_empty() {
        format!("stderr:\n{stderr}")
    } else {
        format!("stdout:\n{stdout}\n\nstderr:\n{stderr}")
    };

    if output.status.success() {
        Ok(rendered)
    } else {
        Err(anyhow::anyhow!(
            "journalctl exited with {}",
            output.status
        ))
    }
}
