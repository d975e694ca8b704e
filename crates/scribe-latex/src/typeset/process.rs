//! External process execution for typesetters

use std::process::Stdio;

use tokio::process::Command;

use super::compiler::{TypesetError, TypesetJob, TypesetResult};

/// Lines of log kept in [`TypesetError::Failed`]
const LOG_TAIL_LINES: usize = 20;

/// Run `program args…` inside the job's working directory
///
/// The child is killed if it outlives `job.timeout`.
pub(crate) async fn run(program: &str, args: &[&str], job: &TypesetJob) -> TypesetResult<()> {
    tracing::debug!(program, ?args, dir = %job.work_dir.display(), "running typesetter");

    let child = Command::new(program)
        .args(args)
        .current_dir(&job.work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| TypesetError::Spawn {
            compiler: program.to_string(),
            source,
        })?;

    let output = match tokio::time::timeout(job.timeout, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            return Err(TypesetError::Timeout {
                compiler: program.to_string(),
                seconds: job.timeout.as_secs(),
            })
        }
    };

    if output.status.success() {
        return Ok(());
    }

    let log_tail = match tokio::fs::read_to_string(job.log_path()).await {
        Ok(log) => tail(&log),
        Err(_) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            tail(&combined)
        }
    };
    Err(TypesetError::Failed {
        compiler: program.to_string(),
        status: output.status.to_string(),
        log_tail,
    })
}

fn tail(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    lines[start..].join("\n")
}
