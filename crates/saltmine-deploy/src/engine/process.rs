//! Worker subprocess engine

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::SearchEngine;
use crate::cancel::SearchControl;
use crate::error::{DeployError, Result};
use crate::job::{read_solution, SearchJob, SearchSolution};

/// Command run once before the first search, typically building the worker
#[derive(Debug, Clone)]
pub struct BuildStep {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl BuildStep {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    fn run(&self) -> Result<()> {
        info!("Running build step: {} {}", self.program, self.args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|e| {
            DeployError::PreconditionFailure(format!("cannot run {}: {}", self.program, e))
        })?;
        if !status.success() {
            return Err(DeployError::PreconditionFailure(format!(
                "build step {} failed: {}",
                self.program, status
            )));
        }
        Ok(())
    }
}

/// Runs each search as a `search` worker subprocess
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    base_args: Vec<String>,
    build: Option<BuildStep>,
    poll_interval: Duration,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            build: None,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Arguments placed before the `search` subcommand
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    pub fn with_build(mut self, build: BuildStep) -> Self {
        self.build = Some(build);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn command(&self, job: &SearchJob) -> Command {
        let target = job.target();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg("search")
            .arg("--factory")
            .arg(job.factory_hex())
            .arg("--init-code-hash")
            .arg(job.init_code_hash().to_hex())
            .arg("--pattern")
            .arg(target.digits())
            .arg("--pattern-type")
            .arg(target.pattern_type.to_string())
            .arg("--contract-name")
            .arg(job.contract_label())
            .arg("--threads")
            .arg(job.worker_concurrency().to_string())
            .arg("--output")
            .arg(job.output_path());
        if let Some(suffix) = target.suffix_digits() {
            cmd.arg("--suffix").arg(suffix);
        }
        if !target.case_insensitive {
            cmd.arg("--case-sensitive");
        }
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Wait for the worker, polling the cancel flag and the deadline
    fn supervise(&self, child: &mut Child, job: &SearchJob, control: &SearchControl) -> Result<ExitStatus> {
        let label = job.contract_label();
        let started = Instant::now();

        loop {
            if control.cancel.is_cancelled() {
                stop_child(child, job.output_path());
                return Err(DeployError::Cancelled);
            }

            if let Some(deadline) = control.deadline {
                if started.elapsed() >= deadline {
                    warn!("{}: worker exceeded {:?}, killing it", label, deadline);
                    stop_child(child, job.output_path());
                    return Err(DeployError::SearchTimedOut {
                        label: label.to_string(),
                        after: deadline,
                    });
                }
            }

            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    stop_child(child, job.output_path());
                    return Err(DeployError::WorkerExecutionFailure {
                        label: label.to_string(),
                        reason: format!("cannot wait for worker: {}", e),
                    });
                }
            }
        }
    }
}

impl SearchEngine for ProcessEngine {
    fn name(&self) -> &str {
        "process"
    }

    fn prepare(&self) -> Result<()> {
        if let Some(build) = &self.build {
            build.run()?;
        }

        if !is_runnable(&self.program) {
            return Err(DeployError::PreconditionFailure(format!(
                "worker {} not found",
                self.program.display()
            )));
        }
        Ok(())
    }

    fn search(&self, job: &SearchJob, control: &SearchControl) -> Result<SearchSolution> {
        if control.cancel.is_cancelled() {
            return Err(DeployError::Cancelled);
        }

        let label = job.contract_label();
        let failure = |reason: String| DeployError::WorkerExecutionFailure {
            label: label.to_string(),
            reason,
        };

        let output = job.output_path();
        if output.exists() {
            debug!("Removing stale output {}", output.display());
            std::fs::remove_file(output)
                .map_err(|e| failure(format!("cannot remove stale output: {}", e)))?;
        }

        let mut child = self
            .command(job)
            .spawn()
            .map_err(|e| failure(format!("cannot start {}: {}", self.program.display(), e)))?;
        debug!("{}: worker pid {}", label, child.id());

        let status = self.supervise(&mut child, job, control)?;
        if !status.success() {
            return Err(failure(format!("worker exited with {}", status)));
        }
        if !output.exists() {
            return Err(failure(format!(
                "worker exited cleanly but wrote no {}",
                output.display()
            )));
        }

        read_solution(label, output)
    }
}

fn stop_child(child: &mut Child, partial_output: &Path) {
    let _ = child.kill();
    let _ = child.wait();
    let _ = std::fs::remove_file(partial_output);
}

/// A path with a separator must exist; a bare name must be on `PATH`
fn is_runnable(program: &Path) -> bool {
    if program.components().count() > 1 {
        return program.is_file();
    }

    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}
