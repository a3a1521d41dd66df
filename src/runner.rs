//! Run orchestration.
//!
//! Drives one run through its states:
//! `Start → ConfigResolved → FilesListed → Confirmed → ConnectionValidated → BatchExecuted → Done`.
//! A decline at the gate or any fatal error ends the run; no state is revisited.

use crate::config::RunConfig;
use crate::db::Connector;
use crate::discovery::discover_scripts;
use crate::error::{Result, SqlRunError};
use crate::executor::{run_batch, BatchReport};
use crate::gate::confirm_run;
use crate::operator::Operator;
use crate::validator::validate_connection;
use std::fmt;
use tracing::{debug, info};

/// Position of a run in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    ConfigResolved,
    FilesListed,
    Confirmed,
    ConnectionValidated,
    BatchExecuted,
    Done,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ConfigResolved => "config-resolved",
            Self::FilesListed => "files-listed",
            Self::Confirmed => "confirmed",
            Self::ConnectionValidated => "connection-validated",
            Self::BatchExecuted => "batch-executed",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How a run ended, short of a fatal error.
#[derive(Debug)]
pub enum RunOutcome {
    /// The operator did not confirm. Nothing was executed or written.
    Declined,
    /// The batch ran to its end.
    Completed(BatchReport),
}

impl RunOutcome {
    /// Process exit code for this outcome.
    ///
    /// A completed batch with failed scripts still exits non-zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Declined => 0,
            Self::Completed(report) if report.is_success() => 0,
            Self::Completed(_) => 1,
        }
    }
}

/// Wires discovery, the gate, validation and the batch together.
pub struct Runner<'a> {
    config: RunConfig,
    connector: &'a dyn Connector,
    operator: &'a mut dyn Operator,
    state: RunState,
}

impl<'a> Runner<'a> {
    pub fn new(
        config: RunConfig,
        connector: &'a dyn Connector,
        operator: &'a mut dyn Operator,
    ) -> Self {
        debug!("Run state: {}", RunState::Start);
        Self {
            config,
            connector,
            operator,
            state: RunState::Start,
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Executes the run. A runner can only be driven once.
    pub async fn run(&mut self) -> Result<RunOutcome> {
        let outcome = self.drive().await;
        if outcome.is_err() {
            self.transition(RunState::Aborted);
        }
        outcome
    }

    async fn drive(&mut self) -> Result<RunOutcome> {
        if self.state != RunState::Start {
            return Err(SqlRunError::config(format!(
                "Run already finished in state {}",
                self.state
            )));
        }
        // The configuration arrives resolved; recording it starts the run.
        self.transition(RunState::ConfigResolved);

        let listed = discover_scripts(&self.config.script_dir)?;
        self.transition(RunState::FilesListed);

        if !confirm_run(&mut *self.operator, &self.config, &listed)? {
            info!("Run declined by operator");
            self.transition(RunState::Aborted);
            return Ok(RunOutcome::Declined);
        }
        self.transition(RunState::Confirmed);

        let identity = validate_connection(self.connector, &self.config).await?;
        info!("Server: {}", identity);
        self.transition(RunState::ConnectionValidated);

        // Listed a second time for execution; ordering is identical for an
        // unchanged directory.
        let files = discover_scripts(&self.config.script_dir)?;
        let report = run_batch(self.connector, &self.config, &files, &mut *self.operator).await?;
        self.transition(RunState::BatchExecuted);

        self.transition(RunState::Done);
        Ok(RunOutcome::Completed(report))
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }
}
