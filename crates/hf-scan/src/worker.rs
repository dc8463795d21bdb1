//! Background scan thread reporting through a channel.

use crate::error::ScanError;
use crate::scan::{ScanDefinition, ScanOutput, run_scan};
use hf_activity::ActivityModel;
use hf_core::CancelToken;
use hf_solver::{EquilibriumSolver, SolveRequest, SolverConfig};
use hf_system::ChemicalSystem;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum ScanMessage {
    Progress { step: usize, total: usize },
    Complete { output: Box<ScanOutput> },
    Cancelled { completed: usize },
    Error { message: String },
}

/// A scan running on its own thread.
///
/// Messages arrive on `progress_rx`; the last one is always `Complete`,
/// `Cancelled` or `Error`.
pub struct ScanWorker {
    pub progress_rx: Receiver<ScanMessage>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl ScanWorker {
    pub fn start(
        system: Arc<ChemicalSystem>,
        activity: ActivityModel,
        config: SolverConfig,
        base: SolveRequest,
        definition: ScanDefinition,
    ) -> Self {
        Self::start_with_token(system, activity, config, base, definition, CancelToken::new())
    }

    /// Like [`start`](Self::start) with a caller-owned cancellation token.
    pub fn start_with_token(
        system: Arc<ChemicalSystem>,
        activity: ActivityModel,
        config: SolverConfig,
        base: SolveRequest,
        definition: ScanDefinition,
        cancel: CancelToken,
    ) -> Self {
        let (tx, rx) = channel();
        let token = cancel.clone();
        let handle = thread::spawn(move || {
            let message = match Self::run(&system, activity, config, &base, &definition, token, &tx) {
                Ok(output) => ScanMessage::Complete {
                    output: Box::new(output),
                },
                Err(ScanError::Cancelled { completed }) => ScanMessage::Cancelled { completed },
                Err(e) => ScanMessage::Error {
                    message: format!("Scan worker error: {e}"),
                },
            };
            // The receiver may already be gone.
            let _ = tx.send(message);
        });

        Self {
            progress_rx: rx,
            cancel,
            handle: Some(handle),
        }
    }

    fn run(
        system: &ChemicalSystem,
        activity: ActivityModel,
        config: SolverConfig,
        base: &SolveRequest,
        definition: &ScanDefinition,
        cancel: CancelToken,
        tx: &Sender<ScanMessage>,
    ) -> Result<ScanOutput, ScanError> {
        let mut solver = EquilibriumSolver::new(system, activity, config)
            .map_err(|source| ScanError::Solve { index: 0, source })?
            .with_cancel_token(cancel);
        debug!(points = definition.num_points, "scan worker running");
        run_scan(&mut solver, base, definition, |step, total| {
            let _ = tx.send(ScanMessage::Progress { step, total });
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Wait for the thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ScanWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
