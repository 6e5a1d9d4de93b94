//! Auto-spin: a bounded run of spins on a fixed cadence

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::{SpinContext, SpinEngine, SpinOutcome};
use crate::error::{SlotError, SlotResult};

/// Auto-spin state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AutoSpinStatus {
    #[default]
    Stopped,
    Running,
}

#[derive(Debug, Default)]
struct RunState {
    status: AutoSpinStatus,
    remaining: u32,
    completed: u32,
    /// Identifies the current run; stale tasks compare against it
    run_id: u64,
    last_error: Option<String>,
}

impl RunState {
    fn is_running(&self, run_id: u64) -> bool {
        self.run_id == run_id && self.status == AutoSpinStatus::Running
    }
}

/// Drives repeated spins on a spawned tokio task
///
/// The first spin resolves inside [`start`](Self::start); later spins wait
/// the engine's auto-spin interval on a spawned task. Stopping cancels the
/// pending wait but lets an in-flight spin finish.
pub struct AutoSpinController {
    engine: Arc<SpinEngine>,
    context: SpinContext,
    state: Arc<Mutex<RunState>>,
    cancel_tx: broadcast::Sender<u64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AutoSpinController {
    pub fn new(engine: Arc<SpinEngine>, context: SpinContext) -> Self {
        let (cancel_tx, _) = broadcast::channel(4);
        Self {
            engine,
            context,
            state: Arc::new(Mutex::new(RunState::default())),
            cancel_tx,
            task: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<SpinEngine> {
        &self.engine
    }

    /// Start `count` spins at `bet`; stops the current run instead if one
    /// is active
    ///
    /// The first spin resolves before this returns; the rest follow on a
    /// spawned task. Must be called from within a tokio runtime.
    pub async fn start(&self, count: u32, bet: f64) -> SlotResult<AutoSpinStatus> {
        if self.status() == AutoSpinStatus::Running {
            self.stop();
            return Ok(AutoSpinStatus::Stopped);
        }
        if count == 0 {
            return Err(SlotError::Validation("auto-spin count must be positive".into()));
        }
        self.engine.limits().validate_bet(bet)?;

        let run_id = {
            let mut state = self.state.lock();
            state.run_id += 1;
            state.status = AutoSpinStatus::Running;
            state.remaining = count;
            state.completed = 0;
            state.last_error = None;
            state.run_id
        };
        log::info!("Auto-spin started: {} spins at {:.2}", count, bet);

        let result = self.engine.spin(bet, &self.context).await;
        let Some(interval) = settle(&self.state, run_id, result, &self.engine) else {
            return Ok(self.status());
        };

        let engine = Arc::clone(&self.engine);
        let context = self.context.clone();
        let state = Arc::clone(&self.state);
        let cancel_rx = self.cancel_tx.subscribe();

        let handle = tokio::spawn(run(engine, context, state, cancel_rx, run_id, bet, interval));
        *self.task.lock() = Some(handle);

        Ok(AutoSpinStatus::Running)
    }

    /// Stop the run; the scheduled spin is cancelled
    pub fn stop(&self) {
        let run_id = {
            let mut state = self.state.lock();
            if state.status != AutoSpinStatus::Running {
                return;
            }
            state.status = AutoSpinStatus::Stopped;
            state.remaining = 0;
            state.run_id
        };

        let _ = self.cancel_tx.send(run_id);
        log::info!("Auto-spin stopped");
    }

    pub fn status(&self) -> AutoSpinStatus {
        self.state.lock().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == AutoSpinStatus::Running
    }

    /// Spins left in the current run
    pub fn remaining(&self) -> u32 {
        self.state.lock().remaining
    }

    /// Spins resolved in the current (or last) run
    pub fn completed(&self) -> u32 {
        self.state.lock().completed
    }

    /// Error that ended the last run, if any
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Wait for the run's task to finish
    pub async fn join(&self) {
        let Some(handle) = self.task.lock().take() else {
            return;
        };
        if let Err(e) = handle.await {
            log::warn!("Auto-spin task ended abnormally: {}", e);
        }
    }
}

impl Drop for AutoSpinController {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    engine: Arc<SpinEngine>,
    context: SpinContext,
    state: Arc<Mutex<RunState>>,
    mut cancel_rx: broadcast::Receiver<u64>,
    run_id: u64,
    bet: f64,
    mut interval: Duration,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancelled(&mut cancel_rx, run_id) => break,
        }
        if !state.lock().is_running(run_id) {
            break;
        }

        let result = engine.spin(bet, &context).await;
        match settle(&state, run_id, result, &engine) {
            Some(next) => interval = next,
            None => break,
        }
    }
}

/// Fold a spin result into the run; the wait before the next spin, or
/// `None` once the run is over
fn settle(
    state: &Mutex<RunState>,
    run_id: u64,
    result: SlotResult<Option<SpinOutcome>>,
    engine: &SpinEngine,
) -> Option<Duration> {
    let mut state = state.lock();
    match result {
        Ok(Some(_)) => {
            state.completed += 1;
            if state.is_running(run_id) {
                state.remaining = state.remaining.saturating_sub(1);
            }
        }
        Ok(None) => log::debug!("Auto-spin waiting, engine busy"),
        Err(e) => {
            if state.is_running(run_id) {
                log::warn!("Auto-spin stopped by error: {}", e);
                state.status = AutoSpinStatus::Stopped;
                state.remaining = 0;
                state.last_error = Some(e.to_string());
            }
            return None;
        }
    }

    if !state.is_running(run_id) {
        return None;
    }
    if state.remaining == 0 {
        state.status = AutoSpinStatus::Stopped;
        log::info!("Auto-spin finished after {} spins", state.completed);
        return None;
    }
    Some(engine.timing().auto_spin_interval())
}

/// Resolves once `run_id` is cancelled or the controller is gone
async fn cancelled(cancel_rx: &mut broadcast::Receiver<u64>, run_id: u64) {
    loop {
        match cancel_rx.recv().await {
            Ok(id) if id == run_id => return,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
