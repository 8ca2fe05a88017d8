//! Polling tick that drives completion detection
//!
//! One task per engine. While the engine is idle the task parks on the state channel;
//! while it runs, the task calls [`TimerEngine::poll`] on a fixed interval. The task is
//! owned by a [`Ticker`] handle and never outlives it.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::state::TimerEngine;

/// Default polling period while a countdown is running
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Handle to the polling task. Dropping it aborts the task.
#[derive(Debug)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Ticker {
    /// Spawn the polling task for `engine` on the current tokio runtime
    pub fn spawn(engine: Arc<TimerEngine>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(ticker_task(engine, period, shutdown_rx));

        Self {
            handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the task and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Ticker task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn ticker_task(engine: Arc<TimerEngine>, period: Duration, shutdown_rx: oneshot::Receiver<()>) {
    info!("Starting ticker for {} every {:?}", engine.storage_key(), period);
    run(&engine, period, shutdown_rx).await;
    info!("Ticker for {} stopped", engine.storage_key());
}

async fn run(engine: &TimerEngine, period: Duration, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut state_rx = engine.subscribe();

    loop {
        // Park until the engine reports running
        if !state_rx.borrow_and_update().is_running {
            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
                _ = &mut shutdown_rx => return,
            }
        }

        debug!("Timer running, polling every {:?}", period);
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Some(mode) = engine.poll() {
                        debug!("Ticker observed {} completion", mode);
                    }
                    if !engine.state().is_running {
                        break;
                    }
                }
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !state_rx.borrow_and_update().is_running {
                        debug!("Timer stopped, ticker going idle");
                        break;
                    }
                }
                _ = &mut shutdown_rx => return,
            }
        }
    }
}
