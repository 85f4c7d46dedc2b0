//! Optional background worker for the digit strategy.
//!
//! The worker owns a fresh copy of the input and communicates only through
//! messages: any number of progress reports with monotone non-decreasing
//! ratios, then exactly one result or error, then nothing. Cancellation
//! stops the search at the next iteration boundary without a final message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

use crate::error::TandemError;
use crate::options::PackerOptions;
use crate::types::{PackerData, Progress};

#[derive(Debug)]
pub enum WorkerMessage {
    Progress(Progress),
    Result(Box<PackerData>),
    Error(String),
}

pub struct DigitWorker {
    rx: Receiver<WorkerMessage>,
    trigger: Option<Sender<()>>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// Spawn the worker. With `waiting_for_trigger` set, the thread parks until
/// [`DigitWorker::trigger`] is called (or the handle is dropped).
pub fn spawn(input: String, opts: PackerOptions) -> DigitWorker {
    let (tx, rx) = channel();
    let (trigger_tx, trigger_rx) = channel::<()>();
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancel);
    let wait = opts.waiting_for_trigger;

    let handle = thread::spawn(move || {
        if wait && trigger_rx.recv().is_err() {
            debug!("worker dropped before being triggered");
            return;
        }
        let mut last = 0.0f64;
        let progress_tx = tx.clone();
        let mut observer = move |p: Progress| {
            let ratio = p.ratio.max(last).min(1.0);
            last = ratio;
            let _ = progress_tx.send(WorkerMessage::Progress(Progress { ratio, ..p }));
        };

        let outcome = crate::digit_data(&input, &opts, Some(&mut observer), Some(&cancel_flag));
        if cancel_flag.load(Ordering::Relaxed) {
            return;
        }
        match outcome {
            Ok((data, timed_out)) => {
                let phase = if timed_out { "timeout" } else { "done" };
                let _ = tx.send(WorkerMessage::Progress(Progress {
                    ratio: 1.0,
                    phase: phase.to_string(),
                    message: format!(
                        "{} replacements, artefact {} bytes",
                        data.replacements.len(),
                        data.best_stage().length
                    ),
                    detail: None,
                }));
                let _ = tx.send(WorkerMessage::Result(Box::new(data)));
            }
            Err(e) => {
                let _ = tx.send(WorkerMessage::Error(e.to_string()));
            }
        }
    });

    DigitWorker { rx, trigger: Some(trigger_tx), cancel, handle: Some(handle) }
}

impl DigitWorker {
    /// Release a worker spawned with `waiting_for_trigger`.
    pub fn trigger(&mut self) {
        if let Some(t) = self.trigger.take() {
            let _ = t.send(());
        }
    }

    /// Block until the next message; `None` once the worker is gone.
    pub fn recv(&self) -> Option<WorkerMessage> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<WorkerMessage> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerMessage> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain messages until the final result or error, then join the thread.
    pub fn wait(mut self) -> Result<PackerData, TandemError> {
        self.trigger();
        loop {
            match self.rx.recv() {
                Ok(WorkerMessage::Result(data)) => {
                    self.join_thread();
                    return Ok(*data);
                }
                Ok(WorkerMessage::Error(e)) => {
                    self.join_thread();
                    return Err(TandemError::Worker(e));
                }
                Ok(WorkerMessage::Progress(_)) => continue,
                Err(_) => {
                    self.join_thread();
                    return Err(TandemError::Worker(
                        "worker exited without a result".to_string(),
                    ));
                }
            }
        }
    }

    /// Stop the search at the next iteration boundary and reclaim the thread.
    pub fn cancel(mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.trigger = None;
        self.join_thread();
    }

    fn join_thread(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
