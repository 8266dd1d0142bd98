//! Background tick driver for a [`QueuedEventBus`].
//!
//! Hosts with their own frame loop call [`QueuedEventBus::drain`] once per
//! tick. Hosts without one can spawn a `DrainLoop` instead.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use super::queued_bus::QueuedEventBus;

/// Totals accumulated by a [`DrainLoop`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub ticks: usize,
    pub dispatched: usize,
    pub delivered: usize,
    pub faults: usize,
}

/// A thread that drains a queued bus at a fixed interval.
///
/// ```
/// use gamebus::{DrainLoop, QueuedEventBus};
/// use serde_json::json;
/// use std::time::Duration;
///
/// let bus = QueuedEventBus::new();
/// let _sub = bus.on("Saved", |event| println!("saved slot {}", event.data));
/// let driver = DrainLoop::spawn(bus.clone(), Duration::from_millis(5));
///
/// bus.emit_event("Saved", json!(1), 0);
///
/// let stats = driver.stop();
/// println!("{} ticks", stats.ticks);
/// ```
pub struct DrainLoop {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<DrainStats>>,
}

impl DrainLoop {
    /// Start draining `bus` every `interval`.
    ///
    /// The loop ends when stopped, dropped, or when the bus is disposed.
    pub fn spawn(bus: QueuedEventBus, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = DrainStats::default();

            loop {
                if bus.is_disposed() {
                    break;
                }

                let result = bus.drain();
                stats.ticks += 1;
                stats.dispatched += result.dispatched;
                stats.delivered += result.delivered;
                stats.faults += result.faults;

                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            // Flush whatever was queued before the stop, one batch at a time.
            loop {
                let result = bus.drain();
                stats.dispatched += result.dispatched;
                stats.delivered += result.delivered;
                stats.faults += result.faults;
                if result.dispatched == 0 || result.remaining == 0 {
                    break;
                }
            }

            debug!(
                ticks = stats.ticks,
                dispatched = stats.dispatched,
                faults = stats.faults,
                "drain loop stopped"
            );
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the loop to stop and wait for it.
    pub fn stop(mut self) -> DrainStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => DrainStats::default(),
        }
    }

    /// Signal the loop to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for DrainLoop {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
