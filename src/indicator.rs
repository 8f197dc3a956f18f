//! Visual connection indicator.
//!
//! Connection callbacks request a blink pattern through an [`IndicatorHandle`];
//! a background task owns the lamp and plays the pattern, so the callback
//! returns immediately instead of sleeping through the blink.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Number of queued patterns before new requests are dropped.
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

/// The on-board lamp.
pub trait Lamp: Send + 'static {
    /// Drive the lamp on or off.
    fn set(&mut self, on: bool);
}

/// A blink sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlinkPattern {
    /// Number of on/off cycles.
    pub count: u32,
    /// Time spent in each of the on and off phases.
    pub half_period: Duration,
}

impl Default for BlinkPattern {
    fn default() -> Self {
        Self {
            count: 2,
            half_period: Duration::from_millis(400),
        }
    }
}

impl BlinkPattern {
    /// Create a pattern.
    pub fn new(count: u32, half_period: Duration) -> Self {
        Self { count, half_period }
    }

    /// Total time the pattern takes to play.
    pub fn duration(&self) -> Duration {
        self.half_period * 2 * self.count
    }
}

/// Fire-and-forget handle for requesting blinks.
#[derive(Debug, Clone)]
pub struct IndicatorHandle {
    tx: Option<mpsc::Sender<BlinkPattern>>,
}

impl IndicatorHandle {
    /// A handle that discards every request.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A handle feeding an existing channel, for callers that drive their
    /// own indicator task.
    pub fn from_sender(tx: mpsc::Sender<BlinkPattern>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Request a blink pattern. Never blocks.
    ///
    /// Returns `false` if the request was dropped because the queue is full
    /// or the indicator task has stopped.
    pub fn signal(&self, pattern: BlinkPattern) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };

        match tx.try_send(pattern) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Indicator queue full, dropping blink request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Indicator task stopped, dropping blink request");
                false
            }
        }
    }
}

/// Spawn the indicator task driving `lamp`.
///
/// Must be called from within a tokio runtime. The task ends once every
/// [`IndicatorHandle`] has been dropped.
pub fn spawn_indicator<L: Lamp>(lamp: L, queue_depth: usize) -> (IndicatorHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(queue_depth.max(1));

    let handle = tokio::spawn(async move {
        let mut lamp = lamp;
        while let Some(pattern) = rx.recv().await {
            play(&mut lamp, pattern).await;
        }
        lamp.set(false);
        debug!("Indicator task ended");
    });

    (IndicatorHandle::from_sender(tx), handle)
}

async fn play<L: Lamp>(lamp: &mut L, pattern: BlinkPattern) {
    for _ in 0..pattern.count {
        lamp.set(true);
        tokio::time::sleep(pattern.half_period).await;
        lamp.set(false);
        tokio::time::sleep(pattern.half_period).await;
    }
}
