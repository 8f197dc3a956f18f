//! Connection lifecycle tracking.
//!
//! Follows whether a central is connected. The radio stack reports connect
//! and disconnect; nothing else writes the state.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::indicator::{BlinkPattern, IndicatorHandle};

/// Connection state of the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No central connected.
    #[default]
    Disconnected,
    /// A central is connected.
    Connected,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Event for connection state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionEvent {
    /// The new connection state.
    pub state: ConnectionState,
    /// Number of connections accepted since boot.
    pub connections: u64,
}

/// Tracks peer presence and drives the connection indicator.
pub struct ConnectionTracker {
    /// Current connection state.
    state: RwLock<ConnectionState>,
    /// Connections accepted since boot.
    connections: AtomicU64,
    /// Channel for connection events.
    event_tx: broadcast::Sender<ConnectionEvent>,
    /// Indicator signalled on every connect and disconnect.
    indicator: IndicatorHandle,
    /// Pattern played on the indicator.
    pattern: BlinkPattern,
}

impl ConnectionTracker {
    /// Create a tracker in the Disconnected state.
    pub fn new(indicator: IndicatorHandle, pattern: BlinkPattern) -> Self {
        let (event_tx, _) = broadcast::channel(16);

        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            connections: AtomicU64::new(0),
            event_tx,
            indicator,
            pattern,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Number of connections accepted since boot.
    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::SeqCst)
    }

    /// Subscribe to connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.event_tx.subscribe()
    }

    /// Handle a connect event from the stack.
    ///
    /// Returns `true` if the state changed.
    pub fn on_connect(&self) -> bool {
        self.indicator.signal(self.pattern);
        let changed = self.set_state(ConnectionState::Connected);
        if changed {
            let n = self.connections.fetch_add(1, Ordering::SeqCst) + 1;
            info!("Central connected (connection #{})", n);
            self.emit(ConnectionState::Connected);
        } else {
            warn!("Connect event while already connected");
        }
        changed
    }

    /// Handle a disconnect event from the stack.
    ///
    /// Returns `true` if the state changed.
    pub fn on_disconnect(&self) -> bool {
        self.indicator.signal(self.pattern);
        let changed = self.set_state(ConnectionState::Disconnected);
        if changed {
            info!("Central disconnected");
            self.emit(ConnectionState::Disconnected);
        } else {
            warn!("Disconnect event while already disconnected");
        }
        changed
    }

    fn set_state(&self, new_state: ConnectionState) -> bool {
        let old_state = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, new_state)
        };

        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);
        }
        old_state != new_state
    }

    fn emit(&self, state: ConnectionState) {
        let _ = self.event_tx.send(ConnectionEvent {
            state,
            connections: self.connections(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ConnectionTracker {
        ConnectionTracker::new(IndicatorHandle::disabled(), BlinkPattern::default())
    }

    #[test]
    fn test_connection_state() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(format!("{}", ConnectionState::Connected), "Connected");
        assert_eq!(format!("{}", ConnectionState::Disconnected), "Disconnected");
    }

    #[test]
    fn test_connect_disconnect_sequence() {
        let tracker = tracker();
        let mut rx = tracker.subscribe();
        assert_eq!(tracker.state(), ConnectionState::Disconnected);

        assert!(tracker.on_connect());
        assert!(tracker.is_connected());
        assert!(tracker.on_disconnect());
        assert!(!tracker.is_connected());

        assert_eq!(
            rx.try_recv().unwrap(),
            ConnectionEvent {
                state: ConnectionState::Connected,
                connections: 1
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ConnectionEvent {
                state: ConnectionState::Disconnected,
                connections: 1
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_duplicate_events_do_not_transition() {
        let tracker = tracker();
        let mut rx = tracker.subscribe();

        assert!(!tracker.on_disconnect());
        assert!(tracker.on_connect());
        assert!(!tracker.on_connect());
        assert_eq!(tracker.connections(), 1);

        assert_eq!(rx.try_recv().unwrap().state, ConnectionState::Connected);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_every_event_signals_indicator() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let pattern = BlinkPattern::new(3, std::time::Duration::from_millis(10));
        let tracker = ConnectionTracker::new(IndicatorHandle::from_sender(tx), pattern);

        tracker.on_connect();
        assert_eq!(rx.try_recv().unwrap(), pattern);
        tracker.on_disconnect();
        assert_eq!(rx.try_recv().unwrap(), pattern);

        // Duplicates still blink
        tracker.on_disconnect();
        assert_eq!(rx.try_recv().unwrap(), pattern);
        tracker.on_connect();
        tracker.on_connect();
        assert_eq!(rx.try_recv().unwrap(), pattern);
        assert_eq!(rx.try_recv().unwrap(), pattern);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reconnect_counts_fresh_connection() {
        let tracker = tracker();
        tracker.on_connect();
        tracker.on_disconnect();
        tracker.on_connect();
        assert_eq!(tracker.connections(), 2);
        assert!(tracker.is_connected());
    }
}
