//! Settings characteristic access policy.
//!
//! Translates raw payloads written to the Settings characteristic into
//! parameter updates and renders the stored parameter for reads. Writes are
//! always acknowledged: the Settings value becomes [`ACK_SUCCESS`] or
//! [`ACK_FAILURE`] and is notified to subscribers.

use tracing::{debug, warn};

use crate::ble::characteristics::{CharacteristicKind, CharacteristicValue, MAX_PAYLOAD_LEN};
use crate::ble::transport::PeripheralTransport;
use crate::error::{Error, Result};
use crate::storage::medium::NonVolatileMedium;
use crate::storage::parameter::{ParameterStore, WriteStatus, MAX_INTERVAL, MIN_INTERVAL};

/// Acknowledgment for an applied write.
pub const ACK_SUCCESS: &[u8] = b"true";

/// Acknowledgment for a rejected write.
pub const ACK_FAILURE: &[u8] = b"false";

/// How a parsed value is checked against the interval domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeCheck {
    /// Reject a value that is below the minimum or above the maximum.
    #[default]
    RejectEither,
    /// Reject only a value that is both below the minimum and above the
    /// maximum, which never happens: every value is accepted and stored
    /// truncated to a byte. Matches firmware already deployed in the field.
    LegacyRejectBoth,
}

impl RangeCheck {
    /// Check if `value` is rejected.
    pub fn rejects(&self, value: i64) -> bool {
        let below = value < i64::from(MIN_INTERVAL);
        let above = value > i64::from(MAX_INTERVAL);
        match self {
            Self::RejectEither => below || above,
            Self::LegacyRejectBoth => below && above,
        }
    }
}

/// Outcome of a Settings write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was stored (or was already stored).
    Applied {
        /// The stored byte.
        value: u8,
        /// Whether the medium was committed.
        committed: bool,
    },
    /// The payload was out of domain, unparsable or too long.
    Rejected {
        /// The parsed value (0 for unparsable input).
        parsed: i64,
    },
    /// The store failed to commit.
    StorageFault,
}

impl WriteOutcome {
    /// The acknowledgment token for this outcome.
    pub fn ack(&self) -> &'static [u8] {
        match self {
            Self::Applied { .. } => ACK_SUCCESS,
            Self::Rejected { .. } | Self::StorageFault => ACK_FAILURE,
        }
    }

    /// Check if the write was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Best-effort integer parse with C `atoi` rules.
///
/// Skips leading whitespace, accepts one sign, consumes leading digits and
/// ignores the rest. Input without leading digits parses to 0. Overflow
/// saturates.
pub fn parse_numeric(payload: &[u8]) -> i64 {
    let mut bytes = payload
        .iter()
        .copied()
        .skip_while(|b| b.is_ascii_whitespace())
        .peekable();

    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    for b in bytes.take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        value = value.saturating_mul(10).saturating_add(digit);
    }

    if negative {
        -value
    } else {
        value
    }
}

/// Render the stored byte as the Settings read response.
///
/// Decimal text of the whole byte, so `10` reads as `"10"` and an
/// unconfigured cell as `"255"`; a single digit character cannot carry 10.
pub fn format_parameter(value: u8) -> String {
    value.to_string()
}

/// Set `payload` on a characteristic and push it to subscribers.
///
/// An empty payload is a no-op. Returns `true` if a notification was sent.
pub fn notify<T>(
    transport: &T,
    kind: CharacteristicKind,
    value: &mut CharacteristicValue,
    payload: &[u8],
) -> Result<bool>
where
    T: PeripheralTransport + ?Sized,
{
    if payload.is_empty() {
        return Ok(false);
    }

    value.set(payload)?;
    transport.notify(kind.uuid(), value.as_bytes())?;
    debug!("Notified {}: {:?}", kind, String::from_utf8_lossy(payload));
    Ok(true)
}

/// Gatekeeper between the Settings characteristic and the parameter store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPolicy {
    range_check: RangeCheck,
}

impl SettingsPolicy {
    /// Create a policy with the given range check.
    pub fn new(range_check: RangeCheck) -> Self {
        Self { range_check }
    }

    /// Get the range check in use.
    pub fn range_check(&self) -> RangeCheck {
        self.range_check
    }

    /// Decide what to store for a raw write payload.
    ///
    /// Returns the byte to store, or the parsed value on rejection.
    pub fn validate(&self, payload: &[u8]) -> std::result::Result<u8, i64> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(parse_numeric(&payload[..MAX_PAYLOAD_LEN]));
        }

        let parsed = parse_numeric(payload);
        if self.range_check.rejects(parsed) {
            return Err(parsed);
        }
        // In range for RejectEither; the legacy check stores the low byte.
        Ok(parsed as u8)
    }

    /// Handle a write to the Settings characteristic.
    ///
    /// The acknowledgment is set on `value` and notified even when the write
    /// is rejected. A storage failure is reported as
    /// [`WriteOutcome::StorageFault`] after acknowledging with [`ACK_FAILURE`];
    /// the error itself is returned in the second tuple field so the caller
    /// can report it.
    pub fn on_write<M, T>(
        &self,
        payload: &[u8],
        store: &mut ParameterStore<M>,
        value: &mut CharacteristicValue,
        transport: &T,
    ) -> (WriteOutcome, Option<Error>)
    where
        M: NonVolatileMedium,
        T: PeripheralTransport + ?Sized,
    {
        let (outcome, fault) = match self.validate(payload) {
            Ok(v) => match store.write(v) {
                Ok(status) => (
                    WriteOutcome::Applied {
                        value: v,
                        committed: status == WriteStatus::Committed,
                    },
                    None,
                ),
                Err(e) => (WriteOutcome::StorageFault, Some(e)),
            },
            Err(parsed) => {
                warn!(
                    "Rejected settings write {:?} (parsed {})",
                    String::from_utf8_lossy(payload),
                    parsed
                );
                (WriteOutcome::Rejected { parsed }, None)
            }
        };

        if let Err(e) = notify(transport, CharacteristicKind::Settings, value, outcome.ack()) {
            warn!("Failed to notify settings acknowledgment: {}", e);
        }

        (outcome, fault)
    }

    /// Handle a read of the Settings characteristic.
    ///
    /// Sets the rendered parameter as the outward value; the transport
    /// returns it to the reader. No notification is sent.
    pub fn on_read<M>(&self, store: &ParameterStore<M>, value: &mut CharacteristicValue) -> Result<()>
    where
        M: NonVolatileMedium,
    {
        let rendered = format_parameter(store.read());
        value.set(rendered.as_bytes())
    }
}
