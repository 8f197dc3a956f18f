//! Periodic sensor publishing.
//!
//! Samples a [`SensorSource`] every publish interval and notifies the
//! Temperature and Humidity characteristics while a central is connected.
//! The interval is re-read from the parameter store on every cycle, so a
//! Settings write takes effect on the next sample.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::ble::characteristics::CharacteristicKind;
use crate::ble::transport::PeripheralTransport;
use crate::error::Result;
use crate::session::PeripheralSession;
use crate::storage::medium::NonVolatileMedium;

/// One raw sample from the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// Temperature in degrees Celsius.
    pub temperature_c: f32,
    /// Relative humidity in percent.
    pub humidity_pct: f32,
}

impl SensorReading {
    /// Create a reading.
    pub fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            temperature_c,
            humidity_pct,
        }
    }

    /// Temperature as ASCII text with one decimal.
    pub fn temperature_payload(&self) -> String {
        format!("{:.1}", self.temperature_c)
    }

    /// Humidity as ASCII text with one decimal.
    pub fn humidity_payload(&self) -> String {
        format!("{:.1}", self.humidity_pct)
    }
}

/// Something that produces sensor readings.
#[async_trait]
pub trait SensorSource: Send {
    /// Take one sample.
    async fn sample(&mut self) -> Result<SensorReading>;
}

/// Counters reported when the publisher stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Samples taken.
    pub samples: u64,
    /// Samples pushed to a connected central.
    pub published: u64,
    /// Samples dropped because no central was connected.
    pub skipped: u64,
    /// Sampling or notify failures.
    pub errors: u64,
}

/// Run the publish loop until `shutdown` becomes `true` or its sender is dropped.
pub async fn run_publisher<T, M, S>(
    session: Arc<PeripheralSession<T, M>>,
    mut source: S,
    mut shutdown: watch::Receiver<bool>,
) -> PublishStats
where
    T: PeripheralTransport,
    M: NonVolatileMedium,
    S: SensorSource,
{
    let mut stats = PublishStats::default();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let interval = session.publish_interval();
        trace!("Next sample in {:?}", interval);

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let reading = match source.sample().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Sensor sample failed: {}", e);
                stats.errors += 1;
                continue;
            }
        };
        stats.samples += 1;

        if !session.is_connected() {
            stats.skipped += 1;
            continue;
        }

        match publish_reading(&session, &reading) {
            Ok(()) => stats.published += 1,
            Err(e) => {
                warn!("Failed to publish reading: {}", e);
                stats.errors += 1;
            }
        }
    }

    debug!("Publisher stopped: {:?}", stats);
    stats
}

fn publish_reading<T, M>(session: &PeripheralSession<T, M>, reading: &SensorReading) -> Result<()>
where
    T: PeripheralTransport,
    M: NonVolatileMedium,
{
    session.publish(
        CharacteristicKind::Temperature,
        reading.temperature_payload().as_bytes(),
    )?;
    session.publish(
        CharacteristicKind::Humidity,
        reading.humidity_payload().as_bytes(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::transport::fake::RecordingTransport;
    use crate::ble::uuids::{HUMIDITY_CHARACTERISTIC_UUID, TEMPERATURE_CHARACTERISTIC_UUID};
    use crate::config::NodeConfig;
    use crate::error::Error;
    use crate::indicator::IndicatorHandle;
    use crate::session::{PeripheralEvent, PeripheralEventHandler};
    use crate::storage::medium::MemoryMedium;
    use std::time::Duration;

    struct FixedSource {
        reading: SensorReading,
        fail: bool,
    }

    #[async_trait]
    impl SensorSource for FixedSource {
        async fn sample(&mut self) -> Result<SensorReading> {
            if self.fail {
                return Err(Error::Internal("sensor not responding".to_string()));
            }
            Ok(self.reading)
        }
    }

    fn session() -> Arc<PeripheralSession<RecordingTransport, MemoryMedium>> {
        let config =
            NodeConfig::default().with_fallback_publish_interval(Duration::from_millis(5));
        let session = PeripheralSession::new(
            RecordingTransport::default(),
            MemoryMedium::new(4),
            IndicatorHandle::disabled(),
            config,
        )
        .unwrap();
        session.start().unwrap();
        Arc::new(session)
    }

    async fn run_for(
        session: Arc<PeripheralSession<RecordingTransport, MemoryMedium>>,
        source: FixedSource,
        duration: Duration,
    ) -> PublishStats {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run_publisher(session, source, rx));
        tokio::time::sleep(duration).await;
        tx.send(true).unwrap();
        task.await.unwrap()
    }

    #[test]
    fn test_reading_payloads() {
        let reading = SensorReading::new(21.46, 48.0);
        assert_eq!(reading.temperature_payload(), "21.5");
        assert_eq!(reading.humidity_payload(), "48.0");

        let cold = SensorReading::new(-3.0, 100.0);
        assert_eq!(cold.temperature_payload(), "-3.0");
        assert!(cold.humidity_payload().len() <= crate::ble::MAX_PAYLOAD_LEN);
    }

    #[tokio::test]
    async fn test_publishes_while_connected() {
        let session = session();
        session.handle(PeripheralEvent::Connected);

        let source = FixedSource {
            reading: SensorReading::new(22.0, 40.5),
            fail: false,
        };
        let stats = run_for(session.clone(), source, Duration::from_millis(100)).await;

        assert!(stats.published > 0);
        assert_eq!(stats.skipped, 0);

        let temps = session
            .transport()
            .notifications(TEMPERATURE_CHARACTERISTIC_UUID);
        assert!(!temps.is_empty());
        assert!(temps.iter().all(|t| t == b"22.0"));
        assert_eq!(
            session
                .transport()
                .notifications(HUMIDITY_CHARACTERISTIC_UUID)
                .len(),
            temps.len()
        );
    }

    #[tokio::test]
    async fn test_skips_while_disconnected() {
        let session = session();
        let source = FixedSource {
            reading: SensorReading::new(22.0, 40.5),
            fail: false,
        };
        let stats = run_for(session.clone(), source, Duration::from_millis(50)).await;

        assert_eq!(stats.published, 0);
        assert_eq!(stats.skipped, stats.samples);
        assert!(session
            .transport()
            .notifications(TEMPERATURE_CHARACTERISTIC_UUID)
            .is_empty());
    }

    #[tokio::test]
    async fn test_sample_errors_counted() {
        let session = session();
        session.handle(PeripheralEvent::Connected);
        let source = FixedSource {
            reading: SensorReading::new(0.0, 0.0),
            fail: true,
        };
        let stats = run_for(session, source, Duration::from_millis(50)).await;

        assert_eq!(stats.samples, 0);
        assert!(stats.errors > 0);
    }

    #[tokio::test]
    async fn test_stops_when_sender_dropped() {
        let session = session();
        let (tx, rx) = watch::channel(false);
        let source = FixedSource {
            reading: SensorReading::new(1.0, 1.0),
            fail: false,
        };
        let task = tokio::spawn(run_publisher(session, source, rx));
        drop(tx);

        let stats = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("publisher did not stop")
            .unwrap();
        assert_eq!(stats.published, 0);
    }
}
