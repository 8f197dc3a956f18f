//! Demo: run the sensor node against a console "radio"
//!
//! Run with: cargo run --example sensor_node
//!
//! Plays a scripted central: connect, read Settings, write a few values,
//! receive sensor notifications for a while, then disconnect. The parameter
//! is stored in a file under the temp directory, so running the demo again
//! starts from the last accepted value.

use async_trait::async_trait;
use bytes::Bytes;
use simple_ble_node::{
    run_publisher, spawn_indicator, AdvertisingConfig, EventResponse, FileMedium, Lamp,
    NodeConfig, PeripheralEvent, PeripheralEventHandler, PeripheralSession, PeripheralTransport,
    Result, SensorReading, SensorSource, ServiceDefinition,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Transport that prints what a real stack would send over the air.
struct ConsoleTransport;

impl PeripheralTransport for ConsoleTransport {
    fn register_service(&self, service: &ServiceDefinition) -> Result<()> {
        println!("[radio] service {}", service.uuid);
        for c in &service.characteristics {
            println!(
                "[radio]   {:<11} {} props={:#04x} descriptors={}",
                c.kind.to_string(),
                c.uuid,
                c.properties.bits(),
                c.descriptors.len()
            );
        }
        Ok(())
    }

    fn start_advertising(&self, config: &AdvertisingConfig) -> Result<()> {
        println!(
            "[radio] advertising '{}' ({})",
            config.device_name, config.service_uuid
        );
        Ok(())
    }

    fn notify(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        println!(
            "[radio] notify {} <- {:?}",
            characteristic,
            String::from_utf8_lossy(payload)
        );
        Ok(())
    }
}

struct ConsoleLamp;

impl Lamp for ConsoleLamp {
    fn set(&mut self, on: bool) {
        println!("[lamp] {}", if on { "ON" } else { "off" });
    }
}

/// Slowly drifting fake sensor.
struct DriftingSensor {
    step: u32,
}

#[async_trait]
impl SensorSource for DriftingSensor {
    async fn sample(&mut self) -> Result<SensorReading> {
        self.step += 1;
        let t = self.step as f32;
        Ok(SensorReading::new(21.0 + t * 0.1, 45.0 - t * 0.2))
    }
}

fn describe(response: EventResponse) -> String {
    match response {
        EventResponse::Handled => "handled".to_string(),
        EventResponse::ReadValue(v) => format!("read -> {:?}", String::from_utf8_lossy(&v)),
        EventResponse::WriteAck(outcome) => format!(
            "ack {:?} ({:?})",
            String::from_utf8_lossy(outcome.ack()),
            outcome
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("simple_ble_node=debug".parse().unwrap()),
        )
        .init();

    let image = std::env::temp_dir().join("simple-ble-node-demo.bin");
    println!("Parameter image: {}\n", image.display());

    let (indicator, _lamp_task) = spawn_indicator(ConsoleLamp, 4);
    let config = NodeConfig::default();
    let session = Arc::new(PeripheralSession::new(
        ConsoleTransport,
        FileMedium::open(&image, 16)?,
        indicator,
        config,
    )?);
    session.start()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let publisher = tokio::spawn(run_publisher(
        session.clone(),
        DriftingSensor { step: 0 },
        shutdown_rx,
    ));

    let script = [
        PeripheralEvent::Connected,
        PeripheralEvent::SettingsRead,
        PeripheralEvent::SettingsWrite(Bytes::from_static(b"15")),
        PeripheralEvent::SettingsWrite(Bytes::from_static(b"abc")),
        PeripheralEvent::SettingsWrite(Bytes::from_static(b"2")),
        PeripheralEvent::SettingsRead,
    ];

    for event in script {
        println!("\n>>> {:?}", event);
        let response = session.handle(event);
        println!("<<< {}", describe(response));
    }

    println!("\nReceiving notifications for 5 seconds...");
    tokio::time::sleep(Duration::from_secs(5)).await;

    println!("\n>>> Disconnected");
    session.handle(PeripheralEvent::Disconnected);
    tokio::time::sleep(Duration::from_secs(2)).await;

    let _ = shutdown_tx.send(true);
    let stats = publisher.await.unwrap();
    println!("\nPublisher: {:?}", stats);
    println!("Stored parameter: {}", session.parameter());

    Ok(())
}
