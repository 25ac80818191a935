// MIT License - Copyright (c) 2026 Peter Wright
// Comelit VEDO alarm bridge
//
//! # vedo-bridge
//!
//! Presents a Comelit VEDO alarm panel as a single HomeKit-style security
//! system, with optional occupancy sensors for each zone.
//!
//! The panel is polled over an [`AlarmClient`]. Area snapshots are reduced to
//! one [`CurrentState`] using the configured away/home/night area groups,
//! and target states chosen by the operator are turned into arm or disarm
//! commands. Changes are pushed to an [`AccessoryReporter`]; the default
//! [`EventReporter`] broadcasts them as [`BridgeEvent`]s, which
//! [`mqtt::MqttBridge`] can forward to a broker.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vedo_bridge::{AlarmClient, BridgeConfig, EventReporter, VedoAlarm};
//!
//! async fn start(client: Arc<dyn AlarmClient>) -> vedo_bridge::Result<()> {
//!     vedo_bridge::logging::init_tracing();
//!
//!     let config = BridgeConfig::builder()
//!         .address("192.168.1.50")
//!         .code("123456")
//!         .away_areas(&["Front", "Back"], Some("tot"))
//!         .home_areas(&["Front"], None)
//!         .map_sensors(true)
//!         .build();
//!
//!     let reporter = Arc::new(EventReporter::default());
//!     let mut events = reporter.subscribe();
//!     let alarm = Arc::new(VedoAlarm::builder(config, client).reporter(reporter).build()?);
//!     let polling = alarm.start_polling();
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     polling.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod alarm;
pub mod client;
pub mod clock;
pub mod config;
pub mod devices;
pub mod error;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod mqtt;
pub mod occupancy;
pub mod poller;
pub mod reconciler;
pub mod reporter;
pub mod session;
pub mod state;

// Re-exports for convenience
pub use alarm::{VedoAlarm, VedoAlarmBuilder};
pub use client::{AlarmClient, ALL_AREAS};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{AlarmConfig, AreaGroupConfig, AreasConfig, BridgeConfig, BridgeConfigBuilder, MqttConfig};
pub use devices::{Area, AreaDesc, Zone, ZoneDesc};
pub use error::{BridgeError, Result};
pub use event::{BridgeEvent, EventReceiver, EventReporter};
pub use metrics::{BridgeMetrics, MetricsSink, NoopMetrics};
pub use occupancy::ZoneMirror;
pub use poller::{PollDriver, PollHandle, PollSettings, PollTask};
pub use reconciler::{AreaGroup, AreaMapping};
pub use reporter::AccessoryReporter;
pub use session::SessionManager;
pub use state::{CurrentState, TargetState};
