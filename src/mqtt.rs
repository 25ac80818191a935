// MIT License - Copyright (c) 2026 Peter Wright
// MQTT surface

use std::sync::Arc;

use chrono::Utc;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::alarm::VedoAlarm;
use crate::config::MqttConfig;
use crate::error::{BridgeError, Result};
use crate::event::{BridgeEvent, EventReceiver};
use crate::state::TargetState;

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

// Published messages share a flat {now, op, ...} structure

#[derive(Debug, Serialize)]
struct MqttStateEvent {
    now: u64,
    op: String,
    state: String,
    value: u8,
}

#[derive(Debug, Serialize)]
struct MqttZoneEvent {
    now: u64,
    op: String,
    zone: u32,
    name: String,
}

#[derive(Debug, Serialize)]
struct MqttCmdAck {
    now: u64,
    op: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Inbound command (subscribed)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MqttCommand {
    pub op: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub zone: Option<u32>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// JSON payload published for a bridge event, and whether it is retained.
pub fn event_payload(event: &BridgeEvent) -> (serde_json::Value, bool) {
    let now = now_epoch_ms();
    let (value, retain) = match event {
        BridgeEvent::CurrentStateChanged(state) => (
            serde_json::to_value(MqttStateEvent {
                now,
                op: "CURRENT_STATE".to_string(),
                state: state.as_str().to_string(),
                value: state.hap_value(),
            }),
            true,
        ),
        BridgeEvent::TargetStateChanged(state) => (
            serde_json::to_value(MqttStateEvent {
                now,
                op: "TARGET_STATE".to_string(),
                state: state.as_str().to_string(),
                value: state.hap_value(),
            }),
            false,
        ),
        BridgeEvent::ZoneOccupancyChanged {
            zone,
            name,
            occupied,
        } => (
            serde_json::to_value(MqttZoneEvent {
                now,
                op: if *occupied { "ZONE_OPEN" } else { "ZONE_CLOSE" }.to_string(),
                zone: *zone,
                name: name.clone(),
            }),
            false,
        ),
        BridgeEvent::ZoneBypassChanged {
            zone,
            name,
            bypassed,
        } => (
            serde_json::to_value(MqttZoneEvent {
                now,
                op: if *bypassed { "ZONE_BYPASSED" } else { "ZONE_UNBYPASSED" }.to_string(),
                zone: *zone,
                name: name.clone(),
            }),
            false,
        ),
    };
    (value.unwrap_or(serde_json::Value::Null), retain)
}

/// CMD_ACK payload for a command, echoing the raw command as `src`.
pub fn command_ack(payload: &str, result: &Result<()>) -> serde_json::Value {
    let ack = MqttCmdAck {
        now: now_epoch_ms(),
        op: "CMD_ACK".to_string(),
        success: result.is_ok(),
        src: serde_json::from_str(payload).ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
    };
    serde_json::to_value(ack).unwrap_or(serde_json::Value::Null)
}

pub fn parse_command(payload: &str) -> Result<MqttCommand> {
    serde_json::from_str(payload)
        .map_err(|e| BridgeError::Mqtt(format!("invalid command payload: {e}")))
}

/// Execute a parsed command against the alarm.
pub async fn execute_command(alarm: &VedoAlarm, cmd: &MqttCommand) -> Result<()> {
    match cmd.op.as_str() {
        "PING" => {
            info!("Command: PING");
            Ok(())
        }

        "SET_TARGET" => {
            let target: TargetState = cmd
                .target
                .as_deref()
                .ok_or_else(|| BridgeError::Mqtt("SET_TARGET: missing target".into()))?
                .parse()?;
            info!("Command: SET_TARGET {}", target);
            alarm.set_target_state(target).await.map(|_| ())
        }

        "ZONE_BYPASS_ENABLE" | "ZONE_BYPASS_DISABLE" => {
            let op = cmd.op.as_str();
            let zone = cmd
                .zone
                .ok_or_else(|| BridgeError::Mqtt(format!("{op}: missing zone")))?;
            info!("Command: {op} zone {zone}");
            alarm
                .set_zone_bypass(zone, op == "ZONE_BYPASS_ENABLE")
                .await
        }

        other => {
            warn!("Unknown command: {other}");
            Err(BridgeError::Mqtt(format!("unknown command {other}")))
        }
    }
}

async fn publish_json(
    client: &AsyncClient,
    topic: &str,
    payload: &serde_json::Value,
    retain: bool,
) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, retain, json).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
pub fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped.rsplit_once(':').ok_or_else(|| {
        BridgeError::Configuration("MQTT URL must be in format mqtt://host:port".into())
    })?;

    let port: u16 = port_str
        .parse()
        .map_err(|_| BridgeError::Configuration(format!("invalid MQTT port number: {port_str}")))?;

    Ok((host.to_string(), port))
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// Publishes bridge events to MQTT and executes commands received on the
/// subscribe topic.
pub struct MqttBridge {
    alarm: Arc<VedoAlarm>,
    config: MqttConfig,
}

impl MqttBridge {
    pub fn new(alarm: Arc<VedoAlarm>, config: MqttConfig) -> Self {
        Self { alarm, config }
    }

    /// Run until `shutdown` turns true.
    pub async fn run(self, events: EventReceiver, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let (host, port) = parse_mqtt_url(&self.config.url)?;
        let publish_topic = self.config.publish_topic.clone();
        let subscribe_topic = self.config.subscribe_topic.clone();

        let mut mqtt_opts = MqttOptions::new(&self.config.client_id, host, port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);

        client.subscribe(&subscribe_topic, QoS::AtLeastOnce).await?;
        info!("MQTT: subscribed to {subscribe_topic}");

        // Retained current state for late subscribers
        let current = BridgeEvent::CurrentStateChanged(self.alarm.current_state().await);
        let (payload, retain) = event_payload(&current);
        publish_json(&client, &publish_topic, &payload, retain).await;

        let forward_client = client.clone();
        let forward_topic = publish_topic.clone();
        let forwarder = tokio::spawn(async move {
            let mut rx = events;
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let (payload, retain) = event_payload(&event);
                        publish_json(&forward_client, &forward_topic, &payload, retain).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Event receiver lagged, missed {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Event channel closed");
                        break;
                    }
                }
            }
        });

        loop {
            tokio::select! {
                polled = eventloop.poll() => match polled {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // rumqttc does not resubscribe after a broker reconnect
                        info!("MQTT: connected, subscribing to {subscribe_topic}");
                        if let Err(e) = client.subscribe(&subscribe_topic, QoS::AtLeastOnce).await {
                            error!("Failed to subscribe to {subscribe_topic}: {e}");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) if msg.topic == subscribe_topic => {
                        let payload = String::from_utf8_lossy(&msg.payload).to_string();
                        debug!("MQTT command received: {payload}");
                        let result = match parse_command(&payload) {
                            Ok(cmd) => execute_command(&self.alarm, &cmd).await,
                            Err(e) => {
                                warn!("Failed to parse MQTT command: {e}");
                                Err(e)
                            }
                        };
                        let ack = command_ack(&payload, &result);
                        publish_json(&client, &publish_topic, &ack, false).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("MQTT bridge shutting down");
                        break;
                    }
                }
            }
        }

        forwarder.abort();
        if let Err(e) = client.disconnect().await {
            debug!("MQTT disconnect failed: {e}");
        }
        Ok(())
    }
}
