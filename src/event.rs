// MIT License - Copyright (c) 2026 Peter Wright
// Broadcast events

use tracing::trace;

use crate::reporter::AccessoryReporter;
use crate::state::{CurrentState, TargetState};

/// Every state transition reported by the bridge.
///
/// Consumers subscribe via [`EventReporter::subscribe`] to receive a
/// `tokio::sync::broadcast::Receiver<BridgeEvent>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    CurrentStateChanged(CurrentState),
    TargetStateChanged(TargetState),
    ZoneOccupancyChanged {
        zone: u32,
        name: String,
        occupied: bool,
    },
    ZoneBypassChanged {
        zone: u32,
        name: String,
        bypassed: bool,
    },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<BridgeEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<BridgeEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}

/// Reporter that fans transitions out on a broadcast channel.
#[derive(Debug, Clone)]
pub struct EventReporter {
    tx: EventSender,
}

impl EventReporter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = event_channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.tx.subscribe()
    }

    fn send(&self, event: BridgeEvent) {
        // No subscribers is fine.
        if self.tx.send(event).is_err() {
            trace!("No event subscribers");
        }
    }
}

impl Default for EventReporter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl AccessoryReporter for EventReporter {
    fn report_current_state(&self, state: CurrentState) {
        self.send(BridgeEvent::CurrentStateChanged(state));
    }

    fn report_target_state(&self, state: TargetState) {
        self.send(BridgeEvent::TargetStateChanged(state));
    }

    fn report_zone_occupancy(&self, zone: u32, name: &str, occupied: bool) {
        self.send(BridgeEvent::ZoneOccupancyChanged {
            zone,
            name: name.to_string(),
            occupied,
        });
    }

    fn report_zone_bypass(&self, zone: u32, name: &str, bypassed: bool) {
        self.send(BridgeEvent::ZoneBypassChanged {
            zone,
            name: name.to_string(),
            bypassed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let reporter = EventReporter::default();
        let mut rx = reporter.subscribe();

        reporter.report_current_state(CurrentState::NightArm);
        reporter.report_zone_occupancy(3, "Hall", true);

        assert_eq!(
            rx.recv().await.unwrap(),
            BridgeEvent::CurrentStateChanged(CurrentState::NightArm)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            BridgeEvent::ZoneOccupancyChanged {
                zone: 3,
                name: "Hall".to_string(),
                occupied: true
            }
        );
    }

    #[test]
    fn test_send_without_subscribers() {
        let reporter = EventReporter::default();
        reporter.report_target_state(TargetState::AwayArm);
    }
}
