// MIT License - Copyright (c) 2026 Peter Wright
// Host-facing reporting seam

use crate::state::{CurrentState, TargetState};

/// Receives every state transition the bridge wants the host to show.
///
/// Implementations must not block: they are called from the poll tasks.
pub trait AccessoryReporter: Send + Sync {
    fn report_current_state(&self, state: CurrentState);

    fn report_target_state(&self, state: TargetState);

    fn report_zone_occupancy(&self, zone: u32, name: &str, occupied: bool);

    fn report_zone_bypass(&self, zone: u32, name: &str, bypassed: bool);
}
