// In-memory VEDO panel shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vedo_bridge::{AlarmClient, MetricsSink, Area, AreaDesc, BridgeConfig, BridgeError, Result, Zone, ZoneDesc};

#[derive(Default)]
pub struct FakePanel {
    pub areas: Mutex<Vec<Area>>,
    pub zones: Mutex<Vec<Zone>>,
    pub calls: Mutex<Vec<String>>,
    pub logins: AtomicU32,
    pub area_desc_fetches: AtomicU32,
    pub fail_status: AtomicBool,
    /// Area index whose arm call is refused
    pub fail_arm: Mutex<Option<u32>>,
    pub fail_disarm: AtomicBool,
}

impl FakePanel {
    pub fn with_areas(areas: Vec<Area>) -> Arc<Self> {
        let panel = Self::default();
        *panel.areas.lock().unwrap() = areas;
        Arc::new(panel)
    }

    pub fn set_areas(&self, areas: Vec<Area>) {
        *self.areas.lock().unwrap() = areas;
    }

    pub fn set_zones(&self, zones: Vec<Zone>) {
        *self.zones.lock().unwrap() = zones;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AlarmClient for FakePanel {
    async fn login(&self, code: &str) -> Result<String> {
        if code != "1234" {
            return Err(BridgeError::auth("wrong code"));
        }
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("uid-{n}"))
    }

    async fn logout(&self, _token: &str) -> Result<()> {
        Ok(())
    }

    async fn area_descriptions(&self, _token: &str) -> Result<Vec<AreaDesc>> {
        self.area_desc_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.areas.lock().unwrap().iter().map(AreaDesc::from).collect())
    }

    async fn zone_descriptions(&self, _token: &str) -> Result<Vec<ZoneDesc>> {
        Ok(self.zones.lock().unwrap().iter().map(ZoneDesc::from).collect())
    }

    async fn find_active_areas(
        &self,
        _token: &str,
        _areas: Option<&[AreaDesc]>,
    ) -> Result<Vec<Area>> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(BridgeError::communication("find_active_areas", "timeout"));
        }
        Ok(self.areas.lock().unwrap().clone())
    }

    async fn zone_status(&self, _token: &str, _zones: Option<&[ZoneDesc]>) -> Result<Vec<Zone>> {
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn arm(
        &self,
        _token: &str,
        area: u32,
        exclusive: bool,
        shortcut: Option<&str>,
    ) -> Result<()> {
        self.record(format!("arm {area} {exclusive} {}", shortcut.unwrap_or("-")));
        if *self.fail_arm.lock().unwrap() == Some(area) {
            return Err(BridgeError::communication("arm", "nak"));
        }
        Ok(())
    }

    async fn disarm(&self, _token: &str, area: u32) -> Result<()> {
        self.record(format!("disarm {area}"));
        if self.fail_disarm.load(Ordering::SeqCst) {
            return Err(BridgeError::communication("disarm", "nak"));
        }
        Ok(())
    }

    async fn include_zone(&self, _token: &str, index: u32) -> Result<()> {
        self.record(format!("include {index}"));
        Ok(())
    }

    async fn exclude_zone(&self, _token: &str, index: u32) -> Result<()> {
        self.record(format!("exclude {index}"));
        Ok(())
    }
}

pub fn house() -> Vec<Area> {
    vec![
        Area::new(0, "Front"),
        Area::new(1, "Back"),
        Area::new(2, "Garage"),
    ]
}

pub fn config() -> BridgeConfig {
    BridgeConfig::builder()
        .address("10.0.0.2")
        .code("1234")
        .away_areas(&["Front", "Back", "Garage"], Some("tot"))
        .home_areas(&["garage"], Some("p1"))
        .build()
}

/// Counts what the bridge records.
#[derive(Default)]
pub struct RecordingMetrics {
    triggers: Mutex<HashMap<String, u64>>,
    polls: Mutex<HashMap<String, u64>>,
}

impl RecordingMetrics {
    pub fn occupancy_triggers(&self, zone: &str) -> u64 {
        self.triggers.lock().unwrap().get(zone).copied().unwrap_or(0)
    }

    pub fn occupancy_triggers_total(&self) -> u64 {
        self.triggers.lock().unwrap().values().sum()
    }

    pub fn poll_count(&self, task: &str) -> u64 {
        self.polls.lock().unwrap().get(task).copied().unwrap_or(0)
    }
}

impl MetricsSink for RecordingMetrics {
    fn occupancy_triggered(&self, zone: &str) {
        *self.triggers.lock().unwrap().entry(zone.to_string()).or_insert(0) += 1;
    }

    fn poll_completed(&self, task: &str) {
        *self.polls.lock().unwrap().entry(task.to_string()).or_insert(0) += 1;
    }
}
