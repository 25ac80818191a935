// MIT License - Copyright (c) 2026 Peter Wright
// VEDO security system accessory

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::client::{AlarmClient, ALL_AREAS};
use crate::clock::{Clock, TokioClock};
use crate::config::BridgeConfig;
use crate::devices::{Area, AreaDesc, Zone, ZoneDesc};
use crate::error::{BridgeError, Result};
use crate::metrics::{BridgeMetrics, MetricsSink, ALARM_TASK, SENSORS_TASK};
use crate::occupancy::ZoneMirror;
use crate::poller::{PollDriver, PollHandle, PollSettings, PollTask};
use crate::reconciler::{arm_for, reconcile, AreaMapping, ReportedState};
use crate::reporter::AccessoryReporter;
use crate::session::SessionManager;
use crate::state::{CurrentState, TargetState};

/// The VEDO panel seen as one security system plus its zone sensors.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vedo_bridge::{AlarmClient, BridgeConfig, EventReporter, TargetState, VedoAlarm};
///
/// async fn run(client: Arc<dyn AlarmClient>) -> vedo_bridge::Result<()> {
///     let config = BridgeConfig::from_file("vedo.toml")?;
///     let reporter = Arc::new(EventReporter::default());
///     let mut events = reporter.subscribe();
///
///     let alarm = Arc::new(VedoAlarm::builder(config, client).reporter(reporter).build()?);
///     let polling = alarm.start_polling();
///
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("Event: {:?}", event);
///         }
///     });
///
///     alarm.set_target_state(TargetState::AwayArm).await?;
///
///     tokio::signal::ctrl_c().await?;
///     polling.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct VedoAlarm {
    name: String,
    client: Arc<dyn AlarmClient>,
    session: SessionManager,
    mapping: AreaMapping,
    reporter: Arc<dyn AccessoryReporter>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
    poll_settings: PollSettings,
    zone_poll_stagger: Duration,
    map_sensors: bool,
    area_descs: Mutex<Option<Vec<AreaDesc>>>,
    zone_descs: Mutex<Option<Vec<ZoneDesc>>>,
    reported: Mutex<ReportedState>,
    mirror: Mutex<ZoneMirror>,
}

impl VedoAlarm {
    pub fn builder(config: BridgeConfig, client: Arc<dyn AlarmClient>) -> VedoAlarmBuilder {
        VedoAlarmBuilder {
            config,
            client,
            reporter: None,
            metrics: None,
            clock: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mapping(&self) -> &AreaMapping {
        &self.mapping
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Targets the host should offer.
    pub fn valid_target_states(&self) -> Vec<TargetState> {
        self.mapping.valid_targets()
    }

    pub async fn current_state(&self) -> CurrentState {
        self.reported.lock().await.current
    }

    pub async fn target_state(&self) -> TargetState {
        self.reported.lock().await.target
    }

    /// Fetch the live status of every area.
    ///
    /// Area descriptions are fetched on first use and kept.
    pub async fn check_alarm(&self) -> Result<Vec<Area>> {
        self.session
            .with_session("checking alarm", |token| async move {
                let mut descs = self.area_descs.lock().await;
                if descs.is_none() {
                    *descs = Some(self.client.area_descriptions(&token).await?);
                }
                self.client
                    .find_active_areas(&token, descs.as_deref())
                    .await
            })
            .await
    }

    /// Fetch the live status of every zone.
    ///
    /// Zone descriptions are fetched on first use and kept.
    pub async fn fetch_zones(&self) -> Result<Vec<Zone>> {
        self.session
            .with_session("fetching zones", |token| async move {
                let mut descs = self.zone_descs.lock().await;
                if descs.is_none() {
                    *descs = Some(self.client.zone_descriptions(&token).await?);
                }
                self.client.zone_status(&token, descs.as_deref()).await
            })
            .await
    }

    /// Reconcile a snapshot of areas and report what changed.
    pub async fn update(&self, areas: &[Area]) -> CurrentState {
        let mut reported = self.reported.lock().await;
        let transition = reconcile(areas, &self.mapping, *reported);
        if let Some(current) = transition.current {
            info!("Setting new status to {}", current);
            self.reporter.report_current_state(current);
            reported.current = current;
        }
        if let Some(target) = transition.target {
            debug!("Setting new target to {}", target);
            self.reporter.report_target_state(target);
            reported.target = target;
        }
        reported.current
    }

    /// Mirror a snapshot of zones and report what changed.
    pub async fn update_zones(&self, zones: &[Zone]) {
        let mut mirror = self.mirror.lock().await;
        for zone in zones {
            let change = mirror.update(zone);
            if change.rising_edge {
                self.metrics.occupancy_triggered(&zone.description);
            }
            if let Some(occupied) = change.occupancy {
                debug!("Zone {} ({}) open={}", zone.index, zone.description, occupied);
                self.reporter
                    .report_zone_occupancy(zone.index, &zone.description, occupied);
            }
            if let Some(bypassed) = change.bypass {
                debug!("Zone {} ({}) excluded={}", zone.index, zone.description, bypassed);
                self.reporter
                    .report_zone_bypass(zone.index, &zone.description, bypassed);
            }
        }
    }

    /// One area poll cycle.
    pub async fn poll_alarm(&self) -> Result<CurrentState> {
        let areas = self.check_alarm().await?;
        Ok(self.update(&areas).await)
    }

    /// One zone poll cycle.
    pub async fn poll_sensors(&self) -> Result<()> {
        let zones = self.fetch_zones().await?;
        self.update_zones(&zones).await;
        Ok(())
    }

    /// Drive the panel towards the operator's requested state.
    ///
    /// Returns the area indices armed (or disarmed). Errors are returned to
    /// the caller so the operator sees the failure. Targets outside
    /// [`valid_target_states`](Self::valid_target_states) are refused with
    /// `InvalidTarget` before any panel call, so an empty home or night
    /// group never reaches the "arm everything" fallback of [`arm_for`].
    pub async fn set_target_state(&self, target: TargetState) -> Result<Vec<u32>> {
        if !self.valid_target_states().contains(&target) {
            return Err(BridgeError::InvalidTarget {
                target: target.to_string(),
            });
        }

        let indices = self
            .session
            .with_session("setting target state", |token| async move {
                match target {
                    TargetState::Disarm => {
                        info!("Disarming system");
                        self.client.disarm(&token, ALL_AREAS).await?;
                        Ok(vec![ALL_AREAS])
                    }
                    _ => {
                        info!("Arm system: {}", target);
                        arm_for(self.client.as_ref(), &token, target, &self.mapping).await
                    }
                }
            })
            .await?;

        self.reported.lock().await.target = target;
        Ok(indices)
    }

    /// Set a HomeKit `SecuritySystemTargetState` value.
    pub async fn set_target_value(&self, value: u8) -> Result<Vec<u32>> {
        let target = TargetState::from_hap_value(value).ok_or_else(|| BridgeError::InvalidTarget {
            target: format!("value {value}"),
        })?;
        self.set_target_state(target).await
    }

    /// Put a zone back into arming.
    pub async fn include_zone(&self, index: u32) -> Result<()> {
        info!("Including zone {}", index);
        self.session
            .with_session("including zone", |token| async move {
                self.client.include_zone(&token, index).await
            })
            .await
    }

    /// Bypass a zone from arming.
    pub async fn exclude_zone(&self, index: u32) -> Result<()> {
        info!("Excluding zone {}", index);
        self.session
            .with_session("excluding zone", |token| async move {
                self.client.exclude_zone(&token, index).await
            })
            .await
    }

    pub async fn set_zone_bypass(&self, index: u32, bypassed: bool) -> Result<()> {
        if bypassed {
            self.exclude_zone(index).await
        } else {
            self.include_zone(index).await
        }
    }

    /// Start the area poll, the zone poll (when sensors are mirrored) and
    /// their watchdog.
    pub fn start_polling(self: &Arc<Self>) -> PollHandle {
        let mut driver = PollDriver::new(self.poll_settings, self.clock.clone(), self.metrics.clone())
            .task(Arc::new(AlarmPoll(self.clone())), Duration::ZERO);
        if self.map_sensors {
            driver = driver.task(Arc::new(SensorPoll(self.clone())), self.zone_poll_stagger);
        }
        info!("Starting polling of {}", self.name);
        driver.start()
    }
}

/// Builder for VedoAlarm.
pub struct VedoAlarmBuilder {
    config: BridgeConfig,
    client: Arc<dyn AlarmClient>,
    reporter: Option<Arc<dyn AccessoryReporter>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl VedoAlarmBuilder {
    pub fn reporter(mut self, reporter: Arc<dyn AccessoryReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and assemble the alarm.
    pub fn build(self) -> Result<VedoAlarm> {
        self.config.validate()?;
        let config = self.config;
        let clock = self.clock.unwrap_or_else(|| Arc::new(TokioClock));
        let mapping = config.mapping();
        debug!("Mapping areas set to {:?}", mapping);

        Ok(VedoAlarm {
            name: format!("VEDO Alarm @ {}", config.alarm.address),
            session: SessionManager::new(
                self.client.clone(),
                config.alarm.code.clone(),
                config.login_timeout(),
                clock.clone(),
            ),
            client: self.client,
            mapping,
            reporter: self
                .reporter
                .unwrap_or_else(|| Arc::new(crate::event::EventReporter::default())),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(BridgeMetrics::new())),
            clock,
            poll_settings: PollSettings::new(config.update_interval(), config.watchdog_interval()),
            zone_poll_stagger: config.zone_poll_stagger(),
            map_sensors: config.alarm.map_sensors,
            area_descs: Mutex::new(None),
            zone_descs: Mutex::new(None),
            reported: Mutex::new(ReportedState::default()),
            mirror: Mutex::new(ZoneMirror::new()),
        })
    }
}

struct AlarmPoll(Arc<VedoAlarm>);

#[async_trait]
impl PollTask for AlarmPoll {
    fn name(&self) -> &'static str {
        ALARM_TASK
    }

    async fn run_once(&self) -> Result<()> {
        self.0.poll_alarm().await.map(|_| ())
    }
}

struct SensorPoll(Arc<VedoAlarm>);

#[async_trait]
impl PollTask for SensorPoll {
    fn name(&self) -> &'static str {
        SENSORS_TASK
    }

    async fn run_once(&self) -> Result<()> {
        self.0.poll_sensors().await
    }
}
