// MIT License - Copyright (c) 2026 Peter Wright
// Area → security system state reconciliation

use std::collections::BTreeSet;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::client::{AlarmClient, ALL_AREAS};
use crate::devices::{normalize_name, Area};
use crate::error::{BridgeError, Result};
use crate::state::{CurrentState, TargetState};

/// Parse a configured shortcut identifier into the panel's numeric code.
///
/// `"tot"` is the total-arm profile (code 4); anything else is a one-letter
/// prefix followed by the code, e.g. `"p1"` → 1.
pub fn parse_shortcut(shortcut: &str) -> Option<u32> {
    let shortcut = shortcut.trim();
    if shortcut.eq_ignore_ascii_case("tot") {
        return Some(4);
    }
    shortcut.get(1..)?.parse().ok()
}

/// A named set of areas armed together, with an optional panel shortcut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaGroup {
    areas: BTreeSet<String>,
    shortcut: Option<String>,
}

impl AreaGroup {
    pub fn new<I, S>(areas: I, shortcut: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            areas: areas
                .into_iter()
                .map(|a| normalize_name(a.as_ref()))
                .filter(|a| !a.is_empty())
                .collect(),
            shortcut: shortcut.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Normalized (lowercase, trimmed) area names.
    pub fn areas(&self) -> &BTreeSet<String> {
        &self.areas
    }

    pub fn shortcut(&self) -> Option<&str> {
        self.shortcut.as_deref()
    }

    pub fn shortcut_code(&self) -> Option<u32> {
        self.shortcut.as_deref().and_then(parse_shortcut)
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// The armed areas are exactly this group's areas.
    pub fn matches(&self, armed: &BTreeSet<String>) -> bool {
        !self.areas.is_empty() && self.areas == *armed
    }

    /// Like [`matches`](Self::matches), and an armed area also carries this
    /// group's shortcut code.
    pub fn matches_with_shortcut(&self, armed: &BTreeSet<String>, shortcuts: &[u32]) -> bool {
        match self.shortcut_code() {
            Some(code) => shortcuts.contains(&code) && self.matches(armed),
            None => false,
        }
    }
}

/// Config-derived mapping of panel areas onto security system states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaMapping {
    pub away: AreaGroup,
    pub home: AreaGroup,
    pub night: AreaGroup,
    /// Areas that are permanently armed and never affect the reported state.
    pub always_on: BTreeSet<String>,
}

impl AreaMapping {
    pub fn new(away: AreaGroup, home: AreaGroup, night: AreaGroup) -> Self {
        Self {
            away,
            home,
            night,
            always_on: BTreeSet::new(),
        }
    }

    pub fn with_always_on<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.always_on = areas
            .into_iter()
            .map(|a| normalize_name(a.as_ref()))
            .collect();
        self
    }

    /// Area group armed for a target; `None` for [`TargetState::Disarm`].
    pub fn group(&self, target: TargetState) -> Option<&AreaGroup> {
        match target {
            TargetState::Disarm => None,
            TargetState::AwayArm => Some(&self.away),
            TargetState::StayArm => Some(&self.home),
            TargetState::NightArm => Some(&self.night),
        }
    }

    /// Targets the host may offer the operator.
    ///
    /// Night and home are only offered when their group has areas.
    pub fn valid_targets(&self) -> Vec<TargetState> {
        let mut targets = vec![TargetState::Disarm, TargetState::AwayArm];
        if !self.night.is_empty() {
            targets.push(TargetState::NightArm);
        }
        if !self.home.is_empty() {
            targets.push(TargetState::StayArm);
        }
        targets
    }

    /// Candidate groups in priority order.
    fn candidates(&self) -> [(CurrentState, &AreaGroup); 3] {
        [
            (CurrentState::AwayArm, &self.away),
            (CurrentState::StayArm, &self.home),
            (CurrentState::NightArm, &self.night),
        ]
    }
}

/// Compute the security system state for a snapshot of areas.
pub fn compute_state(areas: &[Area], mapping: &AreaMapping) -> CurrentState {
    let armed: BTreeSet<String> = areas
        .iter()
        .filter(|a| a.armed)
        .map(Area::key)
        .filter(|key| !mapping.always_on.contains(key))
        .collect();
    let shortcuts: Vec<u32> = areas
        .iter()
        .filter(|a| a.armed)
        .filter_map(|a| a.shortcut)
        .collect();

    if areas.iter().any(Area::is_alerting) {
        let alerting: Vec<&str> = areas
            .iter()
            .filter(|a| a.is_alerting())
            .map(|a| a.description.as_str())
            .collect();
        warn!("Alarm triggered in area {}", alerting.join(", "));
        return CurrentState::Triggered;
    }

    if armed.is_empty() {
        debug!("No armed areas");
        return CurrentState::Disarmed;
    }
    debug!(
        "Found {} armed areas: {} (shortcuts {:?})",
        armed.len(),
        armed.iter().cloned().collect::<Vec<_>>().join(", "),
        shortcuts
    );

    let candidates = mapping.candidates();
    let matched = candidates
        .iter()
        .find(|(_, group)| group.matches_with_shortcut(&armed, &shortcuts))
        .or_else(|| candidates.iter().find(|(_, group)| group.matches(&armed)));

    match matched {
        Some((state, _)) => *state,
        None => {
            debug!("Armed areas match no configured group, defaulting to AWAY_ARM");
            CurrentState::AwayArm
        }
    }
}

/// States most recently reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedState {
    pub current: CurrentState,
    pub target: TargetState,
}

impl Default for ReportedState {
    fn default() -> Self {
        Self {
            current: CurrentState::Disarmed,
            target: TargetState::Disarm,
        }
    }
}

/// Reports needed to bring the host in line with the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    pub current: Option<CurrentState>,
    pub target: Option<TargetState>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.target.is_none()
    }
}

/// Compare the computed state with what the host last saw.
///
/// While triggered, the target is left alone and a second `Triggered`
/// report is suppressed. Otherwise the target follows the current state so
/// that arming from a keypad shows up on the host as well.
pub fn reconcile(areas: &[Area], mapping: &AreaMapping, reported: ReportedState) -> Transition {
    let next = compute_state(areas, mapping);
    let current = (next != reported.current).then_some(next);
    let target = next.target().filter(|t| *t != reported.target);
    Transition { current, target }
}

/// Panel indices of the group's areas present in a live snapshot.
///
/// Names are compared case-insensitively; names the panel does not know are
/// dropped.
pub fn resolve_area_indices(group: &AreaGroup, snapshot: &[Area]) -> Vec<u32> {
    group
        .areas()
        .iter()
        .filter_map(|name| snapshot.iter().find(|a| a.matches_name(name)))
        .map(|a| a.index)
        .collect()
}

/// Arm the areas configured for `target` and return the indices armed.
///
/// Each resolved area is armed exclusively with the group's shortcut, all
/// calls concurrently. When the group is empty or none of its names exist on
/// the panel, the whole panel is armed through [`ALL_AREAS`].
pub async fn arm_for(
    client: &dyn AlarmClient,
    token: &str,
    target: TargetState,
    mapping: &AreaMapping,
) -> Result<Vec<u32>> {
    let group = mapping.group(target).ok_or_else(|| BridgeError::InvalidTarget {
        target: target.to_string(),
    })?;

    if !group.is_empty() {
        let snapshot = client.find_active_areas(token, None).await?;
        let indices = resolve_area_indices(group, &snapshot);
        if !indices.is_empty() {
            let names: Vec<&str> = group.areas().iter().map(String::as_str).collect();
            info!("Arming areas {} ({:?})", names.join(", "), indices);
            let shortcut = group.shortcut();
            let results = join_all(
                indices
                    .iter()
                    .map(|&index| client.arm(token, index, true, shortcut)),
            )
            .await;
            results.into_iter().collect::<Result<Vec<()>>>()?;
            return Ok(indices);
        }
        warn!("None of the configured areas exist on the panel, arming all areas");
    }

    info!("Arming system: ALL SYSTEM");
    client.arm(token, ALL_AREAS, false, None).await?;
    Ok(vec![ALL_AREAS])
}
