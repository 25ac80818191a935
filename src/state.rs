// MIT License - Copyright (c) 2026 Peter Wright
// Security system states

use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// State requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    Disarm,
    AwayArm,
    /// Home / stay arm
    StayArm,
    NightArm,
}

/// State of the panel as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentState {
    Disarmed,
    AwayArm,
    StayArm,
    NightArm,
    /// An area is triggered or sabotaged. Takes precedence over any arm state.
    Triggered,
}

impl TargetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarm => "DISARM",
            Self::AwayArm => "AWAY_ARM",
            Self::StayArm => "STAY_ARM",
            Self::NightArm => "NIGHT_ARM",
        }
    }

    /// HomeKit `SecuritySystemTargetState` value.
    pub fn hap_value(&self) -> u8 {
        match self {
            Self::StayArm => 0,
            Self::AwayArm => 1,
            Self::NightArm => 2,
            Self::Disarm => 3,
        }
    }

    pub fn from_hap_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::StayArm),
            1 => Some(Self::AwayArm),
            2 => Some(Self::NightArm),
            3 => Some(Self::Disarm),
            _ => None,
        }
    }
}

impl CurrentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "DISARMED",
            Self::AwayArm => "AWAY_ARM",
            Self::StayArm => "STAY_ARM",
            Self::NightArm => "NIGHT_ARM",
            Self::Triggered => "ALARM_TRIGGERED",
        }
    }

    /// HomeKit `SecuritySystemCurrentState` value.
    pub fn hap_value(&self) -> u8 {
        match self {
            Self::StayArm => 0,
            Self::AwayArm => 1,
            Self::NightArm => 2,
            Self::Disarmed => 3,
            Self::Triggered => 4,
        }
    }

    /// The target state that corresponds to this state, if any.
    pub fn target(&self) -> Option<TargetState> {
        match self {
            Self::Disarmed => Some(TargetState::Disarm),
            Self::AwayArm => Some(TargetState::AwayArm),
            Self::StayArm => Some(TargetState::StayArm),
            Self::NightArm => Some(TargetState::NightArm),
            Self::Triggered => None,
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CurrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetState {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disarm" | "disarmed" => Ok(Self::Disarm),
            "away" | "away_arm" => Ok(Self::AwayArm),
            "home" | "stay" | "stay_arm" => Ok(Self::StayArm),
            "night" | "night_arm" => Ok(Self::NightArm),
            other => Err(BridgeError::InvalidTarget {
                target: other.to_string(),
            }),
        }
    }
}
