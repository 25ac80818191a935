// MIT License - Copyright (c) 2026 Peter Wright
// Per-zone occupancy mirror

use std::collections::HashMap;

use crate::devices::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MirroredZone {
    open: bool,
    excluded: bool,
}

/// What changed for a zone since the previous poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneChange {
    /// New occupancy value to report, if it changed.
    pub occupancy: Option<bool>,
    /// New bypass value to report, if it changed.
    pub bypass: Option<bool>,
    /// The zone went from closed to open.
    pub rising_edge: bool,
}

impl ZoneChange {
    pub fn is_empty(&self) -> bool {
        self.occupancy.is_none() && self.bypass.is_none()
    }
}

/// Last known open/excluded flags of every zone.
///
/// The first observation of a zone seeds the mirror and is reported, but
/// does not count as a rising edge.
#[derive(Debug, Default)]
pub struct ZoneMirror {
    zones: HashMap<u32, MirroredZone>,
}

impl ZoneMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, zone: &Zone) -> ZoneChange {
        let next = MirroredZone {
            open: zone.open,
            excluded: zone.excluded,
        };
        match self.zones.insert(zone.index, next) {
            None => ZoneChange {
                occupancy: Some(next.open),
                bypass: Some(next.excluded),
                rising_edge: false,
            },
            Some(prev) => ZoneChange {
                occupancy: (prev.open != next.open).then_some(next.open),
                bypass: (prev.excluded != next.excluded).then_some(next.excluded),
                rising_edge: !prev.open && next.open,
            },
        }
    }

    pub fn is_open(&self, index: u32) -> Option<bool> {
        self.zones.get(&index).map(|z| z.open)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
