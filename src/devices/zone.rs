// MIT License - Copyright (c) 2026 Peter Wright
// Physical zones (sensors)

/// Static description of a zone, fetched once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDesc {
    pub index: u32,
    pub description: String,
}

/// A single physical sensor with its live status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub index: u32,
    pub description: String,
    pub open: bool,
    /// Bypassed from arming.
    pub excluded: bool,
}

impl Zone {
    pub fn new(index: u32, description: impl Into<String>) -> Self {
        Self {
            index,
            description: description.into(),
            open: false,
            excluded: false,
        }
    }

    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub fn with_excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }
}

impl From<&Zone> for ZoneDesc {
    fn from(zone: &Zone) -> Self {
        Self {
            index: zone.index,
            description: zone.description.clone(),
        }
    }
}
