// MIT License - Copyright (c) 2026 Peter Wright
// Alarm areas as reported by the panel

/// Normalize an area name for case-insensitive comparison.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Static description of an area, fetched once and memoized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaDesc {
    pub index: u32,
    pub description: String,
}

/// A single alarm area with its live status.
///
/// Areas are supplied as a full snapshot on every poll; the bridge never
/// keeps them between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub index: u32,
    pub description: String,
    pub armed: bool,
    pub triggered: bool,
    pub sabotaged: bool,
    /// Panel code of the arming profile the area was armed with, if any.
    pub shortcut: Option<u32>,
}

impl Area {
    pub fn new(index: u32, description: impl Into<String>) -> Self {
        Self {
            index,
            description: description.into(),
            armed: false,
            triggered: false,
            sabotaged: false,
            shortcut: None,
        }
    }

    pub fn armed(mut self, shortcut: Option<u32>) -> Self {
        self.armed = true;
        self.shortcut = shortcut;
        self
    }

    pub fn triggered(mut self) -> Self {
        self.triggered = true;
        self
    }

    pub fn sabotaged(mut self) -> Self {
        self.sabotaged = true;
        self
    }

    /// Lowercase description used as the identity key.
    pub fn key(&self) -> String {
        normalize_name(&self.description)
    }

    /// Triggered or sabotaged.
    pub fn is_alerting(&self) -> bool {
        self.triggered || self.sabotaged
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.key() == normalize_name(name)
    }
}

impl From<&Area> for AreaDesc {
    fn from(area: &Area) -> Self {
        Self {
            index: area.index,
            description: area.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Front Door "), "front door");
        assert_eq!(normalize_name("GARAGE"), "garage");
    }

    #[test]
    fn test_area_flags() {
        let area = Area::new(0, "Front");
        assert!(!area.armed);
        assert!(!area.is_alerting());

        let area = Area::new(1, "Back").armed(Some(2)).sabotaged();
        assert!(area.armed);
        assert_eq!(area.shortcut, Some(2));
        assert!(area.is_alerting());
    }

    #[test]
    fn test_area_name_matching() {
        let area = Area::new(3, "Living Room");
        assert_eq!(area.key(), "living room");
        assert!(area.matches_name(" LIVING room"));
        assert!(!area.matches_name("living"));
    }
}
