// MIT License - Copyright (c) 2026 Peter Wright
// Panel devices

pub mod area;
pub mod zone;

pub use area::{normalize_name, Area, AreaDesc};
pub use zone::{Zone, ZoneDesc};
