// MIT License - Copyright (c) 2026 Peter Wright
// Alarm client seam

use async_trait::async_trait;

use crate::devices::{Area, AreaDesc, Zone, ZoneDesc};
use crate::error::Result;

/// Area index the panel reserves for "every area".
pub const ALL_AREAS: u32 = 32;

/// Operations offered by the client that speaks the VEDO panel protocol.
///
/// The bridge never talks to the panel directly: every call goes through
/// an implementation of this trait, guarded by a session token obtained
/// from [`login`](AlarmClient::login). Implementations are expected to
/// apply their own retry policy inside `login` and to report a failed
/// login as [`BridgeError::Auth`](crate::BridgeError::Auth).
#[async_trait]
pub trait AlarmClient: Send + Sync {
    async fn login(&self, code: &str) -> Result<String>;

    async fn logout(&self, token: &str) -> Result<()>;

    async fn area_descriptions(&self, token: &str) -> Result<Vec<AreaDesc>>;

    async fn zone_descriptions(&self, token: &str) -> Result<Vec<ZoneDesc>>;

    /// Current status of the given areas, or of every area when `None`.
    async fn find_active_areas(
        &self,
        token: &str,
        areas: Option<&[AreaDesc]>,
    ) -> Result<Vec<Area>>;

    /// Current status of the given zones, or of every zone when `None`.
    async fn zone_status(&self, token: &str, zones: Option<&[ZoneDesc]>) -> Result<Vec<Zone>>;

    /// Arm one area, or the whole panel with [`ALL_AREAS`].
    async fn arm(
        &self,
        token: &str,
        area: u32,
        exclusive: bool,
        shortcut: Option<&str>,
    ) -> Result<()>;

    async fn disarm(&self, token: &str, area: u32) -> Result<()>;

    async fn include_zone(&self, token: &str, index: u32) -> Result<()>;

    async fn exclude_zone(&self, token: &str, index: u32) -> Result<()>;
}
