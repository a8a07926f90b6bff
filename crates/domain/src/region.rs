//! Geofence regions: the fixed set of sites the mobile app monitors.
//!
//! Identifiers mirror the app's region identifiers with the bundle prefix
//! stripped (the store does not allow `.` in keys).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A monitored geofence region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GeofenceRegion {
    CampusMain,
    CampusNorth,
    CampusSouth,
}

impl GeofenceRegion {
    /// Every region, in display order.
    pub const ALL: [Self; 3] = [Self::CampusMain, Self::CampusNorth, Self::CampusSouth];

    /// Key used in storage and on the wire.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::CampusMain => "region-campus-1",
            Self::CampusNorth => "region-campus-2",
            Self::CampusSouth => "region-campus-3",
        }
    }

    /// English description used in geofence messages.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::CampusMain => "the main campus",
            Self::CampusNorth => "the north campus",
            Self::CampusSouth => "the south campus",
        }
    }

    /// Japanese description used in geofence messages.
    #[must_use]
    pub fn description_ja(self) -> &'static str {
        match self {
            Self::CampusMain => "本キャンパス",
            Self::CampusNorth => "北キャンパス",
            Self::CampusSouth => "南キャンパス",
        }
    }
}

impl fmt::Display for GeofenceRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GeofenceRegion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|region| region.id() == s)
            .ok_or_else(|| ValidationError::UnknownRegion(s.to_owned()))
    }
}

impl TryFrom<String> for GeofenceRegion {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GeofenceRegion> for String {
    fn from(region: GeofenceRegion) -> Self {
        region.id().to_owned()
    }
}
