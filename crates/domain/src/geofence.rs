//! Geofence status: a device's per-region membership and the presence
//! signal derived from it.
//!
//! The aggregation is pure: it reads the map it is given and never touches
//! storage. A region missing from the map counts as "not entered".

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::region::GeofenceRegion;

/// Per-region "currently inside" flags reported by a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeofenceStatus(BTreeMap<GeofenceRegion, bool>);

impl GeofenceStatus {
    /// Map with every known region set to `false`.
    #[must_use]
    pub fn all_clear() -> Self {
        Self(GeofenceRegion::ALL.into_iter().map(|r| (r, false)).collect())
    }

    /// Whether the device reports being inside `region`.
    #[must_use]
    pub fn is_inside(&self, region: GeofenceRegion) -> bool {
        self.0.get(&region).copied().unwrap_or(false)
    }

    /// Set a single region flag.
    pub fn set(&mut self, region: GeofenceRegion, inside: bool) {
        self.0.insert(region, inside);
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, region: GeofenceRegion, inside: bool) -> Self {
        self.set(region, inside);
        self
    }

    /// Add `false` for every known region that has no entry yet.
    ///
    /// Returns `true` when at least one region was added.
    pub fn initialize_missing(&mut self) -> bool {
        let mut changed = false;
        for region in GeofenceRegion::ALL {
            if let std::collections::btree_map::Entry::Vacant(slot) = self.0.entry(region) {
                slot.insert(false);
                changed = true;
            }
        }
        changed
    }

    /// Overlay `updates` onto this map.
    pub fn merge(&mut self, updates: &Self) {
        for (region, inside) in &updates.0 {
            self.0.insert(*region, *inside);
        }
    }

    /// Whether every known region has an entry.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        GeofenceRegion::ALL.iter().all(|r| self.0.contains_key(r))
    }

    /// Regions currently entered, in display order.
    #[must_use]
    pub fn entered(&self) -> Vec<GeofenceRegion> {
        GeofenceRegion::ALL
            .into_iter()
            .filter(|r| self.is_inside(*r))
            .collect()
    }

    /// Aggregate over the full known region set.
    #[must_use]
    pub fn presence(&self) -> GeofencePresence {
        GeofencePresence::evaluate(&GeofenceRegion::ALL, self)
    }

    /// Build a map from raw `identifier → inside` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownRegion`] for identifiers outside the
    /// known set.
    pub fn from_raw<'a>(
        raw: impl IntoIterator<Item = (&'a str, bool)>,
    ) -> Result<Self, ValidationError> {
        raw.into_iter()
            .map(|(id, inside)| GeofenceRegion::from_str(id).map(|r| (r, inside)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

impl FromIterator<(GeofenceRegion, bool)> for GeofenceStatus {
    fn from_iter<T: IntoIterator<Item = (GeofenceRegion, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The single presence signal derived from a geofence map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeofencePresence {
    /// At least one region is entered.
    pub any_entered: bool,
    /// The region set is non-empty and none of it is entered.
    pub none_entered: bool,
}

impl GeofencePresence {
    /// Reduce `status` over `regions`.
    ///
    /// For an empty region set both predicates are `false`; otherwise they
    /// are exact complements.
    #[must_use]
    pub fn evaluate(regions: &[GeofenceRegion], status: &GeofenceStatus) -> Self {
        let any_entered = regions.iter().any(|r| status.is_inside(*r));
        let none_entered = !regions.is_empty() && regions.iter().all(|r| !status.is_inside(*r));
        Self {
            any_entered,
            none_entered,
        }
    }
}

/// Language used for the geofence message shown on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLocale {
    #[default]
    En,
    Ja,
}

impl MessageLocale {
    /// Describe which regions `status` has entered.
    #[must_use]
    pub fn geofence_message(self, status: &GeofenceStatus) -> String {
        let entered = status.entered();
        match self {
            Self::En => {
                if entered.is_empty() {
                    return "Not in any tracked region.".to_string();
                }
                let places: Vec<_> = entered.iter().map(|r| r.description()).collect();
                format!("In {}.", places.join(" or "))
            }
            Self::Ja => {
                if entered.is_empty() {
                    return "どの領域にもいません。".to_string();
                }
                let places: Vec<_> = entered.iter().map(|r| r.description_ja()).collect();
                format!("{}にいます。", places.join("、もしくは"))
            }
        }
    }
}

impl FromStr for MessageLocale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "ja" => Ok(Self::Ja),
            other => Err(ValidationError::InvalidParameter {
                field: "locale",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_none_entered_when_all_clear() {
        let presence = GeofenceStatus::all_clear().presence();
        assert!(!presence.any_entered);
        assert!(presence.none_entered);
    }

    #[test]
    fn should_report_any_entered_when_one_region_is_true() {
        let status = GeofenceStatus::all_clear().with(GeofenceRegion::CampusNorth, true);
        let presence = status.presence();
        assert!(presence.any_entered);
        assert!(!presence.none_entered);
    }

    #[test]
    fn should_treat_missing_regions_as_not_entered() {
        let status = GeofenceStatus::default().with(GeofenceRegion::CampusMain, false);
        let presence = status.presence();
        assert!(presence.none_entered);
        assert!(!status.is_inside(GeofenceRegion::CampusSouth));
    }

    #[test]
    fn should_report_neither_for_empty_region_set() {
        let status = GeofenceStatus::all_clear().with(GeofenceRegion::CampusMain, true);
        let presence = GeofencePresence::evaluate(&[], &status);
        assert!(!presence.any_entered);
        assert!(!presence.none_entered);
    }

    #[test]
    fn should_keep_predicates_complementary_for_every_combination() {
        for mask in 0u8..8 {
            let status: GeofenceStatus = GeofenceRegion::ALL
                .into_iter()
                .enumerate()
                .map(|(i, r)| (r, mask & (1 << i) != 0))
                .collect();
            let presence = status.presence();
            assert_eq!(presence.any_entered, !presence.none_entered, "mask {mask}");
        }
    }

    #[test]
    fn should_initialize_only_missing_regions() {
        let mut status = GeofenceStatus::default().with(GeofenceRegion::CampusMain, true);
        assert!(status.initialize_missing());
        assert!(status.is_initialized());
        assert!(status.is_inside(GeofenceRegion::CampusMain));
        assert!(!status.is_inside(GeofenceRegion::CampusNorth));
        assert!(!status.initialize_missing());
    }

    #[test]
    fn should_overlay_updates_when_merging() {
        let mut status = GeofenceStatus::all_clear();
        status.merge(&GeofenceStatus::default().with(GeofenceRegion::CampusSouth, true));
        assert_eq!(status.entered(), vec![GeofenceRegion::CampusSouth]);
        assert!(status.is_initialized());
    }

    #[test]
    fn should_reject_unknown_raw_identifier() {
        let result = GeofenceStatus::from_raw([("region-campus-1", true), ("office", true)]);
        assert_eq!(
            result,
            Err(ValidationError::UnknownRegion("office".to_string()))
        );
    }

    #[test]
    fn should_roundtrip_through_json_object() {
        let status = GeofenceStatus::all_clear().with(GeofenceRegion::CampusMain, true);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["region-campus-1"], true);
        assert_eq!(json["region-campus-3"], false);
        let parsed: GeofenceStatus = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, status);
    }

    #[test]
    fn should_join_entered_regions_with_or() {
        let status = GeofenceStatus::all_clear()
            .with(GeofenceRegion::CampusMain, true)
            .with(GeofenceRegion::CampusSouth, true);
        assert_eq!(
            MessageLocale::En.geofence_message(&status),
            "In the main campus or the south campus."
        );
        assert_eq!(
            MessageLocale::Ja.geofence_message(&status),
            "本キャンパス、もしくは南キャンパスにいます。"
        );
    }

    #[test]
    fn should_say_not_in_any_region_when_nothing_entered() {
        let status = GeofenceStatus::all_clear();
        assert_eq!(
            MessageLocale::En.geofence_message(&status),
            "Not in any tracked region."
        );
    }
}
