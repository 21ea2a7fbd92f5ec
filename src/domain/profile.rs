// Profile domain model - a named collection of screens
use super::data_field::{
    CADENCE, DataField, DISTANCE, ELAPSED_TIME, ELEVATION, ELEVATION_GAIN, GRADE, HEART_RATE,
    POWER, POWER_3S, SPEED,
};
use super::layout::{
    LayoutDataField, LayoutError, LayoutScreen, THREE_STACKED_TEMPLATE_ID, TWO_STACKED_TEMPLATE_ID,
    Visualization,
};
use super::visualization::{Gauge, Orientation, ProgressBar, Zone, ZonedProgressBar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_PROFILE_ID: &str = "default";
pub const DEFAULT_PROFILE_NAME: &str = "Default";

#[derive(Debug, Clone, PartialEq)]
pub struct DataFieldProfile {
    id: String,
    name: String,
    screens: Vec<LayoutScreen>,
    is_default: bool,
    is_read_only: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

fn check_screens(screens: &[LayoutScreen]) -> Result<(), LayoutError> {
    if screens.is_empty() {
        return Err(LayoutError::NoScreens);
    }
    let mut ids = HashSet::new();
    for screen in screens {
        if !ids.insert(screen.id()) {
            return Err(LayoutError::DuplicateScreenId(screen.id()));
        }
    }
    Ok(())
}

impl DataFieldProfile {
    /// A user-owned, editable profile.
    pub fn new_user(
        id: impl Into<String>,
        name: impl Into<String>,
        screens: Vec<LayoutScreen>,
        now: DateTime<Utc>,
    ) -> Result<Self, LayoutError> {
        check_screens(&screens)?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            screens,
            is_default: false,
            is_read_only: false,
            created_at: now,
            modified_at: now,
        })
    }

    /// Rebuild a stored profile. Stores never hold the default profile, so
    /// the flag cannot be restored here.
    pub(crate) fn restore(
        id: String,
        name: String,
        screens: Vec<LayoutScreen>,
        is_read_only: bool,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Result<Self, LayoutError> {
        check_screens(&screens)?;
        Ok(Self {
            id,
            name,
            screens,
            is_default: false,
            is_read_only,
            created_at,
            modified_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn screens(&self) -> &[LayoutScreen] {
        &self.screens
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn screen(&self, screen_id: u32) -> Option<&LayoutScreen> {
        self.screens.iter().find(|s| s.id() == screen_id)
    }

    /// One past the highest screen id; `None` once ids are exhausted.
    pub fn next_screen_id(&self) -> Option<u32> {
        match self.screens.iter().map(LayoutScreen::id).max() {
            Some(id) => id.checked_add(1),
            None => Some(1),
        }
    }

    /// Apply `update` to one screen; every other screen is carried over as is.
    pub fn with_screen<F>(&self, screen_id: u32, update: F) -> Option<Self>
    where
        F: FnOnce(&LayoutScreen) -> LayoutScreen,
    {
        let index = self.screens.iter().position(|s| s.id() == screen_id)?;
        let mut screens = self.screens.clone();
        screens[index] = update(&self.screens[index]);
        Some(Self {
            screens,
            modified_at: Utc::now(),
            ..self.clone()
        })
    }

    pub fn with_screens(&self, screens: Vec<LayoutScreen>) -> Result<Self, LayoutError> {
        check_screens(&screens)?;
        Ok(Self {
            screens,
            modified_at: Utc::now(),
            ..self.clone()
        })
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modified_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Editable copy under a new identity. Screens are deep copies.
    pub fn duplicate_as(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            screens: self.screens.clone(),
            is_default: false,
            is_read_only: false,
            created_at: now,
            modified_at: now,
        }
    }

    pub(crate) fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            modified_at: now,
            ..self.clone()
        }
    }
}

/// Built fresh whenever the profile list is assembled; never persisted.
pub fn default_profile() -> Result<DataFieldProfile, LayoutError> {
    let now = Utc::now();
    Ok(DataFieldProfile {
        id: DEFAULT_PROFILE_ID.to_string(),
        name: DEFAULT_PROFILE_NAME.to_string(),
        screens: starter_screens(StarterTemplate::Default)?,
        is_default: true,
        is_read_only: true,
        created_at: now,
        modified_at: now,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StarterTemplate {
    #[default]
    Default,
    HeartRate,
    Power,
    Climbing,
}

fn gauge_field(
    data_field: &'static DataField,
    zone_id: &str,
    max_value: f64,
) -> Result<LayoutDataField, LayoutError> {
    let gauge = Gauge::new(data_field, 120, 60, 56, 44, 10, 6, true, 0.0, max_value)?;
    Ok(LayoutDataField::text(data_field, zone_id).with_visualization(Visualization::Gauge(gauge)))
}

fn bar_field(
    data_field: &'static DataField,
    zone_id: &str,
    min_value: f64,
    max_value: f64,
) -> Result<LayoutDataField, LayoutError> {
    let bar = ProgressBar::new(
        data_field,
        30,
        100,
        244,
        16,
        Orientation::Horizontal,
        min_value,
        max_value,
        true,
    )?;
    Ok(LayoutDataField::text(data_field, zone_id).with_visualization(Visualization::Bar(bar)))
}

fn heart_rate_zones_field(zone_id: &str) -> Result<LayoutDataField, LayoutError> {
    let bar = ProgressBar::new(
        &HEART_RATE,
        30,
        180,
        244,
        16,
        Orientation::Horizontal,
        40.0,
        200.0,
        false,
    )?;
    let bounds = [40.0, 114.0, 133.0, 152.0, 171.0, 200.0];
    let colors = [6, 8, 10, 12, 15];
    let zones = bounds
        .windows(2)
        .zip(colors)
        .enumerate()
        .map(|(i, (w, color))| Zone::new(format!("Z{}", i + 1), w[0], w[1], color))
        .collect::<Result<Vec<_>, _>>()?;
    let zoned = ZonedProgressBar::new(bar, zones)?;
    Ok(LayoutDataField::text(&HEART_RATE, zone_id)
        .with_visualization(Visualization::ZonedBar(zoned)))
}

/// Screens a new profile starts from.
pub fn starter_screens(template: StarterTemplate) -> Result<Vec<LayoutScreen>, LayoutError> {
    let screens = match template {
        StarterTemplate::Default => vec![
            LayoutScreen::new(
                1,
                "Ride",
                THREE_STACKED_TEMPLATE_ID,
                vec![
                    LayoutDataField::text(&SPEED, "top"),
                    LayoutDataField::text(&POWER, "middle"),
                    LayoutDataField::text(&HEART_RATE, "bottom"),
                ],
            )?,
            LayoutScreen::new(
                2,
                "Trip",
                TWO_STACKED_TEMPLATE_ID,
                vec![
                    LayoutDataField::text(&DISTANCE, "top"),
                    LayoutDataField::text(&ELAPSED_TIME, "bottom"),
                ],
            )?,
        ],
        StarterTemplate::HeartRate => vec![LayoutScreen::new(
            1,
            "Heart Rate",
            THREE_STACKED_TEMPLATE_ID,
            vec![
                LayoutDataField::text(&HEART_RATE, "top"),
                LayoutDataField::text(&SPEED, "middle"),
                heart_rate_zones_field("bottom")?,
            ],
        )?],
        StarterTemplate::Power => vec![LayoutScreen::new(
            1,
            "Power",
            THREE_STACKED_TEMPLATE_ID,
            vec![
                gauge_field(&POWER_3S, "top", 400.0)?,
                bar_field(&POWER, "middle", 0.0, 400.0)?,
                LayoutDataField::text(&CADENCE, "bottom"),
            ],
        )?],
        StarterTemplate::Climbing => vec![LayoutScreen::new(
            1,
            "Climb",
            THREE_STACKED_TEMPLATE_ID,
            vec![
                bar_field(&GRADE, "top", -5.0, 20.0)?,
                LayoutDataField::text(&ELEVATION, "middle"),
                LayoutDataField::text(&ELEVATION_GAIN, "bottom"),
            ],
        )?],
    };
    Ok(screens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_profile() -> DataFieldProfile {
        DataFieldProfile::new_user(
            "p1",
            "Mine",
            starter_screens(StarterTemplate::Default).unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_profile_is_read_only() {
        let profile = default_profile().unwrap();
        assert_eq!(profile.id(), DEFAULT_PROFILE_ID);
        assert!(profile.is_default());
        assert!(profile.is_read_only());
        assert!(!profile.screens().is_empty());
    }

    #[test]
    fn test_every_starter_template_builds() {
        for template in [
            StarterTemplate::Default,
            StarterTemplate::HeartRate,
            StarterTemplate::Power,
            StarterTemplate::Climbing,
        ] {
            assert!(starter_screens(template).is_ok(), "{template:?}");
        }
    }

    #[test]
    fn test_profile_requires_unique_screens() {
        assert_eq!(
            DataFieldProfile::new_user("p", "P", vec![], Utc::now()).unwrap_err(),
            LayoutError::NoScreens
        );
        let screen = LayoutScreen::new(1, "A", THREE_STACKED_TEMPLATE_ID, vec![]).unwrap();
        assert_eq!(
            DataFieldProfile::new_user("p", "P", vec![screen.clone(), screen], Utc::now())
                .unwrap_err(),
            LayoutError::DuplicateScreenId(1)
        );
    }

    #[test]
    fn test_with_screen_only_touches_target() {
        let profile = user_profile();
        let updated = profile.with_screen(2, |s| s.renamed("Renamed")).unwrap();
        assert_eq!(updated.screen(2).unwrap().name(), "Renamed");
        assert_eq!(updated.screen(1), profile.screen(1));
        assert_eq!(profile.screen(2).unwrap().name(), "Trip");
        assert!(updated.modified_at() >= profile.modified_at());
        assert!(profile.with_screen(9, |s| s.clone()).is_none());
    }

    #[test]
    fn test_next_screen_id() {
        assert_eq!(user_profile().next_screen_id(), Some(3));

        let last = LayoutScreen::new(u32::MAX, "Last", THREE_STACKED_TEMPLATE_ID, vec![]).unwrap();
        let exhausted = user_profile().with_screens(vec![last]).unwrap();
        assert_eq!(exhausted.next_screen_id(), None);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let source = default_profile().unwrap();
        let copy = source.duplicate_as("copy", "Copy", Utc::now());
        assert!(!copy.is_default() && !copy.is_read_only());
        assert_eq!(copy.screens(), source.screens());

        let edited = copy.with_screen(1, |s| s.without_field("top").unwrap()).unwrap();
        assert_eq!(edited.screen(1).unwrap().field_count(), 2);
        assert_eq!(source.screen(1).unwrap().field_count(), 3);
    }
}
