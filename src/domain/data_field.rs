// DataField catalog - the fixed set of ride metrics a layout can show
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataFieldCategory {
    General,
    HeartRate,
    Power,
    Speed,
    Cadence,
    Climbing,
    Distance,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IconSize {
    #[default]
    Small,
    Large,
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DataField {
    pub id: u32,
    pub name: &'static str,
    pub unit: &'static str,
    pub category: DataFieldCategory,
    /// Opaque handle into the live metrics source, forwarded untouched.
    pub stream_key: &'static str,
    pub icon_small: Option<&'static str>,
    pub icon_large: Option<&'static str>,
}

impl DataField {
    pub fn has_icon(&self) -> bool {
        self.icon_small.is_some() || self.icon_large.is_some()
    }
}

const fn field(
    id: u32,
    name: &'static str,
    unit: &'static str,
    category: DataFieldCategory,
    stream_key: &'static str,
    icon: Option<(&'static str, &'static str)>,
) -> DataField {
    let (icon_small, icon_large) = match icon {
        Some((small, large)) => (Some(small), Some(large)),
        None => (None, None),
    };
    DataField {
        id,
        name,
        unit,
        category,
        stream_key,
        icon_small,
        icon_large,
    }
}

use DataFieldCategory::*;

pub static SPEED: DataField = field(
    1,
    "Speed",
    "km/h",
    Speed,
    "TYPE_SPEED_ID",
    Some(("ic_speed_s", "ic_speed_l")),
);
pub static AVERAGE_SPEED: DataField = field(
    2,
    "Avg Speed",
    "km/h",
    Speed,
    "TYPE_AVERAGE_SPEED_ID",
    Some(("ic_speed_s", "ic_speed_l")),
);
pub static MAX_SPEED: DataField = field(3, "Max Speed", "km/h", Speed, "TYPE_MAX_SPEED_ID", None);
pub static HEART_RATE: DataField = field(
    10,
    "Heart Rate",
    "bpm",
    HeartRate,
    "TYPE_HEART_RATE_ID",
    Some(("ic_hr_s", "ic_hr_l")),
);
pub static AVERAGE_HEART_RATE: DataField = field(
    11,
    "Avg HR",
    "bpm",
    HeartRate,
    "TYPE_AVERAGE_HR_ID",
    Some(("ic_hr_s", "ic_hr_l")),
);
pub static HR_ZONE: DataField = field(12, "HR Zone", "", HeartRate, "TYPE_HR_ZONE_ID", None);
pub static POWER: DataField = field(
    20,
    "Power",
    "W",
    Power,
    "TYPE_POWER_ID",
    Some(("ic_power_s", "ic_power_l")),
);
pub static POWER_3S: DataField = field(
    21,
    "3s Power",
    "W",
    Power,
    "TYPE_SMOOTHED_3S_AVERAGE_POWER_ID",
    Some(("ic_power_s", "ic_power_l")),
);
pub static AVERAGE_POWER: DataField = field(
    22,
    "Avg Power",
    "W",
    Power,
    "TYPE_AVERAGE_POWER_ID",
    None,
);
pub static NORMALIZED_POWER: DataField = field(
    23,
    "NP",
    "W",
    Power,
    "TYPE_NORMALIZED_POWER_ID",
    None,
);
pub static POWER_ZONE: DataField = field(24, "Power Zone", "", Power, "TYPE_POWER_ZONE_ID", None);
pub static CADENCE: DataField = field(
    30,
    "Cadence",
    "rpm",
    Cadence,
    "TYPE_CADENCE_ID",
    Some(("ic_cadence_s", "ic_cadence_l")),
);
pub static AVERAGE_CADENCE: DataField = field(
    31,
    "Avg Cadence",
    "rpm",
    Cadence,
    "TYPE_AVERAGE_CADENCE_ID",
    None,
);
pub static ELEVATION: DataField = field(
    40,
    "Elevation",
    "m",
    Climbing,
    "TYPE_ELEVATION_ID",
    Some(("ic_elevation_s", "ic_elevation_l")),
);
pub static GRADE: DataField = field(
    41,
    "Grade",
    "%",
    Climbing,
    "TYPE_ELEVATION_GRADE_ID",
    Some(("ic_grade_s", "ic_grade_l")),
);
pub static ELEVATION_GAIN: DataField = field(
    42,
    "Climbed",
    "m",
    Climbing,
    "TYPE_ELEVATION_GAIN_ID",
    None,
);
pub static DISTANCE: DataField = field(
    50,
    "Distance",
    "km",
    Distance,
    "TYPE_DISTANCE_ID",
    Some(("ic_distance_s", "ic_distance_l")),
);
pub static DISTANCE_TO_DESTINATION: DataField = field(
    51,
    "To Dest",
    "km",
    Distance,
    "TYPE_DISTANCE_TO_DESTINATION_ID",
    None,
);
pub static ELAPSED_TIME: DataField = field(
    60,
    "Elapsed",
    "",
    Time,
    "TYPE_ELAPSED_TIME_ID",
    Some(("ic_time_s", "ic_time_l")),
);
pub static RIDE_TIME: DataField = field(61, "Ride Time", "", Time, "TYPE_RIDE_TIME_ID", None);
pub static TIME_OF_DAY: DataField = field(62, "Clock", "", Time, "TYPE_TIME_OF_DAY_ID", None);
pub static TEMPERATURE: DataField = field(70, "Temp", "°C", General, "TYPE_TEMPERATURE_ID", None);
pub static BATTERY: DataField = field(71, "Battery", "%", General, "TYPE_BATTERY_PERCENT_ID", None);

static CATALOG: [&DataField; 23] = [
    &SPEED,
    &AVERAGE_SPEED,
    &MAX_SPEED,
    &HEART_RATE,
    &AVERAGE_HEART_RATE,
    &HR_ZONE,
    &POWER,
    &POWER_3S,
    &AVERAGE_POWER,
    &NORMALIZED_POWER,
    &POWER_ZONE,
    &CADENCE,
    &AVERAGE_CADENCE,
    &ELEVATION,
    &GRADE,
    &ELEVATION_GAIN,
    &DISTANCE,
    &DISTANCE_TO_DESTINATION,
    &ELAPSED_TIME,
    &RIDE_TIME,
    &TIME_OF_DAY,
    &TEMPERATURE,
    &BATTERY,
];

/// Every catalog entry in display order.
pub fn all() -> &'static [&'static DataField] {
    &CATALOG
}

pub fn get_by_id(id: u32) -> Option<&'static DataField> {
    CATALOG.iter().copied().find(|f| f.id == id)
}

pub fn get_by_category(category: DataFieldCategory) -> Vec<&'static DataField> {
    CATALOG
        .iter()
        .copied()
        .filter(|f| f.category == category)
        .collect()
}

/// Icon reference of the requested size. Sizes never substitute for each other.
pub fn icon_for(field: &DataField, size: IconSize) -> Option<&'static str> {
    match size {
        IconSize::Small => field.icon_small,
        IconSize::Large => field.icon_large,
    }
}
