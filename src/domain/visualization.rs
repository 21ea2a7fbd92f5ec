// Visualization geometry - gauges, bars and zoned bars bound to one DataField
use super::data_field::DataField;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The gauge face is split into this many clock positions.
pub const PORTION_COUNT: u8 = 16;
pub const MAX_PORTION: u8 = PORTION_COUNT - 1;
pub const MAX_COLOR: u8 = 15;

const NO_VALUE_SENTINELS: [&str; 3] = ["--", "...", "N/A"];

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid range: min {min} must be below max {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid dimension: {0}")]
    InvalidDimension(&'static str),
    #[error("invalid portion {0}, expected 0..=15")]
    InvalidPortion(u8),
    #[error("invalid color {0}, expected 0..=15")]
    InvalidColor(u8),
    #[error("zoned bar needs at least one zone")]
    EmptyZones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

fn check_range(min: f64, max: f64) -> Result<(), ValidationError> {
    // the span must be finite too, or every fraction comes out NaN
    if !min.is_finite() || !max.is_finite() || max <= min || !(max - min).is_finite() {
        return Err(ValidationError::InvalidRange { min, max });
    }
    Ok(())
}

/// Position of `value` within `[min, max]` as a fraction in `[0, 1]`.
/// NaN sits at the bottom of the range.
fn unit_fraction(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    ((value.clamp(min, max) - min) / (max - min)).clamp(0.0, 1.0)
}

fn percentage_of(value: f64, min: f64, max: f64) -> u8 {
    // round() is half-up for the non-negative values produced here
    (unit_fraction(value, min, max) * 100.0).round() as u8
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    data_field: &'static DataField,
    center_x: i32,
    center_y: i32,
    radius_outer: u32,
    radius_inner: u32,
    start_portion: u8,
    end_portion: u8,
    clockwise: bool,
    min_value: f64,
    max_value: f64,
}

impl Gauge {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data_field: &'static DataField,
        center_x: i32,
        center_y: i32,
        radius_outer: u32,
        radius_inner: u32,
        start_portion: u8,
        end_portion: u8,
        clockwise: bool,
        min_value: f64,
        max_value: f64,
    ) -> Result<Self, ValidationError> {
        if radius_inner == 0 {
            return Err(ValidationError::InvalidDimension("inner radius must be positive"));
        }
        if radius_outer <= radius_inner {
            return Err(ValidationError::InvalidDimension(
                "outer radius must exceed inner radius",
            ));
        }
        for portion in [start_portion, end_portion] {
            if portion > MAX_PORTION {
                return Err(ValidationError::InvalidPortion(portion));
            }
        }
        check_range(min_value, max_value)?;

        Ok(Self {
            data_field,
            center_x,
            center_y,
            radius_outer,
            radius_inner,
            start_portion,
            end_portion,
            clockwise,
            min_value,
            max_value,
        })
    }

    pub fn data_field(&self) -> &'static DataField {
        self.data_field
    }

    pub fn center(&self) -> (i32, i32) {
        (self.center_x, self.center_y)
    }

    pub fn radius_outer(&self) -> u32 {
        self.radius_outer
    }

    pub fn radius_inner(&self) -> u32 {
        self.radius_inner
    }

    pub fn start_portion(&self) -> u8 {
        self.start_portion
    }

    pub fn end_portion(&self) -> u8 {
        self.end_portion
    }

    pub fn clockwise(&self) -> bool {
        self.clockwise
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Same geometry, different metric.
    pub fn with_data_field(&self, data_field: &'static DataField) -> Self {
        Self {
            data_field,
            ..self.clone()
        }
    }

    pub fn percentage(&self, value: f64) -> u8 {
        percentage_of(value, self.min_value, self.max_value)
    }

    /// Number of portions the arc covers, walking from start to end in the
    /// gauge's direction. Start and end are both inclusive.
    pub fn sweep_portions(&self) -> u8 {
        let (from, to) = if self.clockwise {
            (self.start_portion, self.end_portion)
        } else {
            (self.end_portion, self.start_portion)
        };
        (i16::from(to) - i16::from(from)).rem_euclid(i16::from(PORTION_COUNT)) as u8 + 1
    }

    /// Portion the needle points at for `value`.
    pub fn portion_for(&self, value: f64) -> u8 {
        let steps = f64::from(self.sweep_portions() - 1);
        let offset = (unit_fraction(value, self.min_value, self.max_value) * steps).round() as i16;
        let start = i16::from(self.start_portion);
        let portion = if self.clockwise { start + offset } else { start - offset };
        portion.rem_euclid(i16::from(PORTION_COUNT)) as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    data_field: &'static DataField,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    orientation: Orientation,
    min_value: f64,
    max_value: f64,
    show_border: bool,
}

impl ProgressBar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data_field: &'static DataField,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        orientation: Orientation,
        min_value: f64,
        max_value: f64,
        show_border: bool,
    ) -> Result<Self, ValidationError> {
        if width == 0 {
            return Err(ValidationError::InvalidDimension("width must be positive"));
        }
        if height == 0 {
            return Err(ValidationError::InvalidDimension("height must be positive"));
        }
        let far_x = i64::from(x) + i64::from(width);
        let far_y = i64::from(y) + i64::from(height);
        if far_x > i64::from(i32::MAX) || far_y > i64::from(i32::MAX) {
            return Err(ValidationError::InvalidDimension("bar must end inside the pixel space"));
        }
        check_range(min_value, max_value)?;

        Ok(Self {
            data_field,
            x,
            y,
            width,
            height,
            orientation,
            min_value,
            max_value,
            show_border,
        })
    }

    pub fn data_field(&self) -> &'static DataField {
        self.data_field
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn show_border(&self) -> bool {
        self.show_border
    }

    pub fn with_data_field(&self, data_field: &'static DataField) -> Self {
        Self {
            data_field,
            ..self.clone()
        }
    }

    fn length(&self) -> u32 {
        match self.orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    pub fn percentage(&self, value: f64) -> u8 {
        percentage_of(value, self.min_value, self.max_value)
    }

    /// Filled length in pixels along the bar's orientation, truncated.
    pub fn fill_amount(&self, value: f64) -> u32 {
        (unit_fraction(value, self.min_value, self.max_value) * f64::from(self.length())) as u32
    }

    /// Absolute pixel coordinate of `value` along the bar. Horizontal bars
    /// grow rightwards from `x`, vertical bars grow upwards from `y + height`.
    pub fn value_to_pixel(&self, value: f64) -> i32 {
        let offset = i64::from(self.fill_amount(value));
        let pixel = match self.orientation {
            Orientation::Horizontal => i64::from(self.x) + offset,
            Orientation::Vertical => i64::from(self.y) + i64::from(self.height) - offset,
        };
        // new() keeps both bar ends inside i32
        pixel as i32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    name: String,
    min_value: f64,
    max_value: f64,
    color: u8,
}

impl Zone {
    pub fn new(
        name: impl Into<String>,
        min_value: f64,
        max_value: f64,
        color: u8,
    ) -> Result<Self, ValidationError> {
        check_range(min_value, max_value)?;
        if color > MAX_COLOR {
            return Err(ValidationError::InvalidColor(color));
        }
        Ok(Self {
            name: name.into(),
            min_value,
            max_value,
            color,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn color(&self) -> u8 {
        self.color
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZonedProgressBar {
    bar: ProgressBar,
    zones: Vec<Zone>,
}

impl ZonedProgressBar {
    /// Zones are expected to be contiguous and ascending, but only a
    /// non-empty list is enforced.
    pub fn new(bar: ProgressBar, zones: Vec<Zone>) -> Result<Self, ValidationError> {
        if zones.is_empty() {
            return Err(ValidationError::EmptyZones);
        }
        Ok(Self { bar, zones })
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn data_field(&self) -> &'static DataField {
        self.bar.data_field()
    }

    pub fn with_data_field(&self, data_field: &'static DataField) -> Self {
        Self {
            bar: self.bar.with_data_field(data_field),
            zones: self.zones.clone(),
        }
    }

    /// Zone whose `[min, max)` holds `value`; the last zone also owns its max.
    pub fn find_zone(&self, value: f64) -> Option<&Zone> {
        let last = self.zones.len() - 1;
        self.zones.iter().enumerate().find_map(|(i, zone)| {
            let below_max = if i == last {
                value <= zone.max_value
            } else {
                value < zone.max_value
            };
            (value >= zone.min_value && below_max).then_some(zone)
        })
    }

    pub fn percentage(&self, value: f64) -> u8 {
        self.bar.percentage(value)
    }

    pub fn fill_amount(&self, value: f64) -> u32 {
        self.bar.fill_amount(value)
    }

    pub fn value_to_pixel(&self, value: f64) -> i32 {
        self.bar.value_to_pixel(value)
    }

    /// Pixel span `(start, end)` the zone at `index` occupies on the bar.
    pub fn zone_span(&self, index: usize) -> Option<(i32, i32)> {
        let zone = self.zones.get(index)?;
        Some((
            self.bar.value_to_pixel(zone.min_value),
            self.bar.value_to_pixel(zone.max_value),
        ))
    }
}

/// Turn a formatted display string such as `"245W"` back into a number.
pub fn parse_display_value(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || NO_VALUE_SENTINELS.contains(&text) {
        return None;
    }
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    numeric.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::data_field::{HEART_RATE, POWER, SPEED};

    fn power_gauge() -> Gauge {
        Gauge::new(&POWER, 120, 120, 100, 80, 10, 6, true, 0.0, 400.0).unwrap()
    }

    fn power_bar() -> ProgressBar {
        ProgressBar::new(&POWER, 30, 100, 244, 20, Orientation::Horizontal, 0.0, 400.0, true)
            .unwrap()
    }

    fn hr_zoned_bar() -> ZonedProgressBar {
        let bar = ProgressBar::new(
            &HEART_RATE,
            30,
            100,
            244,
            20,
            Orientation::Horizontal,
            40.0,
            200.0,
            false,
        )
        .unwrap();
        let bounds = [40.0, 114.0, 133.0, 152.0, 171.0, 200.0];
        let zones = bounds
            .windows(2)
            .enumerate()
            .map(|(i, w)| Zone::new(format!("Z{}", i + 1), w[0], w[1], i as u8 + 3).unwrap())
            .collect();
        ZonedProgressBar::new(bar, zones).unwrap()
    }

    #[test]
    fn test_percentage_bounds_and_rounding() {
        let gauge = power_gauge();
        assert_eq!(gauge.percentage(0.0), 0);
        assert_eq!(gauge.percentage(400.0), 100);
        assert_eq!(gauge.percentage(245.0), 61);
        assert_eq!(gauge.percentage(2.0), 1);
        assert_eq!(gauge.percentage(-10.0), 0);
        assert_eq!(gauge.percentage(1000.0), 100);
        assert_eq!(gauge.percentage(f64::NAN), 0);

        let bar = power_bar();
        assert_eq!(bar.percentage(245.0), 61);
    }

    #[test]
    fn test_percentage_is_monotonic() {
        let gauge = power_gauge();
        let mut previous = 0;
        for step in -20..=420 {
            let p = gauge.percentage(f64::from(step));
            assert!(p >= previous);
            previous = p;
        }
    }

    #[test]
    fn test_fill_amount_clamps() {
        let bar = power_bar();
        assert_eq!(bar.fill_amount(0.0), 0);
        assert_eq!(bar.fill_amount(400.0), 244);
        assert_eq!(bar.fill_amount(-50.0), 0);
        assert_eq!(bar.fill_amount(500.0), 244);
        assert_eq!(bar.fill_amount(200.0), 122);
    }

    #[test]
    fn test_vertical_bar_uses_height() {
        let bar =
            ProgressBar::new(&SPEED, 10, 10, 20, 100, Orientation::Vertical, 0.0, 50.0, false)
                .unwrap();
        assert_eq!(bar.fill_amount(50.0), 100);
        assert_eq!(bar.fill_amount(25.0), 50);
        assert_eq!(bar.value_to_pixel(0.0), 110);
        assert_eq!(bar.value_to_pixel(50.0), 10);
    }

    #[test]
    fn test_find_zone() {
        let zoned = hr_zoned_bar();
        assert!(zoned.find_zone(39.9).is_none());
        assert_eq!(zoned.find_zone(40.0).map(Zone::name), Some("Z1"));
        assert_eq!(zoned.find_zone(113.9).map(Zone::name), Some("Z1"));
        assert_eq!(zoned.find_zone(114.0).map(Zone::name), Some("Z2"));
        assert_eq!(zoned.find_zone(150.0).map(Zone::name), Some("Z3"));
        assert_eq!(zoned.find_zone(171.0).map(Zone::name), Some("Z5"));
        assert_eq!(zoned.find_zone(200.0).map(Zone::name), Some("Z5"));
        assert!(zoned.find_zone(200.5).is_none());
        assert!(zoned.find_zone(f64::NAN).is_none());
    }

    #[test]
    fn test_value_to_pixel_clamps() {
        let zoned = hr_zoned_bar();
        assert_eq!(zoned.value_to_pixel(0.0), 30);
        assert_eq!(zoned.value_to_pixel(300.0), 274);
        assert_eq!(zoned.value_to_pixel(120.0), 152);
        assert_eq!(zoned.zone_span(0), Some((30, zoned.value_to_pixel(114.0))));
        assert_eq!(zoned.zone_span(4).map(|s| s.1), Some(274));
        assert!(zoned.zone_span(5).is_none());
    }

    #[test]
    fn test_construction_rejects_invalid_geometry() {
        assert_eq!(
            Gauge::new(&POWER, 0, 0, 50, 80, 0, 8, true, 0.0, 1.0).unwrap_err(),
            ValidationError::InvalidDimension("outer radius must exceed inner radius")
        );
        assert!(matches!(
            Gauge::new(&POWER, 0, 0, 80, 0, 0, 8, true, 0.0, 1.0),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert_eq!(
            Gauge::new(&POWER, 0, 0, 80, 50, 16, 8, true, 0.0, 1.0).unwrap_err(),
            ValidationError::InvalidPortion(16)
        );
        assert!(matches!(
            Gauge::new(&POWER, 0, 0, 80, 50, 0, 8, true, 10.0, 10.0),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert!(matches!(
            ProgressBar::new(&POWER, 0, 0, 0, 10, Orientation::Horizontal, 0.0, 1.0, false),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            ProgressBar::new(&POWER, 0, 0, 10, 10, Orientation::Horizontal, 5.0, 1.0, false),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert!(matches!(
            ProgressBar::new(&POWER, 0, 0, 10, 10, Orientation::Horizontal, -1e308, 1e308, false),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert!(matches!(
            Gauge::new(&POWER, 0, 0, 80, 50, 0, 8, true, f64::MIN, f64::MAX),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert_eq!(
            Zone::new("Z1", 0.0, 10.0, 16).unwrap_err(),
            ValidationError::InvalidColor(16)
        );
        assert_eq!(
            ZonedProgressBar::new(power_bar(), vec![]).unwrap_err(),
            ValidationError::EmptyZones
        );
    }

    #[test]
    fn test_bar_must_fit_pixel_space() {
        assert_eq!(
            ProgressBar::new(
                &POWER,
                i32::MAX - 10,
                0,
                100,
                10,
                Orientation::Horizontal,
                0.0,
                1.0,
                false,
            )
            .unwrap_err(),
            ValidationError::InvalidDimension("bar must end inside the pixel space")
        );
        assert!(matches!(
            ProgressBar::new(&POWER, 0, -5, 10, u32::MAX, Orientation::Vertical, 0.0, 1.0, false),
            Err(ValidationError::InvalidDimension(_))
        ));

        let edge = ProgressBar::new(
            &POWER,
            i32::MAX - 100,
            i32::MIN,
            100,
            i32::MAX as u32,
            Orientation::Horizontal,
            0.0,
            1.0,
            false,
        )
        .unwrap();
        assert_eq!(edge.value_to_pixel(1.0), i32::MAX);
        assert_eq!(edge.value_to_pixel(0.0), i32::MAX - 100);

        let tall = ProgressBar::new(
            &POWER,
            0,
            i32::MIN,
            10,
            u32::MAX,
            Orientation::Vertical,
            0.0,
            1.0,
            false,
        )
        .unwrap();
        assert_eq!(tall.value_to_pixel(0.0), i32::MAX);
        assert_eq!(tall.value_to_pixel(1.0), i32::MIN);
    }

    #[test]
    fn test_gauge_sweep_and_needle() {
        let gauge = power_gauge();
        // 10 -> 6 clockwise wraps through 15 and 0
        assert_eq!(gauge.sweep_portions(), 13);
        assert_eq!(gauge.portion_for(0.0), 10);
        assert_eq!(gauge.portion_for(400.0), 6);

        let ccw = Gauge::new(&POWER, 0, 0, 80, 50, 4, 12, false, 0.0, 100.0).unwrap();
        assert_eq!(ccw.sweep_portions(), 9);
        assert_eq!(ccw.portion_for(100.0), 12);
        assert_eq!(ccw.portion_for(50.0), 0);
    }

    #[test]
    fn test_parse_display_value() {
        assert_eq!(parse_display_value("245W"), Some(245.0));
        assert_eq!(parse_display_value("32.5 km/h"), Some(32.5));
        assert_eq!(parse_display_value("-3%"), Some(-3.0));
        assert_eq!(parse_display_value("--"), None);
        assert_eq!(parse_display_value("..."), None);
        assert_eq!(parse_display_value("N/A"), None);
        assert_eq!(parse_display_value(""), None);
        assert_eq!(parse_display_value("bpm"), None);
        assert_eq!(parse_display_value("1.2.3"), None);
    }
}
