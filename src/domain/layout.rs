// Layout domain model - screens made of data fields placed in template zones
use super::data_field::{DataField, IconSize};
use super::visualization::{Gauge, ProgressBar, ValidationError, ZonedProgressBar};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const SINGLE_TEMPLATE_ID: &str = "single";
pub const TWO_STACKED_TEMPLATE_ID: &str = "two_stacked";
pub const THREE_STACKED_TEMPLATE_ID: &str = "three_stacked";

/// Template used when a stored screen carries no template id.
pub const FALLBACK_TEMPLATE_ID: &str = SINGLE_TEMPLATE_ID;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("unknown screen template '{0}'")]
    UnknownTemplate(String),
    #[error("zone '{zone}' is not part of template '{template}'")]
    UnknownZone { zone: String, template: String },
    #[error("zone '{0}' is already occupied")]
    DuplicateZone(String),
    #[error("template '{template}' holds at most {max} fields")]
    TooManyFields { template: String, max: usize },
    #[error("profile needs at least one screen")]
    NoScreens,
    #[error("duplicate screen id {0}")]
    DuplicateScreenId(u32),
    #[error("unknown data field id {0}")]
    UnknownDataField(u32),
    #[error("visualization payload does not match type {0:?}")]
    PayloadMismatch(VisualizationType),
    #[error("visualization in zone '{zone}' is bound to data field {bound}, not {expected}")]
    MetricMismatch { zone: String, bound: u32, expected: u32 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisualizationType {
    Text,
    Gauge,
    Bar,
    ZonedBar,
}

/// How a field is drawn. The payload always agrees with the type.
#[derive(Debug, Clone, PartialEq)]
pub enum Visualization {
    Text,
    Gauge(Gauge),
    Bar(ProgressBar),
    ZonedBar(ZonedProgressBar),
}

impl Visualization {
    pub fn kind(&self) -> VisualizationType {
        match self {
            Visualization::Text => VisualizationType::Text,
            Visualization::Gauge(_) => VisualizationType::Gauge,
            Visualization::Bar(_) => VisualizationType::Bar,
            Visualization::ZonedBar(_) => VisualizationType::ZonedBar,
        }
    }

    /// Metric the payload draws; `None` for plain text.
    pub fn data_field(&self) -> Option<&'static DataField> {
        match self {
            Visualization::Text => None,
            Visualization::Gauge(g) => Some(g.data_field()),
            Visualization::Bar(b) => Some(b.data_field()),
            Visualization::ZonedBar(z) => Some(z.data_field()),
        }
    }

    fn rebound(&self, data_field: &'static DataField) -> Self {
        match self {
            Visualization::Text => Visualization::Text,
            Visualization::Gauge(g) => Visualization::Gauge(g.with_data_field(data_field)),
            Visualization::Bar(b) => Visualization::Bar(b.with_data_field(data_field)),
            Visualization::ZonedBar(z) => Visualization::ZonedBar(z.with_data_field(data_field)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_label: bool,
    pub show_unit: bool,
    pub show_icon: bool,
    pub icon_size: IconSize,
    pub font_size: FontSize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_label: true,
            show_unit: true,
            show_icon: false,
            icon_size: IconSize::Small,
            font_size: FontSize::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDataField {
    pub data_field: &'static DataField,
    pub zone_id: String,
    pub visualization: Visualization,
    pub display: DisplayOptions,
}

impl LayoutDataField {
    /// Plain text field with default sizing; the icon shows when the metric has one.
    pub fn text(data_field: &'static DataField, zone_id: impl Into<String>) -> Self {
        Self {
            data_field,
            zone_id: zone_id.into(),
            visualization: Visualization::Text,
            display: DisplayOptions {
                show_icon: data_field.has_icon(),
                ..DisplayOptions::default()
            },
        }
    }

    pub fn visualization_type(&self) -> VisualizationType {
        self.visualization.kind()
    }

    /// Swap the visualization. The payload is bound to this field's metric.
    pub fn with_visualization(&self, visualization: Visualization) -> Self {
        Self {
            visualization: visualization.rebound(self.data_field),
            ..self.clone()
        }
    }

    pub fn with_display(&self, display: DisplayOptions) -> Self {
        Self {
            display,
            ..self.clone()
        }
    }

    fn is_consistent(&self) -> bool {
        self.visualization
            .data_field()
            .is_none_or(|bound| bound.id == self.data_field.id)
    }

    /// Re-target the field at another metric, keeping zone and geometry.
    pub fn with_data_field(&self, data_field: &'static DataField) -> Self {
        Self {
            data_field,
            zone_id: self.zone_id.clone(),
            visualization: self.visualization.rebound(data_field),
            display: self.display,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ScreenTemplate {
    pub id: &'static str,
    pub zones: &'static [&'static str],
    pub field_limit: usize,
}

impl ScreenTemplate {
    pub fn max_fields(&self) -> usize {
        self.field_limit
    }

    pub fn has_zone(&self, zone_id: &str) -> bool {
        self.zones.contains(&zone_id)
    }
}

static TEMPLATES: [ScreenTemplate; 3] = [
    ScreenTemplate {
        id: SINGLE_TEMPLATE_ID,
        zones: &["main"],
        field_limit: 1,
    },
    ScreenTemplate {
        id: TWO_STACKED_TEMPLATE_ID,
        zones: &["top", "bottom"],
        field_limit: 2,
    },
    ScreenTemplate {
        id: THREE_STACKED_TEMPLATE_ID,
        zones: &["top", "middle", "bottom"],
        field_limit: 3,
    },
];

/// Three zones, two fields: the field cap bites before the zones run out.
#[cfg(test)]
pub(crate) const CAPPED_TEMPLATE_ID: &str = "three_zones_two_fields";

#[cfg(test)]
static TEST_TEMPLATES: [ScreenTemplate; 1] = [ScreenTemplate {
    id: CAPPED_TEMPLATE_ID,
    zones: &["top", "middle", "bottom"],
    field_limit: 2,
}];

#[cfg(not(test))]
static TEST_TEMPLATES: [ScreenTemplate; 0] = [];

pub fn template_for(template_id: &str) -> Result<&'static ScreenTemplate, LayoutError> {
    TEMPLATES
        .iter()
        .chain(TEST_TEMPLATES.iter())
        .find(|t| t.id == template_id)
        .ok_or_else(|| LayoutError::UnknownTemplate(template_id.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutScreen {
    id: u32,
    name: String,
    template: &'static ScreenTemplate,
    data_fields: Vec<LayoutDataField>,
}

impl LayoutScreen {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        template_id: &str,
        data_fields: Vec<LayoutDataField>,
    ) -> Result<Self, LayoutError> {
        let template = template_for(template_id)?;
        if data_fields.len() > template.max_fields() {
            return Err(LayoutError::TooManyFields {
                template: template.id.to_string(),
                max: template.max_fields(),
            });
        }
        let mut seen = HashSet::new();
        for field in &data_fields {
            if !template.has_zone(&field.zone_id) {
                return Err(LayoutError::UnknownZone {
                    zone: field.zone_id.clone(),
                    template: template.id.to_string(),
                });
            }
            if !seen.insert(field.zone_id.as_str()) {
                return Err(LayoutError::DuplicateZone(field.zone_id.clone()));
            }
            if !field.is_consistent() {
                return Err(LayoutError::MetricMismatch {
                    zone: field.zone_id.clone(),
                    bound: field.visualization.data_field().map_or(0, |f| f.id),
                    expected: field.data_field.id,
                });
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            template,
            data_fields,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &'static ScreenTemplate {
        self.template
    }

    pub fn data_fields(&self) -> &[LayoutDataField] {
        &self.data_fields
    }

    pub fn zone_ids_in_use(&self) -> HashSet<&str> {
        self.data_fields.iter().map(|f| f.zone_id.as_str()).collect()
    }

    pub fn field_count(&self) -> usize {
        self.data_fields.len()
    }

    pub fn max_fields(&self) -> usize {
        self.template.max_fields()
    }

    pub fn is_full(&self) -> bool {
        self.field_count() >= self.max_fields()
    }

    pub fn field(&self, zone_id: &str) -> Option<&LayoutDataField> {
        self.data_fields.iter().find(|f| f.zone_id == zone_id)
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_field_added(&self, field: LayoutDataField) -> Result<Self, LayoutError> {
        let mut data_fields = self.data_fields.clone();
        data_fields.push(field);
        Self::new(self.id, self.name.clone(), self.template.id, data_fields)
    }

    /// Swap the field sharing `field.zone_id`; `None` when the zone is empty.
    /// The incoming payload is bound to the incoming field's metric.
    pub fn with_field_replaced(&self, field: LayoutDataField) -> Option<Self> {
        let index = self
            .data_fields
            .iter()
            .position(|f| f.zone_id == field.zone_id)?;
        let mut data_fields = self.data_fields.clone();
        data_fields[index] = field.with_visualization(field.visualization.clone());
        Some(Self {
            data_fields,
            ..self.clone()
        })
    }

    pub fn without_field(&self, zone_id: &str) -> Option<Self> {
        self.field(zone_id)?;
        Some(Self {
            data_fields: self
                .data_fields
                .iter()
                .filter(|f| f.zone_id != zone_id)
                .cloned()
                .collect(),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::data_field::{CADENCE, HEART_RATE, POWER, SPEED, TIME_OF_DAY};
    use crate::domain::visualization::Orientation;

    fn stacked(fields: Vec<LayoutDataField>) -> Result<LayoutScreen, LayoutError> {
        LayoutScreen::new(1, "Main", THREE_STACKED_TEMPLATE_ID, fields)
    }

    #[test]
    fn test_text_field_defaults() {
        let field = LayoutDataField::text(&SPEED, "top");
        assert_eq!(field.visualization_type(), VisualizationType::Text);
        assert!(field.display.show_icon);
        assert_eq!(field.display.font_size, FontSize::Medium);

        let clock = LayoutDataField::text(&TIME_OF_DAY, "top");
        assert!(!clock.display.show_icon);
    }

    #[test]
    fn test_template_lookup() {
        assert_eq!(
            template_for("three_stacked").unwrap().zones,
            &["top", "middle", "bottom"]
        );
        assert_eq!(template_for(FALLBACK_TEMPLATE_ID).unwrap().max_fields(), 1);
        assert_eq!(
            template_for("grid").unwrap_err(),
            LayoutError::UnknownTemplate("grid".to_string())
        );
    }

    #[test]
    fn test_screen_rejects_duplicate_zone() {
        let err = stacked(vec![
            LayoutDataField::text(&SPEED, "top"),
            LayoutDataField::text(&POWER, "top"),
        ])
        .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateZone("top".to_string()));
    }

    #[test]
    fn test_screen_rejects_foreign_zone_and_overflow() {
        assert!(matches!(
            stacked(vec![LayoutDataField::text(&SPEED, "left")]),
            Err(LayoutError::UnknownZone { .. })
        ));
        assert!(matches!(
            LayoutScreen::new(
                1,
                "One",
                SINGLE_TEMPLATE_ID,
                vec![
                    LayoutDataField::text(&SPEED, "main"),
                    LayoutDataField::text(&POWER, "main"),
                ],
            ),
            Err(LayoutError::TooManyFields { max: 1, .. })
        ));
    }

    #[test]
    fn test_zone_occupancy() {
        let screen = stacked(vec![
            LayoutDataField::text(&SPEED, "top"),
            LayoutDataField::text(&POWER, "bottom"),
        ])
        .unwrap();
        let zones = screen.zone_ids_in_use();
        assert!(zones.contains("top") && zones.contains("bottom"));
        assert!(!zones.contains("middle"));
        assert_eq!(screen.field_count(), 2);
        assert!(!screen.is_full());

        let full = screen
            .with_field_added(LayoutDataField::text(&CADENCE, "middle"))
            .unwrap();
        assert!(full.is_full());
        assert_eq!(screen.field_count(), 2);
    }

    #[test]
    fn test_replace_and_remove_field() {
        let screen = stacked(vec![LayoutDataField::text(&SPEED, "top")]).unwrap();
        let gauge = Gauge::new(&POWER, 120, 60, 50, 40, 10, 6, true, 0.0, 400.0).unwrap();
        let replacement =
            LayoutDataField::text(&POWER, "top").with_visualization(Visualization::Gauge(gauge));

        let replaced = screen.with_field_replaced(replacement.clone()).unwrap();
        assert_eq!(replaced.field("top"), Some(&replacement));
        assert_eq!(screen.field("top").unwrap().data_field.id, SPEED.id);

        assert!(
            screen
                .with_field_replaced(LayoutDataField::text(&POWER, "middle"))
                .is_none()
        );
        assert_eq!(replaced.without_field("top").unwrap().field_count(), 0);
        assert!(replaced.without_field("bottom").is_none());
    }

    #[test]
    fn test_with_data_field_keeps_geometry() {
        let bar = ProgressBar::new(
            &POWER,
            30,
            100,
            244,
            20,
            Orientation::Horizontal,
            0.0,
            400.0,
            true,
        )
        .unwrap();
        let field =
            LayoutDataField::text(&POWER, "middle").with_visualization(Visualization::Bar(bar));
        let retargeted = field.with_data_field(&HEART_RATE);

        assert_eq!(retargeted.zone_id, "middle");
        match &retargeted.visualization {
            Visualization::Bar(b) => {
                assert_eq!(b.data_field().id, HEART_RATE.id);
                assert_eq!(b.width(), 244);
            }
            other => panic!("unexpected visualization {other:?}"),
        }
    }

    #[test]
    fn test_visualization_follows_field_metric() {
        let hr_gauge = Gauge::new(&HEART_RATE, 120, 60, 50, 40, 10, 6, true, 40.0, 200.0).unwrap();
        let field = LayoutDataField::text(&POWER, "middle")
            .with_visualization(Visualization::Gauge(hr_gauge.clone()));
        assert_eq!(field.visualization.data_field(), Some(&POWER));

        let screen = stacked(vec![LayoutDataField::text(&POWER, "middle")]).unwrap();
        let mismatched = LayoutDataField {
            visualization: Visualization::Gauge(hr_gauge),
            ..LayoutDataField::text(&POWER, "middle")
        };
        let replaced = screen.with_field_replaced(mismatched.clone()).unwrap();
        assert_eq!(
            replaced.field("middle").unwrap().visualization.data_field(),
            Some(&POWER)
        );

        assert_eq!(
            stacked(vec![mismatched]).unwrap_err(),
            LayoutError::MetricMismatch {
                zone: "middle".to_string(),
                bound: HEART_RATE.id,
                expected: POWER.id,
            }
        );
    }

    #[test]
    fn test_field_limit_below_zone_count() {
        let template = template_for(CAPPED_TEMPLATE_ID).unwrap();
        assert_eq!(template.zones.len(), 3);
        assert_eq!(template.max_fields(), 2);

        let screen = LayoutScreen::new(
            1,
            "Capped",
            CAPPED_TEMPLATE_ID,
            vec![
                LayoutDataField::text(&SPEED, "top"),
                LayoutDataField::text(&POWER, "middle"),
            ],
        )
        .unwrap();
        assert!(screen.is_full());
        assert_eq!(
            screen
                .with_field_added(LayoutDataField::text(&CADENCE, "bottom"))
                .unwrap_err(),
            LayoutError::TooManyFields {
                template: CAPPED_TEMPLATE_ID.to_string(),
                max: 2,
            }
        );
    }
}
