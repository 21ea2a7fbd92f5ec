// Persistence records - the serialized form of profiles and the mapping to domain types
use crate::domain::data_field::{self, IconSize};
use crate::domain::layout::{
    DisplayOptions, FALLBACK_TEMPLATE_ID, FontSize, LayoutDataField, LayoutError, LayoutScreen,
    Visualization, VisualizationType,
};
use crate::domain::profile::DataFieldProfile;
use crate::domain::visualization::{Gauge, Orientation, ProgressBar, Zone, ZonedProgressBar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub name: String,
    pub screens: Vec<ScreenRecord>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_read_only: bool,
    /// Epoch milliseconds
    pub created_at: i64,
    pub modified_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRecord {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub data_fields: Vec<FieldRecord>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub data_field_id: u32,
    pub zone_id: String,
    pub visualization_type: VisualizationType,
    #[serde(default = "enabled")]
    pub show_label: bool,
    #[serde(default = "enabled")]
    pub show_unit: bool,
    #[serde(default)]
    pub show_icon: bool,
    #[serde(default)]
    pub icon_size: IconSize,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_payload: Option<PayloadRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PayloadRecord {
    Gauge(GaugeRecord),
    ProgressBar(BarRecord),
    ZonedBar(ZonedBarRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeRecord {
    pub center_x: i32,
    pub center_y: i32,
    pub radius_outer: u32,
    pub radius_inner: u32,
    pub start_portion: u8,
    pub end_portion: u8,
    pub clockwise: bool,
    pub min_value: f64,
    pub max_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarRecord {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub orientation: Orientation,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub show_border: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonedBarRecord {
    pub bar: BarRecord,
    pub zones: Vec<ZoneRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRecord {
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub color: u8,
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

impl From<&DataFieldProfile> for ProfileRecord {
    fn from(profile: &DataFieldProfile) -> Self {
        Self {
            id: profile.id().to_string(),
            name: profile.name().to_string(),
            screens: profile.screens().iter().map(ScreenRecord::from).collect(),
            is_default: profile.is_default(),
            is_read_only: profile.is_read_only(),
            created_at: profile.created_at().timestamp_millis(),
            modified_at: profile.modified_at().timestamp_millis(),
        }
    }
}

impl TryFrom<ProfileRecord> for DataFieldProfile {
    type Error = LayoutError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let screens = record
            .screens
            .into_iter()
            .map(LayoutScreen::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        DataFieldProfile::restore(
            record.id,
            record.name,
            screens,
            record.is_read_only,
            from_millis(record.created_at),
            from_millis(record.modified_at),
        )
    }
}

impl From<&LayoutScreen> for ScreenRecord {
    fn from(screen: &LayoutScreen) -> Self {
        Self {
            id: screen.id(),
            name: screen.name().to_string(),
            template_id: Some(screen.template().id.to_string()),
            data_fields: screen.data_fields().iter().map(FieldRecord::from).collect(),
        }
    }
}

impl TryFrom<ScreenRecord> for LayoutScreen {
    type Error = LayoutError;

    fn try_from(record: ScreenRecord) -> Result<Self, Self::Error> {
        let fields = record
            .data_fields
            .into_iter()
            .map(LayoutDataField::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let template_id = record.template_id.as_deref().unwrap_or(FALLBACK_TEMPLATE_ID);
        LayoutScreen::new(record.id, record.name, template_id, fields)
    }
}

impl From<&LayoutDataField> for FieldRecord {
    fn from(field: &LayoutDataField) -> Self {
        let payload = match &field.visualization {
            Visualization::Text => None,
            Visualization::Gauge(g) => Some(PayloadRecord::Gauge(GaugeRecord {
                center_x: g.center().0,
                center_y: g.center().1,
                radius_outer: g.radius_outer(),
                radius_inner: g.radius_inner(),
                start_portion: g.start_portion(),
                end_portion: g.end_portion(),
                clockwise: g.clockwise(),
                min_value: g.min_value(),
                max_value: g.max_value(),
            })),
            Visualization::Bar(b) => Some(PayloadRecord::ProgressBar(BarRecord::from(b))),
            Visualization::ZonedBar(z) => Some(PayloadRecord::ZonedBar(ZonedBarRecord {
                bar: BarRecord::from(z.bar()),
                zones: z
                    .zones()
                    .iter()
                    .map(|zone| ZoneRecord {
                        name: zone.name().to_string(),
                        min_value: zone.min_value(),
                        max_value: zone.max_value(),
                        color: zone.color(),
                    })
                    .collect(),
            })),
        };

        Self {
            data_field_id: field.data_field.id,
            zone_id: field.zone_id.clone(),
            visualization_type: field.visualization_type(),
            show_label: field.display.show_label,
            show_unit: field.display.show_unit,
            show_icon: field.display.show_icon,
            icon_size: field.display.icon_size,
            font_size: field.display.font_size,
            visualization_payload: payload,
        }
    }
}

impl TryFrom<FieldRecord> for LayoutDataField {
    type Error = LayoutError;

    fn try_from(record: FieldRecord) -> Result<Self, Self::Error> {
        let data_field = data_field::get_by_id(record.data_field_id)
            .ok_or(LayoutError::UnknownDataField(record.data_field_id))?;

        let visualization = match (record.visualization_type, record.visualization_payload) {
            (VisualizationType::Text, None) => Visualization::Text,
            (VisualizationType::Gauge, Some(PayloadRecord::Gauge(g))) => {
                Visualization::Gauge(Gauge::new(
                    data_field,
                    g.center_x,
                    g.center_y,
                    g.radius_outer,
                    g.radius_inner,
                    g.start_portion,
                    g.end_portion,
                    g.clockwise,
                    g.min_value,
                    g.max_value,
                )?)
            }
            (VisualizationType::Bar, Some(PayloadRecord::ProgressBar(b))) => {
                Visualization::Bar(b.into_bar(data_field)?)
            }
            (VisualizationType::ZonedBar, Some(PayloadRecord::ZonedBar(z))) => {
                let zones = z
                    .zones
                    .into_iter()
                    .map(|zone| Zone::new(zone.name, zone.min_value, zone.max_value, zone.color))
                    .collect::<Result<Vec<_>, _>>()?;
                Visualization::ZonedBar(ZonedProgressBar::new(z.bar.into_bar(data_field)?, zones)?)
            }
            (kind, _) => return Err(LayoutError::PayloadMismatch(kind)),
        };

        Ok(Self {
            data_field,
            zone_id: record.zone_id,
            visualization,
            display: DisplayOptions {
                show_label: record.show_label,
                show_unit: record.show_unit,
                show_icon: record.show_icon,
                icon_size: record.icon_size,
                font_size: record.font_size,
            },
        })
    }
}

impl From<&ProgressBar> for BarRecord {
    fn from(bar: &ProgressBar) -> Self {
        let (x, y) = bar.origin();
        Self {
            x,
            y,
            width: bar.width(),
            height: bar.height(),
            orientation: bar.orientation(),
            min_value: bar.min_value(),
            max_value: bar.max_value(),
            show_border: bar.show_border(),
        }
    }
}

impl BarRecord {
    fn into_bar(
        self,
        data_field: &'static data_field::DataField,
    ) -> Result<ProgressBar, LayoutError> {
        Ok(ProgressBar::new(
            data_field,
            self.x,
            self.y,
            self.width,
            self.height,
            self.orientation,
            self.min_value,
            self.max_value,
            self.show_border,
        )?)
    }
}
