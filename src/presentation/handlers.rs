// HTTP request handlers
use crate::application::profile_builder::BuilderState;
use crate::domain::data_field::{self, DataField, DataFieldCategory};
use crate::domain::layout::LayoutDataField;
use crate::domain::profile::{DataFieldProfile, StarterTemplate};
use crate::infrastructure::profile_record::{FieldRecord, ProfileRecord};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

type Rejection = (StatusCode, String);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub profiles: Vec<ProfileRecord>,
    pub active_profile_id: Option<String>,
    pub selected_screen_id: u32,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl From<&BuilderState> for StateView {
    fn from(state: &BuilderState) -> Self {
        Self {
            profiles: state.profiles.iter().map(ProfileRecord::from).collect(),
            active_profile_id: state.active_profile.as_ref().map(|p| p.id().to_string()),
            selected_screen_id: state.selected_screen_id,
            is_loading: state.is_loading,
            error: state.error.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFieldView {
    pub id: u32,
    pub name: &'static str,
    pub unit: &'static str,
    pub category: DataFieldCategory,
    pub stream_key: &'static str,
    pub icon_small: Option<&'static str>,
    pub icon_large: Option<&'static str>,
}

impl From<&DataField> for DataFieldView {
    fn from(field: &DataField) -> Self {
        Self {
            id: field.id,
            name: field.name,
            unit: field.unit,
            category: field.category,
            stream_key: field.stream_key,
            icon_small: field.icon_small,
            icon_large: field.icon_large,
        }
    }
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub category: Option<DataFieldCategory>,
}

#[derive(Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
    pub template: Option<StarterTemplate>,
}

#[derive(Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFieldRequest {
    pub zone_id: String,
    pub data_field_id: u32,
}

fn current(state: &AppState) -> Json<StateView> {
    Json(StateView::from(&state.builder.snapshot()))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Metric catalog, optionally narrowed to one category
pub async fn list_data_fields(Query(query): Query<CategoryQuery>) -> Json<Vec<DataFieldView>> {
    let fields = match query.category {
        Some(category) => data_field::get_by_category(category),
        None => data_field::all().to_vec(),
    };
    Json(fields.into_iter().map(DataFieldView::from).collect())
}

pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateView> {
    current(&state)
}

/// Server-sent events, one per published snapshot
pub async fn stream_state(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.builder.subscribe()).map(|snapshot| {
        let event = Event::default()
            .event("state")
            .json_data(StateView::from(&snapshot))
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to encode state event: {}", e);
                Event::default().event("error").data(e.to_string())
            });
        Ok(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn clear_error(State(state): State<Arc<AppState>>) -> Json<StateView> {
    state.builder.clear_error();
    current(&state)
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateProfileRequest>,
) -> Json<StateView> {
    state
        .builder
        .create_profile(&request.name, request.template)
        .await;
    current(&state)
}

pub async fn update_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(record): Json<ProfileRecord>,
) -> Result<Json<StateView>, Rejection> {
    if record.id != id {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("profile id {} does not match path {}", record.id, id),
        ));
    }
    let profile = DataFieldProfile::try_from(record)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    state.builder.update_profile(profile).await;
    Ok(current(&state))
}

pub async fn duplicate_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NameRequest>,
) -> Json<StateView> {
    state.builder.duplicate_profile(&id, &request.name).await;
    current(&state)
}

pub async fn rename_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NameRequest>,
) -> Json<StateView> {
    state.builder.rename_profile(&id, &request.name).await;
    current(&state)
}

pub async fn select_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<StateView> {
    state.builder.select_profile(&id).await;
    current(&state)
}

pub async fn delete_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<StateView> {
    state.builder.delete_profile(&id).await;
    current(&state)
}

pub async fn add_screen(State(state): State<Arc<AppState>>) -> Json<StateView> {
    state.builder.add_screen().await;
    current(&state)
}

pub async fn remove_screen(
    Path(screen_id): Path<u32>,
    State(state): State<Arc<AppState>>,
) -> Json<StateView> {
    state.builder.remove_screen(screen_id).await;
    current(&state)
}

pub async fn select_screen(
    Path(screen_id): Path<u32>,
    State(state): State<Arc<AppState>>,
) -> Json<StateView> {
    state.builder.select_screen(screen_id).await;
    current(&state)
}

pub async fn add_field(
    Path(screen_id): Path<u32>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddFieldRequest>,
) -> Result<Json<StateView>, Rejection> {
    let field = data_field::get_by_id(request.data_field_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("unknown data field id {}", request.data_field_id),
        )
    })?;
    state
        .builder
        .add_field_to_screen(screen_id, &request.zone_id, field)
        .await;
    Ok(current(&state))
}

pub async fn update_field(
    Path(screen_id): Path<u32>,
    State(state): State<Arc<AppState>>,
    Json(record): Json<FieldRecord>,
) -> Result<Json<StateView>, Rejection> {
    let field = LayoutDataField::try_from(record)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    state.builder.update_field(screen_id, field).await;
    Ok(current(&state))
}

pub async fn remove_field(
    Path((screen_id, zone_id)): Path<(u32, String)>,
    State(state): State<Arc<AppState>>,
) -> Json<StateView> {
    state.builder.remove_field(screen_id, &zone_id).await;
    current(&state)
}
