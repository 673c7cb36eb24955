use super::models::{Plate, router as crudrouter};
use super::services::{MergeOutcome, MergeRequest, merge_plate_runs};
use crate::common::auth::Role;
use crate::common::errors::{BusinessError, DbErrorExt};
use crate::common::state::AppState;
use crate::not_found;
use crate::wells::models::position_label;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum_keycloak_auth::{PassthroughMode, layer::KeycloakAuthLayer};
use crudcrate::CRUDResource;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::{Value, json};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    let mut mutating_router = crudrouter(&state.db.clone());

    mutating_router = mutating_router
        .route(
            "/{plate_id}/wells",
            get(get_plate_wells).with_state(state.clone()),
        )
        .route(
            "/{plate_id}/acquisitions",
            get(get_plate_acquisitions).with_state(state.clone()),
        )
        .route(
            "/{plate_id}/merge",
            post(merge_plate).with_state(state.clone()),
        );

    if let Some(instance) = state.keycloak_auth_instance.clone() {
        mutating_router = mutating_router.layer(
            KeycloakAuthLayer::<Role>::builder()
                .instance(instance)
                .passthrough_mode(PassthroughMode::Block)
                .persist_raw_claims(false)
                .expected_audiences(vec![String::from("account")])
                .required_roles(vec![Role::Administrator])
                .build(),
        );
    } else if !state.config.tests_running {
        println!(
            "Warning: Mutating routes of {} router are not protected",
            Plate::RESOURCE_NAME_PLURAL
        );
    }

    mutating_router
}

/// Merge plate runs into this plate
#[utoipa::path(
    post,
    path = "/plates/{plate_id}/merge",
    params(
        ("plate_id" = Uuid, Path, description = "Target plate to merge into")
    ),
    request_body = MergeRequest,
    responses(
        (status = 200, description = "Merge summary and the mutated target plate", body = MergeOutcome),
        (status = 400, description = "Validation failure, e.g. runs without start times"),
        (status = 404, description = "Target plate or a source object not found"),
        (status = 422, description = "Screen safety violation"),
        (status = 500, description = "Database failure; earlier runs may already be merged")
    ),
    tag = "plates",
    summary = "Merge plate runs",
    description = "Moves the acquisitions (runs) of the given source plates or runs into this plate, creating missing wells as needed. Runs are folded sequentially in the requested order and persisted one run at a time."
)]
pub async fn merge_plate(
    Path(plate_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Json(request): Json<MergeRequest>,
) -> Result<Json<MergeOutcome>, BusinessError> {
    let outcome = merge_plate_runs(&app_state.db, plate_id, request).await?;
    Ok(Json(outcome))
}

/// Get all wells of a plate, with their samples
#[utoipa::path(
    get,
    path = "/plates/{plate_id}/wells",
    params(
        ("plate_id" = Uuid, Path, description = "Plate ID to fetch wells for")
    ),
    responses(
        (status = 200, description = "Wells of this plate in position order, each with its samples"),
        (status = 404, description = "Plate not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "plates",
    summary = "Get plate wells",
    description = "Retrieve all wells of a plate in (row, column) order, each with its well samples"
)]
pub async fn get_plate_wells(
    Path(plate_id): Path<Uuid>,
    State(app_state): State<AppState>,
) -> Result<Json<Value>, BusinessError> {
    let db = &app_state.db;

    super::models::Entity::find_by_id(plate_id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("plate"))?
        .ok_or_else(|| not_found!("Plate", plate_id))?;

    let wells_with_samples = crate::wells::models::Entity::find()
        .filter(crate::wells::models::Column::PlateId.eq(plate_id))
        .order_by_asc(crate::wells::models::Column::RowIndex)
        .order_by_asc(crate::wells::models::Column::ColumnIndex)
        .find_with_related(crate::well_samples::models::Entity)
        .all(db)
        .await
        .map_err(|e| e.to_business_error("well"))?;

    let wells_data: Vec<Value> = wells_with_samples
        .into_iter()
        .map(|(well, samples)| {
            let samples_data: Vec<Value> = samples
                .into_iter()
                .map(|sample| {
                    json!({
                        "id": sample.id,
                        "plate_acquisition_id": sample.plate_acquisition_id,
                        "image_name": sample.image_name,
                    })
                })
                .collect();

            json!({
                "id": well.id,
                "position": position_label(well.row_index, well.column_index),
                "row_index": well.row_index,
                "column_index": well.column_index,
                "samples": samples_data
            })
        })
        .collect();

    Ok(Json(json!(wells_data)))
}

/// Get all acquisitions (runs) of a plate
#[utoipa::path(
    get,
    path = "/plates/{plate_id}/acquisitions",
    params(
        ("plate_id" = Uuid, Path, description = "Plate ID to fetch acquisitions for")
    ),
    responses(
        (status = 200, description = "Acquisitions of this plate"),
        (status = 404, description = "Plate not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "plates",
    summary = "Get plate acquisitions",
    description = "Retrieve all acquisitions (runs) currently assigned to a plate"
)]
pub async fn get_plate_acquisitions(
    Path(plate_id): Path<Uuid>,
    State(app_state): State<AppState>,
) -> Result<Json<Value>, BusinessError> {
    let db = &app_state.db;

    super::models::Entity::find_by_id(plate_id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("plate"))?
        .ok_or_else(|| not_found!("Plate", plate_id))?;

    let acquisitions = crate::acquisitions::models::Entity::find()
        .filter(crate::acquisitions::models::Column::PlateId.eq(plate_id))
        .order_by_asc(crate::acquisitions::models::Column::Name)
        .all(db)
        .await
        .map_err(|e| e.to_business_error("acquisition"))?;

    let acquisitions_data: Vec<Value> = acquisitions
        .into_iter()
        .map(|run| {
            json!({
                "id": run.id,
                "name": run.name,
                "plate_id": run.plate_id,
                "start_time": run.start_time,
            })
        })
        .collect();

    Ok(Json(json!(acquisitions_data)))
}
