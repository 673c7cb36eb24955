//! Plate-run merge: moves the acquisitions (runs) of source plates into a
//! target plate, creating missing target wells on demand and re-pointing each
//! run's well samples at the positionally matching target well.
//!
//! The fold is sequential and persisted run by run. After every run the
//! target's well index is rebuilt from the database so the next run observes
//! the wells and associations just written. There is no wrapping transaction:
//! a failure partway through leaves earlier runs merged and later ones not,
//! and the operation must be re-run or repaired by an operator.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::acquisitions::models as acquisitions;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::plates::models as plates;
use crate::well_samples::models as well_samples;
use crate::wells::models as wells;
use crate::wells::models::position_label;
use crate::{business_rule_violation, not_found, validation_error};

/// How the `source_ids` of a merge request are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Plate,
    Acquisition,
}

/// The order in which runs are folded into the target. Later runs see the
/// wells created for earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunOrder {
    PlateAndRunName,
    AcquisitionName,
    AcquisitionStartTime,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MergeRequest {
    pub source_kind: SourceKind,
    pub source_ids: Vec<Uuid>,
    pub order_by: RunOrder,
    #[serde(default = "default_same_screen")]
    pub same_screen_required: bool,
}

fn default_same_screen() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MergeOutcome {
    pub message: String,
    pub images_merged: usize,
    pub runs_merged: usize,
    pub wells_created: usize,
    /// Run names in the order they were folded into the target
    pub run_names: Vec<String>,
    pub plate: plates::Plate,
}

type WorkList = Vec<(plates::Model, acquisitions::Model)>;
type WellIndex = HashMap<(i32, i32), wells::Model>;

/// Merge the runs named by `request` into the target plate.
pub async fn merge_plate_runs(
    db: &DatabaseConnection,
    target_plate_id: Uuid,
    request: MergeRequest,
) -> BusinessResult<MergeOutcome> {
    let target = plates::Entity::find_by_id(target_plate_id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("plate"))?
        .ok_or_else(|| not_found!("Plate", target_plate_id))?;

    let work_list = resolve_work_list(db, &target, &request).await?;
    let work_list = order_work_list(work_list, request.order_by)?;

    let run_names: Vec<String> = work_list.iter().map(|(_, run)| run.name.clone()).collect();
    info!(
        target_plate = %target.id,
        runs = run_names.len(),
        "merging runs in order: [{}]",
        run_names.join(", ")
    );

    if request.same_screen_required {
        check_same_screen(&target, &work_list)?;
    }

    let mut well_index = index_target_wells(db, target.id).await?;
    let wells_created = create_missing_wells(db, &target, &work_list, &mut well_index).await?;

    let mut images_merged = 0usize;
    for (source_plate, run) in &work_list {
        images_merged += fold_run(db, source_plate, run, &well_index).await?;

        // Move the run itself to the target plate
        let run_update = acquisitions::ActiveModel {
            id: Set(run.id),
            plate_id: Set(target.id),
            last_updated: Set(Utc::now()),
            ..Default::default()
        };
        run_update
            .update(db)
            .await
            .map_err(|e| e.to_business_error("acquisition"))?;

        // Re-read the target's wells so the next run folds against persisted
        // state rather than this run's in-memory leftovers
        well_index = index_target_wells(db, target.id).await?;
    }

    let message = summary_message(images_merged, work_list.len(), target.id, wells_created);
    info!("{message}");

    let plate = plates::get_one_plate(db, target.id)
        .await
        .map_err(|e| e.to_business_error("plate"))?;

    Ok(MergeOutcome {
        message,
        images_merged,
        runs_merged: work_list.len(),
        wells_created,
        run_names,
        plate,
    })
}

/// Resolve the (plate, run) pairs to fold, per the request's source kind.
///
/// Plate sources: the target's own id is dropped (merging a plate into itself
/// is a no-op), and a plate with no runs gets one synthesized run named after
/// the plate that adopts all of its well samples. Acquisition sources name
/// runs directly; their plate is the run's parent.
async fn resolve_work_list(
    db: &DatabaseConnection,
    target: &plates::Model,
    request: &MergeRequest,
) -> BusinessResult<WorkList> {
    let mut work_list: WorkList = Vec::new();
    let mut seen: HashSet<Uuid> = HashSet::new();

    match request.source_kind {
        SourceKind::Plate => {
            for plate_id in request.source_ids.iter().copied() {
                if plate_id == target.id || !seen.insert(plate_id) {
                    continue;
                }
                let plate = plates::Entity::find_by_id(plate_id)
                    .one(db)
                    .await
                    .map_err(|e| e.to_business_error("plate"))?
                    .ok_or_else(|| not_found!("Plate", plate_id))?;

                let mut runs = acquisitions::Entity::find()
                    .filter(acquisitions::Column::PlateId.eq(plate.id))
                    .all(db)
                    .await
                    .map_err(|e| e.to_business_error("acquisition"))?;

                if runs.is_empty() {
                    runs.push(synthesize_run(db, &plate).await?);
                }

                for run in runs {
                    work_list.push((plate.clone(), run));
                }
            }
        }
        SourceKind::Acquisition => {
            for run_id in request.source_ids.iter().copied() {
                if !seen.insert(run_id) {
                    continue;
                }
                let run = acquisitions::Entity::find_by_id(run_id)
                    .one(db)
                    .await
                    .map_err(|e| e.to_business_error("acquisition"))?
                    .ok_or_else(|| not_found!("Acquisition", run_id))?;
                let plate = plates::Entity::find_by_id(run.plate_id)
                    .one(db)
                    .await
                    .map_err(|e| e.to_business_error("plate"))?
                    .ok_or_else(|| not_found!("Plate", run.plate_id))?;
                work_list.push((plate, run));
            }
        }
    }

    Ok(work_list)
}

/// Create a run for a plate that has none, adopting every well sample on the
/// plate so the merge moves them all.
async fn synthesize_run(
    db: &DatabaseConnection,
    plate: &plates::Model,
) -> BusinessResult<acquisitions::Model> {
    let run = acquisitions::ActiveModel {
        id: Set(Uuid::new_v4()),
        plate_id: Set(plate.id),
        name: Set(plate.name.clone()),
        start_time: Set(None),
        created_at: Set(Utc::now()),
        last_updated: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(|e| e.to_business_error("acquisition"))?;

    info!(plate = %plate.id, run = %run.id, "plate has no runs, synthesized one");

    let plate_wells = wells::Entity::find()
        .filter(wells::Column::PlateId.eq(plate.id))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("well"))?;

    for well in plate_wells {
        let samples = well_samples::Entity::find()
            .filter(well_samples::Column::WellId.eq(well.id))
            .all(db)
            .await
            .map_err(|e| e.to_business_error("well_sample"))?;
        for sample in samples {
            let mut active: well_samples::ActiveModel = sample.into();
            active.plate_acquisition_id = Set(Some(run.id));
            active.last_updated = Set(Utc::now());
            active
                .update(db)
                .await
                .map_err(|e| e.to_business_error("well_sample"))?;
        }
    }

    Ok(run)
}

/// Sort the work list per the requested order. Start-time ordering is
/// all-or-nothing: if any run in the list lacks a start time the request is
/// rejected before anything is mutated.
fn order_work_list(mut work_list: WorkList, order_by: RunOrder) -> BusinessResult<WorkList> {
    match order_by {
        RunOrder::PlateAndRunName => {
            work_list.sort_by(|a, b| {
                (a.0.name.as_str(), a.1.name.as_str()).cmp(&(b.0.name.as_str(), b.1.name.as_str()))
            });
        }
        RunOrder::AcquisitionName => {
            work_list.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        }
        RunOrder::AcquisitionStartTime => {
            if work_list.iter().any(|(_, run)| run.start_time.is_none()) {
                return Err(validation_error!(
                    "order_by",
                    "some runs have no acquisition start time"
                ));
            }
            work_list.sort_by_key(|(_, run)| run.start_time);
        }
    }
    Ok(work_list)
}

/// Screen safety: every involved plate (target included) must belong to a
/// screen, and all involved plates must share exactly one.
fn check_same_screen(
    target: &plates::Model,
    work_list: &[(plates::Model, acquisitions::Model)],
) -> BusinessResult<()> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut screens: HashSet<Uuid> = HashSet::new();
    let mut screenless: Vec<Uuid> = Vec::new();

    for plate in work_list
        .iter()
        .map(|(plate, _)| plate)
        .chain(std::iter::once(target))
    {
        if !seen.insert(plate.id) {
            continue;
        }
        match plate.screen_id {
            Some(screen_id) => {
                screens.insert(screen_id);
            }
            None => screenless.push(plate.id),
        }
    }

    if !screenless.is_empty() {
        let ids = screenless
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(business_rule_violation!(
            "same_screen",
            format!("plates {ids} are not part of a screen")
        ));
    }
    if screens.len() > 1 {
        return Err(business_rule_violation!(
            "same_screen",
            "plates belong to different screens"
        ));
    }

    Ok(())
}

/// Rebuild the coordinate index of the target plate's wells from the database.
async fn index_target_wells(
    db: &DatabaseConnection,
    target_plate_id: Uuid,
) -> BusinessResult<WellIndex> {
    let rows = wells::Entity::find()
        .filter(wells::Column::PlateId.eq(target_plate_id))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("well"))?;

    Ok(rows
        .into_iter()
        .map(|well| ((well.row_index, well.column_index), well))
        .collect())
}

/// Create a target well for every source-plate position the target lacks.
async fn create_missing_wells(
    db: &DatabaseConnection,
    target: &plates::Model,
    work_list: &[(plates::Model, acquisitions::Model)],
    well_index: &mut WellIndex,
) -> BusinessResult<usize> {
    let mut created = 0usize;
    let mut seen_plates: HashSet<Uuid> = HashSet::new();

    for (plate, _) in work_list {
        if !seen_plates.insert(plate.id) {
            continue;
        }
        let source_wells = wells::Entity::find()
            .filter(wells::Column::PlateId.eq(plate.id))
            .all(db)
            .await
            .map_err(|e| e.to_business_error("well"))?;

        for well in source_wells {
            let position = (well.row_index, well.column_index);
            if well_index.contains_key(&position) {
                continue;
            }
            let new_well = wells::ActiveModel {
                id: Set(Uuid::new_v4()),
                plate_id: Set(target.id),
                row_index: Set(well.row_index),
                column_index: Set(well.column_index),
                created_at: Set(Utc::now()),
                last_updated: Set(Utc::now()),
            }
            .insert(db)
            .await
            .map_err(|e| e.to_business_error("well"))?;

            info!(
                plate = %target.id,
                "created well {}",
                position_label(new_well.row_index, new_well.column_index)
            );
            well_index.insert(position, new_well);
            created += 1;
        }
    }

    Ok(created)
}

/// Re-point one run's well samples from the source plate's wells to the
/// positionally matching target wells. Returns the number of samples moved.
async fn fold_run(
    db: &DatabaseConnection,
    source_plate: &plates::Model,
    run: &acquisitions::Model,
    well_index: &WellIndex,
) -> BusinessResult<usize> {
    let source_wells = wells::Entity::find()
        .filter(wells::Column::PlateId.eq(source_plate.id))
        .all(db)
        .await
        .map_err(|e| e.to_business_error("well"))?;

    let mut migrated = 0usize;
    for well in source_wells {
        // Every source position was indexed (or created) before folding began
        let Some(target_well) = well_index.get(&(well.row_index, well.column_index)) else {
            continue;
        };

        let samples = well_samples::Entity::find()
            .filter(well_samples::Column::WellId.eq(well.id))
            .filter(well_samples::Column::PlateAcquisitionId.eq(run.id))
            .all(db)
            .await
            .map_err(|e| e.to_business_error("well_sample"))?;

        for sample in samples {
            let mut active: well_samples::ActiveModel = sample.into();
            active.well_id = Set(target_well.id);
            active.last_updated = Set(Utc::now());
            active
                .update(db)
                .await
                .map_err(|e| e.to_business_error("well_sample"))?;
            migrated += 1;
        }
    }

    Ok(migrated)
}

fn summary_message(images: usize, runs: usize, target_plate_id: Uuid, wells_created: usize) -> String {
    let mut message =
        format!("{images} Images from {runs} Runs merged into Plate:{target_plate_id}.");
    if wells_created > 0 {
        use std::fmt::Write;
        let _ = write!(message, " {wells_created} Wells created.");
    }
    message
}
