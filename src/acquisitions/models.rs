use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "plate_acquisitions")]
#[crudcrate(
    generate_router,
    api_struct = "Acquisition",
    name_singular = "acquisition",
    name_plural = "acquisitions",
    description = "A plate acquisition (run): a named, optionally time-stamped grouping of well samples captured together, scoped to one plate. Merging moves runs between plates by reassigning this plate pointer.",
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub plate_id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[crudcrate(sortable, filterable)]
    pub start_time: Option<DateTime<Utc>>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable, list_model=false)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable, list_model=false)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::plates::models::Entity",
        from = "Column::PlateId",
        to = "crate::plates::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Plates,
    #[sea_orm(has_many = "crate::well_samples::models::Entity")]
    WellSamples,
}

impl Related<crate::plates::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plates.def()
    }
}

impl Related<crate::well_samples::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WellSamples.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
