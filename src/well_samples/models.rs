use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "well_samples")]
#[crudcrate(
    generate_router,
    api_struct = "WellSample",
    name_singular = "well_sample",
    name_plural = "well_samples",
    description = "One imaging acquisition placed within a well, optionally associated with the plate acquisition (run) it was captured in.",
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub well_id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub plate_acquisition_id: Option<Uuid>,
    #[crudcrate(sortable, filterable, fulltext)]
    pub image_name: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable, list_model=false)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable, list_model=false)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::wells::models::Entity",
        from = "Column::WellId",
        to = "crate::wells::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Wells,
    #[sea_orm(
        belongs_to = "crate::acquisitions::models::Entity",
        from = "Column::PlateAcquisitionId",
        to = "crate::acquisitions::models::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Acquisitions,
}

impl Related<crate::wells::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wells.def()
    }
}

impl Related<crate::acquisitions::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Acquisitions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
