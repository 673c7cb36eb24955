use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use sea_orm::QueryOrder;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "plates")]
#[crudcrate(
    generate_router,
    api_struct = "Plate",
    name_singular = "plate",
    name_plural = "plates",
    description = "A plate is a container of wells in a microscopy experiment record. Plates optionally belong to a screen and are the target and source objects of the run-merge operation.",
    fn_get_one = get_one_plate,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[crudcrate(sortable, filterable)]
    pub screen_id: Option<Uuid>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, create_model = false, update_model = false)]
    pub screen_name: Option<String>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, list_model = false, create_model = false, update_model = false)]
    pub wells: Option<Vec<crate::wells::models::Well>>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, list_model = false, create_model = false, update_model = false)]
    pub acquisitions: Option<Vec<crate::acquisitions::models::Acquisition>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::screens::models::Entity",
        from = "Column::ScreenId",
        to = "crate::screens::models::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Screens,
    #[sea_orm(has_many = "crate::wells::models::Entity")]
    Wells,
    #[sea_orm(has_many = "crate::acquisitions::models::Entity")]
    Acquisitions,
}

impl Related<crate::screens::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Screens.def()
    }
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

/// Custom `get_one` that embeds the plate's wells (in plate-position order),
/// its acquisitions, and the name of its screen
pub async fn get_one_plate(db: &DatabaseConnection, id: Uuid) -> Result<Plate, DbErr> {
    let model = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Plate with id '{id}' not found")))?;

    let wells = crate::wells::models::Entity::find()
        .filter(crate::wells::models::Column::PlateId.eq(id))
        .order_by_asc(crate::wells::models::Column::RowIndex)
        .order_by_asc(crate::wells::models::Column::ColumnIndex)
        .all(db)
        .await?;

    let acquisitions = crate::acquisitions::models::Entity::find()
        .filter(crate::acquisitions::models::Column::PlateId.eq(id))
        .order_by_asc(crate::acquisitions::models::Column::Name)
        .all(db)
        .await?;

    let screen_name = if let Some(screen_id) = model.screen_id {
        crate::screens::models::Entity::find_by_id(screen_id)
            .one(db)
            .await?
            .map(|screen| screen.name)
    } else {
        None
    };

    let mut plate: Plate = model.into();
    plate.screen_name = screen_name;
    plate.wells = Some(wells.into_iter().map(std::convert::Into::into).collect());
    plate.acquisitions = Some(
        acquisitions
            .into_iter()
            .map(std::convert::Into::into)
            .collect(),
    );

    Ok(plate)
}
