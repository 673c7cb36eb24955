use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "wells")]
#[crudcrate(
    generate_router,
    api_struct = "Well",
    name_singular = "well",
    name_plural = "wells",
    description = "A single addressable (row, column) position on a plate. Positions are unique per plate; the merge operation creates wells in the target plate on demand and never deletes them.",
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub plate_id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub row_index: i32,
    #[crudcrate(sortable, filterable)]
    pub column_index: i32,
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

/// Render a 0-based (row, column) position as its plate label, e.g. (0, 0) -> "A1".
/// Rows past "Z" continue with double letters ("AA1"), as on large-format plates.
#[must_use]
pub fn position_label(row_index: i32, column_index: i32) -> String {
    let mut row = row_index;
    let mut letters = String::new();
    loop {
        let letter = u8::try_from(row.rem_euclid(26)).unwrap_or(0);
        letters.insert(0, char::from(b'A' + letter));
        row = row / 26 - 1;
        if row < 0 {
            break;
        }
    }
    format!("{letters}{}", column_index + 1)
}

#[cfg(test)]
mod tests {
    use super::position_label;

    #[test]
    fn first_position_is_a1() {
        assert_eq!(position_label(0, 0), "A1");
    }

    #[test]
    fn rows_map_to_letters_and_columns_are_one_based() {
        assert_eq!(position_label(1, 0), "B1");
        assert_eq!(position_label(7, 11), "H12");
        assert_eq!(position_label(25, 3), "Z4");
    }

    #[test]
    fn rows_past_z_use_double_letters() {
        assert_eq!(position_label(26, 0), "AA1");
        assert_eq!(position_label(27, 47), "AB48");
    }
}
