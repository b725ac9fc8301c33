use sea_orm::entity::prelude::*;

/// `release` holds an ISO `YYYY-MM-DD` date, so text comparison orders it
/// chronologically.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "film")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub release: String,
    pub genre: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub duration: f64,
    pub image_url: Option<String>,
    pub director_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::director::Entity",
        from = "Column::DirectorId",
        to = "super::director::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Director,
    #[sea_orm(has_many = "super::film_cast::Entity")]
    FilmCast,
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::director::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Director.def()
    }
}

impl Related<super::film_cast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmCast.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        super::film_cast::Relation::Actor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::film_cast::Relation::Film.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
