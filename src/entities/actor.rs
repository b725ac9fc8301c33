use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "actor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub nationality: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::film_cast::Entity")]
    FilmCast,
}

impl Related<super::film_cast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmCast.def()
    }
}

impl Related<super::film::Entity> for Entity {
    fn to() -> RelationDef {
        super::film_cast::Relation::Film.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::film_cast::Relation::Actor.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
