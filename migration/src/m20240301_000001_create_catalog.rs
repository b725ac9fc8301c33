use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Director::Table)
                    .if_not_exists()
                    .col(pk_auto(Director::Id))
                    .col(string_uniq(Director::Name))
                    .col(string_null(Director::Nationality))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actor::Table)
                    .if_not_exists()
                    .col(pk_auto(Actor::Id))
                    .col(string_uniq(Actor::Name))
                    .col(string_null(Actor::Nationality))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Film::Table)
                    .if_not_exists()
                    .col(pk_auto(Film::Id))
                    .col(string_uniq(Film::Name))
                    .col(string(Film::Release))
                    .col(string(Film::Genre))
                    .col(text(Film::Description))
                    .col(double(Film::Duration))
                    .col(string_null(Film::ImageUrl))
                    .col(integer_null(Film::DirectorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_director")
                            .from(Film::Table, Film::DirectorId)
                            .to(Director::Table, Director::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_release")
                    .table(Film::Table)
                    .col(Film::Release)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmCast::Table)
                    .if_not_exists()
                    .col(integer(FilmCast::FilmId))
                    .col(integer(FilmCast::ActorId))
                    .primary_key(Index::create().col(FilmCast::FilmId).col(FilmCast::ActorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_cast_film")
                            .from(FilmCast::Table, FilmCast::FilmId)
                            .to(Film::Table, Film::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_cast_actor")
                            .from(FilmCast::Table, FilmCast::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_cast_actor")
                    .table(FilmCast::Table)
                    .col(FilmCast::ActorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FilmCast::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Film::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Director::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Director {
    Table,
    Id,
    Name,
    Nationality,
}

#[derive(DeriveIden)]
enum Actor {
    Table,
    Id,
    Name,
    Nationality,
}

#[derive(DeriveIden)]
pub(crate) enum Film {
    Table,
    Id,
    Name,
    Release,
    Genre,
    Description,
    Duration,
    ImageUrl,
    DirectorId,
}

#[derive(DeriveIden)]
enum FilmCast {
    Table,
    FilmId,
    ActorId,
}
