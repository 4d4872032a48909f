use sea_orm_migration::prelude::*;

/// Creates the `game_move` table: the append-only move log.
///
/// `(session_id, move_no)` is unique; move numbers are assigned under the
/// session row lock.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum GameMove {
    Table,
    Id,
    SessionId,
    PlayerId,
    Row,
    Col,
    MoveNo,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Session {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameMove::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameMove::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameMove::SessionId).uuid().not_null())
                    .col(ColumnDef::new(GameMove::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(GameMove::Row).integer().not_null())
                    .col(ColumnDef::new(GameMove::Col).integer().not_null())
                    .col(ColumnDef::new(GameMove::MoveNo).integer().not_null())
                    .col(
                        ColumnDef::new(GameMove::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_move_session_id")
                            .from(GameMove::Table, GameMove::SessionId)
                            .to(Session::Table, Session::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_move_player_id")
                            .from(GameMove::Table, GameMove::PlayerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_move_session_id")
                    .table(GameMove::Table)
                    .col(GameMove::SessionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_move_session_move_no")
                    .table(GameMove::Table)
                    .col(GameMove::SessionId)
                    .col(GameMove::MoveNo)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameMove::Table).to_owned())
            .await
    }
}
