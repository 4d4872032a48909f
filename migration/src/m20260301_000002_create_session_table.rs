use sea_orm_migration::prelude::*;

/// Creates the `session` table.
///
/// Host and guest identity is denormalized onto the row (name + icon) so a
/// session projection never needs a user join; the board is a JSON column so
/// the schema stays game-agnostic.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Session {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
    HostId,
    HostName,
    HostIcon,
    GuestId,
    GuestName,
    GuestIcon,
    GameType,
    GameIcon,
    Status,
    CurrentTurn,
    Board,
    Winner,
    Draw,
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
                    .table(Session::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Session::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Session::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Session::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Session::HostId).uuid().not_null())
                    .col(
                        ColumnDef::new(Session::HostName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Session::HostIcon).string().null())
                    .col(ColumnDef::new(Session::GuestId).uuid().null())
                    .col(ColumnDef::new(Session::GuestName).string_len(100).null())
                    .col(ColumnDef::new(Session::GuestIcon).string().null())
                    .col(
                        ColumnDef::new(Session::GameType)
                            .string_len(32)
                            .not_null()
                            .default("tic_tac_toe"),
                    )
                    .col(ColumnDef::new(Session::GameIcon).string().null())
                    .col(
                        ColumnDef::new(Session::Status)
                            .string_len(16)
                            .not_null()
                            .default("WAITING"),
                    )
                    .col(ColumnDef::new(Session::CurrentTurn).uuid().null())
                    .col(ColumnDef::new(Session::Board).json().not_null())
                    .col(ColumnDef::new(Session::Winner).uuid().null())
                    .col(
                        ColumnDef::new(Session::Draw)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_host_id")
                            .from(Session::Table, Session::HostId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_guest_id")
                            .from(Session::Table, Session::GuestId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_session_host_id")
                    .table(Session::Table)
                    .col(Session::HostId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_session_status")
                    .table(Session::Table)
                    .col(Session::Status)
                    .to_owned(),
            )
            .await?;

        // Supports the created_at DESC, id DESC listing order
        manager
            .create_index(
                Index::create()
                    .name("idx_session_created_at")
                    .table(Session::Table)
                    .col(Session::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Session::Table).to_owned())
            .await
    }
}
