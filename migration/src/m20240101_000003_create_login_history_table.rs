use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoginHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoginHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoginHistory::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(LoginHistory::LoginMethod)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoginHistory::Success).boolean().not_null())
                    .col(ColumnDef::new(LoginHistory::IpAddress).string_len(64))
                    .col(ColumnDef::new(LoginHistory::UserAgent).text())
                    .col(ColumnDef::new(LoginHistory::DeviceInfo).string_len(64))
                    .col(ColumnDef::new(LoginHistory::FailureReason).string_len(255))
                    .col(
                        ColumnDef::new(LoginHistory::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_login_history_user_id")
                            .from(LoginHistory::Table, LoginHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_login_history_user_created")
                    .table(LoginHistory::Table)
                    .col(LoginHistory::UserId)
                    .col(LoginHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoginHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LoginHistory {
    Table,
    Id,
    UserId,
    LoginMethod,
    Success,
    IpAddress,
    UserAgent,
    DeviceInfo,
    FailureReason,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
