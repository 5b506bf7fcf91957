use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(255))
                    .col(
                        ColumnDef::new(Users::PasswordHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::EmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::EmailVerificationToken).string_len(64))
                    .col(
                        ColumnDef::new(Users::SubscriptionTier)
                            .string_len(32)
                            .not_null()
                            .default("free"),
                    )
                    .col(ColumnDef::new(Users::SubscriptionStatus).string_len(32))
                    .col(ColumnDef::new(Users::StripeCustomerId).string_len(255))
                    .col(ColumnDef::new(Users::StripeSubscriptionId).string_len(255))
                    .col(ColumnDef::new(Users::SubscriptionEndsAt).timestamp())
                    .col(
                        ColumnDef::new(Users::TwoFactorEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::TwoFactorSecret).string_len(128))
                    .col(ColumnDef::new(Users::PasswordResetToken).string_len(64))
                    .col(ColumnDef::new(Users::PasswordResetExpires).timestamp())
                    .col(ColumnDef::new(Users::LastLogin).timestamp())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 发票事件按订阅ID反查用户
        manager
            .create_index(
                Index::create()
                    .name("idx_users_stripe_subscription_id")
                    .table(Users::Table)
                    .col(Users::StripeSubscriptionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_password_reset_token")
                    .table(Users::Table)
                    .col(Users::PasswordResetToken)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    IsAdmin,
    EmailVerified,
    EmailVerificationToken,
    SubscriptionTier,
    SubscriptionStatus,
    StripeCustomerId,
    StripeSubscriptionId,
    SubscriptionEndsAt,
    TwoFactorEnabled,
    TwoFactorSecret,
    PasswordResetToken,
    PasswordResetExpires,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}
