use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create devices table
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(pk_auto(Devices::Id))
                    .col(string_uniq(Devices::DeviceId))
                    .col(string(Devices::Username))
                    .col(string(Devices::DeviceName))
                    .col(timestamp_with_time_zone(Devices::CreatedAt))
                    .col(timestamp_with_time_zone(Devices::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create transactions table. No foreign key to devices: the
        // reference is loose and nothing cascades.
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(string(Transactions::DeviceId))
                    .col(string(Transactions::Name))
                    .col(decimal_len(Transactions::Amount, 16, 4))
                    .col(string_len(Transactions::Kind, 8))
                    .col(timestamp_with_time_zone(Transactions::Timestamp))
                    .col(timestamp_with_time_zone(Transactions::CreatedAt))
                    .col(timestamp_with_time_zone(Transactions::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_device_id")
                    .table(Transactions::Table)
                    .col(Transactions::DeviceId)
                    .to_owned(),
            )
            .await?;

        // Month filtering and rollover both range-scan on timestamp.
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_timestamp")
                    .table(Transactions::Table)
                    .col(Transactions::Timestamp)
                    .to_owned(),
            )
            .await?;

        // Create monthly_budgets table
        manager
            .create_table(
                Table::create()
                    .table(MonthlyBudgets::Table)
                    .if_not_exists()
                    .col(pk_auto(MonthlyBudgets::Id))
                    .col(string_uniq(MonthlyBudgets::MonthYear))
                    .col(decimal_len(MonthlyBudgets::BudgetAmount, 16, 4))
                    .col(boolean(MonthlyBudgets::RolloverEnabled).default(true))
                    .col(timestamp_with_time_zone(MonthlyBudgets::CreatedAt))
                    .col(timestamp_with_time_zone(MonthlyBudgets::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create settings table
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(pk_auto(Settings::Id))
                    .col(string_uniq(Settings::Key))
                    .col(text(Settings::Value))
                    .col(timestamp_with_time_zone(Settings::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlyBudgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Devices {
    Table,
    Id,
    DeviceId,
    Username,
    DeviceName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    DeviceId,
    Name,
    Amount,
    Kind,
    Timestamp,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MonthlyBudgets {
    Table,
    Id,
    MonthYear,
    BudgetAmount,
    RolloverEnabled,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    Key,
    Value,
    UpdatedAt,
}
