use anyhow::Result;
use chrono::{TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{device, monthly_budget, setting, transaction, transaction::TransactionKind};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, trace};

use crate::config;

const DEMO_DEVICE_ID: &str = "demo-phone";
const DEMO_USERNAME: &str = "dev_user";

const WITHDRAW_NAMES: &[&str] = &[
    "Groceries",
    "Fuel",
    "Restaurant",
    "Coffee",
    "Pharmacy",
    "Public transport",
    "Streaming",
    "Hardware store",
];

const DEPOSIT_NAMES: &[&str] = &["Refund", "Sold item", "Cashback"];

/// Populate the database with a year of plausible demo data: one device,
/// twelve monthly budgets counting back from the current month, and a
/// spread of random transactions inside each month.
pub async fn seed_demo_data(database_url: &str) -> Result<()> {
    trace!("Entering seed_demo_data function");
    info!("Seeding demo data");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;

    // Settings: default budget plus the API key (generated if absent)
    if setting::Entity::find()
        .filter(setting::Column::Key.eq(compute::DEFAULT_BUDGET_SETTING))
        .one(&db)
        .await?
        .is_none()
    {
        setting::ActiveModel {
            key: Set(compute::DEFAULT_BUDGET_SETTING.to_string()),
            value: Set("1000".to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }
    let key = config::api_key(&db).await?;
    info!("API key: {}", key);

    // Demo device
    if device::Entity::find()
        .filter(device::Column::DeviceId.eq(DEMO_DEVICE_ID))
        .one(&db)
        .await?
        .is_none()
    {
        let now = Utc::now();
        device::ActiveModel {
            device_id: Set(DEMO_DEVICE_ID.to_string()),
            username: Set(DEMO_USERNAME.to_string()),
            device_name: Set("Demo Phone".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        info!("Demo device '{}' created", DEMO_DEVICE_ID);
    }

    let mut rng = rand::thread_rng();
    let mut month_key = Utc::now().format("%Y-%m").to_string();
    let mut transaction_count = 0u32;

    for _ in 0..12 {
        let (year, month) = compute::month::parse_month_key(&month_key)?;

        if monthly_budget::Entity::find()
            .filter(monthly_budget::Column::MonthYear.eq(month_key.as_str()))
            .one(&db)
            .await?
            .is_none()
        {
            let now = Utc::now();
            // Budget between 800.00 and 1500.00
            let amount = Decimal::new(rng.gen_range(80000..=150000), 2);
            monthly_budget::ActiveModel {
                month_year: Set(month_key.clone()),
                budget_amount: Set(amount),
                rollover_enabled: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&db)
            .await?;
            debug!("Budget {} seeded with {}", month_key, amount);
        }

        for _ in 0..rng.gen_range(8..=16) {
            let withdraw = rng.gen_bool(0.7);
            let (kind, names) = if withdraw {
                (TransactionKind::Withdraw, WITHDRAW_NAMES)
            } else {
                (TransactionKind::Deposit, DEPOSIT_NAMES)
            };
            let name = names[rng.gen_range(0..names.len())];
            // Between 1.00 and 150.00
            let amount = Decimal::new(rng.gen_range(100..=15000), 2);
            let timestamp = Utc
                .with_ymd_and_hms(
                    year,
                    month,
                    rng.gen_range(1..=28),
                    rng.gen_range(0..24),
                    rng.gen_range(0..60),
                    0,
                )
                .single()
                .ok_or_else(|| anyhow::anyhow!("seeded timestamp out of range"))?;

            let now = Utc::now();
            transaction::ActiveModel {
                device_id: Set(DEMO_DEVICE_ID.to_string()),
                name: Set(name.to_string()),
                amount: Set(amount),
                kind: Set(kind),
                timestamp: Set(timestamp),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&db)
            .await?;
            transaction_count += 1;
        }

        month_key = compute::month::previous_month(&month_key)?;
    }

    info!(
        "Demo data seeded: 12 budget months, {} transactions",
        transaction_count
    );
    Ok(())
}
