use std::sync::Arc;

use ledger::{Action, Authorizer, Ledger, Scope};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use settings::Database;

mod settings;

/// Permission oracle of a standalone deployment: every user may create
/// transactions, nobody is privileged. Changes then follow the author and
/// age rules only.
struct AuthorsOnly;

impl Authorizer for AuthorsOnly {
    fn can_perform(&self, _actor: i64, action: Action, _scope: Scope<'_>) -> bool {
        matches!(action, Action::Create(_))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bars_ledger={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let ledger = Ledger::builder()
        .database(db)
        .authorizer(Arc::new(AuthorsOnly))
        .default_cancel_threshold_hours(settings.ledger.default_cancel_threshold_hours)
        .build()
        .await?;

    audit(&ledger).await?;
    tracing::info!("ledger ready");
    Ok(())
}

/// Report every stored transaction whose operations do not match its kind.
async fn audit(ledger: &Ledger) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    for bar in ledger.bars().await? {
        let failing = ledger.integrity_report(bar.id).await?;
        if failing.is_empty() {
            tracing::info!(bar = bar.id, name = %bar.name, "integrity audit passed");
        } else {
            for transaction in failing {
                tracing::warn!(bar = bar.id, %transaction, "transaction fails integrity check");
            }
        }
    }
    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
