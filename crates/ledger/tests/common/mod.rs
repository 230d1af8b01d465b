#![allow(dead_code)]

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use ledger::{Action, Authorizer, Ledger, Scope};
use migration::MigratorTrait;

/// Grants everything to everyone.
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can_perform(&self, _actor: i64, _action: Action, _scope: Scope<'_>) -> bool {
        true
    }
}

/// Everyone may create; only staff may change transactions they did not author.
pub struct Staff(pub HashSet<i64>);

impl Authorizer for Staff {
    fn can_perform(&self, actor: i64, action: Action, _scope: Scope<'_>) -> bool {
        match action {
            Action::Create(_) => true,
            Action::ChangeTransaction => self.0.contains(&actor),
        }
    }
}

/// Denies every creation.
pub struct ReadOnly;

impl Authorizer for ReadOnly {
    fn can_perform(&self, _actor: i64, _action: Action, _scope: Scope<'_>) -> bool {
        false
    }
}

pub async fn ledger_with_db(authorizer: Arc<dyn Authorizer>) -> (Ledger, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let ledger = Ledger::builder()
        .database(db.clone())
        .authorizer(authorizer)
        .build()
        .await
        .unwrap();
    (ledger, db)
}

pub async fn new_ledger() -> Ledger {
    ledger_with_db(Arc::new(AllowAll)).await.0
}

/// A fixed instant, `minutes` after a reference date.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap() + Duration::minutes(minutes)
}
