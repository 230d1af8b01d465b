use std::{fmt, sync::Arc};

use sea_orm::DatabaseConnection;

use crate::{Authorizer, LedgerError, ResultLedger, locks::TargetLocks};

mod chain;
mod targets;
mod transactions;

/// Cancel threshold of bars created without an explicit one, in hours.
pub const DEFAULT_CANCEL_THRESHOLD_HOURS: i64 = 12;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

pub struct Ledger {
    database: DatabaseConnection,
    authorizer: Arc<dyn Authorizer>,
    locks: TargetLocks,
    default_cancel_threshold_hours: i64,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("database", &self.database)
            .field(
                "default_cancel_threshold_hours",
                &self.default_cancel_threshold_hours,
            )
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }
}

/// The builder for `Ledger`
pub struct LedgerBuilder {
    database: DatabaseConnection,
    authorizer: Option<Arc<dyn Authorizer>>,
    default_cancel_threshold_hours: i64,
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            authorizer: None,
            default_cancel_threshold_hours: DEFAULT_CANCEL_THRESHOLD_HOURS,
        }
    }
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Pass the required permission oracle
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> LedgerBuilder {
        self.authorizer = Some(authorizer);
        self
    }

    /// Cancel threshold given to new bars.
    pub fn default_cancel_threshold_hours(mut self, hours: i64) -> LedgerBuilder {
        self.default_cancel_threshold_hours = hours;
        self
    }

    /// Construct `Ledger`
    pub async fn build(self) -> ResultLedger<Ledger> {
        let authorizer = self
            .authorizer
            .ok_or_else(|| LedgerError::Config("an authorizer is required".to_string()))?;
        if self.default_cancel_threshold_hours < 0 {
            return Err(LedgerError::Config(
                "default cancel threshold must not be negative".to_string(),
            ));
        }
        Ok(Ledger {
            database: self.database,
            authorizer,
            locks: TargetLocks::default(),
            default_cancel_threshold_hours: self.default_cancel_threshold_hours,
        })
    }
}
