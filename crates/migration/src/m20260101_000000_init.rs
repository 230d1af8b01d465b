//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for the bars ledger:
//!
//! - `bars`: the bar a transaction belongs to, with its cancel threshold
//! - `accounts`: per-bar user accounts holding `money`
//! - `items`: per-bar stock items holding `qty`
//! - `transactions`: typed ledger events
//! - `transaction_data`: label/value rows attached to a transaction
//! - `operations`: elementary balance changes (item or account target)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Bars {
    Table,
    Id,
    Name,
    TransactionCancelThreshold,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    BarId,
    OwnerId,
    Money,
}

#[derive(Iden)]
enum Items {
    Table,
    Id,
    BarId,
    Name,
    Qty,
    Price,
    BuyPrice,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    BarId,
    AuthorId,
    Kind,
    Timestamp,
    LastModified,
    Canceled,
}

#[derive(Iden)]
enum TransactionData {
    Table,
    Id,
    TransactionId,
    Label,
    Data,
}

#[derive(Iden)]
enum Operations {
    Table,
    Id,
    TransactionId,
    TargetKind,
    TargetId,
    Fixed,
    Delta,
    PrevValue,
    NextValue,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Bars
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bars::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bars::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bars::Name).string().not_null())
                    .col(
                        ColumnDef::new(Bars::TransactionCancelThreshold)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::BarId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::Money).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-bar_id")
                            .from(Accounts::Table, Accounts::BarId)
                            .to(Bars::Table, Bars::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-bar_id-owner_id")
                    .table(Accounts::Table)
                    .col(Accounts::BarId)
                    .col(Accounts::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::BarId).big_integer().not_null())
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::Qty).double().not_null())
                    .col(ColumnDef::new(Items::Price).double().not_null())
                    .col(ColumnDef::new(Items::BuyPrice).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-bar_id")
                            .from(Items::Table, Items::BarId)
                            .to(Bars::Table, Bars::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::BarId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transactions::AuthorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::LastModified)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Canceled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-bar_id")
                            .from(Transactions::Table, Transactions::BarId)
                            .to(Bars::Table, Bars::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-bar_id-timestamp")
                    .table(Transactions::Table)
                    .col(Transactions::BarId)
                    .col(Transactions::Timestamp)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Transaction data
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TransactionData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionData::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionData::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionData::Label).string().not_null())
                    .col(ColumnDef::new(TransactionData::Data).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_data-transaction_id")
                            .from(TransactionData::Table, TransactionData::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Operations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Operations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Operations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Operations::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Operations::TargetKind).string().not_null())
                    .col(ColumnDef::new(Operations::TargetId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Operations::Fixed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Operations::Delta).double().not_null())
                    .col(ColumnDef::new(Operations::PrevValue).double().not_null())
                    .col(ColumnDef::new(Operations::NextValue).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operations-transaction_id")
                            .from(Operations::Table, Operations::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-operations-transaction_id")
                    .table(Operations::Table)
                    .col(Operations::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-operations-target")
                    .table(Operations::Table)
                    .col(Operations::TargetKind)
                    .col(Operations::TargetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Operations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionData::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bars::Table).to_owned())
            .await?;
        Ok(())
    }
}
