mod common;

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};

use common::{AllowAll, ReadOnly, at, ledger_with_db, new_ledger};
use ledger::{
    AccountRatio, CreateTransactionCmd, InventoryLine, ItemQty, ItemQtyPrice, Ledger, LedgerError,
    Target, TransactionDetails, TransactionRequest,
};

struct Bar {
    id: i64,
}

async fn bar(ledger: &Ledger) -> Bar {
    let bar = ledger.new_bar("Kfet", None).await.unwrap();
    Bar { id: bar.id }
}

async fn exec(db: &DatabaseConnection, sql: &str, id: uuid::Uuid) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        sql,
        vec![id.to_string().into()],
    ))
    .await?;
    Ok(())
}

fn buy(bar: &Bar, author: i64, item: i64, qty: f64) -> CreateTransactionCmd {
    CreateTransactionCmd::new(bar.id, author, TransactionRequest::Buy { item, qty })
}

#[tokio::test]
async fn buy_debits_buyer_and_removes_stock() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 10.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 5.0, 2.0, 1.0).await.unwrap();

    let tx = ledger
        .create_transaction(buy(&bar, 1, item.id, 2.0))
        .await
        .unwrap();

    assert_eq!(ledger.item(item.id).await.unwrap().qty, 3.0);
    assert_eq!(ledger.account(account.id).await.unwrap().money, 6.0);

    let view = ledger.view_transaction(tx.id).await.unwrap();
    assert_eq!(view.moneyflow, 4.0);
    assert_eq!(view.author_account, Some(account.id));
    assert!(!view.canceled);
    assert_eq!(
        view.details,
        TransactionDetails::Buy {
            item: item.id,
            qty: 2.0
        }
    );
    assert!(ledger.check_integrity(tx.id).await.unwrap());
}

#[tokio::test]
async fn give_then_cancel_restores_both_accounts() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let alice = ledger.new_account(bar.id, 1, 10.0).await.unwrap();
    let bob = ledger.new_account(bar.id, 2, 0.0).await.unwrap();

    let tx = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Give {
                account: bob.id,
                amount: 4.0,
            },
        ))
        .await
        .unwrap();
    assert_eq!(ledger.balance(Target::account(alice.id)).await.unwrap(), 6.0);
    assert_eq!(ledger.balance(Target::account(bob.id)).await.unwrap(), 4.0);

    let view = ledger.view_transaction(tx.id).await.unwrap();
    assert_eq!(
        view.details,
        TransactionDetails::Give {
            account: bob.id,
            amount: 4.0
        }
    );
    assert_eq!(view.moneyflow, 4.0);

    let canceled = ledger
        .cancel_transaction(tx.id, 1, tx.timestamp)
        .await
        .unwrap();
    assert!(canceled.canceled);
    assert_eq!(ledger.balance(Target::account(alice.id)).await.unwrap(), 10.0);
    assert_eq!(ledger.balance(Target::account(bob.id)).await.unwrap(), 0.0);
}

#[tokio::test]
async fn meal_splits_cost_by_ratio() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let alice = ledger.new_account(bar.id, 1, 50.0).await.unwrap();
    let bob = ledger.new_account(bar.id, 2, 50.0).await.unwrap();
    let pasta = ledger.new_item(bar.id, "pasta", 10.0, 5.0, 3.0).await.unwrap();
    let sauce = ledger.new_item(bar.id, "sauce", 10.0, 4.0, 2.0).await.unwrap();

    let tx = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            3,
            TransactionRequest::Meal {
                items: vec![
                    ItemQty {
                        item: pasta.id,
                        qty: 2.0,
                    },
                    ItemQty {
                        item: sauce.id,
                        qty: 5.0,
                    },
                ],
                accounts: vec![
                    AccountRatio {
                        account: alice.id,
                        ratio: 1.0,
                    },
                    AccountRatio {
                        account: bob.id,
                        ratio: 2.0,
                    },
                ],
                name: "friday dinner".to_string(),
            },
        ))
        .await
        .unwrap();

    assert_eq!(ledger.account(alice.id).await.unwrap().money, 40.0);
    assert_eq!(ledger.account(bob.id).await.unwrap().money, 30.0);
    assert_eq!(ledger.item(pasta.id).await.unwrap().qty, 8.0);
    assert_eq!(ledger.item(sauce.id).await.unwrap().qty, 5.0);

    let view = ledger.view_transaction(tx.id).await.unwrap();
    assert_eq!(view.moneyflow, 30.0);
    assert_eq!(view.author_account, None);
    match view.details {
        TransactionDetails::Meal {
            items,
            accounts,
            name,
        } => {
            assert_eq!(name, "friday dinner");
            assert_eq!(items.len(), 2);
            assert_eq!(accounts[0].account, alice.id);
            assert_eq!(accounts[1].account, bob.id);
            assert!(accounts[1].ratio > accounts[0].ratio);
        }
        other => panic!("unexpected details: {other:?}"),
    }
}

#[tokio::test]
async fn canceling_a_middle_buy_rewrites_the_rest_of_the_chain() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 100.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 100.0, 1.0, 0.5).await.unwrap();

    let mut ids = Vec::new();
    for (minute, qty) in [(0, 10.0), (1, 20.0), (2, 30.0)] {
        let tx = ledger
            .create_transaction(buy(&bar, 1, item.id, qty).timestamp(at(minute)))
            .await
            .unwrap();
        ids.push(tx.id);
    }
    let target = Target::account(account.id);
    let nexts: Vec<f64> = ledger
        .target_history(target)
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.operation.next_value)
        .collect();
    assert_eq!(nexts, vec![90.0, 70.0, 40.0]);

    ledger
        .cancel_transaction(ids[1], 1, at(3))
        .await
        .unwrap();

    assert_eq!(ledger.balance(target).await.unwrap(), 60.0);
    let history = ledger.target_history(target).await.unwrap();
    assert!(history[1].canceled);
    assert_eq!(history[2].operation.prev_value, 90.0);
    assert_eq!(history[2].operation.next_value, 60.0);
    assert_eq!(ledger.balance(Target::item(item.id)).await.unwrap(), 60.0);
}

#[tokio::test]
async fn cancel_then_restore_is_a_no_op_on_every_chain() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 100.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 100.0, 1.5, 0.5).await.unwrap();

    let mut ids = Vec::new();
    for (minute, qty) in [(0, 1.0), (5, 3.0), (10, 2.0), (15, 7.0)] {
        let tx = ledger
            .create_transaction(buy(&bar, 1, item.id, qty).timestamp(at(minute)))
            .await
            .unwrap();
        ids.push(tx.id);
    }
    let targets = [Target::account(account.id), Target::item(item.id)];
    let mut before = Vec::new();
    for target in targets {
        before.push((
            ledger.balance(target).await.unwrap(),
            ledger.target_history(target).await.unwrap(),
        ));
    }

    ledger.cancel_transaction(ids[1], 1, at(20)).await.unwrap();
    assert_ne!(ledger.balance(targets[0]).await.unwrap(), before[0].0);
    ledger.restore_transaction(ids[1], 1, at(21)).await.unwrap();

    for (target, (balance, history)) in targets.into_iter().zip(before) {
        assert_eq!(ledger.balance(target).await.unwrap(), balance);
        assert_eq!(ledger.target_history(target).await.unwrap(), history);
        assert!(ledger.replay_target(target).await.unwrap().is_consistent());
    }
}

#[tokio::test]
async fn canceled_transaction_stays_canceled_when_canceled_twice() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 10.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 5.0, 2.0, 1.0).await.unwrap();
    let tx = ledger
        .create_transaction(buy(&bar, 1, item.id, 1.0).timestamp(at(0)))
        .await
        .unwrap();

    ledger.cancel_transaction(tx.id, 1, at(1)).await.unwrap();
    let again = ledger.cancel_transaction(tx.id, 1, at(2)).await.unwrap();

    assert!(again.canceled);
    assert_eq!(again.last_modified, at(2));
    assert_eq!(ledger.account(account.id).await.unwrap().money, 10.0);
    assert_eq!(ledger.item(item.id).await.unwrap().qty, 5.0);
}

#[tokio::test]
async fn inventory_count_survives_cancel_of_an_earlier_buy() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    ledger.new_account(bar.id, 1, 100.0).await.unwrap();
    let item = ledger.new_item(bar.id, "crisps", 10.0, 1.0, 0.5).await.unwrap();

    let bought = ledger
        .create_transaction(buy(&bar, 1, item.id, 2.0).timestamp(at(0)))
        .await
        .unwrap();
    let counted = ledger
        .create_transaction(
            CreateTransactionCmd::new(
                bar.id,
                1,
                TransactionRequest::Inventory {
                    items: vec![ItemQty {
                        item: item.id,
                        qty: 5.0,
                    }],
                },
            )
            .timestamp(at(1)),
        )
        .await
        .unwrap();
    assert_eq!(ledger.item(item.id).await.unwrap().qty, 5.0);

    ledger.cancel_transaction(bought.id, 1, at(2)).await.unwrap();

    assert_eq!(ledger.item(item.id).await.unwrap().qty, 5.0);
    let view = ledger.view_transaction(counted.id).await.unwrap();
    assert_eq!(
        view.details,
        TransactionDetails::Inventory {
            items: vec![InventoryLine {
                item: item.id,
                qty: 5.0,
                delta: -5.0
            }]
        }
    );
    assert_eq!(view.moneyflow, -5.0);
}

#[tokio::test]
async fn appro_restocks_and_updates_buy_price() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let soda = ledger.new_item(bar.id, "soda", 2.0, 1.0, 0.4).await.unwrap();
    let chips = ledger.new_item(bar.id, "chips", 0.0, 1.0, 0.3).await.unwrap();

    let tx = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Appro {
                items: vec![
                    ItemQtyPrice {
                        item: soda.id,
                        qty: 4.0,
                        price: Some(10.0),
                    },
                    ItemQtyPrice {
                        item: chips.id,
                        qty: 10.0,
                        price: None,
                    },
                ],
            },
        ))
        .await
        .unwrap();

    let soda = ledger.item(soda.id).await.unwrap();
    assert_eq!(soda.qty, 6.0);
    assert_eq!(soda.buy_price, 2.5);
    let chips = ledger.item(chips.id).await.unwrap();
    assert_eq!(chips.qty, 10.0);
    assert_eq!(chips.buy_price, 0.3);

    let view = ledger.view_transaction(tx.id).await.unwrap();
    assert_eq!(view.moneyflow, 4.0 * 2.5 + 10.0 * 0.3);
}

#[tokio::test]
async fn throw_and_punish_views_report_their_moneyflow() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 2, 20.0).await.unwrap();
    let item = ledger.new_item(bar.id, "milk", 6.0, 1.5, 1.0).await.unwrap();

    let thrown = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Throw {
                item: item.id,
                qty: 2.0,
            },
        ))
        .await
        .unwrap();
    let view = ledger.view_transaction(thrown.id).await.unwrap();
    assert_eq!(view.moneyflow, -3.0);
    assert_eq!(ledger.item(item.id).await.unwrap().qty, 4.0);

    let punished = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Punish {
                account: account.id,
                amount: 5.0,
                motive: "  broke a glass ".to_string(),
            },
        ))
        .await
        .unwrap();
    let view = ledger.view_transaction(punished.id).await.unwrap();
    assert_eq!(
        view.details,
        TransactionDetails::Punish {
            account: account.id,
            amount: -5.0,
            motive: "broke a glass".to_string()
        }
    );
    assert_eq!(view.moneyflow, -5.0);
    assert_eq!(ledger.account(account.id).await.unwrap().money, 15.0);
}

#[tokio::test]
async fn backdated_buy_starts_from_the_chain_value_at_its_position() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 100.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 50.0, 1.0, 0.5).await.unwrap();

    ledger
        .create_transaction(buy(&bar, 1, item.id, 10.0).timestamp(at(0)))
        .await
        .unwrap();
    ledger
        .create_transaction(buy(&bar, 1, item.id, 30.0).timestamp(at(10)))
        .await
        .unwrap();
    ledger
        .create_transaction(buy(&bar, 1, item.id, 5.0).timestamp(at(5)))
        .await
        .unwrap();

    let target = Target::account(account.id);
    let history = ledger.target_history(target).await.unwrap();
    let chain: Vec<(f64, f64)> = history
        .iter()
        .map(|entry| (entry.operation.prev_value, entry.operation.next_value))
        .collect();
    assert_eq!(chain, vec![(100.0, 90.0), (90.0, 85.0), (85.0, 55.0)]);
    assert_eq!(ledger.balance(target).await.unwrap(), 55.0);
    assert_eq!(ledger.balance(Target::item(item.id)).await.unwrap(), 5.0);
    assert!(ledger.replay_target(target).await.unwrap().is_consistent());
}

#[tokio::test]
async fn backdated_before_every_operation_takes_the_opening_balance() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 100.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 50.0, 1.0, 0.5).await.unwrap();

    ledger
        .create_transaction(buy(&bar, 1, item.id, 10.0).timestamp(at(10)))
        .await
        .unwrap();
    ledger
        .create_transaction(buy(&bar, 1, item.id, 1.0).timestamp(at(0)))
        .await
        .unwrap();

    let history = ledger
        .target_history(Target::account(account.id))
        .await
        .unwrap();
    assert_eq!(history[0].operation.prev_value, 100.0);
    assert_eq!(history[0].operation.next_value, 99.0);
    assert_eq!(history[1].operation.prev_value, 99.0);
    assert_eq!(ledger.account(account.id).await.unwrap().money, 89.0);
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_any_write() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 10.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 5.0, 2.0, 1.0).await.unwrap();

    let err = ledger
        .create_transaction(buy(&bar, 1, item.id, 0.0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation {
            field: "qty".to_string(),
            message: "must be positive".to_string()
        }
    );

    let err = ledger
        .create_transaction(buy(&bar, 1, 999, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "item"));

    let err = ledger
        .create_transaction(buy(&bar, 2, item.id, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "author"));

    let err = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Give {
                account: account.id,
                amount: 1.0,
            },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "account"));

    let err = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Meal {
                items: vec![ItemQty {
                    item: item.id,
                    qty: 1.0,
                }],
                accounts: vec![AccountRatio {
                    account: account.id,
                    ratio: -1.0,
                }],
                name: String::new(),
            },
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation {
            field: "accounts[0].ratio".to_string(),
            message: "must be positive".to_string()
        }
    );

    assert_eq!(ledger.account(account.id).await.unwrap().money, 10.0);
    assert_eq!(ledger.item(item.id).await.unwrap().qty, 5.0);
    assert!(
        ledger
            .target_history(Target::item(item.id))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn items_of_another_bar_are_not_resolved() {
    let ledger = new_ledger().await;
    let kfet = bar(&ledger).await;
    let other = ledger.new_bar("Foyer", Some(24)).await.unwrap();
    ledger.new_account(kfet.id, 1, 10.0).await.unwrap();
    let foreign = ledger.new_item(other.id, "wine", 3.0, 4.0, 2.0).await.unwrap();

    let err = ledger
        .create_transaction(buy(&kfet, 1, foreign.id, 1.0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation {
            field: "item".to_string(),
            message: format!("item {} does not exist", foreign.id)
        }
    );
}

#[tokio::test]
async fn unauthorized_creation_has_no_side_effects() {
    let (ledger, _db) = ledger_with_db(Arc::new(ReadOnly)).await;
    let bar = bar(&ledger).await;
    let account = ledger.new_account(bar.id, 1, 10.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 5.0, 2.0, 1.0).await.unwrap();

    let err = ledger
        .create_transaction(buy(&bar, 1, item.id, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    // Validation still comes first.
    let err = ledger
        .create_transaction(buy(&bar, 1, item.id, -1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    assert_eq!(ledger.account(account.id).await.unwrap().money, 10.0);
    assert_eq!(ledger.item(item.id).await.unwrap().qty, 5.0);
}

#[tokio::test]
async fn unknown_transactions_and_targets_are_not_found() {
    let ledger = new_ledger().await;
    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        ledger.cancel_transaction(missing, 1, at(0)).await,
        Err(LedgerError::KeyNotFound(_))
    ));
    assert!(matches!(
        ledger.view_transaction(missing).await,
        Err(LedgerError::KeyNotFound(_))
    ));
    assert!(matches!(
        ledger.target_history(Target::item(42)).await,
        Err(LedgerError::KeyNotFound(_))
    ));
    assert!(matches!(
        ledger.new_account(42, 1, 0.0).await,
        Err(LedgerError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn one_account_per_owner_and_bar() {
    let ledger = new_ledger().await;
    let bar = bar(&ledger).await;
    ledger.new_account(bar.id, 1, 0.0).await.unwrap();
    let err = ledger.new_account(bar.id, 1, 5.0).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "owner"));
}

#[tokio::test]
async fn check_integrity_flags_tampered_transactions() {
    let (ledger, db) = ledger_with_db(Arc::new(AllowAll)).await;
    let bar = bar(&ledger).await;
    let alice = ledger.new_account(bar.id, 1, 100.0).await.unwrap();
    let bob = ledger.new_account(bar.id, 2, 0.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 50.0, 1.0, 0.5).await.unwrap();

    let bought = ledger
        .create_transaction(buy(&bar, 1, item.id, 1.0))
        .await
        .unwrap();
    let doubled = ledger
        .create_transaction(buy(&bar, 1, item.id, 1.0))
        .await
        .unwrap();
    let given = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Give {
                account: bob.id,
                amount: 1.0,
            },
        ))
        .await
        .unwrap();
    let meal = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Meal {
                items: vec![ItemQty {
                    item: item.id,
                    qty: 1.0,
                }],
                accounts: vec![AccountRatio {
                    account: alice.id,
                    ratio: 1.0,
                }],
                name: "lunch".to_string(),
            },
        ))
        .await
        .unwrap();
    let intact = ledger
        .create_transaction(buy(&bar, 1, item.id, 1.0))
        .await
        .unwrap();
    assert!(ledger.integrity_report(bar.id).await.unwrap().is_empty());

    exec(
        &db,
        "DELETE FROM operations WHERE transaction_id = ? AND target_kind = 'item'",
        bought.id,
    )
    .await
    .unwrap();
    exec(
        &db,
        "INSERT INTO operations (transaction_id, target_kind, target_id, fixed, delta, prev_value, next_value) \
         SELECT transaction_id, target_kind, target_id, fixed, delta, prev_value, next_value \
         FROM operations WHERE transaction_id = ? AND target_kind = 'item'",
        doubled.id,
    )
    .await
    .unwrap();
    exec(
        &db,
        "DELETE FROM operations WHERE id = (SELECT MAX(id) FROM operations WHERE transaction_id = ?)",
        given.id,
    )
    .await
    .unwrap();
    exec(
        &db,
        "DELETE FROM transaction_data WHERE transaction_id = ?",
        meal.id,
    )
    .await
    .unwrap();

    assert!(!ledger.check_integrity(bought.id).await.unwrap());
    assert!(!ledger.check_integrity(doubled.id).await.unwrap());
    assert!(!ledger.check_integrity(given.id).await.unwrap());
    assert!(!ledger.check_integrity(meal.id).await.unwrap());
    assert!(ledger.check_integrity(intact.id).await.unwrap());

    let mut report = ledger.integrity_report(bar.id).await.unwrap();
    report.sort();
    let mut expected = vec![bought.id, doubled.id, given.id, meal.id];
    expected.sort();
    assert_eq!(report, expected);
}

#[tokio::test]
async fn integrity_report_handles_bars_with_many_transactions() {
    let (ledger, db) = ledger_with_db(Arc::new(AllowAll)).await;
    let bar = bar(&ledger).await;
    let item = ledger.new_item(bar.id, "beer", 10.0, 2.0, 1.0).await.unwrap();
    let seed = ledger
        .create_transaction(CreateTransactionCmd::new(
            bar.id,
            1,
            TransactionRequest::Throw {
                item: item.id,
                qty: 1.0,
            },
        ))
        .await
        .unwrap();

    // More transactions than SQLite accepts bound parameters in one statement.
    exec(
        &db,
        "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 260000) \
         INSERT INTO transactions (id, bar_id, author_id, kind, timestamp, last_modified, canceled) \
         SELECT printf('00000000-0000-4000-8000-%012d', n.i), t.bar_id, t.author_id, t.kind, \
                t.timestamp, t.last_modified, t.canceled \
         FROM n, transactions t WHERE t.id = ?",
        seed.id,
    )
    .await
    .unwrap();
    exec(
        &db,
        "INSERT INTO operations (transaction_id, target_kind, target_id, fixed, delta, prev_value, next_value) \
         SELECT t.id, o.target_kind, o.target_id, o.fixed, o.delta, o.prev_value, o.next_value \
         FROM transactions t, operations o \
         WHERE o.transaction_id = ? AND t.id <> o.transaction_id",
        seed.id,
    )
    .await
    .unwrap();
    assert!(ledger.integrity_report(bar.id).await.unwrap().is_empty());

    let broken = uuid::Uuid::parse_str("00000000-0000-4000-8000-000000123456").unwrap();
    exec(&db, "DELETE FROM operations WHERE transaction_id = ?", broken)
        .await
        .unwrap();
    assert_eq!(ledger.integrity_report(bar.id).await.unwrap(), vec![broken]);
}

#[tokio::test]
async fn concurrent_buys_on_one_account_serialize() {
    let ledger = Arc::new(new_ledger().await);
    let bar = ledger.new_bar("Kfet", None).await.unwrap();
    let account = ledger.new_account(bar.id, 1, 100.0).await.unwrap();
    let item = ledger.new_item(bar.id, "beer", 100.0, 1.0, 0.5).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = Arc::clone(&ledger);
        let bar_id = bar.id;
        let item_id = item.id;
        handles.push(tokio::spawn(async move {
            ledger
                .create_transaction(CreateTransactionCmd::new(
                    bar_id,
                    1,
                    TransactionRequest::Buy {
                        item: item_id,
                        qty: 1.0,
                    },
                ))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.account(account.id).await.unwrap().money, 80.0);
    assert_eq!(ledger.item(item.id).await.unwrap().qty, 80.0);
    let report = ledger
        .replay_target(Target::account(account.id))
        .await
        .unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.opening_balance, 100.0);
}

#[tokio::test]
async fn builder_requires_an_authorizer() {
    let err = Ledger::builder().build().await.unwrap_err();
    assert!(matches!(err, LedgerError::Config(_)));
}
