use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use ledger::{AccountId, Amount, Ledger, LedgerError};

fn units(n: i64) -> Amount {
    Amount::from_units(n)
}

#[test]
fn concurrent_withdrawals_never_double_spend() {
    let ledger = Arc::new(Ledger::new());
    let account = ledger.create_account("Alice").id().clone();

    // 1000 / 30 = 33 withdrawals can succeed
    let handles: Vec<_> = (0..100)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let account = account.clone();
            thread::spawn(move || ledger.withdraw(&account, units(30)))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 33);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::InsufficientFunds(..)))
    );
    assert_eq!(ledger.balance(&account).unwrap(), units(10));
}

#[test]
fn concurrent_transfers_conserve_funds_and_never_deadlock() {
    let ledger = Arc::new(Ledger::new());
    let accounts: Vec<AccountId> = (0..4)
        .map(|i| ledger.create_account(format!("acct-{i}")).id().clone())
        .collect();
    let total = ledger.total_balance().unwrap();

    // opposite directions on the same pairs
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            let accounts = accounts.clone();
            thread::spawn(move || {
                for step in 0..500 {
                    let from = &accounts[(worker + step) % accounts.len()];
                    let to = &accounts[(worker + step + 1 + worker % 2) % accounts.len()];
                    let _ = ledger.transfer(from, to, Amount::from_scaled(12_345));
                    assert_eq!(ledger.total_balance(), Some(total));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ledger.total_balance(), Some(total));
    for account in ledger.accounts() {
        assert!(!account.balance().is_negative());
    }
}

#[test]
fn concurrent_operations_issue_unique_increasing_ids() {
    let ledger = Arc::new(Ledger::new());
    let a = ledger.create_account("Alice").id().clone();
    let b = ledger.create_account("Bob").id().clone();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                let mut ids = Vec::new();
                for step in 0..200 {
                    let result = match (worker + step) % 4 {
                        0 => ledger.deposit(&a, units(1)),
                        1 => ledger.withdraw(&b, units(1)),
                        2 => ledger.transfer(&a, &b, units(2)),
                        // always fails, must not consume an id
                        _ => ledger.transfer(&a, &a, units(1)),
                    };
                    if let Ok(record) = result {
                        ids.push(record.id());
                    }
                }
                ids
            })
        })
        .collect();

    let mut all_ids = Vec::new();
    for handle in handles {
        let ids = handle.join().unwrap();
        // each caller observes its own ids in increasing order
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        all_ids.extend(ids);
    }

    let unique: HashSet<_> = all_ids.iter().copied().collect();
    assert_eq!(unique.len(), all_ids.len());

    // no gaps: failures consumed nothing
    all_ids.sort_unstable();
    let expected: Vec<u64> = (1..=all_ids.len() as u64).collect();
    assert_eq!(all_ids, expected);
}

#[test]
fn concurrent_account_creation_allocates_distinct_ids() {
    let ledger = Arc::new(Ledger::new());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.create_account(format!("user {i}")).id().clone())
        })
        .collect();
    let ids: HashSet<AccountId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(ids.len(), 16);
    assert_eq!(ledger.accounts().len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tasks_share_the_ledger() {
    let ledger = Arc::new(Ledger::new());
    let account = ledger
        .create_account_with_balance("Alice", units(100))
        .unwrap()
        .id()
        .clone();

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let account = account.clone();
            tokio::spawn(async move { ledger.withdraw(&account, units(7)) })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 14);
    assert_eq!(ledger.balance(&account).unwrap(), units(2));
}
