mod common;

use common::{backends, numbered_payment, ordered_id};
use papi_core::{PaymentRepository, RepoError};
use std::sync::Arc;
use std::thread;

const WRITERS: u128 = 4;
const PER_WRITER: u128 = 25;

#[test]
fn parallel_writers_on_distinct_ids_all_land() {
    for (backend, repo) in backends() {
        let repo: Arc<dyn PaymentRepository> = Arc::from(repo);

        let handles = (0..WRITERS)
            .map(|writer| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    for n in 0..PER_WRITER {
                        repo.add(&numbered_payment(writer * PER_WRITER + n)).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let total = WRITERS * PER_WRITER;
        for n in 0..total {
            assert_eq!(repo.get(ordered_id(n)).unwrap().id, ordered_id(n), "{backend}");
        }
        assert_eq!(repo.list(0, 100).unwrap().len(), 100, "{backend}");
    }
}

#[test]
fn readers_and_updaters_interleave_safely() {
    for (backend, repo) in backends() {
        let repo: Arc<dyn PaymentRepository> = Arc::from(repo);
        for n in 0..10 {
            repo.add(&numbered_payment(n)).unwrap();
        }

        let updater = {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for round in 0..20u32 {
                    let mut payment = numbered_payment(round as u128 % 10);
                    payment.version = round;
                    repo.update(payment.id, &payment).unwrap();
                }
            })
        };
        let reader = {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for _ in 0..20 {
                    let page = repo.list(0, 10).unwrap();
                    assert_eq!(page.len(), 10);
                    assert!(page.iter().all(|payment| payment.resource_type == "Payment"));
                }
            })
        };
        updater.join().unwrap();
        reader.join().unwrap();

        assert!(
            matches!(repo.list(10, 10), Err(RepoError::BadOffsetLimit(_))),
            "{backend}"
        );
    }
}

#[test]
fn racing_adds_of_one_id_leave_exactly_one_record() {
    for (backend, repo) in backends() {
        let repo: Arc<dyn PaymentRepository> = Arc::from(repo);

        let handles = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || repo.add(&numbered_payment(42)).map(|_| ()))
            })
            .collect::<Vec<_>>();
        let outcomes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();

        // The in-memory backend may let several racing adds through.
        assert!(outcomes.iter().any(Result::is_ok), "{backend}");
        assert!(
            outcomes
                .iter()
                .all(|outcome| matches!(outcome, Ok(()) | Err(RepoError::Conflict(_)))),
            "{backend}"
        );
        assert_eq!(repo.list(0, 10).unwrap().len(), 1, "{backend}");
    }
}
