mod common;

use common::{backends, sample_payment};
use papi_core::{Money, PaymentValidationError, RepoError};
use uuid::Uuid;

#[test]
fn add_then_get_returns_equal_payment() {
    for (backend, repo) in backends() {
        let payment = sample_payment();
        let stored = repo.add(&payment).unwrap();
        assert_eq!(stored, payment, "{backend}");

        let loaded = repo.get(payment.id).unwrap();
        assert_eq!(loaded, payment, "{backend}");
        assert_eq!(loaded.resource_type, "Payment", "{backend}");
        assert_eq!(loaded.version, 0, "{backend}");
    }
}

#[test]
fn add_normalizes_resource_type() {
    for (backend, repo) in backends() {
        let mut payment = sample_payment();
        payment.resource_type = "Something".to_string();

        assert_eq!(repo.add(&payment).unwrap().resource_type, "Payment", "{backend}");
        assert_eq!(
            repo.get(payment.id).unwrap().resource_type,
            "Payment",
            "{backend}"
        );
    }
}

#[test]
fn duplicate_add_is_conflict_and_keeps_first_record() {
    for (backend, repo) in backends() {
        let payment = sample_payment();
        repo.add(&payment).unwrap();

        let mut second = payment.clone();
        second.attributes.amount = "1.00".to_string();
        let err = repo.add(&second).unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)), "{backend}: {err}");
        assert!(err.is_domain(), "{backend}");
        assert!(err.to_string().contains(&payment.id.to_string()), "{backend}");

        assert_eq!(
            repo.get(payment.id).unwrap().attributes.amount,
            "100.21",
            "{backend}"
        );
    }
}

#[test]
fn missing_ids_are_not_found() {
    for (backend, repo) in backends() {
        let id = Uuid::new_v4();
        assert!(
            matches!(repo.get(id), Err(RepoError::NotFound(_))),
            "{backend}"
        );
        assert!(
            matches!(repo.delete(id), Err(RepoError::NotFound(_))),
            "{backend}"
        );
        assert!(
            matches!(
                repo.update(id, &sample_payment()),
                Err(RepoError::NotFound(_))
            ),
            "{backend}"
        );
    }
}

#[test]
fn update_bumps_caller_version_and_replaces_fields() {
    for (backend, repo) in backends() {
        let payment = sample_payment();
        repo.add(&payment).unwrap();

        let mut changed = payment.clone();
        changed.attributes.amount = "200.00".to_string();
        changed.attributes.fx = None;
        let updated = repo.update(payment.id, &changed).unwrap();
        assert_eq!(updated.version, 1, "{backend}");
        assert_eq!(updated.attributes.amount, "200.00", "{backend}");

        let loaded = repo.get(payment.id).unwrap();
        assert_eq!(loaded, updated, "{backend}");
        assert!(loaded.attributes.fx.is_none(), "{backend}");

        // The supplied version wins over the stored one.
        changed.version = 7;
        assert_eq!(repo.update(payment.id, &changed).unwrap().version, 8, "{backend}");
        assert_eq!(repo.get(payment.id).unwrap().version, 8, "{backend}");
    }
}

#[test]
fn update_keeps_the_addressed_id() {
    for (backend, repo) in backends() {
        let payment = sample_payment();
        repo.add(&payment).unwrap();

        let mut changed = payment.clone();
        changed.id = Uuid::new_v4();
        changed.attributes.reference = "moved?".to_string();
        let updated = repo.update(payment.id, &changed).unwrap();
        assert_eq!(updated.id, payment.id, "{backend}");

        assert_eq!(
            repo.get(payment.id).unwrap().attributes.reference,
            "moved?",
            "{backend}"
        );
        assert!(
            matches!(repo.get(changed.id), Err(RepoError::NotFound(_))),
            "{backend}"
        );
    }
}

#[test]
fn delete_removes_payment() {
    for (backend, repo) in backends() {
        let payment = sample_payment();
        repo.add(&payment).unwrap();
        repo.delete(payment.id).unwrap();

        assert!(
            matches!(repo.get(payment.id), Err(RepoError::NotFound(_))),
            "{backend}"
        );
        assert!(
            matches!(repo.delete(payment.id), Err(RepoError::NotFound(_))),
            "{backend}"
        );
        // The id can be reused after deletion.
        repo.add(&payment).unwrap();
    }
}

#[test]
fn sender_charges_keep_order_and_duplicates() {
    for (backend, repo) in backends() {
        let mut payment = sample_payment();
        let charges = vec![
            Money::new("10.00", "USD"),
            Money::new("5.00", "GBP"),
            Money::new("10.00", "USD"),
        ];
        if let Some(info) = payment.attributes.charges_information.as_mut() {
            info.sender_charges = charges.clone();
        }
        repo.add(&payment).unwrap();

        let loaded = repo.get(payment.id).unwrap();
        assert_eq!(
            loaded
                .attributes
                .charges_information
                .map(|info| info.sender_charges),
            Some(charges),
            "{backend}"
        );
    }
}

#[test]
fn absent_optional_groups_round_trip_as_absent() {
    for (backend, repo) in backends() {
        let mut payment = sample_payment();
        payment.attributes.charges_information = None;
        payment.attributes.fx = None;
        repo.add(&payment).unwrap();

        let loaded = repo.get(payment.id).unwrap();
        assert!(loaded.attributes.charges_information.is_none(), "{backend}");
        assert!(loaded.attributes.fx.is_none(), "{backend}");
    }
}

#[test]
fn empty_sender_charges_stay_present() {
    for (backend, repo) in backends() {
        let mut payment = sample_payment();
        if let Some(info) = payment.attributes.charges_information.as_mut() {
            info.sender_charges.clear();
        }
        repo.add(&payment).unwrap();

        let loaded = repo.get(payment.id).unwrap();
        assert_eq!(loaded, payment, "{backend}");
    }
}

#[test]
fn malformed_amounts_are_rejected_before_storage() {
    for (backend, repo) in backends() {
        let mut payment = sample_payment();
        if let Some(info) = payment.attributes.charges_information.as_mut() {
            info.sender_charges.push(Money::new("1,00", "GBP"));
        }

        let err = repo.add(&payment).unwrap_err();
        assert!(
            matches!(
                err,
                RepoError::Validation(PaymentValidationError::InvalidAmount { .. })
            ),
            "{backend}: {err}"
        );
        assert!(!err.is_domain(), "{backend}");
        assert!(
            matches!(repo.get(payment.id), Err(RepoError::NotFound(_))),
            "{backend}"
        );
    }
}

#[test]
fn returned_payment_is_detached_from_store() {
    for (backend, repo) in backends() {
        let payment = sample_payment();
        repo.add(&payment).unwrap();

        let mut loaded = repo.get(payment.id).unwrap();
        loaded.attributes.debtor_party.name = "Someone Else".to_string();

        assert_eq!(
            repo.get(payment.id).unwrap().attributes.debtor_party.name,
            "Emelia Jane Brown",
            "{backend}"
        );
    }
}
