mod common;

use common::{numbered_payment, ordered_id, sample_payment};
use papi_core::{MapPaymentRepository, PaymentService, RepoError, StorageConfig};

#[test]
fn list_page_translates_page_number_to_offset() {
    let service = PaymentService::new(StorageConfig::open_sqlite_in_memory().unwrap());
    for n in 0..20 {
        service.create_payment(&numbered_payment(n)).unwrap();
    }

    let ids = |page, size| {
        service
            .list_page(page, size)
            .unwrap()
            .into_iter()
            .map(|payment| payment.id)
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(3, 3), (9..12).map(ordered_id).collect::<Vec<_>>());
    assert_eq!(ids(0, 5), (0..5).map(ordered_id).collect::<Vec<_>>());
    assert_eq!(ids(3, 6), vec![ordered_id(18), ordered_id(19)]);

    assert!(matches!(
        service.list_page(4, 5),
        Err(RepoError::BadOffsetLimit(_))
    ));
}

#[test]
fn crud_through_service() {
    let service = PaymentService::new(MapPaymentRepository::new());
    let payment = sample_payment();

    service.create_payment(&payment).unwrap();
    assert!(matches!(
        service.create_payment(&payment),
        Err(RepoError::Conflict(_))
    ));

    let mut changed = service.get_payment(payment.id).unwrap();
    changed.attributes.reference = "updated".to_string();
    let updated = service.update_payment(payment.id, &changed).unwrap();
    assert_eq!(updated.version, 1);

    service.delete_payment(payment.id).unwrap();
    assert!(matches!(
        service.get_payment(payment.id),
        Err(RepoError::NotFound(_))
    ));
    assert!(service.repository().is_empty().unwrap());
}
