//! User registry tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use exportflow_core::clock::{Clock, ManualClock};
use exportflow_core::workflow::WorkflowError;
use exportflow_ledger::repositories::NewUser;
use exportflow_ledger::{MemoryLedger, TracingEventSink, UserRegistry};
use exportflow_shared::{ErrorKind, UserId};
use rstest::rstest;

fn registry() -> UserRegistry<MemoryLedger> {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap(),
    ));
    let ledger = Arc::new(MemoryLedger::new(Arc::clone(&clock), Arc::new(TracingEventSink)));
    UserRegistry::new(ledger, clock)
}

fn user(id: &str, username: &str, email: &str) -> NewUser {
    NewUser {
        id: UserId::new(id),
        username: username.to_string(),
        email: email.to_string(),
        organization_id: "ECTAMSP".to_string(),
        role: "inspector".to_string(),
    }
}

#[test]
fn test_register_and_lookup() {
    let users = registry();
    let registered = users
        .register(user("USR-1", "h.girma", "hanna@ecta.example"))
        .unwrap();
    assert!(registered.is_active);
    assert_eq!(registered.created_at, registered.updated_at);

    assert_eq!(users.get("USR-1").unwrap(), registered);
    assert_eq!(users.get_by_username("h.girma").unwrap().id, registered.id);
    assert_eq!(users.get_by_email("hanna@ecta.example").unwrap().id, registered.id);
}

#[rstest]
#[case::same_id(user("USR-1", "other", "other@ecta.example"))]
#[case::same_username(user("USR-2", "h.girma", "other@ecta.example"))]
#[case::same_email(user("USR-2", "other", "hanna@ecta.example"))]
fn test_duplicates_rejected(#[case] duplicate: NewUser) {
    let users = registry();
    users
        .register(user("USR-1", "h.girma", "hanna@ecta.example"))
        .unwrap();

    let err = users.register(duplicate).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(users.get("USR-2").is_err());
}

#[test]
fn test_failed_registration_claims_nothing() {
    let users = registry();
    users
        .register(user("USR-1", "h.girma", "hanna@ecta.example"))
        .unwrap();
    // Username is free but the email is taken: the username stays free.
    users
        .register(user("USR-2", "t.bekele", "hanna@ecta.example"))
        .unwrap_err();
    users
        .register(user("USR-3", "t.bekele", "tesfaye@ecta.example"))
        .unwrap();
}

#[rstest]
#[case::short_username(user("USR-1", "ab", "a@ecta.example"))]
#[case::bad_email(user("USR-1", "abebe", "not an email"))]
#[case::empty_role(NewUser { role: String::new(), ..user("USR-1", "abebe", "a@ecta.example") })]
fn test_invalid_input(#[case] input: NewUser) {
    let err = registry().register(input).unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
}

#[test]
fn test_deactivate_and_activate() {
    let users = registry();
    let registered = users
        .register(user("USR-1", "h.girma", "hanna@ecta.example"))
        .unwrap();

    let inactive = users.deactivate("USR-1").unwrap();
    assert!(!inactive.is_active);
    assert!(inactive.updated_at > registered.updated_at);
    assert!(users.activate("USR-1").unwrap().is_active);

    let err = users.deactivate("USR-9").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_list_by_organization() {
    let users = registry();
    users
        .register(user("USR-1", "h.girma", "hanna@ecta.example"))
        .unwrap();
    users
        .register(NewUser {
            organization_id: "ECXMSP".to_string(),
            ..user("USR-2", "t.bekele", "tesfaye@ecx.example")
        })
        .unwrap();

    let ecta = users.list_by_organization("ECTAMSP").unwrap();
    assert_eq!(ecta.len(), 1);
    assert_eq!(ecta[0].username, "h.girma");
    assert!(users.list_by_organization("ImporterMSP").unwrap().is_empty());
}
