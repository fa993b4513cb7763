use crate::accounts::{Account, AccountKind};

#[test]
fn test_account_kind_serialization() {
    assert_eq!(
        serde_json::to_string(&AccountKind::Investment).unwrap(),
        "\"INVESTMENT\""
    );
    assert_eq!(
        serde_json::to_string(&AccountKind::CreditCard).unwrap(),
        "\"CREDIT_CARD\""
    );
}

#[test]
fn test_account_kind_deserialization() {
    assert_eq!(
        serde_json::from_str::<AccountKind>("\"INVESTMENT\"").unwrap(),
        AccountKind::Investment
    );
    assert_eq!(
        serde_json::from_str::<AccountKind>("\"BANK\"").unwrap(),
        AccountKind::Bank
    );
}

#[test]
fn test_is_investment() {
    assert!(AccountKind::Investment.is_investment());
    assert!(!AccountKind::Bank.is_investment());
}

#[test]
fn test_validate_rejects_empty_id() {
    let mut account = Account::new("A1", "Brokerage", "USD", AccountKind::Investment);
    assert!(account.validate().is_ok());

    account.id = "  ".to_string();
    assert!(account.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_currency() {
    let mut account = Account::new("A1", "Brokerage", "USD", AccountKind::Investment);
    account.currency = String::new();
    assert!(account.validate().is_err());
}

#[test]
fn test_new_account_is_unlocked_and_visible() {
    let account = Account::new("A1", "Chequing", "CAD", AccountKind::Checking);
    assert!(!account.locked);
    assert!(!account.hidden);
}
