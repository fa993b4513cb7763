//! Double-entry transaction domain models.
//!
//! A committed `Transaction` is immutable. "Modify" builds a fresh value from
//! a draft and atomically swaps it in the ledger index, which gives snapshot
//! isolation to concurrent readers for free: they observe either the old or
//! the fully-new transaction, never an interleaving.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::money::MonetaryAmount;

/// Reconciliation status of one side of a transaction entry.
///
/// Tracked independently per side: the two accounts of an entry may reconcile
/// against different bank statements. There is no automatic promotion between
/// states; promotion is driven by an external statement-matching collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciledState {
    #[default]
    NotReconciled,
    Cleared,
    Reconciled,
}

/// Which side of an entry an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntrySide {
    Credit,
    Debit,
}

/// One leg of a transaction: a credit to one account and a matching debit to
/// another.
///
/// `credit_amount` and `debit_amount` differ only when the two accounts carry
/// different currencies; the ratio between them encodes the exchange rate at
/// transaction time. When the currencies match the magnitudes are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    pub credit_account_id: String,
    pub debit_account_id: String,
    pub credit_amount: MonetaryAmount,
    pub debit_amount: MonetaryAmount,
    pub memo: Option<String>,
    pub credit_reconciled: ReconciledState,
    pub debit_reconciled: ReconciledState,
}

impl TransactionEntry {
    pub fn touches(&self, account_id: &str) -> bool {
        self.credit_account_id == account_id || self.debit_account_id == account_id
    }

    /// Signed balance effect of this entry on one account: credits positive,
    /// debits negative, in the account's own currency.
    pub fn signed_effect_on(&self, account_id: &str) -> Decimal {
        let mut effect = Decimal::ZERO;
        if self.credit_account_id == account_id {
            effect += self.credit_amount.value;
        }
        if self.debit_account_id == account_id {
            effect -= self.debit_amount.value;
        }
        effect
    }

    /// True when the accounts and amounts match; memo and reconciliation are
    /// not structural.
    pub fn same_structure(&self, other: &TransactionEntry) -> bool {
        self.credit_account_id == other.credit_account_id
            && self.debit_account_id == other.debit_account_id
            && self.credit_amount == other.credit_amount
            && self.debit_amount == other.debit_amount
    }
}

/// Investment transaction subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentKind {
    Buy,
    Sell,
    Dividend,
    ReturnOfCapital,
}

/// Transaction kind, matched exhaustively at every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "subtype", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// A single entry between two accounts.
    DoubleEntry,
    /// Two or more entries sharing one common account.
    SplitEntry,
    Investment(InvestmentKind),
}

/// Security trade details carried by `Investment` transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentDetails {
    pub security_id: String,
    /// The investment account holding the security.
    pub account_id: String,
    pub quantity: Decimal,
    /// Price per share at trade time, in the investment account's currency.
    pub unit_price: Decimal,
    pub fees: Decimal,
}

/// A committed ledger transaction.
///
/// `sequence` is a monotonically increasing insertion id assigned by the
/// ledger; it breaks date ties so chronological processing is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub number: Option<String>,
    pub kind: TransactionKind,
    pub entries: Vec<TransactionEntry>,
    /// Present iff `kind` is `Investment`.
    pub investment: Option<InvestmentDetails>,
    pub sequence: u64,
}

impl Transaction {
    /// All account ids referenced by this transaction.
    pub fn accounts_touched(&self) -> BTreeSet<&str> {
        let mut accounts: BTreeSet<&str> = BTreeSet::new();
        for entry in &self.entries {
            accounts.insert(entry.credit_account_id.as_str());
            accounts.insert(entry.debit_account_id.as_str());
        }
        if let Some(details) = &self.investment {
            accounts.insert(details.account_id.as_str());
        }
        accounts
    }

    pub fn touches(&self, account_id: &str) -> bool {
        self.accounts_touched().contains(account_id)
    }

    /// For split transactions, the account present on every entry (as either
    /// the credit or the debit side). `None` for other kinds, or when no such
    /// account exists.
    pub fn common_account(&self) -> Option<&str> {
        if self.kind != TransactionKind::SplitEntry {
            return None;
        }
        common_account_of(self.entries.iter().map(|e| {
            (
                e.credit_account_id.as_str(),
                e.debit_account_id.as_str(),
            )
        }))
    }

    /// Signed balance effect on one account, summed over all entries.
    pub fn signed_effect_on(&self, account_id: &str) -> Decimal {
        self.entries
            .iter()
            .map(|e| e.signed_effect_on(account_id))
            .sum()
    }
}

/// Finds the account present on every (credit, debit) pair.
pub(crate) fn common_account_of<'a>(
    mut sides: impl Iterator<Item = (&'a str, &'a str)>,
) -> Option<&'a str> {
    let (first_credit, first_debit) = sides.next()?;
    let mut candidates: Vec<&str> = vec![first_credit];
    if first_debit != first_credit {
        candidates.push(first_debit);
    }
    for (credit, debit) in sides {
        candidates.retain(|c| *c == credit || *c == debit);
        if candidates.is_empty() {
            return None;
        }
    }
    candidates.first().copied()
}

/// Draft of a single entry. Carries no reconciliation state; that is assigned
/// when the draft is committed (or carried over on an edit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntryDraft {
    pub credit_account_id: String,
    pub debit_account_id: String,
    pub credit_amount: MonetaryAmount,
    pub debit_amount: MonetaryAmount,
    pub memo: Option<String>,
}

impl TransactionEntryDraft {
    /// Convenience constructor for the common same-currency case.
    pub fn balanced(
        credit_account_id: impl Into<String>,
        debit_account_id: impl Into<String>,
        amount: MonetaryAmount,
    ) -> Self {
        TransactionEntryDraft {
            credit_account_id: credit_account_id.into(),
            debit_account_id: debit_account_id.into(),
            credit_amount: amount.clone(),
            debit_amount: amount,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn touches(&self, account_id: &str) -> bool {
        self.credit_account_id == account_id || self.debit_account_id == account_id
    }

    /// True when the draft matches a committed entry's accounts and amounts.
    pub fn same_structure(&self, entry: &TransactionEntry) -> bool {
        self.credit_account_id == entry.credit_account_id
            && self.debit_account_id == entry.debit_account_id
            && self.credit_amount == entry.credit_amount
            && self.debit_amount == entry.debit_amount
    }
}

/// Mutable draft used to build or edit a transaction.
///
/// Editing copies entry values out of the committed transaction into a fresh
/// draft; the committed value itself is never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub date: NaiveDate,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub number: Option<String>,
    pub kind: TransactionKind,
    pub entries: Vec<TransactionEntryDraft>,
    pub investment: Option<InvestmentDetails>,
}

impl TransactionDraft {
    pub fn new(kind: TransactionKind, date: NaiveDate) -> Self {
        TransactionDraft {
            date,
            payee: None,
            memo: None,
            number: None,
            kind,
            entries: Vec::new(),
            investment: None,
        }
    }

    /// Copies a committed transaction into an editable draft.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        TransactionDraft {
            date: transaction.date,
            payee: transaction.payee.clone(),
            memo: transaction.memo.clone(),
            number: transaction.number.clone(),
            kind: transaction.kind,
            entries: transaction
                .entries
                .iter()
                .map(|e| TransactionEntryDraft {
                    credit_account_id: e.credit_account_id.clone(),
                    debit_account_id: e.debit_account_id.clone(),
                    credit_amount: e.credit_amount.clone(),
                    debit_amount: e.debit_amount.clone(),
                    memo: e.memo.clone(),
                })
                .collect(),
            investment: transaction.investment.clone(),
        }
    }

    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_entry(mut self, entry: TransactionEntryDraft) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn with_investment(mut self, details: InvestmentDetails) -> Self {
        self.investment = Some(details);
        self
    }

    /// All account ids referenced by this draft.
    pub fn accounts_touched(&self) -> BTreeSet<&str> {
        let mut accounts: BTreeSet<&str> = BTreeSet::new();
        for entry in &self.entries {
            accounts.insert(entry.credit_account_id.as_str());
            accounts.insert(entry.debit_account_id.as_str());
        }
        if let Some(details) = &self.investment {
            accounts.insert(details.account_id.as_str());
        }
        accounts
    }

    pub fn common_account(&self) -> Option<&str> {
        if self.kind != TransactionKind::SplitEntry {
            return None;
        }
        common_account_of(self.entries.iter().map(|e| {
            (
                e.credit_account_id.as_str(),
                e.debit_account_id.as_str(),
            )
        }))
    }
}
