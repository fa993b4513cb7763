//! Ledger service: transaction creation, modification, and retrieval.
//!
//! Mutations are serialized behind a single write lock per ledger. Committed
//! transactions are stored as `Arc<Transaction>`; an edit validates the full
//! replacement first and then swaps the pointer, so a reader holding a
//! snapshot never observes a half-committed state.

use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::accounts::Account;
use crate::errors::{Error, LedgerError, Result};
use crate::ledger::ledger_model::{
    EntrySide, InvestmentKind, ReconciledState, Transaction, TransactionDraft, TransactionEntry,
    TransactionKind,
};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, Account>,
    transactions: HashMap<String, Arc<Transaction>>,
    next_sequence: u64,
}

/// The in-memory ledger: account metadata plus the committed transaction log.
#[derive(Default)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            state: RwLock::new(LedgerState::default()),
        }
    }

    // === Accounts (ingested from the persistence collaborator) ===

    pub fn upsert_account(&self, account: Account) -> Result<()> {
        account.validate()?;
        let mut state = self.write_state()?;
        state.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    pub fn get_account(&self, account_id: &str) -> Option<Account> {
        let Ok(state) = self.state.read() else {
            return None;
        };
        state.accounts.get(account_id).cloned()
    }

    pub fn accounts(&self) -> Vec<Account> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        state.accounts.values().cloned().collect()
    }

    // === Transactions ===

    /// Validates and commits a new transaction.
    ///
    /// Any structural violation, including a reference to a locked account,
    /// rejects the whole draft with `InvalidLedgerState`; nothing is
    /// partially applied.
    pub fn create_transaction(&self, draft: TransactionDraft) -> Result<Arc<Transaction>> {
        let mut state = self.write_state()?;

        validate_draft(&state.accounts, &draft)?;
        for account_id in draft.accounts_touched() {
            if state.accounts[account_id].locked {
                return Err(LedgerError::InvalidLedgerState(format!(
                    "Account '{}' is locked and cannot accept new transactions",
                    account_id
                ))
                .into());
            }
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let transaction = Arc::new(commit_draft(
            Uuid::new_v4().to_string(),
            sequence,
            draft,
            None,
        ));
        debug!(
            "Committed transaction {} ({:?}) on {}",
            transaction.id, transaction.kind, transaction.date
        );
        state
            .transactions
            .insert(transaction.id.clone(), Arc::clone(&transaction));
        Ok(transaction)
    }

    /// Replaces a committed transaction with a fresh value built from `draft`.
    ///
    /// Fails with `LockedAccount` when either the old or the new transaction
    /// touches a locked account; the stored transaction is left untouched in
    /// that case. Reconciliation state carries over per entry when the
    /// entry's accounts and amounts are unchanged; a structural change resets
    /// that entry's sides to `NotReconciled`.
    pub fn modify_transaction(
        &self,
        transaction_id: &str,
        draft: TransactionDraft,
    ) -> Result<Arc<Transaction>> {
        let mut state = self.write_state()?;

        let old = state
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;

        self.check_unlocked(&state.accounts, old.accounts_touched().into_iter())?;
        self.check_unlocked(&state.accounts, draft.accounts_touched().into_iter())?;

        validate_draft(&state.accounts, &draft)?;

        let replacement = Arc::new(commit_draft(
            old.id.clone(),
            old.sequence,
            draft,
            Some(&old),
        ));
        state
            .transactions
            .insert(replacement.id.clone(), Arc::clone(&replacement));
        debug!("Replaced transaction {}", replacement.id);
        Ok(replacement)
    }

    /// Deletes a committed transaction, destroying its entries.
    pub fn delete_transaction(&self, transaction_id: &str) -> Result<()> {
        let mut state = self.write_state()?;

        let old = state
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        self.check_unlocked(&state.accounts, old.accounts_touched().into_iter())?;

        state.transactions.remove(transaction_id);
        debug!("Deleted transaction {}", transaction_id);
        Ok(())
    }

    /// Whether a transaction can be fully edited from the perspective of one
    /// account's register.
    ///
    /// Double-entry transactions are editable from either side. A split is
    /// fully editable only from its common account; from a leaf account the
    /// caller gets a degraded single-amount view, never a structural edit. An
    /// investment transaction is editable only from its investment account.
    pub fn can_modify(&self, transaction: &Transaction, perspective_account_id: &str) -> bool {
        match transaction.kind {
            TransactionKind::DoubleEntry => true,
            TransactionKind::SplitEntry => transaction
                .common_account()
                .is_some_and(|common| common == perspective_account_id),
            TransactionKind::Investment(_) => transaction
                .investment
                .as_ref()
                .is_some_and(|details| details.account_id == perspective_account_id),
        }
    }

    // === Reconciliation tracker ===

    /// Sets the reconciliation state of one side of one entry.
    ///
    /// Pure state holder semantics: explicit set only, no automatic
    /// promotion. Implemented as a pointer swap so readers keep snapshot
    /// isolation, but the operation is not a structural edit and is allowed
    /// on locked accounts.
    pub fn set_reconciled(
        &self,
        transaction_id: &str,
        entry_index: usize,
        side: EntrySide,
        reconciled: ReconciledState,
    ) -> Result<()> {
        let mut state = self.write_state()?;

        let old = state
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;

        if entry_index >= old.entries.len() {
            return Err(LedgerError::EntryOutOfBounds {
                transaction_id: transaction_id.to_string(),
                index: entry_index,
            }
            .into());
        }

        let mut replacement = (*old).clone();
        match side {
            EntrySide::Credit => replacement.entries[entry_index].credit_reconciled = reconciled,
            EntrySide::Debit => replacement.entries[entry_index].debit_reconciled = reconciled,
        }
        state
            .transactions
            .insert(transaction_id.to_string(), Arc::new(replacement));
        Ok(())
    }

    // === Retrieval (consistent snapshots for the read-side engines) ===

    pub fn get_transaction(&self, transaction_id: &str) -> Option<Arc<Transaction>> {
        let Ok(state) = self.state.read() else {
            return None;
        };
        state.transactions.get(transaction_id).cloned()
    }

    /// All transactions touching an account, ascending by date with the
    /// insertion sequence as a stable tie-break.
    pub fn transactions_for_account(&self, account_id: &str) -> Vec<Arc<Transaction>> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        let mut transactions: Vec<Arc<Transaction>> = state
            .transactions
            .values()
            .filter(|t| t.touches(account_id))
            .cloned()
            .collect();
        transactions.sort_by_key(|t| (t.date, t.sequence));
        transactions
    }

    /// Investment transactions for one security in one account, in the
    /// strict processing order required by the lot matching engine.
    pub fn investment_transactions(
        &self,
        account_id: &str,
        security_id: &str,
    ) -> Vec<Arc<Transaction>> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        let mut transactions: Vec<Arc<Transaction>> = state
            .transactions
            .values()
            .filter(|t| {
                matches!(t.kind, TransactionKind::Investment(_))
                    && t.investment.as_ref().is_some_and(|d| {
                        d.account_id == account_id && d.security_id == security_id
                    })
            })
            .cloned()
            .collect();
        transactions.sort_by_key(|t| (t.date, t.sequence));
        transactions
    }

    /// Security ids ever traded in an account.
    pub fn securities_for_account(&self, account_id: &str) -> Vec<String> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        let mut securities: Vec<String> = state
            .transactions
            .values()
            .filter_map(|t| t.investment.as_ref())
            .filter(|d| d.account_id == account_id)
            .map(|d| d.security_id.clone())
            .collect();
        securities.sort();
        securities.dedup();
        securities
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|e| Error::Unexpected(format!("Ledger lock poisoned: {}", e)))
    }

    fn check_unlocked<'a>(
        &self,
        accounts: &HashMap<String, Account>,
        account_ids: impl Iterator<Item = &'a str>,
    ) -> Result<()> {
        for account_id in account_ids {
            let account = accounts
                .get(account_id)
                .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
            if account.locked {
                warn!("Rejected edit touching locked account {}", account_id);
                return Err(LedgerError::LockedAccount(account_id.to_string()).into());
            }
        }
        Ok(())
    }
}

/// Builds the committed transaction value from a validated draft.
///
/// When `previous` is given, reconciliation state carries over for entries
/// whose structure (accounts and amounts) is unchanged at the same position.
fn commit_draft(
    id: String,
    sequence: u64,
    draft: TransactionDraft,
    previous: Option<&Transaction>,
) -> Transaction {
    let entries = draft
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry_draft)| {
            let carried = previous
                .and_then(|old| old.entries.get(index))
                .filter(|old_entry| entry_draft.same_structure(old_entry));
            TransactionEntry {
                credit_account_id: entry_draft.credit_account_id.clone(),
                debit_account_id: entry_draft.debit_account_id.clone(),
                credit_amount: entry_draft.credit_amount.clone(),
                debit_amount: entry_draft.debit_amount.clone(),
                memo: entry_draft.memo.clone(),
                credit_reconciled: carried
                    .map(|e| e.credit_reconciled)
                    .unwrap_or(ReconciledState::NotReconciled),
                debit_reconciled: carried
                    .map(|e| e.debit_reconciled)
                    .unwrap_or(ReconciledState::NotReconciled),
            }
        })
        .collect();

    Transaction {
        id,
        date: draft.date,
        payee: draft.payee,
        memo: draft.memo,
        number: draft.number,
        kind: draft.kind,
        entries,
        investment: draft.investment,
        sequence,
    }
}

/// Structural validation of a draft against current account metadata.
///
/// Rejection here is all-or-nothing: the ledger index is untouched until the
/// whole draft has passed.
fn validate_draft(accounts: &HashMap<String, Account>, draft: &TransactionDraft) -> Result<()> {
    if draft.entries.is_empty() {
        return Err(invalid("Transaction must have at least one entry"));
    }

    for account_id in draft.accounts_touched() {
        if !accounts.contains_key(account_id) {
            return Err(LedgerError::AccountNotFound(account_id.to_string()).into());
        }
    }

    for (index, entry) in draft.entries.iter().enumerate() {
        let credit_account = &accounts[entry.credit_account_id.as_str()];
        let debit_account = &accounts[entry.debit_account_id.as_str()];

        if entry.credit_account_id == entry.debit_account_id {
            return Err(invalid(&format!(
                "Entry {} credits and debits the same account '{}'",
                index, entry.credit_account_id
            )));
        }
        if entry.credit_amount.value <= Decimal::ZERO || entry.debit_amount.value <= Decimal::ZERO {
            return Err(invalid(&format!(
                "Entry {} amounts must be positive",
                index
            )));
        }
        if entry.credit_amount.currency != credit_account.currency {
            return Err(invalid(&format!(
                "Entry {} credit amount currency {} does not match account '{}' currency {}",
                index, entry.credit_amount.currency, credit_account.id, credit_account.currency
            )));
        }
        if entry.debit_amount.currency != debit_account.currency {
            return Err(invalid(&format!(
                "Entry {} debit amount currency {} does not match account '{}' currency {}",
                index, entry.debit_amount.currency, debit_account.id, debit_account.currency
            )));
        }
        // Sum-zero invariant. Each entry carries its credit- and debit-side
        // amount independently, so total credits equal total debits by
        // construction for cross-currency entries (the ratio is the exchange
        // rate at transaction time); same-currency entries must match exactly.
        if credit_account.currency == debit_account.currency
            && entry.credit_amount.value != entry.debit_amount.value
        {
            return Err(invalid(&format!(
                "Entry {} violates the double-entry invariant: credit {} != debit {}",
                index, entry.credit_amount.value, entry.debit_amount.value
            )));
        }
    }

    match draft.kind {
        TransactionKind::DoubleEntry => {
            if draft.entries.len() != 1 {
                return Err(invalid("A double-entry transaction has exactly one entry"));
            }
            if draft.investment.is_some() {
                return Err(invalid(
                    "Investment details are only valid on investment transactions",
                ));
            }
        }
        TransactionKind::SplitEntry => {
            if draft.entries.len() < 2 {
                return Err(invalid("A split transaction has at least two entries"));
            }
            if draft.common_account().is_none() {
                return Err(invalid(
                    "A split transaction requires one account common to every entry",
                ));
            }
            if draft.investment.is_some() {
                return Err(invalid(
                    "Investment details are only valid on investment transactions",
                ));
            }
        }
        TransactionKind::Investment(investment_kind) => {
            if draft.entries.len() != 1 {
                return Err(invalid("An investment transaction has exactly one entry"));
            }
            let details = draft
                .investment
                .as_ref()
                .ok_or_else(|| invalid("Investment transaction is missing trade details"))?;
            if !draft.entries[0].touches(&details.account_id) {
                return Err(invalid(
                    "Investment entry must touch the investment account",
                ));
            }
            match investment_kind {
                InvestmentKind::Buy | InvestmentKind::Sell => {
                    if details.quantity <= Decimal::ZERO {
                        return Err(invalid("Trade quantity must be positive"));
                    }
                    if details.unit_price < Decimal::ZERO {
                        return Err(invalid("Trade price cannot be negative"));
                    }
                }
                InvestmentKind::Dividend | InvestmentKind::ReturnOfCapital => {
                    // Cash events; quantity/price are ignored by the lot
                    // engine but must not be negative.
                    if details.quantity < Decimal::ZERO || details.unit_price < Decimal::ZERO {
                        return Err(invalid("Cash event quantity/price cannot be negative"));
                    }
                }
            }
            if details.fees < Decimal::ZERO {
                return Err(invalid("Trade fees cannot be negative"));
            }
        }
    }

    Ok(())
}

fn invalid(message: &str) -> crate::errors::Error {
    LedgerError::InvalidLedgerState(message.to_string()).into()
}
