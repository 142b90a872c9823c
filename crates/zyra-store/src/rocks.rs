//! `RocksDB` storage implementation.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use rust_decimal::Decimal;

use zyra_core::{Account, CanonicalPhone, Transaction, TransactionId, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{DepositSettlement, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Stage a transaction write plus its indexes onto `batch`.
    fn stage_transaction(&self, batch: &mut WriteBatch, transaction: &Transaction) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let cf_by_corr = self.cf(cf::TRANSACTIONS_BY_CORRELATION)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let user_tx_key = keys::user_transaction_key(&transaction.user_id, &transaction.id);
        let value = Self::serialize(transaction)?;

        batch.put_cf(&cf_tx, &tx_key, &value);
        batch.put_cf(&cf_by_user, &user_tx_key, []); // Index entry (empty value)

        // Deposit callbacks may arrive keyed by either provider id.
        for correlation in [
            transaction.merchant_request_id.as_deref(),
            transaction.checkout_request_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            batch.put_cf(&cf_by_corr, keys::correlation_key(correlation), &tx_key);
        }

        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(&self, account: &Account) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_by_phone = self.cf(cf::ACCOUNTS_BY_PHONE)?;
        let cf_by_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;

        let phone_key = keys::phone_key(&account.phone);
        let email_key = keys::email_key(&account.email);

        let phone_taken = self
            .db
            .get_cf(&cf_by_phone, &phone_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if phone_taken {
            return Err(StoreError::Conflict(format!(
                "phone already registered: {}",
                account.phone
            )));
        }

        let email_taken = self
            .db
            .get_cf(&cf_by_email, &email_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if email_taken {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                account.email
            )));
        }

        let account_key = keys::account_key(&account.id);
        let value = Self::serialize(account)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, &account_key, &value);
        batch.put_cf(&cf_by_phone, &phone_key, &account_key);
        batch.put_cf(&cf_by_email, &email_key, &account_key);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn update_account(&self, account: &Account) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.id);

        if self.get_account(&account.id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "account",
                id: account.id.to_string(),
            });
        }

        let value = Self::serialize(account)?;
        self.db
            .put_cf(&cf_accounts, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_account_by_phone(&self, phone: &CanonicalPhone) -> Result<Option<Account>> {
        let cf_by_phone = self.cf(cf::ACCOUNTS_BY_PHONE)?;

        let Some(account_key) = self
            .db
            .get_cf(&cf_by_phone, keys::phone_key(phone))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        self.db
            .get_cf(&cf_accounts, account_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let cf_by_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;

        let Some(account_key) = self
            .db
            .get_cf(&cf_by_email, keys::email_key(email))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        self.db
            .get_cf(&cf_accounts, account_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn put_transaction(&self, transaction: &Transaction) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, transaction)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_transaction_by_correlation(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Transaction>> {
        let cf_by_corr = self.cf(cf::TRANSACTIONS_BY_CORRELATION)?;

        let Some(tx_key) = self
            .db
            .get_cf(&cf_by_corr, keys::correlation_key(correlation_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        self.db
            .get_cf(&cf_tx, tx_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULID suffixes make the prefix range time-ordered; collect then
        // reverse for newest-first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }

            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn apply_transfer(
        &self,
        sender: &UserId,
        recipient: &UserId,
        amount: Decimal,
        transaction: &Transaction,
    ) -> Result<Decimal> {
        let mut sender_account = self.get_account(sender)?.ok_or(StoreError::NotFound {
            entity: "account",
            id: sender.to_string(),
        })?;
        let mut recipient_account = self.get_account(recipient)?.ok_or(StoreError::NotFound {
            entity: "account",
            id: recipient.to_string(),
        })?;

        // Re-check under the store's view; the handler's pre-check may be
        // stale by the time the write lands.
        if sender_account.balance < amount {
            return Err(StoreError::InsufficientBalance {
                balance: sender_account.balance,
                required: amount,
            });
        }

        let now = chrono::Utc::now();
        sender_account.balance -= amount;
        sender_account.updated_at = now;
        recipient_account.balance += amount;
        recipient_account.updated_at = now;

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let sender_value = Self::serialize(&sender_account)?;
        let recipient_value = Self::serialize(&recipient_account)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, keys::account_key(sender), &sender_value);
        batch.put_cf(&cf_accounts, keys::account_key(recipient), &recipient_value);
        self.stage_transaction(&mut batch, transaction)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(sender_account.balance)
    }

    fn settle_deposit(
        &self,
        transaction_id: &TransactionId,
        settlement: &DepositSettlement,
    ) -> Result<Transaction> {
        let mut transaction =
            self.get_transaction(transaction_id)?
                .ok_or(StoreError::NotFound {
                    entity: "transaction",
                    id: transaction_id.to_string(),
                })?;

        if transaction.is_terminal() {
            return Err(StoreError::AlreadySettled {
                transaction_id: transaction_id.to_string(),
            });
        }

        let mut account =
            self.get_account(&transaction.user_id)?
                .ok_or(StoreError::NotFound {
                    entity: "account",
                    id: transaction.user_id.to_string(),
                })?;

        let now = chrono::Utc::now();
        transaction.status = settlement.status;
        transaction.receipt_number = settlement.receipt_number.clone();
        transaction.result_code = Some(settlement.result_code);
        transaction.result_desc = Some(settlement.result_desc.clone());
        transaction.updated_at = now;

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let mut batch = WriteBatch::default();

        if let Some(credit) = settlement.credit {
            account.balance += credit;
            account.updated_at = now;
            let account_value = Self::serialize(&account)?;
            batch.put_cf(
                &cf_accounts,
                keys::account_key(&transaction.user_id),
                &account_value,
            );
        }

        self.stage_transaction(&mut batch, &transaction)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zyra_core::TransactionStatus;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn test_account(phone: &str, email: &str) -> Account {
        Account::new(
            CanonicalPhone::normalize(phone),
            email.into(),
            "$2b$10$hash".into(),
            "GPUBLIC".into(),
            "SSECRET".into(),
        )
    }

    #[test]
    fn account_create_and_lookups() {
        let (store, _dir) = create_test_store();
        let account = test_account("0712345678", "a@example.com");

        store.create_account(&account).unwrap();

        let by_id = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");

        let by_phone = store
            .get_account_by_phone(&CanonicalPhone::normalize("+254712345678"))
            .unwrap()
            .unwrap();
        assert_eq!(by_phone.id, account.id);

        let by_email = store.get_account_by_email("A@Example.COM").unwrap().unwrap();
        assert_eq!(by_email.id, account.id);
    }

    #[test]
    fn duplicate_phone_or_email_conflicts() {
        let (store, _dir) = create_test_store();
        store
            .create_account(&test_account("0712345678", "a@example.com"))
            .unwrap();

        // Same phone in a different raw shape still collides.
        let dup_phone = test_account("+254712345678", "b@example.com");
        assert!(matches!(
            store.create_account(&dup_phone),
            Err(StoreError::Conflict(_))
        ));

        let dup_email = test_account("0798765432", "a@example.com");
        assert!(matches!(
            store.create_account(&dup_email),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn update_account_requires_existing() {
        let (store, _dir) = create_test_store();
        let account = test_account("0712345678", "a@example.com");

        assert!(matches!(
            store.update_account(&account),
            Err(StoreError::NotFound { .. })
        ));

        store.create_account(&account).unwrap();
        let mut updated = account.clone();
        updated.balance = Decimal::from(42);
        store.update_account(&updated).unwrap();

        let read = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(read.balance, Decimal::from(42));
    }

    #[test]
    fn deposit_found_by_either_correlation_id() {
        let (store, _dir) = create_test_store();
        let account = test_account("0712345678", "a@example.com");
        store.create_account(&account).unwrap();

        let tx = Transaction::pending_deposit(
            account.id,
            Decimal::from(500),
            "mr-1".into(),
            "co-1".into(),
        );
        store.put_transaction(&tx).unwrap();

        let by_merchant = store
            .find_transaction_by_correlation("mr-1")
            .unwrap()
            .unwrap();
        let by_checkout = store
            .find_transaction_by_correlation("co-1")
            .unwrap()
            .unwrap();
        assert_eq!(by_merchant.id, tx.id);
        assert_eq!(by_checkout.id, tx.id);

        assert!(store
            .find_transaction_by_correlation("unknown")
            .unwrap()
            .is_none());
    }

    #[test]
    fn list_transactions_newest_first_with_pagination() {
        let (store, _dir) = create_test_store();
        let account = test_account("0712345678", "a@example.com");
        store.create_account(&account).unwrap();

        let tx1 =
            Transaction::pending_deposit(account.id, Decimal::from(100), "mr-1".into(), "co-1".into());
        store.put_transaction(&tx1).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs

        let tx2 =
            Transaction::pending_deposit(account.id, Decimal::from(200), "mr-2".into(), "co-2".into());
        store.put_transaction(&tx2).unwrap();

        let all = store.list_transactions_by_user(&account.id, 10, 0).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, tx2.id); // Newest first
        assert_eq!(all[1].id, tx1.id);

        let page1 = store.list_transactions_by_user(&account.id, 1, 0).unwrap();
        let page2 = store.list_transactions_by_user(&account.id, 1, 1).unwrap();
        assert_eq!(page1[0].id, tx2.id);
        assert_eq!(page2[0].id, tx1.id);
    }

    #[test]
    fn apply_transfer_moves_balance_atomically() {
        let (store, _dir) = create_test_store();
        let mut sender = test_account("0712345678", "a@example.com");
        sender.balance = Decimal::from(100);
        let recipient = test_account("0798765432", "b@example.com");
        store.create_account(&sender).unwrap();
        store.create_account(&recipient).unwrap();

        let tx = Transaction::completed_send(
            sender.id,
            recipient.phone.clone(),
            Decimal::from(30),
            Some("hash".into()),
        );
        let new_balance = store
            .apply_transfer(&sender.id, &recipient.id, Decimal::from(30), &tx)
            .unwrap();
        assert_eq!(new_balance, Decimal::from(70));

        let recipient_read = store.get_account(&recipient.id).unwrap().unwrap();
        assert_eq!(recipient_read.balance, Decimal::from(30));

        let sends = store.list_transactions_by_user(&sender.id, 10, 0).unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].status, TransactionStatus::Success);
    }

    #[test]
    fn apply_transfer_rechecks_balance() {
        let (store, _dir) = create_test_store();
        let mut sender = test_account("0712345678", "a@example.com");
        sender.balance = Decimal::from(10);
        let recipient = test_account("0798765432", "b@example.com");
        store.create_account(&sender).unwrap();
        store.create_account(&recipient).unwrap();

        let tx = Transaction::completed_send(
            sender.id,
            recipient.phone.clone(),
            Decimal::from(30),
            None,
        );
        let result = store.apply_transfer(&sender.id, &recipient.id, Decimal::from(30), &tx);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientBalance { .. })
        ));

        // Nothing moved, nothing recorded.
        let sender_read = store.get_account(&sender.id).unwrap().unwrap();
        assert_eq!(sender_read.balance, Decimal::from(10));
        assert!(store
            .list_transactions_by_user(&sender.id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn settle_deposit_credits_once() {
        let (store, _dir) = create_test_store();
        let account = test_account("0712345678", "a@example.com");
        store.create_account(&account).unwrap();

        let tx = Transaction::pending_deposit(
            account.id,
            Decimal::from(500),
            "mr-1".into(),
            "co-1".into(),
        );
        store.put_transaction(&tx).unwrap();

        let settlement = DepositSettlement {
            status: TransactionStatus::Success,
            receipt_number: Some("RCP123".into()),
            result_code: 0,
            result_desc: "Success".into(),
            credit: Some(Decimal::from(10_000)),
        };

        let settled = store.settle_deposit(&tx.id, &settlement).unwrap();
        assert_eq!(settled.status, TransactionStatus::Success);
        assert_eq!(settled.receipt_number.as_deref(), Some("RCP123"));

        let account_read = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account_read.balance, Decimal::from(10_000));

        // A replayed callback settles nothing and credits nothing.
        let result = store.settle_deposit(&tx.id, &settlement);
        assert!(matches!(result, Err(StoreError::AlreadySettled { .. })));
        let account_read = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account_read.balance, Decimal::from(10_000));
    }

    #[test]
    fn settle_deposit_failure_does_not_credit() {
        let (store, _dir) = create_test_store();
        let account = test_account("0712345678", "a@example.com");
        store.create_account(&account).unwrap();

        let tx = Transaction::pending_deposit(
            account.id,
            Decimal::from(500),
            "mr-1".into(),
            "co-1".into(),
        );
        store.put_transaction(&tx).unwrap();

        let settlement = DepositSettlement {
            status: TransactionStatus::Failed,
            receipt_number: None,
            result_code: 1032,
            result_desc: "Request cancelled by user".into(),
            credit: None,
        };

        let settled = store.settle_deposit(&tx.id, &settlement).unwrap();
        assert_eq!(settled.status, TransactionStatus::Failed);
        assert_eq!(settled.result_code, Some(1032));

        let account_read = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account_read.balance, Decimal::ZERO);
    }
}
