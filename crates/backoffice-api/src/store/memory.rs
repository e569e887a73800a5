//! # In-Memory Backend
//!
//! [`MemoryStore`] implements [`AccountLedger`] and [`Directory`] with
//! `parking_lot` locks. Locks are never held across `.await`.
//!
//! Each sequence key owns its own counter slot (`Arc<Mutex<u64>>`). The slot
//! map lock is only taken to find or lazily create a slot, so allocations for
//! different keys never wait on each other. `create_account` holds the slot
//! for the whole number-and-insert step and only advances the counter once
//! the insert succeeded, which gives the same no-gap behaviour as the
//! PostgreSQL backend's shared transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::account_number;
use backoffice_core::{
    Account, AccountNumber, AccountType, AccountTypeId, Branch, BranchId, Capability,
    CapabilitySet, Currency, CurrencyCode, FeeCode, NewAccountType, NewBranch, Nik, Role, RoleId,
    SequenceKey, TransactionFee, User, UserId,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

use super::{AccountChange, AccountDraft, AccountLedger, Directory, StoreError, UserQuery};

type Slot = Arc<Mutex<u64>>;

#[derive(Default)]
struct Inner {
    counters: RwLock<HashMap<SequenceKey, Slot>>,
    accounts: RwLock<BTreeMap<AccountNumber, Account>>,
    users: RwLock<HashMap<UserId, User>>,
    roles: RwLock<BTreeMap<String, Role>>,
    branches: RwLock<BTreeMap<BranchId, Branch>>,
    account_types: RwLock<BTreeMap<AccountTypeId, AccountType>>,
    currencies: RwLock<BTreeMap<String, Currency>>,
    fees: RwLock<BTreeMap<String, TransactionFee>>,
    next_branch_id: Mutex<i32>,
    next_account_type_id: Mutex<i32>,
}

/// Thread-safe, cloneable in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("accounts", &self.inner.accounts.read().len())
            .field("users", &self.inner.users.read().len())
            .finish()
    }
}

/// Roles every deployment starts with.
pub fn default_roles() -> Vec<Role> {
    let role = |id: RoleId, name: &str, capabilities: CapabilitySet| Role {
        id,
        name: name.to_string(),
        capabilities,
    };
    vec![
        role(RoleId::admin(), "Administrator", CapabilitySet::all()),
        role(
            RoleId::employee(),
            "Employee",
            CapabilitySet::empty()
                .with(Capability::ProvisionAccounts)
                .with(Capability::ManageUsers),
        ),
        role(RoleId::default_user(), "Customer", CapabilitySet::empty()),
    ]
}

impl MemoryStore {
    /// Create an empty store with no roles or reference data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the default roles, the `IDR` base currency and
    /// the standard transfer fees.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut roles = store.inner.roles.write();
            for role in default_roles() {
                roles.insert(role.id.as_str().to_string(), role);
            }
        }
        let idr = CurrencyCode::default_base();
        store.inner.currencies.write().insert(
            idr.as_str().to_string(),
            Currency {
                code: idr,
                name: "Indonesian Rupiah".to_string(),
                rate_to_base: Decimal::ONE,
            },
        );
        let mut fees = store.inner.fees.write();
        for (code, name, amount) in [
            ("INT", "Interbank Transfer", Decimal::new(6500, 0)),
            ("BIF", "BI-FAST Transfer", Decimal::new(2500, 0)),
        ] {
            if let Ok(code) = FeeCode::new(code) {
                fees.insert(
                    code.as_str().to_string(),
                    TransactionFee {
                        code,
                        name: name.to_string(),
                        fee: amount,
                    },
                );
            }
        }
        drop(fees);
        store
    }

    /// Set a counter back so the next allocation repeats an issued value.
    #[cfg(test)]
    pub(crate) fn rewind_counter(&self, key: SequenceKey, last: u64) {
        *self.slot(key).lock() = last;
    }

    /// Find or lazily create the counter slot for a key.
    fn slot(&self, key: SequenceKey) -> Slot {
        if let Some(slot) = self.inner.counters.read().get(&key) {
            return Arc::clone(slot);
        }
        Arc::clone(self.inner.counters.write().entry(key).or_default())
    }
}

#[async_trait]
impl AccountLedger for MemoryStore {
    async fn allocate_next(&self, key: SequenceKey) -> Result<u64, StoreError> {
        let slot = self.slot(key);
        let mut last = slot.lock();
        *last = last
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend(format!("sequence counter {key} exhausted")))?;
        Ok(*last)
    }

    async fn current_sequence(&self, key: SequenceKey) -> Result<u64, StoreError> {
        let slot = self.inner.counters.read().get(&key).cloned();
        Ok(slot.map(|s| *s.lock()).unwrap_or(0))
    }

    async fn create_account(&self, draft: AccountDraft) -> Result<Account, StoreError> {
        let slot = self.slot(draft.key);
        let mut last = slot.lock();
        let next = last
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend(format!("sequence counter {} exhausted", draft.key)))?;
        let number = account_number::encode(draft.key.branch, draft.key.account_type, next)?;

        let now = Utc::now();
        let account = Account {
            id: draft.id,
            user_id: draft.user_id,
            employee_id: draft.employee_id,
            branch_id: draft.key.branch,
            account_type_id: draft.key.account_type,
            sequence_number: next,
            account_number: number.clone(),
            currency: draft.currency,
            balance: Decimal::ZERO,
            pin_hash: draft.pin_hash,
            created_at: now,
            updated_at: now,
        };

        {
            let mut accounts = self.inner.accounts.write();
            if accounts.contains_key(&number) {
                return Err(StoreError::UniqueViolation(format!(
                    "account number {number} already exists"
                )));
            }
            accounts.insert(number, account.clone());
        }
        *last = next;
        Ok(account)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.inner.accounts.read().values().cloned().collect())
    }

    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .inner
            .accounts
            .read()
            .values()
            .filter(|a| a.is_owned_by(user))
            .cloned()
            .collect())
    }

    async fn find_account(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.accounts.read().get(number).cloned())
    }

    async fn update_account(
        &self,
        number: &AccountNumber,
        change: AccountChange,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.inner.accounts.write();
        Ok(accounts.get_mut(number).map(|account| {
            account.employee_id = change.employee_id;
            if let Some(hash) = change.pin_hash {
                account.pin_hash = hash;
            }
            account.updated_at = Utc::now();
            account.clone()
        }))
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.users.read().get(&id).cloned())
    }

    async fn find_user_by_nik(&self, nik: &Nik) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .users
            .read()
            .values()
            .find(|u| &u.nik == nik)
            .cloned())
    }

    async fn search_users(&self, query: &UserQuery) -> Result<Vec<User>, StoreError> {
        let mut found: Vec<User> = self
            .inner
            .users
            .read()
            .values()
            .filter(|u| query.matches(u))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(found)
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.inner.users.write();
        if let Some(clash) = users.values().find(|u| {
            u.id == user.id || u.nik == user.nik || u.username == user.username || u.email == user.email
        }) {
            let field = if clash.nik == user.nik {
                "nik"
            } else if clash.username == user.username {
                "username"
            } else if clash.email == user.email {
                "email"
            } else {
                "id"
            };
            return Err(StoreError::UniqueViolation(format!("user {field} already exists")));
        }
        if !self.inner.roles.read().contains_key(user.role_id.as_str()) {
            return Err(StoreError::NotFound(format!("role {}", user.role_id)));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_role(&self, id: &RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self.inner.roles.read().get(id.as_str()).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.inner.roles.read().values().cloned().collect())
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, StoreError> {
        Ok(self.inner.branches.read().values().cloned().collect())
    }

    async fn find_branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError> {
        Ok(self.inner.branches.read().get(&id).cloned())
    }

    async fn insert_branch(&self, branch: NewBranch) -> Result<Branch, StoreError> {
        let id = {
            let mut next = self.inner.next_branch_id.lock();
            *next += 1;
            BranchId::new(*next)
        };
        let branch = branch.with_id(id);
        self.inner.branches.write().insert(id, branch.clone());
        Ok(branch)
    }

    async fn update_branch(&self, branch: Branch) -> Result<Option<Branch>, StoreError> {
        let mut branches = self.inner.branches.write();
        Ok(branches.get_mut(&branch.id).map(|slot| {
            *slot = branch;
            slot.clone()
        }))
    }

    async fn list_account_types(&self) -> Result<Vec<AccountType>, StoreError> {
        Ok(self.inner.account_types.read().values().cloned().collect())
    }

    async fn find_account_type(
        &self,
        id: AccountTypeId,
    ) -> Result<Option<AccountType>, StoreError> {
        Ok(self.inner.account_types.read().get(&id).cloned())
    }

    async fn insert_account_type(
        &self,
        account_type: NewAccountType,
    ) -> Result<AccountType, StoreError> {
        let id = {
            let mut next = self.inner.next_account_type_id.lock();
            *next += 1;
            AccountTypeId::new(*next)
        };
        let account_type = account_type.with_id(id);
        self.inner
            .account_types
            .write()
            .insert(id, account_type.clone());
        Ok(account_type)
    }

    async fn update_account_type(
        &self,
        account_type: AccountType,
    ) -> Result<Option<AccountType>, StoreError> {
        let mut types = self.inner.account_types.write();
        Ok(types.get_mut(&account_type.id).map(|slot| {
            *slot = account_type;
            slot.clone()
        }))
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, StoreError> {
        Ok(self.inner.currencies.read().values().cloned().collect())
    }

    async fn find_currency(&self, code: &CurrencyCode) -> Result<Option<Currency>, StoreError> {
        Ok(self.inner.currencies.read().get(code.as_str()).cloned())
    }

    async fn insert_currency(&self, currency: Currency) -> Result<Currency, StoreError> {
        let mut currencies = self.inner.currencies.write();
        if currencies.contains_key(currency.code.as_str()) {
            return Err(StoreError::UniqueViolation(format!(
                "currency {} already exists",
                currency.code
            )));
        }
        currencies.insert(currency.code.as_str().to_string(), currency.clone());
        Ok(currency)
    }

    async fn update_currency(&self, currency: Currency) -> Result<Option<Currency>, StoreError> {
        let mut currencies = self.inner.currencies.write();
        Ok(currencies.get_mut(currency.code.as_str()).map(|slot| {
            *slot = currency;
            slot.clone()
        }))
    }

    async fn list_fees(&self) -> Result<Vec<TransactionFee>, StoreError> {
        Ok(self.inner.fees.read().values().cloned().collect())
    }

    async fn find_fee(&self, code: &FeeCode) -> Result<Option<TransactionFee>, StoreError> {
        Ok(self.inner.fees.read().get(code.as_str()).cloned())
    }

    async fn insert_fee(&self, fee: TransactionFee) -> Result<TransactionFee, StoreError> {
        let mut fees = self.inner.fees.write();
        if fees.contains_key(fee.code.as_str()) {
            return Err(StoreError::UniqueViolation(format!(
                "transaction fee {} already exists",
                fee.code
            )));
        }
        fees.insert(fee.code.as_str().to_string(), fee.clone());
        Ok(fee)
    }

    async fn update_fee(&self, fee: TransactionFee) -> Result<Option<TransactionFee>, StoreError> {
        let mut fees = self.inner.fees.write();
        Ok(fees.get_mut(fee.code.as_str()).map(|slot| {
            *slot = fee;
            slot.clone()
        }))
    }

    async fn delete_fee(&self, code: &FeeCode) -> Result<bool, StoreError> {
        Ok(self.inner.fees.write().remove(code.as_str()).is_some())
    }
}
