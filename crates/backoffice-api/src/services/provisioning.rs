//! # Account Provisioning
//!
//! [`AccountProvisioner::create_account`] runs its checks in a fixed order
//! and stops at the first failure:
//!
//! 1. requester exists and holds `provision_accounts`
//! 2. target user (by NIK) exists
//! 3. branch, then account type, exist
//! 4. currency (defaulting to the base currency) exists
//! 5. PIN is six ASCII digits
//!
//! Only then is the PIN hashed and the ledger asked to allocate a sequence
//! and insert the account. Failures in steps 1–5 leave no durable trace and
//! consume no sequence value.

use std::sync::Arc;

use backoffice_core::{
    Account, AccountId, AccountNumber, AccountTypeId, BranchId, Capability, CurrencyCode, Nik,
    RawPin, SecretHasher, SequenceKey, UserId,
};

use super::{hash_pin, ServiceError};
use crate::authz::{AuthorizationGate, Requester};
use crate::store::{AccountChange, AccountDraft, AccountLedger, Directory};

/// Input of [`AccountProvisioner::create_account`].
///
/// String fields arrive unparsed so that each is rejected at its own step.
#[derive(Clone)]
pub struct CreateAccount {
    /// Employee opening the account.
    pub requester: UserId,
    /// Issuing branch.
    pub branch: BranchId,
    /// Product.
    pub account_type: AccountTypeId,
    /// National identity number of the future owner.
    pub target_nik: String,
    /// Raw PIN.
    pub pin: String,
    /// Currency code; the base currency when absent.
    pub currency: Option<String>,
}

impl std::fmt::Debug for CreateAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAccount")
            .field("requester", &self.requester)
            .field("branch", &self.branch)
            .field("account_type", &self.account_type)
            .field("target_nik", &self.target_nik)
            .field("pin", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish()
    }
}

/// Input of [`AccountProvisioner::update_account`].
#[derive(Clone, Default)]
pub struct UpdateAccount {
    /// Replacement PIN, if the PIN changes.
    pub pin: Option<String>,
}

impl std::fmt::Debug for UpdateAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateAccount")
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Account creation, reads and PIN updates.
#[derive(Clone)]
pub struct AccountProvisioner {
    gate: Arc<dyn AuthorizationGate>,
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn AccountLedger>,
    hasher: SecretHasher,
    base_currency: CurrencyCode,
}

impl AccountProvisioner {
    /// Wire the provisioner to its collaborators.
    pub fn new(
        gate: Arc<dyn AuthorizationGate>,
        directory: Arc<dyn Directory>,
        ledger: Arc<dyn AccountLedger>,
        hasher: SecretHasher,
        base_currency: CurrencyCode,
    ) -> Self {
        Self {
            gate,
            directory,
            ledger,
            hasher,
            base_currency,
        }
    }

    /// Currency assigned when a request names none.
    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    /// Open a new account.
    pub async fn create_account(&self, req: CreateAccount) -> Result<Account, ServiceError> {
        let requester = self
            .gate
            .require(req.requester, Capability::ProvisionAccounts)
            .await?;

        let owner = match Nik::new(req.target_nik.as_str()) {
            Ok(nik) => self.directory.find_user_by_nik(&nik).await?,
            Err(_) => None,
        }
        .ok_or_else(|| ServiceError::NotFound(format!("user with NIK {}", req.target_nik)))?;

        self.directory
            .find_branch(req.branch)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("branch {}", req.branch)))?;
        self.directory
            .find_account_type(req.account_type)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account type {}", req.account_type)))?;

        // Blank means unspecified.
        let requested = req
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());
        let currency = match requested {
            None => Some(self.base_currency.clone()),
            Some(raw) => CurrencyCode::new(raw).ok(),
        };
        let currency = match currency {
            Some(code) => self.directory.find_currency(&code).await?.map(|c| c.code),
            None => None,
        }
        .ok_or_else(|| {
            let code = requested.unwrap_or(self.base_currency.as_str());
            ServiceError::NotFound(format!("currency {code}"))
        })?;

        let pin = RawPin::new(req.pin)?;
        let pin_hash = hash_pin(&self.hasher, pin).await?;

        let key = SequenceKey::new(req.branch, req.account_type);
        let account = self
            .ledger
            .create_account(AccountDraft {
                id: AccountId::new(),
                user_id: owner.id,
                employee_id: requester.user_id,
                key,
                currency,
                pin_hash,
            })
            .await
            .map_err(|e| {
                tracing::warn!(sequence_key = %key, error = %e, "account insert failed");
                ServiceError::from(e)
            })?;

        tracing::info!(
            account_number = %account.account_number,
            sequence = account.sequence_number,
            sequence_key = %key,
            employee_id = %requester.user_id,
            "account provisioned"
        );
        Ok(account)
    }

    /// Every account. Requires `provision_accounts`.
    pub async fn list_accounts(&self, requester: UserId) -> Result<Vec<Account>, ServiceError> {
        self.gate
            .require(requester, Capability::ProvisionAccounts)
            .await?;
        Ok(self.ledger.list_accounts().await?)
    }

    /// Accounts owned by the requester. Needs no capability.
    pub async fn my_accounts(&self, requester: UserId) -> Result<Vec<Account>, ServiceError> {
        let requester = self.gate.resolve(requester).await?;
        Ok(self.ledger.accounts_for_user(requester.user_id).await?)
    }

    /// One account. Allowed for `provision_accounts` holders and the owner.
    pub async fn get_account(
        &self,
        requester: UserId,
        number: &str,
    ) -> Result<Account, ServiceError> {
        let requester = self.gate.resolve(requester).await?;
        let account = self.find(number).await?;
        Self::check_access(&requester, &account)?;
        Ok(account)
    }

    /// Change an account's PIN and employee of record.
    ///
    /// Allowed for `provision_accounts` holders and the owner. When staff
    /// update an account they become its employee of record.
    pub async fn update_account(
        &self,
        requester: UserId,
        number: &str,
        change: UpdateAccount,
    ) -> Result<Account, ServiceError> {
        let requester = self.gate.resolve(requester).await?;
        let account = self.find(number).await?;
        Self::check_access(&requester, &account)?;

        let employee_id = if requester.has(Capability::ProvisionAccounts) {
            requester.user_id
        } else {
            account.employee_id
        };
        let pin_hash = match change.pin {
            Some(raw) => Some(hash_pin(&self.hasher, RawPin::new(raw)?).await?),
            None => None,
        };
        let pin_changed = pin_hash.is_some();

        let updated = self
            .ledger
            .update_account(
                &account.account_number,
                AccountChange {
                    employee_id,
                    pin_hash,
                },
            )
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account {number}")))?;

        tracing::info!(
            account_number = %updated.account_number,
            updated_by = %requester.user_id,
            pin_changed,
            "account updated"
        );
        Ok(updated)
    }

    async fn find(&self, number: &str) -> Result<Account, ServiceError> {
        let parsed = AccountNumber::parse(number)
            .map_err(|_| ServiceError::NotFound(format!("account {number}")))?;
        self.ledger
            .find_account(&parsed)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account {number}")))
    }

    fn check_access(requester: &Requester, account: &Account) -> Result<(), ServiceError> {
        if requester.has(Capability::ProvisionAccounts) || account.is_owned_by(requester.user_id) {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized(format!(
                "account {} belongs to another user",
                account.account_number
            )))
        }
    }
}
