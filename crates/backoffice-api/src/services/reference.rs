//! # Users and Reference Data
//!
//! Capability-gated management of users, branches, account types,
//! currencies and transaction fees.
//!
//! | Operation                         | Capability            |
//! |-----------------------------------|-----------------------|
//! | add / search users                | `manage_users`        |
//! | read a user by NIK                | `manage_users` or self |
//! | add / update branches             | `manage_branches`     |
//! | add / update account types        | `manage_account_types` |
//! | add / update currencies           | `manage_currencies`   |
//! | add / update / delete fees        | `manage_fees`         |
//! | read branches, types, currencies, fees | any known user   |
//!
//! Partial updates keep the stored value for every absent or blank field.

use std::sync::Arc;

use backoffice_core::{
    AccountType, AccountTypeId, Branch, BranchId, Capability, Currency, CurrencyCode, FeeCode,
    NewAccountType, NewBranch, Nik, RoleId, SecretHasher, TransactionFee, User, UserId,
    ValidationError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::{hash_password, ServiceError};
use crate::authz::AuthorizationGate;
use crate::store::{Directory, UserQuery};

/// Minimum password length for new users.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A user registration.
#[derive(Deserialize, ToSchema)]
pub struct NewUser {
    /// National identity number.
    pub nik: String,
    /// Role code; `USR` when absent.
    pub role_id: Option<String>,
    /// Full legal name.
    pub full_name: String,
    /// Login name.
    pub username: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Initial password. Zeroed after hashing.
    #[schema(value_type = String, format = Password)]
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("nik", &self.nik)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Partial update of a branch.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BranchPatch {
    /// New name.
    pub name: Option<String>,
    /// New address.
    pub address: Option<String>,
}

/// Partial update of an account type.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AccountTypePatch {
    /// New name.
    pub name: Option<String>,
    /// New e-toll flag.
    pub can_etoll: Option<bool>,
    /// New Indomaret flag.
    pub can_indomart: Option<bool>,
    /// New Steam flag.
    pub can_steam: Option<bool>,
}

/// Partial update of a currency.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CurrencyPatch {
    /// New display name.
    pub name: Option<String>,
    /// New exchange rate to the base currency.
    #[schema(value_type = Option<String>)]
    pub rate_to_base: Option<Decimal>,
}

/// Partial update of a transaction fee.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FeePatch {
    /// New display name.
    pub name: Option<String>,
    /// New amount.
    #[schema(value_type = Option<String>)]
    pub fee: Option<Decimal>,
}

fn keep_or_replace(current: &mut String, new: Option<String>) {
    if let Some(value) = new {
        if !value.trim().is_empty() {
            *current = value.trim().to_string();
        }
    }
}

/// Users and reference data.
#[derive(Clone)]
pub struct ReferenceData {
    gate: Arc<dyn AuthorizationGate>,
    directory: Arc<dyn Directory>,
    hasher: SecretHasher,
}

impl ReferenceData {
    /// Wire the service to its collaborators.
    pub fn new(
        gate: Arc<dyn AuthorizationGate>,
        directory: Arc<dyn Directory>,
        hasher: SecretHasher,
    ) -> Self {
        Self {
            gate,
            directory,
            hasher,
        }
    }

    // -- Users --------------------------------------------------------------

    /// Register a user. The requester becomes the user's employee of record.
    pub async fn add_user(&self, requester: UserId, new: NewUser) -> Result<User, ServiceError> {
        let requester = self.gate.require(requester, Capability::ManageUsers).await?;
        let registered_by = requester.user_id;
        self.register(Some(registered_by), new).await
    }

    /// Register a user without a requester. Used to bootstrap the first
    /// administrator.
    pub(crate) async fn register(
        &self,
        registered_by: Option<UserId>,
        new: NewUser,
    ) -> Result<User, ServiceError> {
        let nik = Nik::new(new.nik)?;
        let role_id = match new.role_id {
            Some(raw) => RoleId::new(raw)?,
            None => RoleId::default_user(),
        };
        if new.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }

        let mut user = User {
            id: UserId::new(),
            employee_id: registered_by,
            nik,
            role_id,
            full_name: new.full_name.trim().to_string(),
            username: new.username.trim().to_string(),
            email: new.email.trim().to_string(),
            phone: new.phone.trim().to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        user.validate()?;

        if self.directory.find_user_by_nik(&user.nik).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "user with NIK {} already exists",
                user.nik
            )));
        }
        if self.directory.find_role(&user.role_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("role {}", user.role_id)));
        }

        user.password_hash = hash_password(&self.hasher, new.password).await?;
        let user = self.directory.insert_user(user).await?;
        tracing::info!(user_id = %user.id, role_id = %user.role_id, "user registered");
        Ok(user)
    }

    /// Look up a user by NIK. Users may always read themselves.
    pub async fn get_user_by_nik(&self, requester: UserId, nik: &str) -> Result<User, ServiceError> {
        let requester = self.gate.resolve(requester).await?;
        let user = match Nik::new(nik) {
            Ok(nik) => self.directory.find_user_by_nik(&nik).await?,
            Err(_) => None,
        }
        .ok_or_else(|| ServiceError::NotFound(format!("user with NIK {nik}")))?;
        if user.id != requester.user_id {
            requester.require(Capability::ManageUsers)?;
        }
        Ok(user)
    }

    /// Users matching any of NIK, username or e-mail.
    pub async fn search_users(
        &self,
        requester: UserId,
        query: UserQuery,
    ) -> Result<Vec<User>, ServiceError> {
        self.gate.require(requester, Capability::ManageUsers).await?;
        if query.is_empty() {
            return Err(ValidationError::EmptyField("search criteria").into());
        }
        Ok(self.directory.search_users(&query).await?)
    }

    // -- Branches -----------------------------------------------------------

    /// Every branch.
    pub async fn list_branches(&self, requester: UserId) -> Result<Vec<Branch>, ServiceError> {
        self.gate.resolve(requester).await?;
        Ok(self.directory.list_branches().await?)
    }

    /// One branch.
    pub async fn get_branch(&self, requester: UserId, id: BranchId) -> Result<Branch, ServiceError> {
        self.gate.resolve(requester).await?;
        self.directory
            .find_branch(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("branch {id}")))
    }

    /// Open a branch.
    pub async fn add_branch(&self, requester: UserId, new: NewBranch) -> Result<Branch, ServiceError> {
        self.gate.require(requester, Capability::ManageBranches).await?;
        let new = NewBranch {
            name: new.name.trim().to_string(),
            address: new.address.trim().to_string(),
        };
        new.validate()?;
        let branch = self.directory.insert_branch(new).await?;
        tracing::info!(branch_id = %branch.id, "branch added");
        Ok(branch)
    }

    /// Edit a branch.
    pub async fn update_branch(
        &self,
        requester: UserId,
        id: BranchId,
        patch: BranchPatch,
    ) -> Result<Branch, ServiceError> {
        self.gate.require(requester, Capability::ManageBranches).await?;
        let mut branch = self
            .directory
            .find_branch(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("branch {id}")))?;
        keep_or_replace(&mut branch.name, patch.name);
        keep_or_replace(&mut branch.address, patch.address);
        branch.validate()?;
        self.directory
            .update_branch(branch)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("branch {id}")))
    }

    // -- Account types ------------------------------------------------------

    /// Every account type.
    pub async fn list_account_types(
        &self,
        requester: UserId,
    ) -> Result<Vec<AccountType>, ServiceError> {
        self.gate.resolve(requester).await?;
        Ok(self.directory.list_account_types().await?)
    }

    /// One account type.
    pub async fn get_account_type(
        &self,
        requester: UserId,
        id: AccountTypeId,
    ) -> Result<AccountType, ServiceError> {
        self.gate.resolve(requester).await?;
        self.directory
            .find_account_type(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account type {id}")))
    }

    /// Introduce an account type.
    pub async fn add_account_type(
        &self,
        requester: UserId,
        new: NewAccountType,
    ) -> Result<AccountType, ServiceError> {
        self.gate
            .require(requester, Capability::ManageAccountTypes)
            .await?;
        let new = NewAccountType {
            name: new.name.trim().to_string(),
            ..new
        };
        new.validate()?;
        let account_type = self.directory.insert_account_type(new).await?;
        tracing::info!(account_type_id = %account_type.id, "account type added");
        Ok(account_type)
    }

    /// Edit an account type.
    pub async fn update_account_type(
        &self,
        requester: UserId,
        id: AccountTypeId,
        patch: AccountTypePatch,
    ) -> Result<AccountType, ServiceError> {
        self.gate
            .require(requester, Capability::ManageAccountTypes)
            .await?;
        let mut account_type = self
            .directory
            .find_account_type(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account type {id}")))?;
        keep_or_replace(&mut account_type.name, patch.name);
        account_type.can_etoll = patch.can_etoll.unwrap_or(account_type.can_etoll);
        account_type.can_indomart = patch.can_indomart.unwrap_or(account_type.can_indomart);
        account_type.can_steam = patch.can_steam.unwrap_or(account_type.can_steam);
        account_type.validate()?;
        self.directory
            .update_account_type(account_type)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account type {id}")))
    }

    // -- Currencies ---------------------------------------------------------

    /// Every currency.
    pub async fn list_currencies(&self, requester: UserId) -> Result<Vec<Currency>, ServiceError> {
        self.gate.resolve(requester).await?;
        Ok(self.directory.list_currencies().await?)
    }

    /// One currency.
    pub async fn get_currency(&self, requester: UserId, code: &str) -> Result<Currency, ServiceError> {
        self.gate.resolve(requester).await?;
        let code = CurrencyCode::new(code)?;
        self.directory
            .find_currency(&code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("currency {code}")))
    }

    /// Introduce a currency.
    pub async fn add_currency(
        &self,
        requester: UserId,
        currency: Currency,
    ) -> Result<Currency, ServiceError> {
        self.gate
            .require(requester, Capability::ManageCurrencies)
            .await?;
        let currency = Currency {
            name: currency.name.trim().to_string(),
            ..currency
        };
        currency.validate()?;
        if self.directory.find_currency(&currency.code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "currency {} already exists",
                currency.code
            )));
        }
        let currency = self.directory.insert_currency(currency).await?;
        tracing::info!(currency = %currency.code, rate = %currency.rate_to_base, "currency added");
        Ok(currency)
    }

    /// Edit a currency's name or rate.
    pub async fn update_currency(
        &self,
        requester: UserId,
        code: &str,
        patch: CurrencyPatch,
    ) -> Result<Currency, ServiceError> {
        self.gate
            .require(requester, Capability::ManageCurrencies)
            .await?;
        let code = CurrencyCode::new(code)?;
        let mut currency = self
            .directory
            .find_currency(&code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("currency {code}")))?;
        keep_or_replace(&mut currency.name, patch.name);
        if let Some(rate) = patch.rate_to_base {
            currency.rate_to_base = rate;
        }
        currency.validate()?;
        self.directory
            .update_currency(currency)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("currency {code}")))
    }

    // -- Transaction fees ---------------------------------------------------

    /// Every transaction fee.
    pub async fn list_fees(&self, requester: UserId) -> Result<Vec<TransactionFee>, ServiceError> {
        self.gate.resolve(requester).await?;
        Ok(self.directory.list_fees().await?)
    }

    /// One transaction fee.
    pub async fn get_fee(&self, requester: UserId, code: &str) -> Result<TransactionFee, ServiceError> {
        self.gate.resolve(requester).await?;
        let code = FeeCode::new(code)?;
        self.directory
            .find_fee(&code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction fee {code}")))
    }

    /// Introduce a transaction fee.
    pub async fn add_fee(
        &self,
        requester: UserId,
        fee: TransactionFee,
    ) -> Result<TransactionFee, ServiceError> {
        self.gate.require(requester, Capability::ManageFees).await?;
        let fee = TransactionFee {
            name: fee.name.trim().to_string(),
            ..fee
        };
        fee.validate()?;
        if self.directory.find_fee(&fee.code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "transaction fee {} already exists",
                fee.code
            )));
        }
        let fee = self.directory.insert_fee(fee).await?;
        tracing::info!(fee_code = %fee.code, amount = %fee.fee, "transaction fee added");
        Ok(fee)
    }

    /// Edit a transaction fee.
    pub async fn update_fee(
        &self,
        requester: UserId,
        code: &str,
        patch: FeePatch,
    ) -> Result<TransactionFee, ServiceError> {
        self.gate.require(requester, Capability::ManageFees).await?;
        let code = FeeCode::new(code)?;
        let mut fee = self
            .directory
            .find_fee(&code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction fee {code}")))?;
        keep_or_replace(&mut fee.name, patch.name);
        if let Some(amount) = patch.fee {
            fee.fee = amount;
        }
        fee.validate()?;
        self.directory
            .update_fee(fee)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction fee {code}")))
    }

    /// Remove a transaction fee.
    pub async fn delete_fee(&self, requester: UserId, code: &str) -> Result<(), ServiceError> {
        self.gate.require(requester, Capability::ManageFees).await?;
        let code = FeeCode::new(code)?;
        if !self.directory.delete_fee(&code).await? {
            return Err(ServiceError::NotFound(format!("transaction fee {code}")));
        }
        tracing::info!(fee_code = %code, "transaction fee deleted");
        Ok(())
    }
}
