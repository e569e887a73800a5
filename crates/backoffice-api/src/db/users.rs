//! User and role persistence operations.

use backoffice_core::{Capability, CapabilitySet, Nik, Role, RoleId, User, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::corrupt;
use crate::store::{StoreError, UserQuery};

const USER_COLUMNS: &str = "id, employee_id, nik, role_id, full_name, username, email, phone,
     password_hash, created_at";

const ROLE_COLUMNS: &str = "id, name, can_provision_accounts, can_manage_users,
     can_manage_branches, can_manage_account_types, can_manage_currencies, can_manage_fees";

/// Insert a new user.
pub async fn insert(pool: &PgPool, user: &User) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO users (id, employee_id, nik, role_id, full_name, username, email,
         phone, password_hash, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(user.id.as_uuid())
    .bind(user.employee_id.map(|e| *e.as_uuid()))
    .bind(user.nik.as_str())
    .bind(user.role_id.as_str())
    .bind(&user.full_name)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a user by id.
pub async fn get_by_id(pool: &PgPool, id: UserId) -> Result<Option<User>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id.as_uuid())
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_record).transpose()
}

/// Fetch a user by NIK.
pub async fn get_by_nik(pool: &PgPool, nik: &Nik) -> Result<Option<User>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE nik = $1"
    ))
    .bind(nik.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_record).transpose()
}

/// Users matching any of the given NIK, username or e-mail.
pub async fn search(pool: &PgPool, query: &UserQuery) -> Result<Vec<User>, StoreError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE nik = $1 OR username = $2 OR email = $3
         ORDER BY username"
    ))
    .bind(query.nik.as_deref())
    .bind(query.username.as_deref())
    .bind(query.email.as_deref())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(UserRow::into_record).collect()
}

/// Fetch a role by id.
pub async fn get_role(pool: &PgPool, id: &RoleId) -> Result<Option<Role>, StoreError> {
    let row = sqlx::query_as::<_, RoleRow>(&format!(
        "SELECT {ROLE_COLUMNS} FROM user_roles WHERE id = $1"
    ))
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(RoleRow::into_record).transpose()
}

/// All roles.
pub async fn list_roles(pool: &PgPool) -> Result<Vec<Role>, StoreError> {
    let rows = sqlx::query_as::<_, RoleRow>(&format!(
        "SELECT {ROLE_COLUMNS} FROM user_roles ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(RoleRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    employee_id: Option<Uuid>,
    nik: String,
    role_id: String,
    full_name: String,
    username: String,
    email: String,
    phone: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> Result<User, StoreError> {
        Ok(User {
            id: UserId::from_uuid(self.id),
            employee_id: self.employee_id.map(UserId::from_uuid),
            nik: Nik::new(self.nik).map_err(corrupt("NIK"))?,
            role_id: RoleId::new(self.role_id).map_err(corrupt("role id"))?,
            full_name: self.full_name,
            username: self.username,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: String,
    name: String,
    can_provision_accounts: bool,
    can_manage_users: bool,
    can_manage_branches: bool,
    can_manage_account_types: bool,
    can_manage_currencies: bool,
    can_manage_fees: bool,
}

impl RoleRow {
    fn into_record(self) -> Result<Role, StoreError> {
        let flags = [
            (self.can_provision_accounts, Capability::ProvisionAccounts),
            (self.can_manage_users, Capability::ManageUsers),
            (self.can_manage_branches, Capability::ManageBranches),
            (self.can_manage_account_types, Capability::ManageAccountTypes),
            (self.can_manage_currencies, Capability::ManageCurrencies),
            (self.can_manage_fees, Capability::ManageFees),
        ];
        let capabilities: CapabilitySet = flags
            .into_iter()
            .filter_map(|(granted, capability)| granted.then_some(capability))
            .collect();
        Ok(Role {
            id: RoleId::new(self.id).map_err(corrupt("role id"))?,
            name: self.name,
            capabilities,
        })
    }
}
