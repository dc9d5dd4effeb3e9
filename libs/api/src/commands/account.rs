//! Domains, accounts, users and projects.

use rigger_id::{AccountId, DomainId, ProjectId, ResourceKind, ResourceRef, UserId};
use rigger_lifecycle::DeleteAction;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::delete_action;
use crate::client::Client;
use crate::de::opt_number;
use crate::error::ApiError;
use crate::principal::Principal;
use crate::resource::{CreateSpec, ListQuery, Params, RemoteResource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "parentdomainid")]
    pub parent_domain_id: Option<DomainId>,
    #[serde(default, rename = "networkdomain")]
    pub network_domain: Option<String>,
}

impl RemoteResource for Domain {
    const KIND: ResourceKind = ResourceKind::Domain;
    const RESPONSE_KEY: &'static str = "domain";
    const LIST_COMMAND: &'static str = "listDomains";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn parent(&self) -> Option<ResourceRef> {
        self.parent_domain_id.as_ref().map(DomainId::to_ref)
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createDomain`.
#[derive(Debug, Clone, Default)]
pub struct CreateDomain {
    pub name: String,
    pub parent_domain_id: Option<DomainId>,
    pub network_domain: Option<String>,
}

impl CreateDomain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn under(mut self, parent: &DomainId) -> Self {
        self.parent_domain_id = Some(parent.clone());
        self
    }
}

impl CreateSpec for CreateDomain {
    type Output = Domain;
    const COMMAND: &'static str = "createDomain";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .opt("parentdomainid", self.parent_domain_id.as_ref())
            .opt("networkdomain", self.network_domain.as_ref())
    }
}

/// Account role, as the numeric `accounttype` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    User,
    Admin,
    DomainAdmin,
}

impl AccountType {
    pub fn code(self) -> u8 {
        match self {
            AccountType::User => 0,
            AccountType::Admin => 1,
            AccountType::DomainAdmin => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, rename = "accountid")]
    pub account_id: Option<AccountId>,
    #[serde(default, rename = "domainid")]
    pub domain_id: Option<DomainId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "apikey")]
    pub api_key: Option<String>,
}

impl RemoteResource for User {
    const KIND: ResourceKind = ResourceKind::User;
    const RESPONSE_KEY: &'static str = "user";
    const LIST_COMMAND: &'static str = "listUsers";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.username)
    }

    fn parent(&self) -> Option<ResourceRef> {
        self.account_id.as_ref().map(AccountId::to_ref)
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    #[serde(default, rename = "accounttype", deserialize_with = "opt_number")]
    pub account_type: Option<u8>,
    #[serde(rename = "domainid")]
    pub domain_id: DomainId,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "user")]
    pub users: Vec<User>,
}

impl RemoteResource for Account {
    const KIND: ResourceKind = ResourceKind::Account;
    const RESPONSE_KEY: &'static str = "account";
    const LIST_COMMAND: &'static str = "listAccounts";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn parent(&self) -> Option<ResourceRef> {
        Some(self.domain_id.to_ref())
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createAccount`. Creates the account together with its first user.
#[derive(Debug, Clone, Default)]
pub struct CreateAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub account_type: AccountType,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
    pub role_id: Option<String>,
    pub network_domain: Option<String>,
}

impl CreateAccount {
    /// Account whose name, username and email all derive from `username`.
    pub fn user(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            email: format!("{username}@test.invalid"),
            first_name: "Test".to_string(),
            last_name: username.clone(),
            username,
            password: password.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn admin(mut self) -> Self {
        self.account_type = AccountType::Admin;
        self
    }

    #[must_use]
    pub fn domain_admin(mut self) -> Self {
        self.account_type = AccountType::DomainAdmin;
        self
    }

    #[must_use]
    pub fn in_domain(mut self, domain_id: &DomainId) -> Self {
        self.domain_id = Some(domain_id.clone());
        self
    }
}

impl CreateSpec for CreateAccount {
    type Output = Account;
    const COMMAND: &'static str = "createAccount";

    fn params(&self) -> Params {
        Params::new()
            .set("email", &self.email)
            .set("firstname", &self.first_name)
            .set("lastname", &self.last_name)
            .set("username", &self.username)
            .set("password", &self.password)
            .set("accounttype", self.account_type.code())
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
            .opt("roleid", self.role_id.as_ref())
            .opt("networkdomain", self.network_domain.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, rename = "displaytext")]
    pub display_text: Option<String>,
    #[serde(default, rename = "domainid")]
    pub domain_id: Option<DomainId>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl RemoteResource for Project {
    const KIND: ResourceKind = ResourceKind::Project;
    const RESPONSE_KEY: &'static str = "project";
    const LIST_COMMAND: &'static str = "listProjects";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn parent(&self) -> Option<ResourceRef> {
        self.domain_id.as_ref().map(DomainId::to_ref)
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createProject`.
#[derive(Debug, Clone, Default)]
pub struct CreateProject {
    pub name: String,
    pub display_text: String,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
}

impl CreateProject {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_text: name.clone(),
            name,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn owned_by(mut self, account: &Account) -> Self {
        self.account = Some(account.name.clone());
        self.domain_id = Some(account.domain_id.clone());
        self
    }
}

impl CreateSpec for CreateProject {
    type Output = Project;
    const COMMAND: &'static str = "createProject";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .set("displaytext", &self.display_text)
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct UserKeys {
    #[serde(rename = "apikey")]
    api_key: String,
    #[serde(rename = "secretkey")]
    secret_key: String,
}

impl Client {
    /// `listUsers`.
    pub async fn list_users(&self, query: &ListQuery) -> Result<Vec<User>, ApiError> {
        self.list::<User>(query).await
    }

    /// `registerUserKeys`: generate API keys for a user.
    pub async fn register_user_keys(&self, user: &User) -> Result<Principal, ApiError> {
        let keys: UserKeys = self
            .execute_into(
                "registerUserKeys",
                Params::new().set("id", &user.id),
                "userkeys",
            )
            .await?;
        Ok(Principal::new(keys.api_key, keys.secret_key).named(&user.username))
    }

    /// Principal for the first user of `account`, generating keys for it.
    pub async fn principal_for(&self, account: &Account) -> Result<Principal, ApiError> {
        let users = self
            .list_users(
                &ListQuery::new()
                    .account(&account.name, account.domain_id.as_str())
                    .list_all(),
            )
            .await?;
        let user = users
            .first()
            .or_else(|| account.users.first())
            .ok_or_else(|| {
                ApiError::decode("listUsers", format!("account {} has no users", account.name))
            })?;
        let principal = self.register_user_keys(user).await?;
        info!(account = %account.name, user = %user.username, "Registered user keys");
        Ok(principal)
    }

    /// `updateAccount` with a new name.
    pub async fn rename_account(
        &self,
        account: &Account,
        new_name: &str,
    ) -> Result<Account, ApiError> {
        self.execute_into(
            "updateAccount",
            Params::new().set("id", &account.id).set("newname", new_name),
            "account",
        )
        .await
    }

    /// `disableAccount`. `lock` keeps resources running but blocks logins.
    pub async fn disable_account(
        &self,
        account: &AccountId,
        lock: bool,
    ) -> Result<Account, ApiError> {
        self.execute_into(
            "disableAccount",
            Params::new().set("id", account).set("lock", lock),
            "account",
        )
        .await
    }

    /// `enableAccount`.
    pub async fn enable_account(&self, account: &AccountId) -> Result<Account, ApiError> {
        self.execute_into("enableAccount", Params::new().set("id", account), "account")
            .await
    }
}
