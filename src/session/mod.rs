//! Signed-in identity and audit trail
//!
//! The session lives in session storage next to the cache. It is either
//! absent or fully populated; logging out also drops every cached read so the
//! next identity never sees the previous one's data.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::client::ApiGateway;
use crate::client::endpoints::{AUDIT_LOG, wire_name};
use crate::clock::Clock;
use crate::domain::Domain;
use crate::error::{Result, SessionError, StorageError};
use crate::storage::SessionStorage;

pub const USER_KEY: &str = "siwaras_user";
pub const ROLE_KEY: &str = "siwaras_role";
pub const DOMAIN_KEY: &str = "siwaras_db_type";
pub const LOGIN_TIME_KEY: &str = "siwaras_login_time";
pub const ADMIN_ID_KEY: &str = "siwaras_admin_id";

const SESSION_KEYS: [&str; 5] = [USER_KEY, ROLE_KEY, DOMAIN_KEY, LOGIN_TIME_KEY, ADMIN_ID_KEY];

/// Access level, bound to one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    #[serde(rename = "admin-wisuda")]
    AdminWisuda,
    #[serde(rename = "admin-sosprom")]
    AdminSosprom,
    #[serde(rename = "guest-wisuda")]
    GuestWisuda,
    #[serde(rename = "guest-sosprom")]
    GuestSosprom,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AdminWisuda => "admin-wisuda",
            Role::AdminSosprom => "admin-sosprom",
            Role::GuestWisuda => "guest-wisuda",
            Role::GuestSosprom => "guest-sosprom",
        }
    }

    /// Role granted by signing in to `domain` in `mode`
    pub fn for_login(mode: LoginMode, domain: Domain) -> Self {
        match (mode, domain) {
            (LoginMode::Admin, Domain::Wisuda) => Role::AdminWisuda,
            (LoginMode::Admin, Domain::Sosprom) => Role::AdminSosprom,
            (LoginMode::Guest, Domain::Wisuda) => Role::GuestWisuda,
            (LoginMode::Guest, Domain::Sosprom) => Role::GuestSosprom,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::AdminWisuda | Role::AdminSosprom)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin-wisuda" => Ok(Role::AdminWisuda),
            "admin-sosprom" => Ok(Role::AdminSosprom),
            "guest-wisuda" => Ok(Role::GuestWisuda),
            "guest-sosprom" => Ok(Role::GuestSosprom),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Sign-in flavour: full access or read-only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Admin,
    Guest,
}

impl LoginMode {
    fn tag(&self) -> &'static str {
        match self {
            LoginMode::Admin => "ADMIN",
            LoginMode::Guest => "GUEST",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            LoginMode::Admin => "Admin",
            LoginMode::Guest => "Guest",
        }
    }
}

/// Admin record returned by a successful login
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminInfo {
    pub id: Option<String>,
}

impl AdminInfo {
    /// Pull `id_admin` out of the login result's `admin` object.
    /// Spreadsheet ids arrive as strings or numbers.
    pub fn from_value(admin: &Value) -> Self {
        let id = match admin.get("id_admin") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self { id }
    }
}

/// Snapshot of the stored session; all fields absent when logged out
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub username: Option<String>,
    pub role: Option<Role>,
    pub domain: Domain,
    pub login_time: Option<DateTime<Utc>>,
    pub admin_id: Option<String>,
}

/// Handle to a detached audit task; dropping it leaves the task running
pub type AuditHandle = JoinHandle<()>;

/// Session façade over storage, cache and gateway
pub struct SessionManager {
    storage: Arc<SessionStorage>,
    gateway: Arc<ApiGateway>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(
        storage: Arc<SessionStorage>,
        gateway: Arc<ApiGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            gateway,
            clock,
        }
    }

    /// Persist a session in one transaction
    pub fn set_session(
        &self,
        username: &str,
        role: Role,
        domain: Domain,
        admin: &AdminInfo,
    ) -> std::result::Result<(), StorageError> {
        let login_time = DateTime::from_timestamp_millis(self.clock.now_millis())
            .unwrap_or_else(Utc::now)
            .to_rfc3339();

        let mut set = vec![
            (USER_KEY, username),
            (ROLE_KEY, role.as_str()),
            (DOMAIN_KEY, domain.as_str()),
            (LOGIN_TIME_KEY, login_time.as_str()),
        ];
        let mut remove = Vec::new();
        match admin.id.as_deref() {
            Some(id) => set.push((ADMIN_ID_KEY, id)),
            None => remove.push(ADMIN_ID_KEY),
        }

        self.storage.update_items(&set, &remove)?;
        log::debug!("Session set: {} ({}, {})", username, role, domain);
        Ok(())
    }

    /// Current session; fields are `None` (domain defaults) when logged out
    pub fn get_session(&self) -> Session {
        let username = self.item(USER_KEY).filter(|u| !u.is_empty());
        if username.is_none() {
            return Session::default();
        }

        Session {
            username,
            role: self.item(ROLE_KEY).and_then(|r| r.parse().ok()),
            domain: self
                .item(DOMAIN_KEY)
                .and_then(|d| d.parse().ok())
                .unwrap_or_default(),
            login_time: self
                .item(LOGIN_TIME_KEY)
                .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
                .map(|t| t.with_timezone(&Utc)),
            admin_id: self.item(ADMIN_ID_KEY),
        }
    }

    /// Remove the session and every cached read in every domain
    pub fn clear_session(&self) -> std::result::Result<(), StorageError> {
        self.storage.remove_items(&SESSION_KEYS)?;
        self.gateway.cache().invalidate(None);
        log::debug!("Session cleared");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.item(USER_KEY).is_some_and(|u| !u.is_empty())
    }

    /// Record an audit entry for the signed-in user in the background.
    ///
    /// Returns `None` without sending anything when nobody is signed in.
    /// The task never fails; errors are logged and dropped.
    pub fn log_audit(&self, action: &str, details: &str) -> Option<AuditHandle> {
        let session = self.get_session();
        let username = session.username?;

        let data = json!({
            "id_admin": session.admin_id.unwrap_or_default(),
            "username": username,
            "action": action,
            "details": details,
        });
        Some(self.spawn_audit(AUDIT_LOG, data, session.domain))
    }

    /// Sign in, store the session and audit the attempt either way
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
        domain: Domain,
        mode: LoginMode,
    ) -> Result<Session> {
        let action = format!("LOGIN_{}_{}", domain.as_str().to_uppercase(), mode.tag());

        let outcome: Result<AdminInfo> = match self.gateway.login(username, password, domain).await {
            Ok(result) => accepted_admin(&result).ok_or_else(|| {
                let reason = result
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Invalid username or password");
                SessionError::Rejected(reason.to_string()).into()
            }),
            Err(e) => Err(e.into()),
        };

        let admin = match outcome {
            Ok(admin) => admin,
            Err(err) => {
                let data = json!({
                    "username": username,
                    "action": format!("{}_FAILED", action),
                    "details": format!("Login failed: {} ({})", err, username),
                });
                let _ = self.spawn_audit(wire_name(AUDIT_LOG), data, domain).await;
                return Err(err);
            }
        };

        let role = Role::for_login(mode, domain);
        self.set_session(username, role, domain, &admin)?;

        let details = format!(
            "User {} logged in as {} {}",
            username,
            mode.title(),
            domain.title()
        );
        if let Some(handle) = self.log_audit(&action, &details) {
            let _ = handle.await;
        }

        Ok(self.get_session())
    }

    fn spawn_audit(&self, operation: &'static str, data: Value, domain: Domain) -> AuditHandle {
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            if let Err(e) = gateway.write(operation, &data, domain).await {
                log::warn!("Audit log failed (non-critical): {}", e);
            }
        })
    }

    fn item(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).unwrap_or_else(|e| {
            log::warn!("Session read error for {}: {}", key, e);
            None
        })
    }
}

/// Admin record of a successful login result (`auth: true` plus `admin`)
fn accepted_admin(result: &Value) -> Option<AdminInfo> {
    let authed = result.get("auth").and_then(Value::as_bool) == Some(true);
    match result.get("admin") {
        Some(admin) if authed && admin.is_object() => Some(AdminInfo::from_value(admin)),
        _ => None,
    }
}
