//! Account administration. The controller owns the only copy of the account
//! collection; it is replaced wholesale on every load and filtered in memory.

use shared::{
    domain::{Account, Role, SubscriptionStatus, UserId},
    protocol::AdminAccountUpdate,
};
use tracing::{debug, info};

use crate::{
    confirm::{Acknowledged, Confirmation, ConfirmationGate},
    context::PortalContext,
    error::{PortalError, PortalResult},
    events::PortalEvent,
    notifier::NoticeKind,
    validation::is_valid_email,
};

pub const NEUTRAL_COLOR: &str = "#757575";

const SUSPEND_PROMPTS: &[&str] = &["Are you sure you want to suspend this user?"];
const ACTIVATE_PROMPTS: &[&str] = &["Are you sure you want to activate this user?"];
const DELETE_PROMPTS: &[&str] =
    &["Are you sure you want to DELETE this user? This action cannot be undone!"];

pub fn role_color(role: &Role) -> &'static str {
    match role {
        Role::Admin => "#d32f2f",
        Role::Subscriber => "#1976d2",
        Role::User => "#388e3c",
        Role::Unknown(_) => NEUTRAL_COLOR,
    }
}

pub fn status_color(status: &SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "#388e3c",
        SubscriptionStatus::Inactive => "#757575",
        SubscriptionStatus::Suspended => "#d32f2f",
        SubscriptionStatus::Unknown(_) => NEUTRAL_COLOR,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub color: &'static str,
}

impl Badge {
    pub fn for_role(role: &Role) -> Self {
        Self {
            label: known_or_unknown(role.is_known(), role.as_str()),
            color: role_color(role),
        }
    }

    pub fn for_status(status: &SubscriptionStatus) -> Self {
        Self {
            label: known_or_unknown(status.is_known(), status.as_str()),
            color: status_color(status),
        }
    }
}

fn known_or_unknown(known: bool, raw: &str) -> String {
    if known {
        raw.to_string()
    } else {
        "unknown".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Suspend,
    Activate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Suspend,
    Activate,
    Delete,
}

/// Render-ready table row. Each action dispatches an [`AdminCommand`] for
/// the row's account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub account: Account,
    pub role_badge: Badge,
    pub status_badge: Badge,
    pub actions: Vec<RowAction>,
}

impl AccountRow {
    pub fn new(account: Account) -> Self {
        let toggle = if account.subscription_status.is_suspended() {
            RowAction::Activate
        } else {
            RowAction::Suspend
        };
        Self {
            role_badge: Badge::for_role(&account.role),
            status_badge: Badge::for_status(&account.subscription_status),
            actions: vec![RowAction::Edit, toggle, RowAction::Delete],
            account,
        }
    }

    pub fn command(&self, action: RowAction) -> AdminCommand {
        let id = self.account.user_id;
        match action {
            RowAction::Edit => AdminCommand::Edit {
                id,
                fullname: self.account.fullname.clone(),
                email: self.account.email.clone(),
            },
            RowAction::Suspend => AdminCommand::Suspend(id),
            RowAction::Activate => AdminCommand::Activate(id),
            RowAction::Delete => AdminCommand::Delete(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Suspend(UserId),
    Activate(UserId),
    Edit {
        id: UserId,
        fullname: String,
        email: String,
    },
    Delete(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityDraft {
    pub user_id: UserId,
    pub fullname: String,
    pub email: String,
}

/// Case-insensitive substring match on name or email. A blank term keeps
/// everything.
pub fn filter_accounts<'a>(accounts: &'a [Account], term: &str) -> Vec<&'a Account> {
    let needle = term.trim().to_lowercase();
    accounts
        .iter()
        .filter(|account| {
            needle.is_empty()
                || account.fullname.to_lowercase().contains(&needle)
                || account.email.to_lowercase().contains(&needle)
        })
        .collect()
}

pub struct AdminUserController {
    ctx: PortalContext,
    accounts: Vec<Account>,
    filter: Option<String>,
    pending: ConfirmationGate<AdminCommand>,
}

impl AdminUserController {
    pub fn new(ctx: PortalContext) -> Self {
        Self {
            ctx,
            accounts: Vec::new(),
            filter: None,
            pending: ConfirmationGate::default(),
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn visible(&self) -> Vec<&Account> {
        filter_accounts(&self.accounts, self.filter.as_deref().unwrap_or_default())
    }

    pub fn rows(&self) -> Vec<AccountRow> {
        self.visible()
            .into_iter()
            .cloned()
            .map(AccountRow::new)
            .collect()
    }

    fn publish_rows(&self) {
        self.ctx.publish(PortalEvent::AccountsReplaced {
            rows: self.rows(),
            filter: self.filter.clone(),
        });
    }

    /// Refetches the whole collection. Any active search is dropped.
    pub async fn load_all(&mut self) -> PortalResult<()> {
        let result = self.ctx.api().list_accounts().await;
        let accounts = self.ctx.surface(result, "Failed to load users")?;
        debug!(count = accounts.len(), "account cache replaced");
        self.accounts = accounts;
        self.filter = None;
        self.publish_rows();
        Ok(())
    }

    /// Filters the cached collection; never touches the network.
    pub fn search(&mut self, term: &str) -> Vec<&Account> {
        let term = term.trim();
        self.filter = (!term.is_empty()).then(|| term.to_string());
        self.publish_rows();
        self.visible()
    }

    pub fn set_status(&mut self, user_id: UserId, action: StatusAction) -> &'static str {
        match action {
            StatusAction::Suspend => self.gate(AdminCommand::Suspend(user_id), SUSPEND_PROMPTS),
            StatusAction::Activate => self.gate(AdminCommand::Activate(user_id), ACTIVATE_PROMPTS),
        }
    }

    pub fn delete_account(&mut self, user_id: UserId) -> &'static str {
        self.gate(AdminCommand::Delete(user_id), DELETE_PROMPTS)
    }

    fn gate(&mut self, command: AdminCommand, prompts: &'static [&'static str]) -> &'static str {
        let prompt = self.pending.request(command, prompts);
        self.ctx
            .publish(PortalEvent::ConfirmationRequested { prompt });
        prompt
    }

    pub fn pending_prompt(&self) -> Option<&'static str> {
        self.pending.pending_prompt()
    }

    pub fn decline(&mut self) -> bool {
        self.pending.decline().is_some()
    }

    pub async fn confirm(&mut self) -> PortalResult<Confirmation<()>> {
        match self.pending.acknowledge() {
            None => Err(PortalError::NothingPending),
            Some(Acknowledged::NextPrompt(prompt)) => {
                self.ctx
                    .publish(PortalEvent::ConfirmationRequested { prompt });
                Ok(Confirmation::Prompt(prompt))
            }
            Some(Acknowledged::Ready(command)) => {
                self.execute(command).await?;
                Ok(Confirmation::Completed(()))
            }
        }
    }

    /// Current identity of a cached account, for pre-filling the edit prompt.
    pub fn begin_edit(&self, user_id: UserId) -> PortalResult<IdentityDraft> {
        self.accounts
            .iter()
            .find(|account| account.user_id == user_id)
            .map(|account| IdentityDraft {
                user_id,
                fullname: account.fullname.clone(),
                email: account.email.clone(),
            })
            .ok_or_else(|| PortalError::validation("User not found"))
    }

    pub async fn edit_identity(
        &mut self,
        user_id: UserId,
        fullname: &str,
        email: &str,
    ) -> PortalResult<()> {
        let (fullname, email) = (fullname.trim(), email.trim());
        let checked = if fullname.is_empty() || email.is_empty() {
            Err(PortalError::validation("Full name and email are required"))
        } else if !is_valid_email(email) {
            Err(PortalError::validation("Please enter a valid email address"))
        } else {
            Ok(())
        };
        self.ctx.surface(checked, "")?;

        self.execute(AdminCommand::Edit {
            id: user_id,
            fullname: fullname.to_string(),
            email: email.to_string(),
        })
        .await
    }

    /// Entry point for row actions. Destructive commands park behind a
    /// confirmation; edits go straight through.
    pub async fn dispatch(&mut self, command: AdminCommand) -> PortalResult<Confirmation<()>> {
        match command {
            AdminCommand::Suspend(id) => {
                Ok(Confirmation::Prompt(self.set_status(id, StatusAction::Suspend)))
            }
            AdminCommand::Activate(id) => {
                Ok(Confirmation::Prompt(self.set_status(id, StatusAction::Activate)))
            }
            AdminCommand::Delete(id) => Ok(Confirmation::Prompt(self.delete_account(id))),
            AdminCommand::Edit {
                id,
                fullname,
                email,
            } => {
                self.edit_identity(id, &fullname, &email).await?;
                Ok(Confirmation::Completed(()))
            }
        }
    }

    async fn execute(&mut self, command: AdminCommand) -> PortalResult<()> {
        let api = self.ctx.api();
        let (result, fallback, done) = match &command {
            AdminCommand::Suspend(id) => (
                api.update_account(*id, &AdminAccountUpdate::Suspend).await,
                "Failed to suspend user",
                "User suspended successfully",
            ),
            AdminCommand::Activate(id) => (
                api.update_account(*id, &AdminAccountUpdate::Activate).await,
                "Failed to activate user",
                "User activated successfully",
            ),
            AdminCommand::Edit {
                id,
                fullname,
                email,
            } => (
                api.update_account(
                    *id,
                    &AdminAccountUpdate::Edit {
                        fullname: fullname.clone(),
                        email: email.clone(),
                    },
                )
                .await,
                "Failed to update user",
                "User updated successfully",
            ),
            AdminCommand::Delete(id) => (
                api.delete_account(*id).await,
                "Failed to delete user",
                "User deleted successfully",
            ),
        };
        let ack = self.ctx.surface(result, fallback)?;
        info!(?command, "admin action applied");
        self.ctx.notify(NoticeKind::Success, ack.message_or(done));
        let _ = self.load_all().await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/admin_tests.rs"]
mod tests;
