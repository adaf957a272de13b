use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use portal_core::{
    admin::{AdminCommand, StatusAction},
    load_settings,
    AuthController, Confirmation, Notice, NoticeKind, Notifier, PortalContext, PortalError,
    RoleDashboard, UploadFile,
};
use serde::Serialize;
use shared::domain::{AnimationId, AvatarId, UserId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "portal-cli", about = "Drive the avatar animation portal from a terminal")]
struct Cli {
    /// Overrides `base_url` from portal.toml and the environment.
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Answer yes to every confirmation prompt.
    #[arg(long)]
    yes: bool,
    /// Print list output as JSON.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Signup {
        fullname: String,
        email: String,
        password: String,
        confirm: String,
    },
    Verify {
        email: String,
        otp: String,
    },
    ResendOtp {
        email: String,
    },
    ForgotPassword {
        email: String,
    },
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Avatars(AvatarCommand),
    #[command(subcommand)]
    Animations(AnimationCommand),
    Plan {
        plan: String,
    },
    #[command(subcommand)]
    Admin(AdminUsersCommand),
    Logout,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Edit {
        fullname: String,
        email: String,
    },
    Picture {
        path: PathBuf,
    },
    Password {
        current: String,
        new: String,
        confirm: String,
    },
    Delete,
}

#[derive(Subcommand, Debug)]
enum AvatarCommand {
    List,
    Upload { path: PathBuf },
    Delete { avatar_id: i64 },
}

#[derive(Subcommand, Debug)]
enum AnimationCommand {
    List,
    Generate {
        avatar_id: String,
        expression_id: String,
    },
    Delete {
        animation_id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum AdminUsersCommand {
    List,
    Search {
        term: String,
    },
    Suspend {
        user_id: i64,
    },
    Activate {
        user_id: i64,
    },
    Edit {
        user_id: i64,
        fullname: String,
        email: String,
    },
    Delete {
        user_id: i64,
    },
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Error => eprintln!("error: {}", notice.message),
            kind => println!("{kind}: {}", notice.message),
        }
    }
}

struct Confirmer {
    assume_yes: bool,
}

impl Confirmer {
    async fn ask(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            println!("{prompt} [y/N] y");
            return Ok(true);
        }
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{prompt} [y/N] ").as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("failed to read confirmation")?;
        Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // Portal failures were already shown by the notifier.
        Err(err) if err.downcast_ref::<PortalError>().is_some() => Ok(ExitCode::FAILURE),
        Err(err) => Err(err),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings();
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    let max_upload_bytes = settings.max_upload_bytes;
    let ctx = PortalContext::connect(settings)?.with_notifier(Arc::new(ConsoleNotifier));
    let auth = AuthController::new(ctx.clone());

    match cli.command {
        Command::Signup {
            fullname,
            email,
            password,
            confirm,
        } => {
            auth.signup(&fullname, &email, &password, &confirm).await?;
            Ok(())
        }
        Command::Verify { email, otp } => Ok(auth.verify_email(&email, &otp).await?),
        Command::ResendOtp { email } => Ok(auth.resend_otp(&email).await?),
        Command::ForgotPassword { email } => Ok(auth.forgot_password(&email).await?),
        command => {
            let email = cli.email.context("--email is required for this command")?;
            let password = cli
                .password
                .context("--password is required for this command")?;
            let outcome = auth.login(&email, &password).await?;
            let role = outcome.role.with_context(|| {
                format!("no dashboard for redirect '{}'", outcome.navigation.path)
            })?;
            let mut dashboard = RoleDashboard::for_role(ctx, role.clone())
                .with_context(|| format!("no dashboard for role '{role}'"))?;

            let report = dashboard.init().await;
            for err in report.failures() {
                warn!(%err, "initial load failed");
            }

            let session = Session {
                dashboard,
                confirmer: Confirmer {
                    assume_yes: cli.yes,
                },
                json: cli.json,
                max_upload_bytes,
            };
            session.execute(command).await
        }
    }
}

struct Session {
    dashboard: RoleDashboard,
    confirmer: Confirmer,
    json: bool,
    max_upload_bytes: u64,
}

impl Session {
    async fn execute(mut self, command: Command) -> Result<()> {
        match command {
            Command::Profile(command) => self.profile(command).await,
            Command::Avatars(command) => self.avatars(command).await,
            Command::Animations(command) => self.animations(command).await,
            Command::Plan { plan } => {
                let plans = self
                    .dashboard
                    .subscription
                    .as_ref()
                    .context("this dashboard has no subscription plans")?;
                Ok(plans.change_plan(&plan).await?)
            }
            Command::Admin(command) => self.admin(command).await,
            Command::Logout => {
                match self.dashboard.session.logout().await {
                    Some(navigation) => println!("signed out, next: {}", navigation.path),
                    None => println!("logout was not confirmed by the server"),
                }
                Ok(())
            }
            Command::Signup { .. }
            | Command::Verify { .. }
            | Command::ResendOtp { .. }
            | Command::ForgotPassword { .. } => Ok(()),
        }
    }

    async fn profile(&mut self, command: ProfileCommand) -> Result<()> {
        let max_upload_bytes = self.max_upload_bytes;
        let profile = &mut self.dashboard.profile;
        match command {
            ProfileCommand::Show => {
                let view = profile.view().context("profile is not loaded")?;
                println!("name:    {}", view.fullname);
                println!("email:   {}", view.email);
                println!("role:    {}", view.role);
                println!("status:  {}", view.subscription_status);
                println!("picture: {}", view.picture.url());
            }
            ProfileCommand::Edit { fullname, email } => {
                profile.begin_edit();
                profile.save_profile(&fullname, &email).await?;
            }
            ProfileCommand::Picture { path } => {
                let file = UploadFile::from_path(&path, max_upload_bytes)
                    .await
                    .map_err(|err| anyhow!("{}: {err}", path.display()))?;
                let url = profile.upload_profile_picture(file).await?;
                println!("{url}");
            }
            ProfileCommand::Password {
                current,
                new,
                confirm,
            } => {
                profile.toggle_password_form();
                let outcome = profile.change_password(&current, &new, &confirm).await;
                if let Some(message) = &profile.password_form().message {
                    println!("{}: {}", message.kind, message.message);
                }
                outcome?;
            }
            ProfileCommand::Delete => {
                let mut prompt = profile.request_account_deletion();
                loop {
                    if !self.confirmer.ask(prompt).await? {
                        profile.decline_account_deletion();
                        println!("cancelled");
                        break;
                    }
                    match profile.confirm_account_deletion().await? {
                        Confirmation::Prompt(next) => prompt = next,
                        Confirmation::Completed(navigation) => {
                            println!("next: {}", navigation.path);
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn avatars(&mut self, command: AvatarCommand) -> Result<()> {
        let (json, max_upload_bytes) = (self.json, self.max_upload_bytes);
        let media = self
            .dashboard
            .media
            .as_mut()
            .context("this dashboard has no avatars")?;
        let avatars = &mut media.avatars;
        match command {
            AvatarCommand::List => {
                if json {
                    return print_json(avatars.items());
                }
                for entry in avatars.entries() {
                    println!("{:>6}  {}  {}", display_id(entry.id), entry.title, entry.url);
                }
            }
            AvatarCommand::Upload { path } => {
                let file = UploadFile::from_path(&path, max_upload_bytes)
                    .await
                    .map_err(|err| anyhow!("{}: {err}", path.display()))?;
                avatars.add(file).await?;
            }
            AvatarCommand::Delete { avatar_id } => {
                let prompt = avatars.request_remove(AvatarId(avatar_id));
                if !self.confirmer.ask(prompt).await? {
                    avatars.decline_remove();
                    println!("cancelled");
                    return Ok(());
                }
                avatars.confirm_remove().await?;
            }
        }
        Ok(())
    }

    async fn animations(&mut self, command: AnimationCommand) -> Result<()> {
        let json = self.json;
        let media = self
            .dashboard
            .media
            .as_mut()
            .context("this dashboard has no animations")?;
        match command {
            AnimationCommand::List => {
                if json {
                    return print_json(media.animations.items());
                }
                for entry in media.animations.entries() {
                    let created = entry
                        .created
                        .map(|date| date.to_string())
                        .unwrap_or_default();
                    println!(
                        "{:>6}  {:<12} {:<10}  {}",
                        display_id(entry.id),
                        entry.title,
                        created,
                        entry.url
                    );
                }
            }
            AnimationCommand::Generate {
                avatar_id,
                expression_id,
            } => {
                let preview = media.generate(&avatar_id, &expression_id).await?;
                println!("{}", preview.url);
            }
            AnimationCommand::Delete { animation_id } => {
                let history = &mut media.animations;
                let prompt = history.request_remove(AnimationId(animation_id));
                if !self.confirmer.ask(prompt).await? {
                    history.decline_remove();
                    println!("cancelled");
                    return Ok(());
                }
                history.confirm_remove().await?;
            }
        }
        Ok(())
    }

    async fn admin(&mut self, command: AdminUsersCommand) -> Result<()> {
        let json = self.json;
        let admin = self
            .dashboard
            .admin
            .as_mut()
            .context("this dashboard has no user administration")?;
        let command = match command {
            AdminUsersCommand::List => {
                if json {
                    return print_json(admin.accounts());
                }
                for row in admin.rows() {
                    print_row(&row);
                }
                return Ok(());
            }
            AdminUsersCommand::Search { term } => {
                let hits = admin.search(&term).len();
                for row in admin.rows() {
                    print_row(&row);
                }
                println!("{hits} match(es)");
                return Ok(());
            }
            AdminUsersCommand::Suspend { user_id } => {
                admin.set_status(UserId(user_id), StatusAction::Suspend);
                None
            }
            AdminUsersCommand::Activate { user_id } => {
                admin.set_status(UserId(user_id), StatusAction::Activate);
                None
            }
            AdminUsersCommand::Delete { user_id } => {
                admin.delete_account(UserId(user_id));
                None
            }
            AdminUsersCommand::Edit {
                user_id,
                fullname,
                email,
            } => Some(AdminCommand::Edit {
                id: UserId(user_id),
                fullname,
                email,
            }),
        };

        if let Some(command) = command {
            admin.dispatch(command).await?;
            return Ok(());
        }
        while let Some(prompt) = admin.pending_prompt() {
            if !self.confirmer.ask(prompt).await? {
                admin.decline();
                println!("cancelled");
                break;
            }
            admin.confirm().await?;
        }
        Ok(())
    }
}

fn display_id<I: ToString>(id: Option<I>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_row(row: &portal_core::admin::AccountRow) {
    let account = &row.account;
    let created = account
        .created_date()
        .map(|date| date.to_string())
        .unwrap_or_default();
    println!(
        "{:>5}  {:<20} {:<28} {:<10} {:<10} {}",
        account.user_id, account.fullname, account.email, row.role_badge.label,
        row.status_badge.label, created
    );
}

fn print_json<T: Serialize>(items: &[T]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}
