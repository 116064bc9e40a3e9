mod cli;

use std::io;
use std::sync::Arc;

use alpha_vault_client::service::{PageRequest, Resource, ResourceService};
use alpha_vault_client::{
    ApiClient, ApiError, AuthApi, AuthEvent, GuardOutcome, LoginOutcome, Registration, RouteGuard,
};
use alpha_vault_core::record::{Budget, Debt, Expense, Income, Investment, SavingsGoal};
use alpha_vault_session::{
    AuthStatus, MemorySessionStore, RedbSessionStore, SessionError, SessionManager, SessionStore,
    StoreError,
};
use alpha_vault_util_error::{FmtCompact as _, WhateverResult};
use clap::Parser;
use cli::{GlobalOpts, Opts, OptsCmd, RegisterOpts, ResourceCmd};
use serde_json::json;
use snafu::{FromString, ResultExt, Snafu, Whatever};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

pub const LOG_TARGET: &str = "alpha_vault::cli";

const SESSION_DB_FILE: &str = "session.redb";

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Session store error: {source}"))]
    Store { source: StoreError },
    #[snafu(display("Session error: {source}"))]
    Session { source: SessionError },
    #[snafu(display("API error: {source}"))]
    Api { source: ApiError },
    #[snafu(display("Invalid record JSON: {source}"))]
    RecordJson { source: serde_json::Error },
    #[snafu(display("Login required, continue at {redirect}"))]
    LoginRequired { redirect: String },
    #[snafu(display("Data dir error: {source:?}"))]
    DataDir { source: io::Error },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    let v = handle_cmd(opts).await?;
    println!("{}", serde_json::to_string_pretty(&v).expect("Can't fail"));
    Ok(())
}

fn open_store(opts: &GlobalOpts) -> CliResult<Arc<dyn SessionStore>> {
    if opts.ephemeral {
        debug!(target: LOG_TARGET, "Using in-memory session store");
        return Ok(Arc::new(MemorySessionStore::new()));
    }

    let data_dir = opts.data_dir();
    std::fs::create_dir_all(data_dir).context(DataDirSnafu)?;
    let path = data_dir.join(SESSION_DB_FILE);

    Ok(Arc::new(RedbSessionStore::open(path).context(StoreSnafu)?))
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    let session = Arc::new(SessionManager::new(open_store(&opts.global)?));
    let api = ApiClient::builder(opts.global.api_url.clone())
        .session(session.clone())
        .build()
        .context(ApiSnafu)?;

    // Entering a feature area goes through the same guard a page navigation would
    if let Some(route) = opts.cmd.protected_route() {
        if let GuardOutcome::Redirect(redirect) = RouteGuard::new(session.clone()).check(route) {
            if redirect.expired {
                warn!(target: LOG_TARGET, "Session expired, please log in again");
            }
            return LoginRequiredSnafu {
                redirect: redirect.to_path(),
            }
            .fail();
        }
    }

    let mut events = api.events();
    let res = dispatch(opts.cmd, &api, &session).await;

    while let Ok(event) = events.try_recv() {
        match event {
            AuthEvent::LoggedIn { user_id } => {
                info!(target: LOG_TARGET, user_id = ?user_id, "Logged in");
            }
            AuthEvent::LoggedOut => {
                info!(target: LOG_TARGET, "Logged out");
            }
            AuthEvent::SessionExpired => {
                warn!(target: LOG_TARGET, "Session expired, please log in again");
            }
        }
    }

    res
}

async fn dispatch(
    cmd: OptsCmd,
    api: &Arc<ApiClient>,
    session: &Arc<SessionManager>,
) -> CliResult<serde_json::Value> {
    let auth = AuthApi::new(api.clone());

    Ok(match cmd {
        OptsCmd::Login { email, password } => {
            let outcome = auth.login(&email, &password).await.context(ApiSnafu)?;
            login_outcome_json(outcome)
        }
        OptsCmd::Register(RegisterOpts {
            email,
            password,
            first_name,
            last_name,
            currency,
            monthly_income,
            accept_terms,
        }) => {
            let registration = Registration {
                email,
                password,
                first_name,
                last_name,
                currency,
                monthly_income,
                accepted_terms: accept_terms,
            };
            auth.register(&registration).await.context(ApiSnafu)?;
            json!({ "registered": registration.email, "confirmationRequired": true })
        }
        OptsCmd::Confirm { email, code } => {
            let outcome = auth
                .confirm_registration(&email, &code)
                .await
                .context(ApiSnafu)?;
            login_outcome_json(outcome)
        }
        OptsCmd::Logout => {
            auth.logout().await;
            serde_json::Value::Bool(true)
        }
        OptsCmd::Status => {
            let status = session.auth_status();
            json!({
                "authenticated": status.is_authenticated(),
                "status": match status {
                    AuthStatus::Token => "token",
                    AuthStatus::Session => "session",
                    AuthStatus::Expired => "expired",
                    AuthStatus::Anonymous => "anonymous",
                },
                "authMode": session.auth_mode().map(|m| m.as_str()),
                "userId": session.get_user_id(),
            })
        }
        OptsCmd::Whoami => {
            let profile = session.profile().context(SessionSnafu)?;
            serde_json::to_value(profile).expect("Can't fail")
        }
        OptsCmd::Guard { route } => match RouteGuard::new(session.clone()).check(&route) {
            GuardOutcome::Allow => json!({ "allow": true, "route": route }),
            GuardOutcome::Redirect(redirect) => json!({
                "allow": false,
                "expired": redirect.expired,
                "redirect": redirect.to_path(),
            }),
        },
        OptsCmd::Budget(cmd) => handle_resource::<Budget>(api, cmd).await?,
        OptsCmd::Income(cmd) => handle_resource::<Income>(api, cmd).await?,
        OptsCmd::Expense(cmd) => handle_resource::<Expense>(api, cmd).await?,
        OptsCmd::Debt(cmd) => handle_resource::<Debt>(api, cmd).await?,
        OptsCmd::Investment(cmd) => handle_resource::<Investment>(api, cmd).await?,
        OptsCmd::Savings(cmd) => handle_resource::<SavingsGoal>(api, cmd).await?,
    })
}

fn login_outcome_json(outcome: LoginOutcome) -> serde_json::Value {
    match outcome {
        LoginOutcome::Token(user_id) => json!({ "authMode": "token", "userId": user_id }),
        LoginOutcome::Session(user_id) => json!({ "authMode": "session", "userId": user_id }),
    }
}

async fn handle_resource<R: Resource>(
    api: &Arc<ApiClient>,
    cmd: ResourceCmd,
) -> CliResult<serde_json::Value> {
    let service = ResourceService::<R>::new(api.clone());

    let res = match cmd {
        ResourceCmd::List { page, size } => service
            .list(PageRequest::new(page, size))
            .await
            .map(|page| serde_json::to_value(page).expect("Can't fail")),
        ResourceCmd::Get { id } => service
            .get(id)
            .await
            .map(|r| serde_json::to_value(r).expect("Can't fail")),
        ResourceCmd::Add { json } => {
            let record: R = serde_json::from_str(&json).context(RecordJsonSnafu)?;
            service
                .create(record)
                .await
                .map(|r| serde_json::to_value(r).expect("Can't fail"))
        }
        ResourceCmd::Update { id, json } => {
            let record: R = serde_json::from_str(&json).context(RecordJsonSnafu)?;
            service
                .update(id, record)
                .await
                .map(|r| serde_json::to_value(r).expect("Can't fail"))
        }
        ResourceCmd::Delete { id } => service.delete(id).await.map(|()| json!({ "deleted": id })),
    };

    match res {
        Ok(v) => Ok(v),
        Err(err @ ApiError::Unauthorized { .. }) => {
            debug!(target: LOG_TARGET, err = %err.fmt_compact(), resource = R::NAME, "Request rejected");
            LoginRequiredSnafu {
                redirect: alpha_vault_client::LoginRedirect {
                    expired: true,
                    return_to: None,
                }
                .to_path(),
            }
            .fail()
        }
        Err(source) => Err(CliError::Api { source }),
    }
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
