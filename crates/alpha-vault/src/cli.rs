use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::{Args, Parser, Subcommand};
use url::Url;

/// Command line front end of the Alpha Vault finance tracker
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Where the session database lives
    #[arg(env = "ALPHA_VAULT_DATA_DIR", long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Backend base URL
    #[arg(
        env = "ALPHA_VAULT_API_URL",
        long,
        global = true,
        default_value = "http://localhost:8080"
    )]
    pub api_url: Url,

    /// Keep the session in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

static PROJECT_DIRS: LazyLock<directories::ProjectDirs> = LazyLock::new(|| {
    directories::ProjectDirs::from("org", "AlphaVault", "alpha-vault")
        .expect("Unable to determine project's dir")
});

impl GlobalOpts {
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or_else(|| {
            PROJECT_DIRS
                .state_dir()
                .unwrap_or_else(|| PROJECT_DIRS.data_local_dir())
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ALPHA_VAULT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Submit a new account registration
    Register(RegisterOpts),
    /// Confirm a registration with the emailed code, and log in
    Confirm {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    Logout,
    /// Show whether there is a usable session
    Status,
    /// Show the cached profile
    Whoami,
    /// Check whether a protected route may be entered
    Guard {
        #[arg(default_value = "/dashboard")]
        route: String,
    },
    #[command(subcommand)]
    Budget(ResourceCmd),
    #[command(subcommand)]
    Income(ResourceCmd),
    #[command(subcommand)]
    Expense(ResourceCmd),
    #[command(subcommand)]
    Debt(ResourceCmd),
    #[command(subcommand)]
    Investment(ResourceCmd),
    #[command(subcommand)]
    Savings(ResourceCmd),
}

impl OptsCmd {
    /// Route a command stands for, if it needs a logged-in user
    pub fn protected_route(&self) -> Option<&'static str> {
        Some(match self {
            OptsCmd::Budget(_) => "/budgets",
            OptsCmd::Income(_) => "/incomes",
            OptsCmd::Expense(_) => "/expenses",
            OptsCmd::Debt(_) => "/debts",
            OptsCmd::Investment(_) => "/investments",
            OptsCmd::Savings(_) => "/savings",
            _ => return None,
        })
    }
}

#[derive(Debug, Args)]
pub struct RegisterOpts {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "ALPHA_VAULT_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long, default_value = "USD")]
    pub currency: String,
    #[arg(long)]
    pub monthly_income: Option<f64>,
    #[arg(long)]
    pub accept_terms: bool,
}

#[derive(Debug, Subcommand)]
pub enum ResourceCmd {
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    Get {
        id: u64,
    },
    /// Create a record from its JSON form
    Add {
        json: String,
    },
    Update {
        id: u64,
        json: String,
    },
    Delete {
        id: u64,
    },
}
