//! CLI argument parsing, validation, and startup helpers.

use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::ServerConfig;
use crate::client::{ClientError, ClientResult, FileTokenStore, TodoClient};
use crate::clock::SystemClock;
use crate::db::Database;
use crate::password::DEFAULT_COST;
use crate::wire::TodoItem;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "taskbook", about = "Todo list API server and client")]
pub struct Args {
    /// Log output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the API server
    Serve(ServeArgs),
    /// Talk to a running server
    Client(ClientArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Path to SQLite database file (":memory:" for a throwaway database)
    #[arg(short, long, env = "DATABASE_URL", default_value = "taskbook.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Allowed CORS origins, comma separated. "*" allows any origin
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    /// Disable per-IP rate limiting of the auth endpoints
    #[arg(long)]
    pub no_rate_limit: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of the API
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:3000")]
    pub api_url: String,

    /// File holding the access and refresh tokens
    #[arg(long, env = "TASKBOOK_SESSION", default_value = ".taskbook-session.json")]
    pub session_file: String,

    #[command(subcommand)]
    pub action: ClientAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ClientAction {
    /// Create an account and log in
    Signup {
        email: String,
        #[arg(long, env = "TASKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in to an existing account
    Login {
        email: String,
        #[arg(long, env = "TASKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List todos
    List,
    /// Add a todo
    Add { title: String },
    /// Mark a todo as completed
    Done { id: i64 },
    /// Mark a todo as not completed
    Undo { id: i64 },
    /// Change a todo's title
    Rename { id: i64, title: String },
    /// Flip a todo's completed flag
    Toggle { id: i64 },
    /// Delete a todo
    Rm { id: i64 },
}

/// Initialize logging based on the specified format. `RUST_LOG` overrides `default_level`.
/// Logs go to stderr.
pub fn init_logging(format: &LogFormat, default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    cors_origins: Vec<String>,
    no_rate_limit: bool,
) -> ServerConfig {
    let cors_origins = cors_origins
        .into_iter()
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        clock: Arc::new(SystemClock),
        bcrypt_cost: DEFAULT_COST,
        cors_origins,
        rate_limit: !no_rate_limit,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

fn print_todo(todo: &TodoItem) {
    let mark = if todo.completed { "x" } else { " " };
    println!("[{}] {:>4}  {}", mark, todo.id, todo.title);
}

/// Run one client action against the API, printing the result to stdout.
pub async fn run_client(args: ClientArgs) -> ClientResult<()> {
    let store = Arc::new(FileTokenStore::new(&args.session_file));
    let client = TodoClient::connect(&args.api_url, store)?;

    let needs_session = !matches!(
        args.action,
        ClientAction::Signup { .. } | ClientAction::Login { .. } | ClientAction::Logout
    );
    if needs_session && !client.is_logged_in() {
        return Err(ClientError::NotLoggedIn);
    }

    match args.action {
        ClientAction::Signup { email, password } => {
            client.signup(&email, &password).await?;
            println!("Signed up as {}", email.trim().to_lowercase());
        }
        ClientAction::Login { email, password } => {
            client.login(&email, &password).await?;
            println!("Logged in as {}", email.trim().to_lowercase());
        }
        ClientAction::Logout => {
            client.logout().await?;
            println!("Logged out");
        }
        ClientAction::Whoami => {
            let user = client.verify().await?;
            println!("{} (id {})", user.email, user.id);
        }
        ClientAction::List => {
            let todos = client.list_todos().await?;
            if todos.is_empty() {
                println!("No todos");
            }
            todos.iter().for_each(print_todo);
        }
        ClientAction::Add { title } => print_todo(&client.create_todo(&title).await?),
        ClientAction::Done { id } => print_todo(&client.set_completed(id, true).await?),
        ClientAction::Undo { id } => print_todo(&client.set_completed(id, false).await?),
        ClientAction::Rename { id, title } => print_todo(&client.rename_todo(id, &title).await?),
        ClientAction::Toggle { id } => print_todo(&client.toggle_todo(id).await?),
        ClientAction::Rm { id } => {
            client.delete_todo(id).await?;
            println!("Deleted {}", id);
        }
    }

    Ok(())
}
