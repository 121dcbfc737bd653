//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::api::is_valid_email;
use crate::db::{Database, UserError, UserRole};
use axum::http::HeaderName;
use clap::Parser;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "internhub",
    about = "Internship, course and project request backend"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7291")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "internhub.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Create (or promote) an admin with this email on startup. The password
    /// is read from ADMIN_PASSWORD
    #[arg(long, value_name = "EMAIL")]
    pub create_admin: Option<String>,

    /// Disable public registration (admin creation via --create-admin still works)
    #[arg(long)]
    pub no_signup: bool,

    /// Disable per-IP rate limiting on login and registration
    #[arg(long, env = "INTERNHUB_NO_RATE_LIMIT")]
    pub no_rate_limit: bool,

    /// Read the client IP from this header (e.g. X-Forwarded-For). Only set
    /// this behind a reverse proxy that overwrites it. Without it the socket
    /// address is used
    #[arg(long, env = "INTERNHUB_IP_HEADER", value_name = "HEADER")]
    pub ip_header: Option<HeaderName>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // SAFETY: called once during startup before any other thread exists.
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

    check_secret_length(secret)
}

fn check_secret_length(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }
    Some(secret)
}

/// Create an admin account, or promote and reactivate an existing one.
pub async fn create_admin(db: &Database, email: &str, password: &str) -> Result<(), UserError> {
    match db.users().create_with_role(email, password, UserRole::Admin).await {
        Ok(user) => {
            info!(user_id = user.id, email = %user.email, "Admin user created");
            Ok(())
        }
        Err(UserError::DuplicateEmail) => {
            let user = db
                .users()
                .get_by_email(email)
                .await?
                .ok_or(UserError::NotFound)?;
            db.users().set_role(user.id, UserRole::Admin).await?;
            db.users().set_active(user.id, true).await?;
            info!(user_id = user.id, email = %user.email, "Existing user promoted to admin");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Handle the --create-admin flag. Exits the process on failure.
pub async fn handle_create_admin(db: &Database, email: &str) {
    if !is_valid_email(email.trim()) {
        error!(email = %email, "--create-admin needs a valid email address");
        std::process::exit(1);
    }

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => {
            // SAFETY: called once during startup before any other thread exists.
            unsafe { std::env::remove_var("ADMIN_PASSWORD") };
            password
        }
        _ => {
            error!("Set ADMIN_PASSWORD to the password for the admin created by --create-admin");
            std::process::exit(1);
        }
    };

    if let Err(e) = create_admin(db, email, &password).await {
        error!(error = %e, "Failed to create admin user");
        std::process::exit(1);
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    no_signup: bool,
    no_rate_limit: bool,
    ip_header: Option<HeaderName>,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        no_signup,
        rate_limit: !no_rate_limit,
        ip_header,
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
