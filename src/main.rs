// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Zenark command-line client
//!
//! Drives the session lifecycle from a terminal: sign in, sign up, check
//! the stored session and manage passwords.

use anyhow::Context;
use clap::{Parser, Subcommand};
use zenark_client::{
    config::Config,
    error::AuthError,
    models::Credentials,
    session::SessionStatus,
    validation::SignupForm,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "zenark", version, about = "Zenark account client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Ask for a short-lived token
        #[arg(long)]
        no_remember: bool,
    },
    /// Create an account (does not sign in)
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Fetch the profile from the server and update the cached copy
        #[arg(long)]
        refresh: bool,
    },
    /// Check the stored session with the server
    Status,
    /// Change the password of the signed-in user
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Reset a forgotten password
    ResetPassword {
        #[command(subcommand)]
        step: ResetStep,
    },
}

#[derive(Subcommand)]
enum ResetStep {
    /// Email a reset key
    Init {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with the emailed key
    Finish {
        #[arg(long)]
        key: String,
        #[arg(long)]
        new: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(api = %config.api_base_url, "Starting Zenark client");

    let app = AppState::open(config)
        .await
        .context("Failed to open secure store")?;
    let _listener = app.session.spawn_invalidation_listener();
    app.session.restore().await;

    let signing_in = matches!(cli.command, Command::Login { .. });
    if let Err(e) = run(&app, cli.command).await {
        tracing::debug!(error = %e, "Command failed");
        if signing_in {
            eprintln!("{}", e.user_message());
        } else {
            eprintln!("{}", e.account_message());
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &AppState, command: Command) -> Result<(), AuthError> {
    match command {
        Command::Login {
            email,
            password,
            no_remember,
        } => {
            let credentials = Credentials::new(email, password).remember(!no_remember);
            let outcome = app.session.login(&credentials).await?;
            println!("Welcome back to Zenark, {}!", outcome.user.display_name());
        }
        Command::Register {
            name,
            email,
            password,
            confirm_password,
            lang,
        } => {
            let form = SignupForm {
                full_name: name,
                email,
                password,
                confirm_password,
            };
            let mut request = form.into_request()?;
            request.lang_key = lang;

            let user = app.auth().register(&request).await?;
            println!("Signup successful! Welcome to Zenark, {}.", user.display_name());
        }
        Command::Logout => {
            app.session.logout().await?;
            println!("Signed out.");
        }
        Command::Whoami { refresh } => {
            let user = if refresh {
                Some(app.session.refresh_user().await?)
            } else {
                app.session.state().user
            };

            match user {
                Some(user) => {
                    println!("{} <{}>", user.display_name(), user.email);
                    let roles: Vec<&str> = user.roles.iter().map(String::as_str).collect();
                    println!("login: {}  roles: {}", user.login_id, roles.join(", "));
                }
                None => println!("Not signed in."),
            }
        }
        Command::Status => {
            let state = app.session.state();
            if state.status != SessionStatus::Authenticated {
                println!("Not signed in.");
            } else if app.session.verify().await? {
                println!("Signed in.");
            } else {
                println!("Session expired. Please sign in again.");
            }
        }
        Command::ChangePassword { current, new } => {
            app.auth().change_password(&current, &new).await?;
            println!("Password changed.");
        }
        Command::ResetPassword { step } => match step {
            ResetStep::Init { email } => {
                app.auth().request_password_reset(&email).await?;
                println!("Check your email for a reset key.");
            }
            ResetStep::Finish { key, new } => {
                app.auth().finish_password_reset(&key, &new).await?;
                println!("Password reset. You can sign in now.");
            }
        },
    }
    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,zenark_client=info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
