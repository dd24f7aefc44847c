//! Bandsite CLI - Database migrations and platform management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema + session store)
//! bandsite-cli migrate
//!
//! # Create a band site at midnight-owls.{platform domain}
//! bandsite-cli tenant create -s midnight-owls -n "Midnight Owls" -d midnightowls.com
//!
//! # List and deactivate tenants
//! bandsite-cli tenant list
//! bandsite-cli tenant deactivate -s midnight-owls
//!
//! # Create the band's first admin
//! bandsite-cli admin create -t midnight-owls -e owner@example.com -n "Sam" -r owner
//! bandsite-cli admin list -t midnight-owls
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bandsite-cli")]
#[command(author, version, about = "Bandsite CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage tenants (band sites)
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum TenantAction {
    /// Create a new tenant
    Create {
        /// Subdomain label
        #[arg(short, long)]
        slug: String,

        /// Band or artist name
        #[arg(short, long)]
        name: String,

        /// Custom domain served alongside the subdomain
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// List all tenants
    List,
    /// Stop serving a tenant's site
    Deactivate {
        #[arg(short, long)]
        slug: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user for a tenant
    Create {
        /// Tenant slug
        #[arg(short, long)]
        tenant: String,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`owner`, `editor`)
        #[arg(short, long, default_value = "owner")]
        role: String,
    },
    /// List a tenant's admin users
    List {
        /// Tenant slug
        #[arg(short, long)]
        tenant: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Tenant { action } => match action {
            TenantAction::Create { slug, name, domain } => {
                commands::tenant::create(&slug, &name, domain.as_deref()).await?;
            }
            TenantAction::List => commands::tenant::list().await?,
            TenantAction::Deactivate { slug } => commands::tenant::deactivate(&slug).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                tenant,
                email,
                name,
                role,
            } => {
                commands::admin::create_user(&tenant, &email, &name, &role).await?;
            }
            AdminAction::List { tenant } => commands::admin::list_users(&tenant).await?,
        },
    }
    Ok(())
}
