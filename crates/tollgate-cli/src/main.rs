//! Tollgate CLI - operator commands
//!
//! Usage:
//!   tollgate check-password <password>
//!   tollgate hash-password <password>
//!   tollgate issue <identity-id>
//!   tollgate inspect <token>
//!   tollgate migrate

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tollgate_api::auth::{
    CredentialHasher, PasswordPolicy, SigningKey, TokenService, TokenVerifier, VerifyingKey,
};
use tollgate_core::{AppConfig, PgSessionStore};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "Session token service CLI")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a password against the policy
    CheckPassword { password: String },
    /// Print the Argon2id hash of a password
    HashPassword { password: String },
    /// Sign a token pair for an identity
    Issue {
        identity: String,
        #[arg(long)]
        private_key: Option<PathBuf>,
        #[arg(long)]
        public_key: Option<PathBuf>,
    },
    /// Verify a token and print its claims
    Inspect {
        token: String,
        #[arg(long)]
        public_key: Option<PathBuf>,
    },
    /// Apply database migrations
    Migrate {
        #[arg(long)]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::CheckPassword { password } => {
            let policy = PasswordPolicy::from_config(&config.password);
            match policy.validate(&password) {
                Ok(()) => println!("ok"),
                Err(violation) => bail!("{violation} (failed rule: {:?})", violation.rule),
            }
        }
        Commands::HashPassword { password } => {
            let hasher = CredentialHasher::from_config(&config.password)?;
            println!("{}", hasher.hash(&password)?);
        }
        Commands::Issue {
            identity,
            private_key,
            public_key,
        } => {
            let identity = Uuid::parse_str(&identity).context("invalid user id format")?;
            let private_key = private_key.unwrap_or_else(|| config.tokens.private_key_path.clone());
            let public_key = public_key.unwrap_or_else(|| config.tokens.public_key_path.clone());

            let service = TokenService::with_keys(
                SigningKey::from_file(&private_key)?,
                VerifyingKey::from_file(&public_key)?,
                &config.tokens,
            )?;
            let pair = service.issue(identity)?;
            tracing::info!(
                identity_id = %identity,
                issuer = %config.tokens.issuer,
                "Issued token pair"
            );
            println!("{}", serde_json::to_string_pretty(&pair)?);
        }
        Commands::Inspect { token, public_key } => {
            let public_key = public_key.unwrap_or_else(|| config.tokens.public_key_path.clone());
            let verifier = TokenVerifier::new(
                VerifyingKey::from_file(&public_key)?,
                config.tokens.issuer.clone(),
            );

            let valid = verifier.verify(&token)?;
            let claims = verifier.extract_claims(&token)?;
            let report = serde_json::json!({
                "identity": claims.identity,
                "kind": claims.kind,
                "token_id": claims.token_id,
                "issued_at": claims.issued_at.to_rfc3339(),
                "expires_at": claims.expires_at.to_rfc3339(),
                "expired": !valid,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Migrate { database_url } => {
            let url = database_url.unwrap_or_else(|| config.database.url.clone());
            tracing::info!("Connecting to session store");
            let store = PgSessionStore::connect(&url, 1).await?;
            store.migrate().await?;
            tracing::info!("Migrations complete");
            store.close().await;
            println!("migrations applied");
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)
            .and_then(AppConfig::with_env_override)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_issue() {
        let cli = Cli::try_parse_from([
            "tollgate",
            "issue",
            "8f14e45f-ceea-4e7a-9d5b-2c3f0a1b2c3d",
            "--private-key",
            "k.pem",
        ])
        .unwrap();

        match cli.command {
            Commands::Issue {
                identity,
                private_key,
                public_key,
            } => {
                assert_eq!(identity, "8f14e45f-ceea-4e7a-9d5b-2c3f0a1b2c3d");
                assert_eq!(private_key, Some(PathBuf::from("k.pem")));
                assert!(public_key.is_none());
            }
            _ => panic!("expected issue"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["tollgate", "check-password", "Abcd123!", "--config", "t.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("t.toml")));
    }
}
