use anyhow::anyhow;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{database, output_success};
use crate::cli::OutputFormat;
use crate::error::ApiError;
use crate::services::UserService;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an ADMIN account")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, help = "Sign-in email")]
        email: String,

        #[arg(long, help = "Password (at least 6 characters)")]
        password: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create { name, email, password } => {
            let db = database()?;
            let users = UserService::new(db.pool().clone());

            let result = users.bootstrap_admin(name, email, password).await;
            db.close().await;

            let user = result.map_err(|e| {
                let e = ApiError::from(e);
                match e.to_json().get("field_errors") {
                    Some(fields) => anyhow!("{}: {}", e.message(), fields),
                    None => anyhow!("{}", e.message()),
                }
            })?;

            output_success(
                &output_format,
                &format!("Admin {} created", user.email),
                Some(json!({ "id": user.id, "email": user.email, "role": user.role })),
            )
        }
    }
}
