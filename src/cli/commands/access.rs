use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::Principal;
use crate::cli::OutputFormat;
use crate::database::models::Role;
use crate::rbac::{self, AccessDecision};

#[derive(Subcommand)]
pub enum AccessCommands {
    #[command(about = "Show what the route guard does for a role and path")]
    Check {
        #[arg(help = "Role: CLIENT, TEAM_MEMBER, PROJECT_MANAGER, ADMIN or ANONYMOUS")]
        role: String,

        #[arg(help = "Request path, e.g. /dashboard/admin/users")]
        path: String,

        #[arg(long, help = "Treat the account as deactivated")]
        inactive: bool,
    },
}

/// Human summary of a guard decision
pub fn describe(decision: &AccessDecision) -> String {
    match decision {
        AccessDecision::Continue => "allow".to_string(),
        AccessDecision::Deny(status) => format!("deny {}", status.as_u16()),
        redirect => format!("redirect {}", redirect.location().unwrap_or_default()),
    }
}

pub fn handle(cmd: AccessCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AccessCommands::Check { role, path, inactive } => {
            let principal = match role.trim().to_ascii_uppercase().as_str() {
                "ANONYMOUS" | "NONE" => None,
                other => Some(Principal {
                    id: Uuid::nil(),
                    email: "cli@localhost".to_string(),
                    name: "Access Check".to_string(),
                    role: other.parse::<Role>().map_err(anyhow::Error::msg)?,
                    is_active: !inactive,
                }),
            };

            let decision = rbac::authorize(&path, principal.as_ref());
            let summary = describe(&decision);

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "role": principal.as_ref().map(|p| p.role.as_str()).unwrap_or("ANONYMOUS"),
                        "path": path,
                        "active": !inactive,
                        "decision": summary,
                        "location": decision.location()
                    }))?
                ),
                OutputFormat::Text => println!("{} {} -> {}", role, path, summary),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn decisions_read_plainly() {
        assert_eq!(describe(&AccessDecision::Continue), "allow");
        assert_eq!(describe(&AccessDecision::Deny(StatusCode::FORBIDDEN)), "deny 403");
        assert_eq!(describe(&AccessDecision::RedirectUnauthorized), "redirect /unauthorized");
        assert_eq!(
            describe(&AccessDecision::RedirectSignIn { error: Some(rbac::DEACTIVATED_ERROR) }),
            "redirect /auth/signin?error=account-deactivated"
        );
    }
}
