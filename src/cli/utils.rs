use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(fields)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Pool for the configured database; commands fail on first use if it is unreachable
pub fn database() -> anyhow::Result<DatabaseManager> {
    Ok(DatabaseManager::connect_lazy(&config::config().database)?)
}
