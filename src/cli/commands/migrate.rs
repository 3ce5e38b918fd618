use crate::cli::utils::{database, output_success};
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let db = database()?;
    db.migrate().await?;
    db.close().await;
    output_success(&output_format, "Migrations applied", None)
}
