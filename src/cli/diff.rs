//! Diff command - print the diff hunk of a pull request

use crate::cli::CliProgress;
use crate::cli::context::{CommandContext, GlobalOptions};
use lapo::error::Result;
use std::io::Write;

/// Run the diff command
pub async fn run_diff(options: &GlobalOptions, pr_url: &str, quiet: bool) -> Result<()> {
    let ctx = CommandContext::new(options).await?;
    let progress = CliProgress::new(quiet);

    let result = ctx.pipeline.diff(pr_url, &progress).await;
    progress.finish();
    let diff = result?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(diff.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
