//! Submit command - turn a patch file into a pull request

use crate::cli::CliProgress;
use crate::cli::context::{CommandContext, GlobalOptions};
use crate::cli::style::{CHECK, Stylize, arrow, hyperlink};
use anstream::println;
use dialoguer::Confirm;
use lapo::error::{Error, Result};
use lapo::publish::PrPublisher;
use lapo::types::{PatchRequest, PipelineOutcome};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Options for the submit command
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Repository to open the PR against
    pub repo_url: String,
    /// Patch file, or `-` for stdin
    pub patch_file: PathBuf,
    /// Rationale, used for the commit message and PR body
    pub reasoning: String,
    /// PR title without prefix
    pub title: Option<String>,
    /// Branch name to push
    pub branch: Option<String>,
    /// Triggering reference for the PR body
    pub triggered_by: Option<String>,
    /// Existing working tree instead of the cache
    pub repo_path: Option<PathBuf>,
    /// Preview and prompt before pushing
    pub confirm: bool,
    /// Hide the spinner
    pub quiet: bool,
}

/// Read patch text from a file, or stdin for `-`
pub fn read_patch(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read patch {}: {e}", path.display())))
}

/// Run the submit command
pub async fn run_submit(global: &GlobalOptions, options: SubmitOptions) -> Result<()> {
    let patch_text = read_patch(&options.patch_file)?;
    // A blank patch needs neither a credential nor a working copy.
    if lapo::stage::is_blank_patch(&patch_text) {
        println!("{}", "No changes detected".muted());
        return Ok(());
    }
    let ctx = CommandContext::new(global).await?;

    let request = PatchRequest {
        repo_url: options.repo_url,
        branch_name: options.branch,
        title: options.title,
        reasoning: options.reasoning,
        patch_text,
        triggering_reference: options.triggered_by,
        local_path: options.repo_path,
    };

    if options.confirm {
        print_submit_preview(&ctx, &request);
        if !Confirm::new()
            .with_prompt("Push branch and open pull request?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
        println!();
    }

    let progress = CliProgress::new(options.quiet);
    let result = ctx.pipeline.submit(request, &progress).await;
    progress.finish();

    match result? {
        PipelineOutcome::NoChanges => {
            println!("{}", "No changes detected".muted());
        }
        PipelineOutcome::Published(record) => {
            println!(
                "{} {}",
                format!("{CHECK} Opened pull request #{}:", record.number).success(),
                hyperlink(&record.result_url).accent()
            );
        }
    }
    Ok(())
}

/// Print what submit is about to do for --confirm
fn print_submit_preview(ctx: &CommandContext, request: &PatchRequest) {
    let config = ctx.pipeline.config();
    let publisher = PrPublisher::new(config);
    let (added, removed) = count_changes(&request.patch_text);

    println!("{}:", "Submit plan".emphasis());
    println!();
    println!("  {} repository: {}", arrow(), request.repo_url.accent());
    println!(
        "  {} branch: {}",
        arrow(),
        request
            .branch_name
            .as_deref()
            .unwrap_or("(generated)")
            .accent()
    );
    println!(
        "  {} title: {}",
        arrow(),
        publisher.compose_title(request.title.as_deref())
    );
    println!(
        "  {} base: {}",
        arrow(),
        publisher.base_branch().accent()
    );
    println!(
        "  {} patch: {} {}",
        arrow(),
        format!("+{added}").success(),
        format!("-{removed}").failure()
    );
    println!();
}

/// Added and removed line counts in a unified diff, ignoring file headers
fn count_changes(patch: &str) -> (usize, usize) {
    patch.lines().fold((0, 0), |(added, removed), line| {
        if line.starts_with("+++") || line.starts_with("---") {
            (added, removed)
        } else if line.starts_with('+') {
            (added + 1, removed)
        } else if line.starts_with('-') {
            (added, removed + 1)
        } else {
            (added, removed)
        }
    })
}
