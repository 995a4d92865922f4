use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use git_release::config;
use git_release::git::{Git2Repository, ReleaseRepository};
use git_release::preflight::{self, ReleaseWarning};
use git_release::{logging, ui, ReleaseError, ReleaseRequest, Releaser};

#[derive(clap::Parser)]
#[command(
    name = "git-release",
    about = "Set the release version, commit, tag, open the next snapshot and push"
)]
struct Args {
    #[arg(value_name = "VERSION", help = "Version to release (e.g. 1.0.0)")]
    release_version: String,

    #[arg(
        value_name = "NEW_VERSION",
        help = "Next development version, without the snapshot suffix (e.g. 1.1.0)"
    )]
    next_version: String,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Path inside the repository to release"
    )]
    repo: PathBuf,

    #[arg(short, long, help = "Skip confirmation prompts")]
    force: bool,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logging::init_tracing(args.verbose);

    if let Err(err) = run(args) {
        report_failure(&err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let repo = Git2Repository::open(&args.repo)?;
    tracing::debug!(workdir = %repo.workdir().display(), "opened repository");

    let config = config::load_config(args.config.as_deref(), repo.workdir())
        .context("Error loading config")?;

    let request = ReleaseRequest::new(args.release_version, args.next_version);
    let releaser = Releaser::new(&repo, &config);
    let plan = releaser.plan(&request)?;

    let warnings = preflight::check(&repo, &config, &request)?;
    for warning in &warnings {
        ui::display_warning(warning);
    }

    ui::display_plan(&plan);

    if args.dry_run {
        ui::display_status("Dry run: no files, commits, tags or remotes were changed");
        return Ok(());
    }

    if let Some(ReleaseWarning::TagAlreadyExists { tag }) =
        warnings.iter().find(|w| w.is_blocking())
    {
        return Err(ReleaseError::TagExists(tag.clone()).into());
    }

    if !args.force {
        if !warnings.is_empty() && !ui::confirm_action("Continue despite the warnings above?")? {
            println!("Operation cancelled by user.");
            return Ok(());
        }

        let prompt = format!(
            "Release {} and push to {}/{}?",
            plan.tag, config.remote, config.branch
        );
        if !ui::confirm_action(&prompt)? {
            println!("Operation cancelled by user.");
            return Ok(());
        }
    }

    let outcome = releaser.run_with_progress(&request, ui::display_step)?;

    println!();
    ui::display_success(&format!(
        "Released {} ({}), development continues at {}",
        outcome.tag,
        short_hash(&outcome.release_commit.to_string()),
        config.snapshot_version(&request.new_version)
    ));

    Ok(())
}

fn report_failure(err: &anyhow::Error) {
    ui::display_error(&format!("{:#}", err));

    if let Some(ReleaseError::StepFailed {
        completed,
        published,
        ..
    }) = err.downcast_ref::<ReleaseError>()
    {
        ui::display_partial_release(completed, *published);
    }
}

fn short_hash(hash: &str) -> &str {
    if hash.len() > 7 {
        &hash[..7]
    } else {
        hash
    }
}
