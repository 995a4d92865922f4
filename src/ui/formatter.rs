//! Pure formatting functions for UI output.
//!
//! `format_*` functions build strings and are unit tested; `display_*`
//! functions print them.

use console::style;

use crate::preflight::ReleaseWarning;
use crate::release::{ReleasePlan, ReleaseStep};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a preflight warning with a yellow warning icon.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow().bold(), warning);
}

/// Display the full release plan, numbered.
pub fn display_plan(plan: &ReleasePlan) {
    println!("\n{}", style(format!("Release plan for {}:", plan.tag)).bold());
    print!("{}", format_plan(plan));
}

/// Display the step about to run, e.g. "[3/7] create tag v1.0.0".
pub fn display_step(index: usize, total: usize, step: &ReleaseStep) {
    display_status(&format_step(index, total, step));
}

/// Display what a failed run already did, so the operator can repair it.
///
/// # Arguments
/// * `completed` - Descriptions of the steps that finished
/// * `published` - Whether a push had already succeeded
pub fn display_partial_release(completed: &[String], published: bool) {
    if completed.is_empty() {
        eprintln!("{} No release step completed.", style("→").yellow());
        return;
    }

    eprintln!("\n{}", style("Completed before the failure:").bold());
    for (i, step) in completed.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, step);
    }

    if published {
        eprintln!(
            "\n{} {}",
            style("⚠ WARNING:").yellow().bold(),
            "Changes were already pushed; the remote holds a partial release that must be fixed manually."
        );
    } else {
        eprintln!(
            "\n{} Nothing was pushed; local commits and tags can be reset before retrying.",
            style("→").yellow()
        );
    }
}

pub fn format_step(index: usize, total: usize, step: &ReleaseStep) -> String {
    format!("[{}/{}] {}", index, total, step)
}

/// One line per step, indented and numbered from 1.
pub fn format_plan(plan: &ReleasePlan) -> String {
    let mut out = format!("  version file: {}\n", plan.version_file.display());
    for (i, step) in plan.steps.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, step));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan() -> ReleasePlan {
        ReleasePlan {
            version_file: PathBuf::from("/repo/version.sbt"),
            tag: "v1.0.0".to_string(),
            steps: vec![
                ReleaseStep::WriteVersion {
                    version: "1.0.0".to_string(),
                },
                ReleaseStep::PushTags {
                    remote: "origin".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_format_plan() {
        let text = format_plan(&plan());
        assert_eq!(
            text,
            format!(
                "  version file: {}\n  1. set version to 1.0.0\n  2. push tags to origin\n",
                PathBuf::from("/repo/version.sbt").display()
            )
        );
    }

    #[test]
    fn test_format_step() {
        let step = ReleaseStep::Tag {
            name: "v1.0.0".to_string(),
            message: "v1.0.0".to_string(),
        };
        assert_eq!(format_step(3, 7, &step), "[3/7] create tag v1.0.0");
    }

    #[test]
    fn test_display_functions_do_not_panic() {
        display_error("test error");
        display_success("test success");
        display_status("test status");
        display_warning(&ReleaseWarning::DirtyWorkingTree);
        display_plan(&plan());
        display_partial_release(&[], false);
        display_partial_release(&["push branch to origin/master".to_string()], true);
    }
}
