use std::path::PathBuf;

use anyhow::Result;
use colored::{ColoredString, Colorize};
use di_core::review::{ReviewComment, Severity};
use di_review::ReviewOutcome;

use crate::util::{load_changes, load_project};
use crate::Settings;

/// What the changes are reviewed against.
pub enum Target {
    Session(String),
    Project(PathBuf),
}

pub async fn run(
    settings: &Settings,
    target: Target,
    changes: PathBuf,
    description: String,
    json: bool,
) -> Result<()> {
    let extractor = settings.extractor();
    let change_set = load_changes(&extractor, &changes)?;
    let service = settings.review_service().await?;

    let outcome = match target {
        Target::Session(id) => service.review(&id, &change_set, &description).await?,
        Target::Project(dir) => {
            let files = load_project(&extractor, &dir)?;
            service.quick_review(&files, &change_set, &description).await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn severity_label(severity: Severity) -> ColoredString {
    let label = format!("[{}]", severity.as_str());
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.dimmed(),
    }
}

fn print_section(title: &str, comments: &[ReviewComment]) {
    if comments.is_empty() {
        return;
    }
    println!("\n{} ({})", title.bold(), comments.len());
    for c in comments {
        let location = match c.line {
            Some(line) => format!("{}:{}", c.file, line),
            None => c.file.clone(),
        };
        println!("  {} {} {}", severity_label(c.severity), location.cyan(), c.issue);
        println!("      {} {}", "fix:".dimmed(), c.suggestion);
    }
}

fn print_outcome(outcome: &ReviewOutcome) {
    let review = &outcome.review;

    let source = if outcome.cached {
        "(cached)".dimmed()
    } else {
        "(fresh)".dimmed()
    };
    println!("{} {}", "Review".green().bold(), source);
    println!("{}", review.overall_quality);
    println!(
        "  {} issues ({} critical) across {} file(s): {}",
        review.summary.total_issues,
        review.summary.critical_issues.to_string().red(),
        review.summary.files_reviewed,
        outcome.files_reviewed.join(", ")
    );
    if let Some(stats) = &outcome.project_stats {
        super::print_stats(stats);
    }

    print_section("Potential bugs", &review.potential_bugs);
    print_section("Performance", &review.performance_issues);
    print_section("Security", &review.security_vulnerabilities);
    print_section("Conventions", &review.convention_violations);

    if !review.improvements.is_empty() {
        println!("\n{} ({})", "Improvements".bold(), review.improvements.len());
        for imp in &review.improvements {
            let kind = format!("[{}]", imp.kind.as_str());
            println!("  {} {} {}", kind.blue(), imp.file.cyan(), imp.suggestion);
        }
    }

    if !review.positive_points.is_empty() {
        println!("\n{}", "Positive points".bold());
        for point in &review.positive_points {
            println!("  {} {}", "+".green(), point);
        }
    }
}
