use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use di_core::ContextStats;
use di_review::ContextSession;

use crate::util::load_project;
use crate::Settings;

pub async fn run(settings: &Settings, dir: PathBuf, json: bool) -> Result<()> {
    let files = load_project(&settings.extractor(), &dir)?;
    let stats = ContextStats::from_files(&files);

    let sessions = ContextSession::new(settings.store().await);
    let id = sessions.create_session(&files).await?;

    if json {
        let out = serde_json::json!({ "contextId": id, "stats": stats });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} {}", "Context uploaded:".green().bold(), id.as_str().bold());
    super::print_stats(&stats);
    println!(
        "{}",
        format!("Expires in 24h. Next: devinsight review {id} --changes <PATH> -d <DESCRIPTION>")
            .dimmed()
    );
    Ok(())
}
