use anyhow::Result;
use colored::Colorize;
use di_review::ContextSession;

use crate::Settings;

pub async fn run(settings: &Settings, session_id: String, json: bool) -> Result<()> {
    let sessions = ContextSession::new(settings.store().await);
    let info = sessions.get_session_info(&session_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    if !info.exists {
        println!("{} {}", "Context not found or expired:".yellow().bold(), info.context_id);
        return Ok(());
    }

    println!("{} {}", "Context".green().bold(), info.context_id.bold());
    if let Some(created_at) = info.created_at {
        println!("  created  {}", created_at.to_rfc3339());
    }
    if let Some(secs) = info.expires_in {
        println!("  expires  in {}h {:02}m", secs / 3600, (secs % 3600) / 60);
    }
    if let Some(stats) = &info.stats {
        super::print_stats(stats);
    }
    Ok(())
}
