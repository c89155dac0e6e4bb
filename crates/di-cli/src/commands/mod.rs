pub mod info;
pub mod review;
pub mod upload;

use colored::Colorize;
use di_core::ContextStats;

pub(crate) fn print_stats(stats: &ContextStats) {
    println!(
        "  {} files, {} lines, {} bytes",
        stats.total_files.to_string().bold(),
        stats.total_lines,
        stats.size_in_bytes
    );
    for (ext, count) in &stats.files_by_extension {
        println!("    {:<14} {}", ext.dimmed(), count);
    }
}
