use anyhow::Result;
use clap::Args;
use colored::Colorize;
use inkpress_common::load_source;
use inkpress_editor::analytics::{analyze, Readability, TextProjection};
use inkpress_editor::{AnalyticsSnapshot, EditorConfig};
use std::path::Path;

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Article file (.md, .markdown, .html, .htm)
    pub file: String,

    /// Reading speed (overrides config)
    #[arg(long)]
    pub wpm: Option<u32>,

    /// Print the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn stats(args: StatsArgs, cwd: &Path) -> Result<()> {
    let config = EditorConfig::load(cwd)?;
    let snapshot = article_stats(&cwd.join(&args.file), &config, args.wpm)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{} {}", "📊".bright_blue(), args.file.bright_white().bold());
    println!("  Words:        {}", snapshot.word_count);
    println!("  Characters:   {}", snapshot.char_count);
    println!("  Sentences:    {}", snapshot.sentence_count);
    println!("  Paragraphs:   {}", snapshot.paragraph_count);
    println!("  Reading time: {} min", snapshot.reading_time_minutes);
    println!("  Readability:  {:.0}", snapshot.readability_score);

    Ok(())
}

pub fn article_stats(
    file: &Path,
    config: &EditorConfig,
    wpm: Option<u32>,
) -> Result<AnalyticsSnapshot> {
    let loaded = load_source(file)?;
    let projection = TextProjection::of(&loaded.output.document);
    let readability = Readability::new(config.readability_fallback);

    Ok(analyze(
        &projection,
        wpm.unwrap_or(config.words_per_minute),
        &readability,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_stats_counts_markdown_article() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("post.md");
        fs::write(&file, "# Title\n\nOne two three. Four five!\n").unwrap();

        let snapshot = article_stats(&file, &EditorConfig::default(), None).unwrap();
        assert_eq!(snapshot.word_count, 6);
        assert_eq!(snapshot.sentence_count, 2);
        assert_eq!(snapshot.paragraph_count, 2);
        assert_eq!(snapshot.reading_time_minutes, 1);
        assert_eq!(snapshot.readability_score, 60.0);
    }

    #[test]
    fn test_stats_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = article_stats(
            &dir.path().join("missing.md"),
            &EditorConfig::default(),
            None,
        );
        assert!(result.is_err());
    }
}
