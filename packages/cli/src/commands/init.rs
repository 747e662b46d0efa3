use anyhow::Result;
use clap::Args;
use colored::Colorize;
use inkpress_editor::config::DEFAULT_CONFIG_NAME;
use inkpress_editor::EditorConfig;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    #[arg(default_value = ".")]
    pub dir: String,

    /// Directory for article sources
    #[arg(short, long, default_value = "articles")]
    pub articles_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

const WELCOME_ARTICLE: &str = r#"# Welcome to Inkpress

Write your article here. **Bold**, *italic* and `code` all work.

> [!NOTE]
> Callouts, tables and columns are available from the `/` menu in the editor.
"#;

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let root = cwd.join(&args.dir);
    let config_path = root.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!(
        "{}",
        "📝 Initializing Inkpress project...".bright_blue().bold()
    );

    let articles_dir = root.join(&args.articles_dir);
    if !articles_dir.exists() {
        fs::create_dir_all(&articles_dir)?;
        println!("  {} Created {}/", "✓".green(), args.articles_dir);
    }

    let welcome = articles_dir.join("welcome.md");
    if !welcome.exists() {
        fs::write(&welcome, WELCOME_ARTICLE)?;
        println!("  {} Created welcome.md", "✓".green());
    }

    let config_json = serde_json::to_string_pretty(&EditorConfig::default())?;
    fs::write(&config_path, config_json)?;
    tracing::debug!("[init] wrote {}", config_path.display());

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/welcome.md", args.articles_dir);
    println!("  2. Run: inkpress convert {} --to html", args.articles_dir);
    println!("  3. Run: inkpress stats {}/welcome.md", args.articles_dir);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(force: bool) -> InitArgs {
        InitArgs {
            dir: ".".to_string(),
            articles_dir: "articles".to_string(),
            force,
        }
    }

    #[test]
    fn test_init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        init(args(false), dir.path()).unwrap();

        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert!(dir.path().join("articles/welcome.md").exists());
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_NAME);
        fs::write(&path, r#"{"wordsPerMinute": 120}"#).unwrap();

        init(args(false), dir.path()).unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap().words_per_minute, 120);

        init(args(true), dir.path()).unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap().words_per_minute, 200);
    }
}
