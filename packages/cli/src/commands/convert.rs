use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use inkpress_common::{load_source, SourceFormat};
use inkpress_compiler_html::{to_flat_markup, CompileOptions};
use inkpress_compiler_markdown::to_markdown;
use inkpress_parser::format_diagnostics;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// File or directory to convert (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: String,

    /// Target format (markdown, html)
    #[arg(short, long, default_value = "html")]
    pub to: String,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory
    #[arg(short, long, default_value = "dist")]
    pub out_dir: String,
}

pub fn convert(args: ConvertArgs, cwd: &Path) -> Result<()> {
    let target = SourceFormat::parse_name(&args.to)?;
    let input = cwd.join(&args.path);

    let (root, files) = if input.is_file() {
        let root = input.parent().map(Path::to_path_buf).unwrap_or_default();
        (root, vec![input.clone()])
    } else if input.is_dir() {
        (input.clone(), find_article_files(&input))
    } else {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    };

    if files.is_empty() {
        println!("{}", "⚠️  No article files found".yellow());
        return Ok(());
    }

    if !args.stdout {
        println!("{}", "🔨 Converting articles...".bright_blue().bold());
        println!("Found {} files", files.len());
    }

    let out_dir = cwd.join(&args.out_dir);
    let mut success_count = 0;
    let mut warning_count = 0;
    let mut error_count = 0;

    for file in &files {
        let relative_path = file.strip_prefix(&root).unwrap_or(file);

        match convert_file(file, target) {
            Ok(converted) => {
                success_count += 1;
                if !converted.diagnostics.is_empty() {
                    warning_count += 1;
                    eprintln!("{}", converted.diagnostics);
                }

                if args.stdout {
                    print!("{}", converted.output);
                    continue;
                }

                let output_file = out_dir
                    .join(relative_path)
                    .with_extension(target.extension());
                write_output(&output_file, &converted.output)?;
                println!(
                    "  {} {} → {}",
                    "✓".green(),
                    relative_path.display(),
                    output_file.display()
                );
            }
            Err(e) => {
                error_count += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    relative_path.display(),
                    e.to_string().red()
                );
            }
        }
    }

    if args.stdout {
        return Ok(());
    }

    println!();
    if error_count == 0 && warning_count == 0 {
        println!(
            "{} Converted {} files successfully",
            "✅".green(),
            success_count
        );
    } else {
        println!(
            "{} Converted {} files, {} with warnings, {} errors",
            "⚠️".yellow(),
            success_count,
            warning_count,
            error_count
        );
    }

    Ok(())
}

/// A converted file with its rendered diagnostics
#[derive(Debug)]
pub struct Converted {
    pub output: String,
    pub diagnostics: String,
}

pub fn convert_file(file: &Path, target: SourceFormat) -> Result<Converted> {
    let loaded = load_source(file)?;

    let diagnostics = if loaded.output.diagnostics.is_empty() {
        String::new()
    } else {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        tracing::warn!(
            "[convert] {} conversion diagnostics in {}",
            loaded.output.diagnostics.len(),
            file_name
        );
        format_diagnostics(&loaded.source, file_name, &loaded.output.diagnostics)
    };

    let output = match target {
        SourceFormat::Markdown => to_markdown(&loaded.output.document),
        SourceFormat::FlatMarkup => {
            to_flat_markup(&loaded.output.document, &CompileOptions::default())
        }
    };

    Ok(Converted {
        output,
        diagnostics,
    })
}

fn write_output(output_file: &Path, output: &str) -> Result<()> {
    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_file, output)?;
    Ok(())
}

fn find_article_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && SourceFormat::from_path(path).is_ok() {
            files.push(path.to_path_buf());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_markdown_to_flat_markup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("post.md");
        fs::write(&file, "# Title\n\nSome **bold** text.\n").unwrap();

        let converted = convert_file(&file, SourceFormat::FlatMarkup).unwrap();
        assert_eq!(
            converted.output,
            "<h1>Title</h1>\n<p>Some <strong>bold</strong> text.</p>\n"
        );
        assert!(converted.diagnostics.is_empty());
    }

    #[test]
    fn test_convert_flat_markup_to_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("post.html");
        fs::write(&file, "<h2>Intro</h2><p>Hello <em>world</em></p>").unwrap();

        let converted = convert_file(&file, SourceFormat::Markdown).unwrap();
        assert_eq!(converted.output, "## Intro\n\nHello *world*\n");
    }

    #[test]
    fn test_convert_directory_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let articles = dir.path().join("articles");
        fs::create_dir_all(articles.join("nested")).unwrap();
        fs::write(articles.join("a.md"), "First\n").unwrap();
        fs::write(articles.join("nested/b.markdown"), "Second\n").unwrap();
        fs::write(articles.join("notes.txt"), "ignored").unwrap();

        let args = ConvertArgs {
            path: "articles".to_string(),
            to: "html".to_string(),
            stdout: false,
            out_dir: "dist".to_string(),
        };
        convert(args, dir.path()).unwrap();

        let first = fs::read_to_string(dir.path().join("dist/a.html")).unwrap();
        assert_eq!(first, "<p>First</p>\n");
        assert!(dir.path().join("dist/nested/b.html").exists());
        assert!(!dir.path().join("dist/notes.html").exists());
    }

    #[test]
    fn test_convert_rejects_unknown_target() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConvertArgs {
            path: ".".to_string(),
            to: "pdf".to_string(),
            stdout: true,
            out_dir: "dist".to_string(),
        };
        assert!(convert(args, dir.path()).is_err());
    }
}
