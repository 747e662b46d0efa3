use std::path::Path;

use inkpress_parser::{from_flat_markup, from_markdown, IDGenerator, ParseOutput};
use serde::{Deserialize, Serialize};

use crate::error::CommonError;
use crate::result::CommonResult;

/// The two flat encodings an article can be read from or written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceFormat {
    Markdown,
    FlatMarkup,
}

impl SourceFormat {
    /// Pick the format from a file extension (`md`, `markdown`, `html`, `htm`)
    pub fn from_path(path: &Path) -> CommonResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "md" | "markdown" => Ok(SourceFormat::Markdown),
            "html" | "htm" => Ok(SourceFormat::FlatMarkup),
            _ => Err(CommonError::UnknownFormat(path.display().to_string())),
        }
    }

    pub fn parse_name(name: &str) -> CommonResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(SourceFormat::Markdown),
            "html" | "markup" | "flat-markup" => Ok(SourceFormat::FlatMarkup),
            other => Err(CommonError::UnknownFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Markdown => "md",
            SourceFormat::FlatMarkup => "html",
        }
    }

    pub fn parse(&self, source: &str, ids: &mut IDGenerator) -> ParseOutput {
        match self {
            SourceFormat::Markdown => from_markdown(source, ids),
            SourceFormat::FlatMarkup => from_flat_markup(source, ids),
        }
    }
}

/// A source file read from disk and parsed
#[derive(Debug)]
pub struct LoadedSource {
    pub format: SourceFormat,
    pub source: String,
    pub output: ParseOutput,
}

pub fn load_source(path: &Path) -> CommonResult<LoadedSource> {
    let format = SourceFormat::from_path(path)?;
    let source = std::fs::read_to_string(path)?;
    let mut ids = IDGenerator::new(&path.display().to_string());
    let output = format.parse(&source, &mut ids);

    Ok(LoadedSource {
        format,
        source,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(&PathBuf::from("post.MD")).unwrap(),
            SourceFormat::Markdown
        );
        assert_eq!(
            SourceFormat::from_path(&PathBuf::from("a/b/post.html")).unwrap(),
            SourceFormat::FlatMarkup
        );
        assert!(matches!(
            SourceFormat::from_path(&PathBuf::from("notes.txt")),
            Err(CommonError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_parse_by_format() {
        let mut ids = IDGenerator::new("format");
        let md = SourceFormat::Markdown.parse("## Hi", &mut ids);
        let html = SourceFormat::FlatMarkup.parse("<h2>Hi</h2>", &mut ids);
        assert_eq!(md.document.without_ids(), html.document.without_ids());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_source(&PathBuf::from("/definitely/not/here.md"));
        assert!(matches!(result, Err(CommonError::Io(_))));
    }
}
