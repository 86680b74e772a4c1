use std::io;
use std::path::PathBuf;

use buzz_core::{Post, POST_COLUMNS};
use buzz_logging::{buzz_info, buzz_warn};
use serde::Serialize;

use crate::persist::{AtomicFileWriter, PersistError};

/// Lets spreadsheet tools detect UTF-8 in the CSV output.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub format: ExportFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            file_name: "buzzed_posts.csv".to_string(),
            format: ExportFormat::Csv,
        }
    }
}

impl ExportOptions {
    /// The configured name, with a `.csv` extension swapped for `.json` in JSON mode.
    pub fn target_file_name(&self) -> String {
        match self.format {
            ExportFormat::Csv => self.file_name.clone(),
            ExportFormat::Json => match self.file_name.strip_suffix(".csv") {
                Some(stem) => format!("{stem}.json"),
                None if self.file_name.ends_with(".json") => self.file_name.clone(),
                None => format!("{}.json", self.file_name),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Writes `posts` in acceptance order. Returns the written path, or `None`
/// when there was nothing to write.
pub fn export_posts(posts: &[Post], options: &ExportOptions) -> Result<Option<PathBuf>, ExportError> {
    if posts.is_empty() {
        buzz_warn!("no posts to save");
        return Ok(None);
    }

    let content = match options.format {
        ExportFormat::Csv => render_csv(posts)?,
        ExportFormat::Json => render_json(posts)?,
    };
    let writer = AtomicFileWriter::new(options.output_dir.clone());
    let path = writer.write(&options.target_file_name(), &content)?;
    buzz_info!("saved {} posts to {}", posts.len(), path.display());
    Ok(Some(path))
}

/// UTF-8 CSV with BOM and a header row in `POST_COLUMNS` order.
pub fn render_csv(posts: &[Post]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(POST_COLUMNS)?;
    for post in posts {
        writer.write_record(post.to_record())?;
    }
    writer.into_inner().map_err(|err| ExportError::Io(err.into_error()))
}

/// Pretty-printed JSON array, four-space indent, non-ASCII text left as is.
pub fn render_json(posts: &[Post]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    posts.serialize(&mut serializer)?;
    Ok(buffer)
}
