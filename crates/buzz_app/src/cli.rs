use std::path::PathBuf;

use buzz_core::{
    CrawlConfig, DEFAULT_LIKE_THRESHOLD, DEFAULT_LIMIT, DEFAULT_MAX_ITERATIONS,
    DEFAULT_PATIENCE_LIMIT, DEFAULT_SCROLL_STEP_PX,
};
use buzz_engine::{ExportFormat, ExportOptions};
use clap::{Parser, ValueEnum};

/// Collects high-engagement posts from a keyword search feed.
#[derive(Parser, Debug)]
#[command(name = "buzz_scout")]
#[command(about = "Scrolls a keyword search feed and saves the posts that went viral")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, help = "Search keyword")]
    pub keyword: String,

    #[arg(short, long, default_value_t = DEFAULT_LIMIT, help = "Number of posts to collect")]
    pub limit: usize,

    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_LIKE_THRESHOLD,
        help = "Minimum like count for a post to qualify"
    )]
    pub threshold: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS, help = "Maximum number of scrolls")]
    pub max_scrolls: u32,

    #[arg(
        long,
        default_value_t = DEFAULT_PATIENCE_LIMIT,
        help = "Consecutive scrolls without new content before giving up"
    )]
    pub patience: u32,

    #[arg(long, default_value_t = DEFAULT_SCROLL_STEP_PX, help = "Pixels per scroll")]
    pub scroll_step: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    #[arg(short, long, default_value = "data", help = "Directory for the result file")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = "buzzed_posts.csv", help = "Result file name")]
    pub file_name: String,

    #[arg(long, default_value = "http://localhost:9515", help = "WebDriver server url")]
    pub webdriver_url: String,

    #[arg(
        long,
        default_value = "127.0.0.1:9222",
        help = "Remote debugging address of an already running Chrome"
    )]
    pub debugger_address: String,

    #[arg(long, value_name = "DIR", conflicts_with = "capture", help = "Crawl captured HTML frames instead of a browser")]
    pub replay: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Save the page source of every scan")]
    pub capture: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Also write the log to this file")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, help = "Debug logging")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig::new(self.keyword.trim())
            .with_limit(self.limit)
            .with_like_threshold(self.threshold)
            .with_max_iterations(self.max_scrolls)
            .with_patience_limit(self.patience)
            .with_scroll_step(self.scroll_step)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            output_dir: self.output_dir.clone(),
            file_name: self.file_name.clone(),
            format: self.format.into(),
        }
    }
}
