use std::fs;

use buzz_core::Post;
use buzz_engine::{export_posts, render_csv, render_json, ExportFormat, ExportOptions};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_posts() -> Vec<Post> {
    vec![
        Post {
            url: "https://x.com/alice/status/1".into(),
            username: "@alice".into(),
            display_name: "アリス".into(),
            published_at: "2025-10-01T09:00:00.000Z".into(),
            text: "line one\nline, two".into(),
            like_count: 15_000,
            repost_count: 40,
            view_count: 120_000,
            hashtags: vec!["#SNS運用".into(), "#rust".into()],
        },
        Post {
            url: "https://x.com/bob/status/2".into(),
            like_count: 100,
            ..Post::default()
        },
    ]
}

fn options(dir: &TempDir, format: ExportFormat) -> ExportOptions {
    ExportOptions {
        output_dir: dir.path().join("data"),
        file_name: "buzzed_posts.csv".into(),
        format,
    }
}

#[test]
fn csv_has_bom_header_and_rows_in_order() {
    let bytes = render_csv(&sample_posts()).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));

    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(
        headers,
        vec![
            "post_url",
            "username",
            "display_name",
            "date",
            "text",
            "likes",
            "reposts",
            "views",
            "hashtags"
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][4], "line one\nline, two");
    assert_eq!(&rows[0][5], "15000");
    assert_eq!(&rows[0][8], "#SNS運用|#rust");
    assert_eq!(&rows[1][0], "https://x.com/bob/status/2");
    assert_eq!(&rows[1][1], "");
    assert_eq!(&rows[1][7], "0");
}

#[test]
fn json_keeps_non_ascii_and_column_keys() {
    let bytes = render_json(&sample_posts()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("アリス"));
    assert!(text.contains("\n    {"));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["post_url"], "https://x.com/alice/status/1");
    assert_eq!(value[0]["views"], 120_000);
    assert_eq!(value[1]["hashtags"], "");
}

#[test]
fn json_target_swaps_extension() {
    let mut opts = ExportOptions {
        format: ExportFormat::Json,
        ..ExportOptions::default()
    };
    assert_eq!(opts.target_file_name(), "buzzed_posts.json");
    opts.file_name = "out".into();
    assert_eq!(opts.target_file_name(), "out.json");
    opts.file_name = "out.json".into();
    assert_eq!(opts.target_file_name(), "out.json");
    opts.format = ExportFormat::Csv;
    assert_eq!(opts.target_file_name(), "out.json");
}

#[test]
fn export_writes_into_created_directory() {
    let temp = TempDir::new().unwrap();
    let path = export_posts(&sample_posts(), &options(&temp, ExportFormat::Csv))
        .unwrap()
        .unwrap();
    assert_eq!(path, temp.path().join("data").join("buzzed_posts.csv"));
    assert!(fs::read(&path).unwrap().starts_with(b"\xEF\xBB\xBF"));

    let json = export_posts(&sample_posts(), &options(&temp, ExportFormat::Json))
        .unwrap()
        .unwrap();
    assert_eq!(json, temp.path().join("data").join("buzzed_posts.json"));
}

#[test]
fn nothing_is_written_for_an_empty_result() {
    let temp = TempDir::new().unwrap();
    let opts = options(&temp, ExportFormat::Csv);
    assert_eq!(export_posts(&[], &opts).unwrap(), None);
    assert!(!opts.output_dir.exists());
}
