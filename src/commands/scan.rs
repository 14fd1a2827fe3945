//! The `scan` command: one-shot classification of everything under the
//! watched root, for checking filter configuration before going live.

use std::path::Path;
use std::time::{Duration, SystemTime};

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config;
use crate::error::Result;
use crate::filter;
use crate::scanner::walk_files;

/// How a file would be treated by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Candidate,
    Temporary,
    FilteredExtension,
    RootLevel,
    TooOld,
    Unreadable,
}

impl Disposition {
    fn label(self) -> &'static str {
        match self {
            Disposition::Candidate => "candidate",
            Disposition::Temporary => "temporary",
            Disposition::FilteredExtension => "filtered extension",
            Disposition::RootLevel => "root level",
            Disposition::TooOld => "too old",
            Disposition::Unreadable => "unreadable",
        }
    }
}

#[derive(Tabled)]
struct ScanRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Disposition")]
    disposition: String,
}

pub fn cmd_scan(config_path: Option<&Path>, root: Option<&Path>, json: bool) -> Result<()> {
    let config = config::resolve(config_path, root)?;
    let files = walk_files(&config.root, config.recursive)?;

    let mut entries = Vec::new();
    for path in &files {
        let (size, modified) = match std::fs::metadata(path) {
            Ok(meta) => (Some(meta.len()), meta.modified().ok()),
            Err(_) => (None, None),
        };
        let disposition = classify(path, &config, size.is_none(), modified);
        entries.push((path.clone(), size, modified, disposition));
    }

    if json {
        let rows: Vec<_> = entries
            .iter()
            .map(|(path, size, modified, disposition)| {
                json!({
                    "path": path.to_string_lossy(),
                    "size": size,
                    "modified": modified.and_then(format_time),
                    "disposition": disposition.label(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "files": rows }))?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No files under {}", config.root.display());
        return Ok(());
    }

    let rows: Vec<ScanRow> = entries
        .iter()
        .map(|(path, size, modified, disposition)| ScanRow {
            file: path
                .strip_prefix(&config.root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
            size: size.map(human_size).unwrap_or_else(|| "-".to_string()),
            modified: modified.and_then(format_time).unwrap_or_else(|| "-".to_string()),
            disposition: disposition.label().to_string(),
        })
        .collect();

    let candidates = entries
        .iter()
        .filter(|(_, _, _, d)| *d == Disposition::Candidate)
        .count();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!(
        "{} file(s), {} candidate(s)",
        entries.len(),
        candidates.to_string().green()
    );
    Ok(())
}

/// Name-and-metadata classification. The stability check is deliberately
/// not part of `scan` — it is a point-in-time probe, not a property of
/// the file.
fn classify(
    path: &Path,
    config: &crate::config::Config,
    unreadable: bool,
    modified: Option<SystemTime>,
) -> Disposition {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return Disposition::Unreadable;
    };
    if filter::is_temporary(&file_name) {
        return Disposition::Temporary;
    }
    if !filter::extension_allowed(path, &config.extensions) {
        return Disposition::FilteredExtension;
    }
    if config.subfolders_only && path.parent() == Some(config.root.as_path()) {
        return Disposition::RootLevel;
    }
    if unreadable {
        return Disposition::Unreadable;
    }
    if let (Some(max_age), Some(modified)) = (config.max_file_age(), modified) {
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > max_age {
            return Disposition::TooOld;
        }
    }
    Disposition::Candidate
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_time(time: SystemTime) -> Option<String> {
    jiff::Timestamp::try_from(time)
        .ok()
        .map(|t| t.strftime("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_classify_temporary_wins_over_extension() {
        let config = Config::for_root("/drop");
        // .tmp is both temporary and not on the allow-list; temporary is
        // the meaningful classification
        assert_eq!(
            classify(Path::new("/drop/upload.tmp"), &config, false, None),
            Disposition::Temporary
        );
    }

    #[test]
    fn test_classify_candidate() {
        let config = Config::for_root("/drop");
        assert_eq!(
            classify(Path::new("/drop/acme/report.pdf"), &config, false, None),
            Disposition::Candidate
        );
    }

    #[test]
    fn test_classify_filtered_extension() {
        let config = Config::for_root("/drop");
        assert_eq!(
            classify(Path::new("/drop/notes.txt"), &config, false, None),
            Disposition::FilteredExtension
        );
    }

    #[test]
    fn test_classify_root_level_when_subfolders_only() {
        let mut config = Config::for_root("/drop");
        config.subfolders_only = true;
        assert_eq!(
            classify(Path::new("/drop/report.pdf"), &config, false, None),
            Disposition::RootLevel
        );
        assert_eq!(
            classify(Path::new("/drop/acme/report.pdf"), &config, false, None),
            Disposition::Candidate
        );
    }

    #[test]
    fn test_classify_too_old() {
        let mut config = Config::for_root("/drop");
        config.max_file_age_secs = Some(60);
        let old = SystemTime::now() - Duration::from_secs(3600);
        assert_eq!(
            classify(Path::new("/drop/report.pdf"), &config, false, Some(old)),
            Disposition::TooOld
        );
        let fresh = SystemTime::now();
        assert_eq!(
            classify(Path::new("/drop/report.pdf"), &config, false, Some(fresh)),
            Disposition::Candidate
        );
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(10 * 1024), "10.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
