//! Classification of candidate file names.
//!
//! Two pure checks gate every candidate before any filesystem probing:
//! recognition of transient artifacts (editor lock files, partial
//! downloads, autosave fragments) and the extension allow-list. Both are
//! name-only and deterministic, so a path classified once never needs to
//! be re-evaluated.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use unicase::UniCase;

/// Patterns for transient artifacts, matched case-insensitively against
/// the bare file name. Office owner files (`~$Report.xlsx`), `.~`-prefixed
/// editor fragments, partial downloads, vim swap, backups, and Excel
/// AutoRecovery fragments.
static TEMP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^~",
        r"^\.~",
        r"\.tmp$",
        r"\.temp$",
        r"\.part$",
        r"\.crdownload$",
        r"\.swp$",
        r"\.bak$",
        r"~RF.*\.TMP$",
    ]
    .into_iter()
    .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("temp pattern is valid"))
    .collect()
});

/// True if the file name is a transient artifact that must never reach
/// the dispatcher.
pub fn is_temporary(file_name: &str) -> bool {
    if file_name.is_empty() {
        return false;
    }
    TEMP_PATTERNS.iter().any(|p| p.is_match(file_name))
}

/// True if the path's extension is on the allow-list (case-insensitive).
/// An empty allow-list allows everything; a file without an extension only
/// passes an empty allow-list. Entries may be given with or without a
/// leading dot.
pub fn extension_allowed(path: &Path, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    let ext = UniCase::new(ext.as_ref());
    allowed
        .iter()
        .map(|a| a.strip_prefix('.').unwrap_or(a))
        .any(|a| UniCase::new(a) == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_office_lock_files_are_temporary() {
        assert!(is_temporary("~$report.xlsx"));
        assert!(is_temporary("~WRL0001.tmp"));
        assert!(is_temporary(".~lock.report.ods#"));
    }

    #[test]
    fn test_download_fragments_are_temporary() {
        assert!(is_temporary("invoice.pdf.part"));
        assert!(is_temporary("invoice.pdf.crdownload"));
        assert!(is_temporary("upload.tmp"));
        assert!(is_temporary("upload.TMP"));
        assert!(is_temporary("draft.temp"));
    }

    #[test]
    fn test_editor_artifacts_are_temporary() {
        assert!(is_temporary("notes.txt.swp"));
        assert!(is_temporary("report.docx.bak"));
        assert!(is_temporary("report~RF12ab34.TMP"));
    }

    #[test]
    fn test_regular_documents_are_not_temporary() {
        assert!(!is_temporary("report.xlsx"));
        assert!(!is_temporary("contract_final.pdf"));
        assert!(!is_temporary("tmp_notes.docx"));
        assert!(!is_temporary(""));
    }

    #[test]
    fn test_classification_is_deterministic() {
        for _ in 0..3 {
            assert!(is_temporary("~$report.xlsx"));
            assert!(!is_temporary("report.xlsx"));
        }
    }

    #[test]
    fn test_extension_allow_list_is_case_insensitive() {
        let allowed = vec!["pdf".to_string(), "XLSX".to_string()];
        assert!(extension_allowed(Path::new("a/report.PDF"), &allowed));
        assert!(extension_allowed(Path::new("a/report.xlsx"), &allowed));
        assert!(!extension_allowed(Path::new("a/report.docx"), &allowed));
    }

    #[test]
    fn test_extension_entries_may_carry_a_dot() {
        let allowed = vec![".pdf".to_string()];
        assert!(extension_allowed(Path::new("report.pdf"), &allowed));
    }

    #[test]
    fn test_empty_allow_list_allows_everything() {
        let allowed: Vec<String> = Vec::new();
        assert!(extension_allowed(Path::new("anything.zip"), &allowed));
        assert!(extension_allowed(Path::new("no_extension"), &allowed));
    }

    #[test]
    fn test_missing_extension_fails_nonempty_allow_list() {
        let allowed = vec!["pdf".to_string()];
        assert!(!extension_allowed(&PathBuf::from("README"), &allowed));
    }
}
