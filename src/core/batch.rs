use crate::core::project;
use crate::core::reader::{DocumentReader, DocxReader};
use crate::core::tree::build_section_tree;
use crate::BatchEntry;
use anyhow::{bail, Context, Result};
use log::{error, info};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Splits one document into section files under `output_folder` and returns
/// the folder the sections were written to.
pub fn split_document(
    file_path: &Path,
    output_folder: &Path,
    parse_level: usize,
    keywords: Option<&BTreeSet<String>>,
) -> Result<PathBuf> {
    info!("Parsing document: {}", file_path.display());

    let paragraphs = DocxReader::new()
        .read(file_path)
        .with_context(|| format!("Error opening document {}", file_path.display()))?;
    let tree = build_section_tree(&paragraphs, parse_level);

    let title = file_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let doc_folder = output_folder.join(project::sanitize_filename(&title));

    project::project(&tree, &doc_folder, keywords)?;
    info!("Parsing complete. Output folder: {}", doc_folder.display());
    Ok(doc_folder)
}

/// Fans the input documents out to worker threads and collects one entry
/// per document in completion order. A document's failure becomes its own
/// entry and never aborts the rest of the batch.
pub fn process_batch(
    file_paths: &[PathBuf],
    output_folder: &Path,
    parse_level: usize,
    keywords: Option<&BTreeSet<String>>,
) -> Result<Vec<BatchEntry>> {
    if parse_level == 0 {
        bail!("parse_level must be at least 1");
    }
    info!(
        "Processing batch of {} document(s) at parse level {}",
        file_paths.len(),
        parse_level
    );

    let (sender, receiver) = mpsc::channel();
    rayon::scope(|scope| {
        for file_path in file_paths {
            let sender = sender.clone();
            scope.spawn(move |_| {
                let entry =
                    match split_document(file_path, output_folder, parse_level, keywords) {
                        Ok(doc_folder) => BatchEntry::success(file_path, doc_folder),
                        Err(e) => {
                            error!("{} generated an exception: {:#}", file_path.display(), e);
                            BatchEntry::failure(file_path, format!("{:#}", e))
                        }
                    };
                let _ = sender.send(entry);
            });
        }
    });
    drop(sender);

    Ok(receiver.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::serialize::save_docx;
    use crate::Paragraph;
    use tempfile::TempDir;

    fn para(style: &str, text: &str) -> Paragraph {
        Paragraph::new(style, text)
    }

    /// An input fixture whose body paragraphs read back as headings again,
    /// so the split sees a two-section document.
    fn write_input(path: &Path) {
        let body = vec![
            para("Heading 1", "Alpha"),
            para("Normal", "x"),
            para("Heading 1", "Beta"),
            para("Normal", "y"),
        ];
        save_docx(path, "Report", &body, 1).unwrap();
    }

    #[test]
    fn split_document_creates_a_folder_per_document() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("my report.docx");
        write_input(&input);

        let out = dir.path().join("out");
        let doc_folder = split_document(&input, &out, 1, None).unwrap();

        assert_eq!(doc_folder, out.join("my report"));
        assert!(doc_folder.join("Alpha.docx").is_file());
        assert!(doc_folder.join("Beta.docx").is_file());
        // "Report" opens the fixture with no body of its own.
        assert!(!doc_folder.join("Report.docx").exists());
    }

    #[test]
    fn batch_reports_successes_and_failures_independently() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.docx");
        write_input(&good);
        let missing = dir.path().join("missing.docx");

        let out = dir.path().join("out");
        let entries = process_batch(&[good, missing], &out, 1, None).unwrap();
        assert_eq!(entries.len(), 2);

        let good_entry = entries.iter().find(|e| e.file() == "good.docx").unwrap();
        match good_entry {
            BatchEntry::Success { output_folder, .. } => {
                assert!(output_folder.join("Alpha.docx").is_file());
            }
            other => panic!("expected success, got {:?}", other),
        }

        let bad_entry = entries.iter().find(|e| e.file() == "missing.docx").unwrap();
        match bad_entry {
            BatchEntry::Failure { error, .. } => {
                assert!(error.contains("Error opening document"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn parse_level_zero_rejects_the_whole_batch() {
        let dir = TempDir::new().unwrap();
        let result = process_batch(&[], dir.path(), 0, None);
        assert!(result.is_err());
    }

    #[test]
    fn empty_batch_yields_no_entries() {
        let dir = TempDir::new().unwrap();
        let entries = process_batch(&[], dir.path(), 1, None).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn entries_serialize_to_the_report_shape() {
        let success = BatchEntry::success(Path::new("a/report.docx"), PathBuf::from("out/report"));
        let value = serde_json::to_value(&success).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"file": "report.docx", "output_folder": "out/report"})
        );

        let failure = BatchEntry::failure(Path::new("b/bad.docx"), "boom".to_string());
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"file": "bad.docx", "error": "boom"})
        );
    }
}
