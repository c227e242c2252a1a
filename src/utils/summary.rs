use crate::core::reader::{DocumentReader, DocxReader};
use anyhow::{Context, Result};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Counts lowercased words across the documents and writes the ones whose
/// count falls inside `[min_count, max_count]` to a CSV in `output_folder`,
/// most frequent first. Returns the written path, or `None` plus a message
/// naming the observed count range when nothing falls in the window.
pub fn create_word_count_summary(
    doc_paths: &[PathBuf],
    output_folder: &Path,
    min_count: usize,
    max_count: usize,
) -> Result<(Option<PathBuf>, String)> {
    let reader = DocxReader::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for path in doc_paths {
        let paragraphs = reader
            .read(path)
            .with_context(|| format!("Error opening document {}", path.display()))?;
        for paragraph in &paragraphs {
            for word in paragraph.text.to_lowercase().split_whitespace() {
                *counts.entry(word.to_string()).or_default() += 1;
            }
        }
    }

    let observed_min = counts.values().min().copied();
    let observed_max = counts.values().max().copied();
    let mut filtered: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count && *count <= max_count)
        .collect();

    if filtered.is_empty() {
        let message = match (observed_min, observed_max) {
            (Some(lo), Some(hi)) => format!(
                "No words found with a count between {} and {}. Observed counts range from {} to {}.",
                min_count, max_count, lo, hi
            ),
            _ => format!(
                "No words found with a count between {} and {}. The documents contained no words.",
                min_count, max_count
            ),
        };
        info!("{}", message);
        return Ok((None, message));
    }

    // Most frequent first; ties alphabetical so the output is stable.
    filtered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let file_path = output_folder.join(format!(
        "word_count_summary_{}_to_{}.csv",
        min_count, max_count
    ));
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;
    writer.write_record(["Word", "Count"])?;
    for (word, count) in &filtered {
        let count = count.to_string();
        writer.write_record([word.as_str(), count.as_str()])?;
    }
    writer.flush()?;

    let message = format!("Word count summary saved to {}", file_path.display());
    info!("{}", message);
    Ok((Some(file_path), message))
}
