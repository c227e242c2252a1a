use crate::core::reader::{DocumentReader, DocxReader};
use crate::core::serialize::escape_xml;
use anyhow::{bail, Context, Result};
use log::debug;
use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

/// Loads the keyword reference file: .csv takes the first column of every
/// row, .txt one keyword per line. Keywords are trimmed and lowercased.
pub fn read_keywords(path: &Path) -> Result<BTreeSet<String>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "csv" => read_keywords_csv(path),
        "txt" => read_keywords_txt(path),
        _ => bail!("Unsupported file format: {}", path.display()),
    }
}

fn read_keywords_csv(path: &Path) -> Result<BTreeSet<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Error reading reference file: {}", path.display()))?;

    let mut keywords = BTreeSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(first) = record.get(0) {
            let keyword = first.trim().to_lowercase();
            if !keyword.is_empty() {
                keywords.insert(keyword);
            }
        }
    }
    Ok(keywords)
}

fn read_keywords_txt(path: &Path) -> Result<BTreeSet<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading reference file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Scans the document text for keywords and, when any match, appends an
/// empty paragraph plus a `Tags: "a", "b"` paragraph to the file in place.
/// Returns the tags that were applied.
pub fn tag_document(path: &Path, keywords: &BTreeSet<String>) -> Result<Vec<String>> {
    let paragraphs = DocxReader::new().read(path)?;
    let text = paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let tags: Vec<String> = keywords
        .iter()
        .filter(|keyword| text.contains(keyword.as_str()))
        .cloned()
        .collect();
    if tags.is_empty() {
        debug!("No tags matched for {}", path.display());
        return Ok(tags);
    }

    append_tags_paragraph(path, &tags)
        .with_context(|| format!("Failed to tag {}", path.display()))?;
    Ok(tags)
}

/// Rewrites the archive entry by entry, patching the tags paragraph into
/// word/document.xml just before the body closes.
fn append_tags_paragraph(path: &Path, tags: &[String]) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;

            if name == "word/document.xml" {
                let document_xml = String::from_utf8(contents)
                    .context("word/document.xml is not valid UTF-8")?;
                contents = patch_document_xml(&document_xml, tags)?.into_bytes();
            }
            zip.start_file(name, options)?;
            zip.write_all(&contents)?;
        }
        zip.finish()?;
    }

    std::fs::write(path, buffer.into_inner())?;
    Ok(())
}

fn patch_document_xml(document_xml: &str, tags: &[String]) -> Result<String> {
    let quoted: Vec<String> = tags.iter().map(|tag| format!("\"{}\"", tag)).collect();
    let paragraph = format!(
        r#"<w:p/><w:p><w:r><w:t xml:space="preserve">Tags: </w:t></w:r><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(&quoted.join(", "))
    );
    match document_xml.rfind("</w:body>") {
        Some(pos) => {
            let mut patched = document_xml.to_string();
            patched.insert_str(pos, &paragraph);
            Ok(patched)
        }
        None => bail!("Document has no body element"),
    }
}
