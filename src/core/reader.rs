use crate::{Paragraph, Run};
use anyhow::{Context, Result};
use log::debug;
use memmap2::Mmap;
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Documents larger than this are memory-mapped instead of slurped.
const MMAP_THRESHOLD: u64 = 10 * 1024 * 1024;

pub trait DocumentReader {
    fn read(&self, file_path: &Path) -> Result<Vec<Paragraph>>;
}

/// Reads the paragraph stream out of a .docx archive, resolving each
/// paragraph's styleId to the style NAME defined in word/styles.xml.
pub struct DocxReader;

impl DocxReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for DocxReader {
    fn read(&self, file_path: &Path) -> Result<Vec<Paragraph>> {
        let metadata = std::fs::metadata(file_path)
            .with_context(|| format!("Failed to stat {}", file_path.display()))?;

        if metadata.len() > MMAP_THRESHOLD {
            debug!("Memory-mapping large document: {}", file_path.display());
            let file = File::open(file_path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            read_archive(Cursor::new(&mmap[..]))
        } else {
            let bytes = std::fs::read(file_path)
                .with_context(|| format!("Failed to read {}", file_path.display()))?;
            read_archive(Cursor::new(bytes))
        }
    }
}

fn read_archive<R: Read + Seek>(reader: R) -> Result<Vec<Paragraph>> {
    let mut archive = ZipArchive::new(reader).context("Not a valid .docx archive")?;

    let mut styles = HashMap::new();
    if let Ok(mut entry) = archive.by_name("word/styles.xml") {
        let mut styles_xml = String::new();
        entry.read_to_string(&mut styles_xml)?;
        styles = parse_styles_xml(&styles_xml)?;
    }

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("Missing word/document.xml")?
        .read_to_string(&mut document_xml)?;

    parse_document_xml(&document_xml, &styles)
}

/// styleId -> style name map from word/styles.xml.
fn parse_styles_xml(xml: &str) -> Result<HashMap<String, String>> {
    let doc = Document::parse(xml).context("Malformed word/styles.xml")?;
    let mut styles = HashMap::new();

    for style_node in doc
        .root_element()
        .children()
        .filter(|n| n.tag_name().name() == "style")
    {
        if let Some(style_id) = style_node.attribute((W_NS, "styleId")) {
            let name = style_node
                .children()
                .find(|n| n.tag_name().name() == "name")
                .and_then(|n| n.attribute((W_NS, "val")))
                .unwrap_or(style_id);
            styles.insert(style_id.to_string(), name.to_string());
        }
    }
    Ok(styles)
}

fn parse_document_xml(xml: &str, styles: &HashMap<String, String>) -> Result<Vec<Paragraph>> {
    let doc = Document::parse(xml).context("Malformed word/document.xml")?;
    let body = doc
        .root_element()
        .children()
        .find(|n| n.tag_name().name() == "body")
        .context("Document has no body element")?;

    // Top-level paragraphs only; table contents are not part of the stream.
    let paragraphs = body
        .children()
        .filter(|n| n.tag_name().name() == "p")
        .map(|node| parse_paragraph(&node, styles))
        .collect();
    Ok(paragraphs)
}

fn parse_paragraph(para: &Node, styles: &HashMap<String, String>) -> Paragraph {
    let style_id = para
        .children()
        .find(|n| n.tag_name().name() == "pPr")
        .and_then(|ppr| {
            ppr.children()
                .find(|n| n.tag_name().name() == "pStyle")
                .and_then(|ps| ps.attribute((W_NS, "val")))
        })
        .unwrap_or("Normal");
    let style = styles
        .get(style_id)
        .cloned()
        .unwrap_or_else(|| style_id.to_string());

    let mut runs = Vec::new();
    for run_node in para.descendants().filter(|n| n.tag_name().name() == "r") {
        let run = parse_run(&run_node);
        if !run.text.is_empty() {
            runs.push(run);
        }
    }
    Paragraph::with_runs(style, runs)
}

fn parse_run(run: &Node) -> Run {
    let mut text = String::new();
    for child in run.children() {
        match child.tag_name().name() {
            "t" => {
                if let Some(content) = child.text() {
                    text.push_str(content);
                }
            }
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }

    let mut parsed = Run::new(text);
    if let Some(rpr) = run.children().find(|n| n.tag_name().name() == "rPr") {
        parsed.bold = toggle_on(&rpr, "b");
        parsed.italic = toggle_on(&rpr, "i");
        parsed.underline = underline_on(&rpr);
    }
    parsed
}

/// w:b / w:i are toggles: present means on unless val switches it off.
fn toggle_on(rpr: &Node, tag: &str) -> bool {
    match rpr.children().find(|n| n.tag_name().name() == tag) {
        Some(node) => !matches!(
            node.attribute((W_NS, "val")),
            Some("0") | Some("false") | Some("none")
        ),
        None => false,
    }
}

fn underline_on(rpr: &Node) -> bool {
    match rpr.children().find(|n| n.tag_name().name() == "u") {
        Some(node) => !matches!(
            node.attribute((W_NS, "val")),
            Some("none") | Some("0") | Some("false")
        ),
        None => false,
    }
}
