use crate::core::serialize;
use crate::core::tree::{SectionNode, SectionTree};
use crate::utils::tagger;
use anyhow::{bail, Result};
use log::{error, info};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const MAX_FILENAME_LEN: usize = 255;

/// Replaces every character outside letters, digits, space, '-', '_' and
/// '.' with '_', truncated to the filesystem limit.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, ' ' | '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect()
}

fn slug_or_default(title: &str) -> String {
    let slug = sanitize_filename(title);
    if slug.is_empty() {
        "content".to_string()
    } else {
        slug
    }
}

/// Projects a section tree under `folder`: branches become directories,
/// leaves become `<slug>.docx` files beside their sibling directories.
/// A failed leaf is logged and collected; the remaining leaves still write,
/// then the collected failures surface as one error. Tagging failures abort
/// immediately.
pub fn project(
    tree: &SectionTree,
    folder: &Path,
    keywords: Option<&BTreeSet<String>>,
) -> Result<()> {
    let mut failures = Vec::new();
    visit(tree, folder, 1, keywords, &mut failures)?;
    if !failures.is_empty() {
        bail!(
            "{} section file(s) failed to write: {}",
            failures.len(),
            failures.join("; ")
        );
    }
    Ok(())
}

fn visit(
    tree: &SectionTree,
    folder: &Path,
    depth: usize,
    keywords: Option<&BTreeSet<String>>,
    failures: &mut Vec<String>,
) -> Result<()> {
    fs::create_dir_all(folder)
        .map_err(|e| anyhow::anyhow!("Failed to create directory {}: {}", folder.display(), e))?;

    for (title, node) in tree.iter() {
        match node {
            SectionNode::Branch(children) => {
                let subfolder = folder.join(slug_or_default(title));
                visit(children, &subfolder, depth + 1, keywords, failures)?;
            }
            SectionNode::Leaf(body) => {
                if body.is_empty() {
                    continue;
                }
                let file_path = folder.join(format!("{}.docx", slug_or_default(title)));
                match serialize::save_docx(&file_path, title, body, depth) {
                    Ok(()) => {
                        info!("Saved parsed content to: {}", file_path.display());
                        if let Some(keywords) = keywords {
                            let tags = tagger::tag_document(&file_path, keywords)?;
                            info!(
                                "Tagged document {} with tags: {:?}",
                                file_path.display(),
                                tags
                            );
                        }
                    }
                    Err(e) => {
                        error!("Error saving document {}: {:#}", file_path.display(), e);
                        failures.push(format!("{}: {:#}", file_path.display(), e));
                    }
                }
            }
        }
    }
    Ok(())
}
