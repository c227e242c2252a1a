use crate::core::heading;
use crate::Paragraph;
use log::debug;

/// Depth-indexed heading slots, one per level up to the parse level.
/// Setting a slot clears everything deeper, so the live slots always spell
/// the path from the document root to the section being read.
#[derive(Debug, Clone)]
pub struct HeadingPath {
    slots: Vec<Option<String>>,
}

impl HeadingPath {
    pub fn new(parse_level: usize) -> Self {
        Self {
            slots: vec![None; parse_level],
        }
    }

    /// Records a heading at a 1-based level and clears the deeper slots.
    pub fn set(&mut self, level: usize, title: String) {
        debug_assert!(level >= 1 && level <= self.slots.len());
        self.slots[level - 1] = Some(title);
        for slot in &mut self.slots[level..] {
            *slot = None;
        }
    }

    /// The non-empty slots in depth order. A document that opens below
    /// level one simply has its path start at the first set slot.
    pub fn segments(&self) -> Vec<&str> {
        self.slots.iter().flatten().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// A section holds either named subsections or a run of body paragraphs,
/// never both.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionNode {
    Branch(SectionTree),
    Leaf(Vec<Paragraph>),
}

/// Children of one section, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionTree {
    nodes: Vec<(String, SectionNode)>,
}

impl SectionTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionNode)> {
        self.nodes.iter().map(|(title, node)| (title.as_str(), node))
    }

    pub fn get(&self, title: &str) -> Option<&SectionNode> {
        self.nodes
            .iter()
            .find(|(existing, _)| existing == title)
            .map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn install(&mut self, path: &[&str], body: Vec<Paragraph>) {
        let (head, rest) = match path.split_first() {
            Some(parts) => parts,
            None => return,
        };
        let found = self.nodes.iter().position(|(title, _)| title == head);

        if rest.is_empty() {
            match found {
                None => self
                    .nodes
                    .push(((*head).to_string(), SectionNode::Leaf(body))),
                Some(i) => match &mut self.nodes[i].1 {
                    // Reopened section: the latest body wins.
                    SectionNode::Leaf(existing) => *existing = body,
                    SectionNode::Branch(_) => {
                        debug!(
                            "Dropping {} paragraph(s): section \"{}\" already has subsections",
                            body.len(),
                            head
                        );
                    }
                },
            }
            return;
        }

        let i = match found {
            Some(i) => {
                if matches!(self.nodes[i].1, SectionNode::Leaf(_)) {
                    // A deeper heading arrived under a section that had
                    // already captured body text; the subsections win.
                    debug!("Replacing body of section \"{}\" with subsections", head);
                    self.nodes[i].1 = SectionNode::Branch(SectionTree::new());
                }
                i
            }
            None => {
                self.nodes
                    .push(((*head).to_string(), SectionNode::Branch(SectionTree::new())));
                self.nodes.len() - 1
            }
        };
        if let SectionNode::Branch(children) = &mut self.nodes[i].1 {
            children.install(rest, body);
        }
    }
}

/// Folds a flat paragraph stream into a section tree bounded by
/// `parse_level`. Headings past that depth stay in the body verbatim.
pub fn build_section_tree(paragraphs: &[Paragraph], parse_level: usize) -> SectionTree {
    let mut tree = SectionTree::new();
    let mut path = HeadingPath::new(parse_level);
    let mut buffer: Vec<Paragraph> = Vec::new();

    for paragraph in paragraphs {
        match heading::classify(paragraph) {
            Some(level) if level >= 1 && level <= parse_level => {
                flush(&mut tree, &path, &mut buffer);
                path.set(level, paragraph.text.clone());
            }
            _ => {
                if !paragraph.is_blank() {
                    buffer.push(paragraph.clone());
                }
            }
        }
    }
    flush(&mut tree, &path, &mut buffer);
    tree
}

fn flush(tree: &mut SectionTree, path: &HeadingPath, buffer: &mut Vec<Paragraph>) {
    if buffer.is_empty() {
        return;
    }
    if path.is_empty() {
        // Content before the first heading has nowhere to live.
        debug!(
            "Discarding {} paragraph(s) found before any heading",
            buffer.len()
        );
        buffer.clear();
        return;
    }
    let body = std::mem::take(buffer);
    tree.install(&path.segments(), body);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(style: &str, text: &str) -> Paragraph {
        Paragraph::new(style, text)
    }

    fn texts(body: &[Paragraph]) -> Vec<&str> {
        body.iter().map(|p| p.text.as_str()).collect()
    }

    fn branch<'a>(tree: &'a SectionTree, title: &str) -> &'a SectionTree {
        match tree.get(title) {
            Some(SectionNode::Branch(children)) => children,
            other => panic!("expected branch at \"{}\", got {:?}", title, other),
        }
    }

    fn leaf<'a>(tree: &'a SectionTree, title: &str) -> &'a [Paragraph] {
        match tree.get(title) {
            Some(SectionNode::Leaf(body)) => body,
            other => panic!("expected leaf at \"{}\", got {:?}", title, other),
        }
    }

    #[test]
    fn nested_sections_split_at_each_level() {
        let paragraphs = vec![
            para("Heading 1", "A"),
            para("Normal", "x"),
            para("Heading 2", "B"),
            para("Normal", "y"),
            para("Heading 1", "C"),
            para("Normal", "z"),
        ];
        let tree = build_section_tree(&paragraphs, 2);

        assert_eq!(tree.len(), 2);
        let a = branch(&tree, "A");
        assert_eq!(a.len(), 1);
        assert_eq!(texts(leaf(a, "B")), ["y"]);
        assert_eq!(texts(leaf(&tree, "C")), ["z"]);
        // "x" sat at A's own depth and A went on to gain subsections.
        assert!(tree.iter().map(|(t, _)| t).eq(["A", "C"]));
    }

    #[test]
    fn content_before_first_heading_is_dropped() {
        let paragraphs = vec![
            para("Normal", "preamble"),
            para("Heading 1", "A"),
            para("Normal", "x"),
        ];
        let tree = build_section_tree(&paragraphs, 1);

        assert_eq!(tree.len(), 1);
        assert_eq!(texts(leaf(&tree, "A")), ["x"]);
    }

    #[test]
    fn sibling_headings_with_same_text_merge() {
        let paragraphs = vec![
            para("Heading 1", "Intro"),
            para("Normal", "a"),
            para("Heading 1", "Other"),
            para("Normal", "b"),
            para("Heading 1", "Intro"),
            para("Normal", "c"),
        ];
        let tree = build_section_tree(&paragraphs, 1);

        assert_eq!(tree.len(), 2);
        assert!(tree.iter().map(|(t, _)| t).eq(["Intro", "Other"]));
        // Reopening the section replaced its body.
        assert_eq!(texts(leaf(&tree, "Intro")), ["c"]);
        assert_eq!(texts(leaf(&tree, "Other")), ["b"]);
    }

    #[test]
    fn headings_beyond_parse_level_stay_in_body() {
        let paragraphs = vec![
            para("Heading 1", "A"),
            para("Heading 2", "B"),
            para("Normal", "y"),
        ];
        let tree = build_section_tree(&paragraphs, 1);

        let body = leaf(&tree, "A");
        assert_eq!(texts(body), ["B", "y"]);
        assert_eq!(body[0].style, "Heading 2");
    }

    #[test]
    fn branch_keeps_children_over_later_body() {
        let paragraphs = vec![
            para("Heading 1", "A"),
            para("Heading 2", "B"),
            para("Normal", "y"),
            para("Heading 1", "A"),
            para("Normal", "w"),
        ];
        let tree = build_section_tree(&paragraphs, 2);

        assert_eq!(tree.len(), 1);
        let a = branch(&tree, "A");
        assert_eq!(texts(leaf(a, "B")), ["y"]);
    }

    #[test]
    fn document_opening_below_level_one_keeps_its_content() {
        let paragraphs = vec![para("Heading 2", "B"), para("Normal", "y")];
        let tree = build_section_tree(&paragraphs, 2);

        assert_eq!(tree.len(), 1);
        assert_eq!(texts(leaf(&tree, "B")), ["y"]);
    }

    #[test]
    fn whitespace_only_paragraphs_are_skipped() {
        let paragraphs = vec![
            para("Heading 1", "A"),
            para("Normal", "   "),
            para("Normal", "x"),
        ];
        let tree = build_section_tree(&paragraphs, 1);

        assert_eq!(texts(leaf(&tree, "A")), ["x"]);
    }

    #[test]
    fn heading_without_body_produces_no_node() {
        let paragraphs = vec![
            para("Heading 1", "A"),
            para("Heading 1", "B"),
            para("Normal", "z"),
        ];
        let tree = build_section_tree(&paragraphs, 1);

        assert_eq!(tree.len(), 1);
        assert!(tree.get("A").is_none());
        assert_eq!(texts(leaf(&tree, "B")), ["z"]);
    }

    #[test]
    fn three_levels_nest_in_order() {
        let paragraphs = vec![
            para("Heading 1", "A"),
            para("Heading 2", "B"),
            para("Heading 3", "C"),
            para("Normal", "d"),
            para("Heading 2", "E"),
            para("Normal", "f"),
        ];
        let tree = build_section_tree(&paragraphs, 3);

        let a = branch(&tree, "A");
        let b = branch(a, "B");
        assert_eq!(texts(leaf(b, "C")), ["d"]);
        assert_eq!(texts(leaf(a, "E")), ["f"]);
        assert!(a.iter().map(|(t, _)| t).eq(["B", "E"]));
    }

    #[test]
    fn malformed_heading_styles_become_body() {
        let paragraphs = vec![
            para("Heading 1", "A"),
            para("HeadingFoo", "odd"),
            para("Normal", "x"),
        ];
        let tree = build_section_tree(&paragraphs, 1);

        assert_eq!(texts(leaf(&tree, "A")), ["odd", "x"]);
    }

    #[test]
    fn heading_path_clears_deeper_slots() {
        let mut path = HeadingPath::new(3);
        path.set(1, "A".into());
        path.set(2, "B".into());
        path.set(3, "C".into());
        assert_eq!(path.segments(), ["A", "B", "C"]);

        path.set(2, "D".into());
        assert_eq!(path.segments(), ["A", "D"]);

        path.set(1, "E".into());
        assert_eq!(path.segments(), ["E"]);
    }
}
