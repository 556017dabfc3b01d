//! Pure conversion of a flat leveled index into a navigation forest.

use crate::model::IndexEntry;
use serde::Serialize;

/// One node of the outline forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    /// Section heading text.
    pub label: String,
    /// Nesting significance; 1 is the most significant.
    pub level: u32,
    /// Page number where the section first appears.
    pub target_page: u32,
    /// Nested subsections in input order.
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    fn from_entry(entry: &IndexEntry) -> Self {
        Self {
            label: entry.label.clone(),
            level: entry.level,
            target_page: entry.target_page,
            children: Vec::new(),
        }
    }
}

/// Build a forest from index entries in document-reading order.
///
/// Maintains a stack of open ancestors: each incoming entry closes stack nodes
/// whose level is greater than or equal to its own, then attaches to the new
/// stack top (or becomes a root). Skipped levels nest directly under the
/// nearest shallower ancestor.
pub fn build_outline_tree(entries: &[IndexEntry]) -> Vec<OutlineNode> {
    let mut roots: Vec<OutlineNode> = Vec::new();
    let mut stack: Vec<OutlineNode> = Vec::new();

    for entry in entries {
        close_down_to(&mut stack, &mut roots, entry.level);
        stack.push(OutlineNode::from_entry(entry));
    }
    close_down_to(&mut stack, &mut roots, 0);

    roots
}

fn close_down_to(stack: &mut Vec<OutlineNode>, roots: &mut Vec<OutlineNode>, level: u32) {
    while stack
        .last()
        .is_some_and(|top| level == 0 || top.level >= level)
    {
        let node = stack.pop().expect("stack checked non-empty");
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}
