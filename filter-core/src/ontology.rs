use crate::error::FilterError;
use crate::error::Result;
use crate::model::Field;
use crate::model::FieldType;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use tracing::debug;

/// Term of the synthetic root placed above several top-level branches.
pub const GENERATED_ROOT_TERM: &str = "@@root@@";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct TreeOptions {
    /// Promote a lone top-level branch to be the root.
    pub hide_single_root: bool,
    /// Hoist the only child of grouping nodes into their place.
    pub remove_single_child_intermediates: bool,
    /// Stably order filterable children before grouping children.
    pub sort_leaves_before_branches: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            hide_single_root: true,
            remove_single_child_intermediates: false,
            sort_leaves_before_branches: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OntologyNode {
    pub field: Field,
    pub children: Vec<OntologyNode>,
}

impl OntologyNode {
    pub fn is_generated_root(&self) -> bool {
        self.field.term == GENERATED_ROOT_TERM
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// Filterable fields in pre-order.
    pub fn filter_fields(&self) -> impl Iterator<Item = &Field> {
        self.preorder()
            .map(|node| &node.field)
            .filter(|field| field.is_filter_field())
    }

    pub fn first_leaf(&self) -> Option<&Field> {
        self.filter_fields().next()
    }

    pub fn find(&self, term: &str) -> Option<&OntologyNode> {
        self.preorder().find(|node| node.field.term == term)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.find(term).is_some()
    }

    /// Path of fields from this node down to `term`, inclusive on both ends.
    /// Empty when `term` is not in the tree.
    pub fn ancestors(&self, term: &str) -> Vec<&Field> {
        let mut path = Vec::new();
        if collect_path(self, term, &mut path) {
            path
        } else {
            Vec::new()
        }
    }
}

fn collect_path<'a>(node: &'a OntologyNode, term: &str, path: &mut Vec<&'a Field>) -> bool {
    path.push(&node.field);
    if node.field.term == term {
        return true;
    }
    for child in &node.children {
        if collect_path(child, term, path) {
            return true;
        }
    }
    path.pop();
    false
}

pub struct Preorder<'a> {
    stack: Vec<&'a OntologyNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a OntologyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

fn generated_root(children: Vec<OntologyNode>) -> OntologyNode {
    OntologyNode {
        field: Field::new(GENERATED_ROOT_TERM, GENERATED_ROOT_TERM),
        children: leaves_first(children),
    }
}

/// Builds the ontology tree from a flat field list.
///
/// Fields whose parent term is not present are placed at the top level.
/// Duplicate terms and parent cycles are rejected since nodes are addressed
/// by term everywhere downstream.
pub fn build_tree(fields: &[Field], options: TreeOptions) -> Result<OntologyNode> {
    let mut terms = HashSet::with_capacity(fields.len());
    for field in fields {
        if !terms.insert(field.term.as_str()) {
            return Err(FilterError::DuplicateTerm(field.term.clone()));
        }
    }

    let mut by_parent: HashMap<Option<&str>, Vec<&Field>> = HashMap::new();
    for field in fields {
        let parent = field
            .parent
            .as_deref()
            .filter(|parent| terms.contains(parent));
        if field.parent.is_some() && parent.is_none() {
            debug!(term = %field.term, "parent not in ontology; placing field at top level");
        }
        by_parent.entry(parent).or_default().push(field);
    }

    let mut visited = 0usize;
    let top_level: Vec<OntologyNode> = by_parent
        .get(&None)
        .map(|roots| {
            roots
                .iter()
                .map(|field| make_node(field, &by_parent, &mut visited))
                .collect()
        })
        .unwrap_or_default();

    if visited != fields.len() {
        let reached: HashSet<&str> = top_level
            .iter()
            .flat_map(|node| node.preorder())
            .map(|node| node.field.term.as_str())
            .collect();
        let unreachable = fields
            .iter()
            .filter(|field| !reached.contains(field.term.as_str()))
            .map(|field| field.term.clone())
            .collect();
        return Err(FilterError::ParentCycle(unreachable));
    }

    let mut root = match <[OntologyNode; 1]>::try_from(top_level) {
        Ok([single]) if options.hide_single_root && !single.children.is_empty() => {
            promote_single_branch(single)
        }
        Ok([single]) => generated_root(vec![single]),
        Err(top_level) => generated_root(top_level),
    };

    if options.remove_single_child_intermediates {
        root = remove_intermediate_nodes_with_single_child(root);
    }
    if options.sort_leaves_before_branches {
        root = sort_leaves_before_branches(root);
    }
    Ok(root)
}

/// A grouping root whose only child is itself a branch gives way to that child.
fn promote_single_branch(root: OntologyNode) -> OntologyNode {
    if root.field.is_filter_field() {
        return root;
    }
    match <[OntologyNode; 1]>::try_from(root.children) {
        Ok([child]) if !child.children.is_empty() => child,
        Ok([child]) => OntologyNode {
            field: root.field,
            children: vec![child],
        },
        Err(children) => OntologyNode {
            field: root.field,
            children,
        },
    }
}

fn make_node(
    field: &Field,
    by_parent: &HashMap<Option<&str>, Vec<&Field>>,
    visited: &mut usize,
) -> OntologyNode {
    *visited += 1;
    let children = by_parent
        .get(&Some(field.term.as_str()))
        .map(|children| {
            children
                .iter()
                .map(|child| make_node(child, by_parent, visited))
                .collect()
        })
        .unwrap_or_default();
    OntologyNode {
        field: field.clone(),
        children,
    }
}

fn leaves_first(mut nodes: Vec<OntologyNode>) -> Vec<OntologyNode> {
    // Vec::sort_by_key is stable.
    nodes.sort_by_key(|node| !node.field.is_filter_field());
    nodes
}

/// Replaces grouping nodes that have exactly one child with that child.
/// Subtrees rooted at filterable fields (multi filters) are kept whole.
pub fn remove_intermediate_nodes_with_single_child(node: OntologyNode) -> OntologyNode {
    if node.field.is_filter_field() {
        return node;
    }
    match <[OntologyNode; 1]>::try_from(node.children) {
        Ok([child]) => remove_intermediate_nodes_with_single_child(child),
        Err(children) => OntologyNode {
            field: node.field,
            children: children
                .into_iter()
                .map(remove_intermediate_nodes_with_single_child)
                .collect(),
        },
    }
}

/// Stably orders every grouping node's children so filterable fields come
/// first. Children owned by a filterable field keep their order.
pub fn sort_leaves_before_branches(node: OntologyNode) -> OntologyNode {
    if node.field.is_filter_field() {
        return node;
    }
    let children = node
        .children
        .into_iter()
        .map(sort_leaves_before_branches)
        .collect();
    OntologyNode {
        field: node.field,
        children: leaves_first(children),
    }
}

/// Filterable fields beneath `root` (inclusive), breadth first.
pub fn leaves_of_subtree<'a>(fields: &'a [Field], root: &'a Field) -> Vec<&'a Field> {
    let mut by_parent: HashMap<&str, Vec<&Field>> = HashMap::new();
    for field in fields {
        if let Some(parent) = field.parent.as_deref() {
            by_parent.entry(parent).or_default().push(field);
        }
    }
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(field) = queue.pop_front() {
        if !seen.insert(field.term.as_str()) {
            continue;
        }
        if let Some(children) = by_parent.get(field.term.as_str()) {
            queue.extend(children.iter().copied());
        }
        if field.is_filter_field() {
            result.push(field);
        }
    }
    result
}

/// Stable content digest of a field list, used as a cache key for built trees.
pub fn fingerprint(fields: &[Field]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.term.as_bytes());
        hasher.update([0x1f]);
        hasher.update(field.display.as_bytes());
        hasher.update([0x1f]);
        hasher.update(field.parent.as_deref().unwrap_or_default().as_bytes());
        hasher.update([0x1f]);
        hasher.update(field.field_type.map(FieldType::as_str).unwrap_or_default().as_bytes());
        hasher.update([u8::from(field.is_range), 0x1e]);
    }
    format!("{:x}", hasher.finalize())
}
