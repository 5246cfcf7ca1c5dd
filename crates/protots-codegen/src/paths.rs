//! Pure traversal and path helpers over the reflection tree.
//!
//! Messages double as namespaces here: traversal descends into plain
//! namespaces and messages, while enums and services are leaves. Generated
//! file paths are always `/`-joined regardless of the host platform, since
//! they also appear inside generated import statements.

use std::collections::{HashSet, VecDeque};

use protots_model::{NodeId, Root};

/// Direct children that act as namespaces: plain namespaces and messages.
pub fn child_namespaces(root: &Root, id: NodeId) -> Vec<NodeId> {
    root.children(id)
        .iter()
        .copied()
        .filter(|&c| {
            let node = root.node(c);
            node.is_namespace() || node.is_message()
        })
        .collect()
}

/// Direct message children, in declaration order.
pub fn child_types(root: &Root, id: NodeId) -> Vec<NodeId> {
    root.children(id)
        .iter()
        .copied()
        .filter(|&c| root.node(c).is_message())
        .collect()
}

/// Direct enum children, in declaration order.
pub fn child_enums(root: &Root, id: NodeId) -> Vec<NodeId> {
    root.children(id)
        .iter()
        .copied()
        .filter(|&c| root.node(c).is_enum())
        .collect()
}

/// Direct service children, in declaration order.
pub fn child_services(root: &Root, id: NodeId) -> Vec<NodeId> {
    root.children(id)
        .iter()
        .copied()
        .filter(|&c| root.node(c).is_service())
        .collect()
}

/// All namespaces reachable from `id`, including `id` itself, in
/// breadth-first order. A visited set keeps the result duplicate-free.
pub fn namespaces_transitive(root: &Root, id: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([id]);

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        order.push(current);
        for child in child_namespaces(root, current) {
            queue.push_back(child);
        }
    }

    order
}

/// All message nodes in the subtree rooted at `id`.
pub fn types_transitive(root: &Root, id: NodeId) -> Vec<NodeId> {
    namespaces_transitive(root, id)
        .into_iter()
        .flat_map(|ns| child_types(root, ns))
        .collect()
}

/// All service nodes in the subtree rooted at `id`.
pub fn services_transitive(root: &Root, id: NodeId) -> Vec<NodeId> {
    namespaces_transitive(root, id)
        .into_iter()
        .flat_map(|ns| child_services(root, ns))
        .collect()
}

/// True if the node or any transitive descendant owns a message or enum.
/// Namespaces without one produce no output file.
pub fn has_type_or_enum(root: &Root, id: NodeId) -> bool {
    if !child_types(root, id).is_empty() || !child_enums(root, id).is_empty() {
        return true;
    }
    child_namespaces(root, id)
        .into_iter()
        .any(|ns| has_type_or_enum(root, ns))
}

/// The chain of ancestors from just below the synthetic root down to the
/// node's parent. The root itself has an empty chain.
pub fn ancestor_chain(root: &Root, id: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut current = root.parent(id);

    while let Some(ancestor) = current {
        // the synthetic root (the only parentless node) is not a path segment
        if root.parent(ancestor).is_some() {
            chain.push(ancestor);
        }
        current = root.parent(ancestor);
    }

    chain.reverse();
    chain
}

/// The output directory for a node: its ancestor-chain names plus its own,
/// `/`-joined. The root maps to the empty string (the output root itself).
pub fn output_dir_path(root: &Root, id: NodeId) -> String {
    let mut segments: Vec<&str> = ancestor_chain(root, id)
        .into_iter()
        .map(|a| root.node(a).name.as_str())
        .collect();
    if !root.node(id).name.is_empty() {
        segments.push(&root.node(id).name);
    }
    segments.join("/")
}

/// The output file path for a node with the given file name, e.g.
/// `a/b/index.d.ts`.
pub fn output_file_path(root: &Root, id: NodeId, file_name: &str) -> String {
    let dir = output_dir_path(root, id);
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{dir}/{file_name}")
    }
}
