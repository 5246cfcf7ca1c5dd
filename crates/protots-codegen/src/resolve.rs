//! Cross-file reference resolution for generated imports.
//!
//! Every namespace's generated file needs a unique alias and a correct
//! relative path when referenced from another file. The alias is the node's
//! `$`-joined tree address; the path comes from a longest-common-ancestor
//! walk over the two nodes' chains, so references stay correct at any
//! nesting depth.

use protots_model::{NodeId, Root};

use crate::paths::{ancestor_chain, has_type_or_enum, namespaces_transitive};

/// The unique alias under which a node's file is imported, e.g. `$a$b` for
/// namespace `a.b`. Derived from the node's tree address, so two distinct
/// nodes never share an alias.
pub fn import_reference(root: &Root, id: NodeId) -> String {
    let mut parts: Vec<&str> = ancestor_chain(root, id)
        .into_iter()
        .map(|a| root.node(a).name.as_str())
        .collect();
    let name = &root.node(id).name;
    if !name.is_empty() {
        parts.push(name);
    }
    format!("${}", parts.join("$"))
}

/// The relative path from the file generated for `base` to the file
/// generated for `target`, always `/`-joined.
///
/// Both chains include the node itself and exclude the synthetic root.
/// After dropping the longest common prefix (compared by node identity,
/// not name), the remainder of the base chain becomes `..` segments and
/// the remainder of the target chain becomes name segments. With zero
/// ascents the path is prefixed with `.` so it stays a relative module
/// path rather than a bare package name.
pub fn import_path(root: &Root, target: NodeId, base: NodeId) -> String {
    let target_chain = full_chain(root, target);
    let base_chain = full_chain(root, base);

    let mut i = 0;
    while i < target_chain.len() && i < base_chain.len() && target_chain[i] == base_chain[i] {
        i += 1;
    }

    let mut segments: Vec<&str> = Vec::new();
    for _ in i..base_chain.len() {
        segments.push("..");
    }
    if segments.is_empty() {
        segments.push(".");
    }
    for &node in &target_chain[i..] {
        segments.push(root.node(node).name.as_str());
    }

    segments.join("/")
}

/// Ancestor chain plus the node itself, root-exclusive.
fn full_chain(root: &Root, id: NodeId) -> Vec<NodeId> {
    let mut chain = ancestor_chain(root, id);
    if root.parent(id).is_some() {
        chain.push(id);
    }
    chain
}

/// A qualified reference to a type declared in another namespace's file:
/// the parent namespace's alias plus the type name, e.g. `$a$b.M`.
pub fn namespaced_type_reference(root: &Root, id: NodeId) -> String {
    let parent = root
        .parent(id)
        .expect("a type node always has a parent namespace");
    format!("{}.{}", import_reference(root, parent), root.node(id).name)
}

/// Import lines for every namespace file visible from `base`: one
/// `import * as <alias> from '<path>';` per transitive namespace of the
/// whole tree that owns types or enums, in traversal order.
pub fn namespace_import_declarations(root: &Root, base: NodeId) -> Vec<String> {
    namespaces_transitive(root, root.root())
        .into_iter()
        .filter(|&ns| has_type_or_enum(root, ns))
        .map(|ns| {
            format!(
                "import * as {} from '{}';",
                import_reference(root, ns),
                import_path(root, ns, base)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protots_model::NodeKind;

    fn sample() -> (Root, NodeId, NodeId, NodeId, NodeId, NodeId) {
        // a { b { M, S } }, sibling x { y }
        let mut root = Root::new();
        let a = root.add_node(root.root(), "a", NodeKind::Namespace);
        let b = root.add_node(a, "b", NodeKind::Namespace);
        let m = root.add_node(b, "M", NodeKind::Message { fields: vec![] });
        let s = root.add_node(b, "S", NodeKind::Service { methods: vec![] });
        let x = root.add_node(root.root(), "x", NodeKind::Namespace);
        root.add_node(x, "y", NodeKind::Namespace);
        (root, a, b, m, s, x)
    }

    #[test]
    fn test_import_reference_encodes_tree_address() {
        let (root, a, b, m, s, _) = sample();
        assert_eq!(import_reference(&root, a), "$a");
        assert_eq!(import_reference(&root, b), "$a$b");
        assert_eq!(import_reference(&root, m), "$a$b$M");
        assert_eq!(import_reference(&root, s), "$a$b$S");
        assert_eq!(import_reference(&root, root.root()), "$");
    }

    #[test]
    fn test_import_references_are_unique() {
        let (root, ..) = sample();
        let all: Vec<_> = root.ids().map(|id| import_reference(&root, id)).collect();
        for (i, left) in all.iter().enumerate() {
            for right in &all[i + 1..] {
                assert_ne!(left, right);
            }
        }
    }

    #[test]
    fn test_same_name_siblings_have_distinct_references() {
        let mut root = Root::new();
        let a = root.add_node(root.root(), "a", NodeKind::Namespace);
        let x = root.add_node(root.root(), "x", NodeKind::Namespace);
        let na = root.add_node(a, "shared", NodeKind::Namespace);
        let nx = root.add_node(x, "shared", NodeKind::Namespace);
        assert_ne!(import_reference(&root, na), import_reference(&root, nx));
    }

    #[test]
    fn test_import_path_self_is_same_directory_marker() {
        let (root, _, b, _, _, _) = sample();
        assert_eq!(import_path(&root, b, b), ".");
    }

    #[test]
    fn test_import_path_descending() {
        let (root, a, b, _, _, _) = sample();
        // from a's file down into a/b
        assert_eq!(import_path(&root, b, a), "./b");
        // from the root file down
        assert_eq!(import_path(&root, b, root.root()), "./a/b");
    }

    #[test]
    fn test_import_path_ascending_and_descending() {
        let (root, a, b, _, s, x) = sample();
        // sibling namespaces: one up, one down
        assert_eq!(import_path(&root, x, a), "../x");
        // from the service's own directory out to a sibling package
        assert_eq!(import_path(&root, x, s), "../../../x");
        // service file referencing its own namespace
        assert_eq!(import_path(&root, b, s), "..");
        // and the whole tree root
        assert_eq!(import_path(&root, root.root(), s), "../../..");
    }

    #[test]
    fn test_ascend_count_grows_with_base_depth() {
        let (root, a, b, _, s, x) = sample();
        let ascends = |p: &str| p.split('/').filter(|seg| *seg == "..").count();

        // target x is outside every base subtree here; each extra base
        // level adds exactly one ascent
        assert_eq!(ascends(&import_path(&root, x, a)), 1);
        assert_eq!(ascends(&import_path(&root, x, b)), 2);
        assert_eq!(ascends(&import_path(&root, x, s)), 3);
    }

    #[test]
    fn test_import_path_never_has_empty_segments() {
        let (root, ..) = sample();
        let ids: Vec<_> = root.ids().collect();
        for &target in &ids {
            for &base in &ids {
                let path = import_path(&root, target, base);
                assert!(!path.is_empty());
                assert!(path.split('/').all(|seg| !seg.is_empty()), "path: {path}");
            }
        }
    }

    #[test]
    fn test_namespaced_type_reference() {
        let (root, _, _, m, _, _) = sample();
        assert_eq!(namespaced_type_reference(&root, m), "$a$b.M");
    }

    #[test]
    fn test_top_level_type_uses_root_alias() {
        let mut root = Root::new();
        let m = root.add_node(root.root(), "M", NodeKind::Message { fields: vec![] });
        assert_eq!(namespaced_type_reference(&root, m), "$.M");
    }

    #[test]
    fn test_namespace_import_declarations_filter_and_shape() {
        let (mut root, _, b, _, s, x) = sample();
        // x/y subtree has no types; add one to x to make it importable
        root.add_node(x, "T", NodeKind::Message { fields: vec![] });

        let imports = namespace_import_declarations(&root, s);
        // b (owns M) and x (owns T); y and the bare namespaces are skipped
        assert_eq!(imports.len(), 2);
        assert!(imports
            .iter()
            .any(|l| l == "import * as $a$b from '..';"));
        assert!(imports
            .iter()
            .any(|l| l == "import * as $x from '../../../x';"));
        let _ = b;
    }
}
