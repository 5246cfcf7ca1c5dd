//! Multi-file proto loading and reference resolution.
//!
//! Imports resolve like `protoc` does: absolute paths are used as-is,
//! relative paths probe the configured import roots in order. There is no
//! fallback to resolving relative to the importing file.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use protots_model::{NodeId, NodeKind, Root, TypeRef};
use thiserror::Error;
use tracing::debug;

use crate::parser::{parse_source, ParseError};
use crate::ParseOptions;

/// Errors from loading and resolving a set of proto files.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{}: {error}", file.display())]
    Parse {
        file: PathBuf,
        source_text: String,
        #[source]
        error: ParseError,
    },

    #[error("cannot read '{}': {error}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("could not find file \"{import}\" (imported from {})", from.display())]
    ImportNotFound { import: String, from: PathBuf },

    #[error("cannot resolve type '{name}' for '{context}'")]
    UnresolvedType { name: String, context: String },

    #[error("'{name}' referenced by '{context}' is not a {expected}")]
    NotAType {
        name: String,
        context: String,
        expected: &'static str,
    },
}

impl LoadError {
    /// Prints a pretty report for parse errors; other errors go through
    /// their `Display` form.
    pub fn report(&self) {
        match self {
            LoadError::Parse {
                file,
                source_text,
                error,
            } => error.report(&file.display().to_string(), source_text),
            other => eprintln!("{other}"),
        }
    }
}

/// Loads a set of proto entry files, following imports through the given
/// import roots, and resolves all type references. Returns the completed
/// reflection tree.
pub fn load(
    files: &[PathBuf],
    import_roots: &[PathBuf],
    options: &ParseOptions,
) -> Result<Root, LoadError> {
    let mut root = Root::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<PathBuf> = files.iter().cloned().collect();

    while let Some(file) = queue.pop_front() {
        let canonical = file.canonicalize().map_err(|error| LoadError::Io {
            file: file.clone(),
            error,
        })?;
        if !visited.insert(canonical) {
            continue;
        }

        let source = fs::read_to_string(&file).map_err(|error| LoadError::Io {
            file: file.clone(),
            error,
        })?;

        debug!(file = %file.display(), "parsing proto file");
        let imports =
            parse_source(&source, &mut root, options).map_err(|error| LoadError::Parse {
                file: file.clone(),
                source_text: source.clone(),
                error,
            })?;

        for import in imports {
            queue.push_back(resolve_import(&import, &file, import_roots)?);
        }
    }

    resolve_references(&mut root)?;
    Ok(root)
}

/// Resolves one import statement to a file path: absolute imports are used
/// as-is, relative imports probe the roots in order for the first match.
fn resolve_import(
    import: &str,
    from: &Path,
    import_roots: &[PathBuf],
) -> Result<PathBuf, LoadError> {
    let path = Path::new(import);

    if path.is_absolute() {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    } else if let Some(resolved) = import_roots
        .iter()
        .map(|r| r.join(path))
        .find(|candidate| candidate.exists())
    {
        return Ok(resolved);
    }

    Err(LoadError::ImportNotFound {
        import: import.to_string(),
        from: from.to_path_buf(),
    })
}

/// Resolves every `TypeRef::Named` in the tree to a concrete node,
/// following proto scoping rules: a leading dot anchors at the root,
/// otherwise the enclosing scopes are probed innermost-out.
pub fn resolve_references(root: &mut Root) -> Result<(), LoadError> {
    let ids: Vec<NodeId> = root.ids().collect();

    for id in ids {
        match &root.node(id).kind {
            NodeKind::Message { fields } => {
                let pending: Vec<(usize, String, String)> = fields
                    .iter()
                    .enumerate()
                    .filter_map(|(i, f)| match &f.ty {
                        TypeRef::Named(name) => Some((i, name.clone(), f.name.clone())),
                        _ => None,
                    })
                    .collect();

                for (slot, name, field_name) in pending {
                    let context = format!("{}.{}", root.full_name(id), field_name);
                    let target = lookup(root, id, &name, &context, "message or enum", |n| {
                        n.is_message() || n.is_enum()
                    })?;
                    if let NodeKind::Message { fields } = &mut root.node_mut(id).kind {
                        fields[slot].ty = TypeRef::Resolved(target);
                    }
                }
            }
            NodeKind::Service { methods } => {
                let pending: Vec<(usize, bool, String, String)> = methods
                    .iter()
                    .enumerate()
                    .flat_map(|(i, m)| {
                        let mut refs = vec![];
                        if let TypeRef::Named(name) = &m.request {
                            refs.push((i, true, name.clone(), m.name.clone()));
                        }
                        if let TypeRef::Named(name) = &m.response {
                            refs.push((i, false, name.clone(), m.name.clone()));
                        }
                        refs
                    })
                    .collect();

                for (slot, is_request, name, method_name) in pending {
                    let context = format!("{}.{}", root.full_name(id), method_name);
                    let target =
                        lookup(root, id, &name, &context, "message", |n| n.is_message())?;
                    if let NodeKind::Service { methods } = &mut root.node_mut(id).kind {
                        let ty = TypeRef::Resolved(target);
                        if is_request {
                            methods[slot].request = ty;
                        } else {
                            methods[slot].response = ty;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Resolves a name from a scope and checks the target's kind.
fn lookup(
    root: &Root,
    scope: NodeId,
    name: &str,
    context: &str,
    expected: &'static str,
    accept: impl Fn(&protots_model::Node) -> bool,
) -> Result<NodeId, LoadError> {
    let target = resolve_name(root, scope, name).ok_or_else(|| LoadError::UnresolvedType {
        name: name.to_string(),
        context: context.to_string(),
    })?;

    if !accept(root.node(target)) {
        return Err(LoadError::NotAType {
            name: name.to_string(),
            context: context.to_string(),
            expected,
        });
    }

    Ok(target)
}

/// Resolves a possibly dotted name against the scope chain.
fn resolve_name(root: &Root, scope: NodeId, name: &str) -> Option<NodeId> {
    if let Some(rest) = name.strip_prefix('.') {
        return lookup_dotted(root, root.root(), rest);
    }

    let mut current = Some(scope);
    while let Some(scope) = current {
        if let Some(found) = lookup_dotted(root, scope, name) {
            return Some(found);
        }
        current = root.parent(scope);
    }
    None
}

/// Walks a dotted name downward from a starting node.
fn lookup_dotted(root: &Root, from: NodeId, name: &str) -> Option<NodeId> {
    let mut current = from;
    for segment in name.split('.') {
        current = root.get_child(current, segment)?;
    }
    Some(current)
}
