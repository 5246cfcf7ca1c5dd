//! TypeScript declaration generation over the proto reflection tree.
//!
//! A [`Template`] turns the whole tree into a set of `(relative path,
//! content)` pairs. [`render_templates`] runs the configured templates and
//! collects their output into a [`TemplateMap`], where a duplicate path is a
//! hard error rather than a silent overwrite. The map is then written below
//! an output root with [`TemplateMap::write_to`].

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;

use protots_model::Root;
use thiserror::Error;
use tracing::debug;

pub mod paths;
pub mod resolve;
pub mod templates;

/// Errors that can occur during code generation.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("file '{0}' already generated")]
    Collision(String),

    #[error("cannot resolve type for '{0}'")]
    UnresolvedType(String),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A unit of code generation: renders the whole tree into a set of
/// `(relative path, content)` pairs.
///
/// Templates are statically registered; see [`template_by_name`].
pub trait Template: Sync {
    /// The template name used in configuration.
    fn name(&self) -> &'static str;

    /// Renders all files this template wants written.
    fn render(&self, root: &Root) -> Result<Vec<(String, String)>, CodegenError>;
}

/// The collected output of one generation run: relative file path to
/// content, ordered by path for deterministic iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMap {
    files: BTreeMap<String, String>,
}

impl TemplateMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rendered file. Inserting a path that is already present is
    /// a collision error and leaves the first entry untouched.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), CodegenError> {
        match self.files.entry(path.into()) {
            Entry::Vacant(entry) => {
                entry.insert(content.into());
                Ok(())
            }
            Entry::Occupied(entry) => Err(CodegenError::Collision(entry.key().clone())),
        }
    }

    /// Returns the content for a path, if present.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|s| s.as_str())
    }

    /// Iterates over `(path, content)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// The generated paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|p| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes all files below the given output directory, creating the
    /// necessary subdirectories first.
    pub fn write_to(&self, out_dir: &Path) -> Result<(), CodegenError> {
        std::fs::create_dir_all(out_dir)?;

        for (path, content) in self.iter() {
            let relative = Path::new(path);
            validate_relative_path(relative)?;

            let target = out_dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            debug!(path, "writing generated file");
            std::fs::write(&target, content)?;
        }
        Ok(())
    }
}

fn validate_relative_path(path: &Path) -> Result<(), CodegenError> {
    use std::path::Component;

    if path.as_os_str().is_empty() || path.is_absolute() {
        return Err(CodegenError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("generated file path must be relative: {}", path.display()),
        )));
    }

    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            // Disallow `..`, `.`, prefixes, and root dirs to prevent escaping the output dir.
            Component::ParentDir | Component::CurDir | Component::Prefix(_) | Component::RootDir => {
                return Err(CodegenError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "generated file path must be a normal relative path: {}",
                        path.display()
                    ),
                )));
            }
        }
    }

    Ok(())
}

/// Runs every template over the tree and collects the results, failing on
/// cross-template path collisions.
pub fn render_templates(
    root: &Root,
    templates: &[&dyn Template],
) -> Result<TemplateMap, CodegenError> {
    let mut map = TemplateMap::new();

    for template in templates {
        debug!(template = template.name(), "rendering template");
        for (path, content) in template.render(root)? {
            map.insert(path, content)?;
        }
    }

    Ok(map)
}

/// Looks up a statically registered template by its configuration name.
pub fn template_by_name(name: &str) -> Option<&'static dyn Template> {
    static GRPC_NODE: templates::grpc_node::GrpcNodeTemplate =
        templates::grpc_node::GrpcNodeTemplate;
    static PROTOBUFJS6: templates::protobufjs6::ProtobufJs6Template =
        templates::protobufjs6::ProtobufJs6Template;

    match name {
        "grpc-node" => Some(&GRPC_NODE),
        "protobufjs6" => Some(&PROTOBUFJS6),
        _ => None,
    }
}

/// Names of all registered templates.
pub fn available_templates() -> &'static [&'static str] {
    &["grpc-node", "protobufjs6"]
}
