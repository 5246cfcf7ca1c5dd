//! Reflection model for parsed proto definitions.
//!
//! The model is a flat arena: every namespace, message, enum, and service is
//! a [`Node`] stored in a vector owned by [`Root`] and addressed by a
//! [`NodeId`]. Parent and child links are indices into the same arena, so
//! node identity is index equality and the tree carries no shared ownership.
//! The tree is built once during parsing and is read-only afterwards.

/// Index of a node in the arena owned by [`Root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Proto scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Returns the proto keyword for this scalar type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// Parses a proto scalar type keyword.
    pub fn from_keyword(s: &str) -> Option<ScalarType> {
        match s {
            "double" => Some(ScalarType::Double),
            "float" => Some(ScalarType::Float),
            "int32" => Some(ScalarType::Int32),
            "int64" => Some(ScalarType::Int64),
            "uint32" => Some(ScalarType::Uint32),
            "uint64" => Some(ScalarType::Uint64),
            "sint32" => Some(ScalarType::Sint32),
            "sint64" => Some(ScalarType::Sint64),
            "fixed32" => Some(ScalarType::Fixed32),
            "fixed64" => Some(ScalarType::Fixed64),
            "sfixed32" => Some(ScalarType::Sfixed32),
            "sfixed64" => Some(ScalarType::Sfixed64),
            "bool" => Some(ScalarType::Bool),
            "string" => Some(ScalarType::String),
            "bytes" => Some(ScalarType::Bytes),
            _ => None,
        }
    }
}

/// A field or method type reference.
///
/// `Named` only exists between parsing and the resolution pass; rendering a
/// `Named` reference is an invariant violation and must fail hard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A proto scalar type.
    Scalar(ScalarType),
    /// An unresolved reference as written in the source, possibly dotted
    /// and possibly rooted with a leading `.`.
    Named(String),
    /// A resolved reference to a message or enum node.
    Resolved(NodeId),
}

/// A field of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The field name (case already normalized by the parser).
    pub name: String,
    /// The field type.
    pub ty: TypeRef,
    /// True for `repeated` fields.
    pub repeated: bool,
    /// True for oneof members, rendered as optional.
    pub optional: bool,
    /// Leading comment, if any.
    pub comment: Option<String>,
}

/// A method of a service.
///
/// Request and response references must be resolved before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub request: TypeRef,
    pub response: TypeRef,
    pub request_stream: bool,
    pub response_stream: bool,
}

/// What a node is; the closed set of declaration kinds in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A plain package-grouping namespace.
    Namespace,
    /// A message definition. Messages also act as namespaces for their
    /// nested declarations.
    Message { fields: Vec<Field> },
    /// An enum definition with its values in declaration order.
    Enum { values: Vec<(String, i32)> },
    /// A service definition.
    Service { methods: Vec<Method> },
}

/// A node in the reflection tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Name, unique among siblings. Empty only for the synthetic root.
    pub name: String,
    /// Parent node; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Children in declaration order.
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, NodeKind::Namespace)
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, NodeKind::Message { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, NodeKind::Enum { .. })
    }

    pub fn is_service(&self) -> bool {
        matches!(self.kind, NodeKind::Service { .. })
    }

    /// The fields of a message node, or an empty slice.
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            NodeKind::Message { fields } => fields,
            _ => &[],
        }
    }

    /// The methods of a service node, or an empty slice.
    pub fn methods(&self) -> &[Method] {
        match &self.kind {
            NodeKind::Service { methods } => methods,
            _ => &[],
        }
    }

    /// The values of an enum node, or an empty slice.
    pub fn enum_values(&self) -> &[(String, i32)] {
        match &self.kind {
            NodeKind::Enum { values } => values,
            _ => &[],
        }
    }
}

/// The reflection tree: an arena of nodes with a synthetic unnamed root
/// namespace at index 0.
#[derive(Debug, Clone, Default)]
pub struct Root {
    nodes: Vec<Node>,
}

impl Root {
    /// Creates a tree containing only the root namespace.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                children: vec![],
                kind: NodeKind::Namespace,
            }],
        }
    }

    /// The synthetic root namespace.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node for an id.
    ///
    /// Ids are only ever produced by this arena, so an out-of-range id is a
    /// programming fault and panics.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Mutable access to a node, used by the parser and the resolution pass.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Adds a new node under `parent`, appended to its children.
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.into(),
            parent: Some(parent),
            children: vec![],
            kind,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Looks up a direct child of `parent` by name.
    pub fn get_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.index()]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.index()].name == name)
    }

    /// Returns the child namespace with the given name, creating it if
    /// needed. Used when multiple files contribute to the same package.
    pub fn get_or_insert_namespace(&mut self, parent: NodeId, name: &str) -> NodeId {
        match self.get_child(parent, name) {
            Some(id) => id,
            None => self.add_node(parent, name, NodeKind::Namespace),
        }
    }

    /// The parent of a node, `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Children of a node in declaration order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// All node ids in the arena, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The dotted name of a node, e.g. `a.b.Message`, for diagnostics.
    /// The root itself has the empty name.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut parts = vec![];
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = self.node(n);
            if !node.name.is_empty() {
                parts.push(node.name.as_str());
            }
            cur = node.parent;
        }
        parts.reverse();
        parts.join(".")
    }
}
