//! Query abstract syntax tree.
//!
//! Represents parsed queries as handed to the query executor. Every node owns its children
//! exclusively; the tree is built bottom-up by the parser and only ever grows by appending
//! children to [`NodeKind::Phrase`] and [`NodeKind::Union`] nodes.

use std::{fmt, mem, ops::BitOr, slice};

use thiserror::Error;

use crate::schema::Schema;

/// A set of schema fields, one bit per field.
///
/// The default mask matches every field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldMask(u64);

impl FieldMask {
    /// Matches all fields.
    pub const ALL: Self = Self(u64::MAX);

    /// Matches no field.
    pub const NONE: Self = Self(0);

    /// Number of distinct bit positions a mask can hold.
    pub const CAPACITY: u8 = 64;

    /// Creates a mask from raw bits.
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    /// Creates a mask with a single bit set. Positions past [`Self::CAPACITY`] yield
    /// an empty mask.
    pub fn from_bit(bit: u8) -> Self {
        Self::NONE.with_bit(bit)
    }

    /// Returns this mask with `bit` added.
    pub fn with_bit(self, bit: u8) -> Self {
        match 1u64.checked_shl(u32::from(bit)) {
            Some(flag) => Self(self.0 | flag),
            None => self,
        }
    }

    /// Returns the raw bits.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns true if `bit` is set.
    pub fn contains(self, bit: u8) -> bool {
        1u64.checked_shl(u32::from(bit)).is_some_and(|flag| self.0 & flag != 0)
    }

    /// Returns true if this is the match-all mask.
    pub fn is_all(self) -> bool {
        self == Self::ALL
    }

    /// Returns true if no bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the set bit positions in ascending order.
    pub fn bits(self) -> impl Iterator<Item = u8> {
        (0..Self::CAPACITY).filter(move |&bit| self.contains(bit))
    }
}

impl Default for FieldMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for FieldMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            f.write_str("FieldMask(ALL)")
        } else {
            write!(f, "FieldMask({self})")
        }
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("*");
        }
        f.write_str("{")?;
        for (i, bit) in self.bits().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{bit}")?;
        }
        f.write_str("}")
    }
}

/// The shape of a query node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A single word.
    Term(String),

    /// A sequence of children.
    ///
    /// With `exact == false` this is an implicit intersection with no positional
    /// constraint; with `exact == true` the children must match as a contiguous phrase.
    Phrase {
        /// Children in query order.
        children: Vec<QueryNode>,
        /// Whether the children must match in exact sequence.
        exact: bool,
    },

    /// Any child may match.
    Union(Vec<QueryNode>),

    /// Results must NOT match the child.
    Not(Box<QueryNode>),

    /// The child may match; it never excludes results.
    Optional(Box<QueryNode>),

    /// Matches every term starting with the given text.
    Prefix(String),
}

impl NodeKind {
    /// Short name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Term(_) => "Term",
            Self::Phrase { .. } => "Phrase",
            Self::Union(_) => "Union",
            Self::Not(_) => "Not",
            Self::Optional(_) => "Optional",
            Self::Prefix(_) => "Prefix",
        }
    }

    /// Returns true if the variant owns child nodes.
    fn has_children(&self) -> bool {
        matches!(
            self,
            Self::Phrase { .. } | Self::Union(_) | Self::Not(_) | Self::Optional(_)
        )
    }
}

/// Errors from mutating a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    /// Children can only be appended to phrase and union nodes.
    #[error("cannot append a child to a {0} node")]
    InvalidAppend(&'static str),
    /// Growing the child list failed.
    #[error("out of memory while appending a child")]
    OutOfMemory,
}

/// A node in the query tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNode {
    /// What the node matches.
    kind: NodeKind,
    /// Fields the node is restricted to.
    field_mask: FieldMask,
}

impl QueryNode {
    /// Wraps a kind with the default match-all mask.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            field_mask: FieldMask::ALL,
        }
    }

    /// Creates a term node.
    pub fn term(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Term(text.into()))
    }

    /// Creates a prefix node.
    pub fn prefix(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Prefix(text.into()))
    }

    /// Creates an empty phrase node.
    pub fn phrase(exact: bool) -> Self {
        Self::phrase_of(exact, Vec::new())
    }

    /// Creates a phrase node with the given children.
    pub fn phrase_of(exact: bool, children: Vec<Self>) -> Self {
        Self::new(NodeKind::Phrase { children, exact })
    }

    /// Creates an empty union node.
    pub fn union() -> Self {
        Self::union_of(Vec::new())
    }

    /// Creates a union node with the given children.
    pub fn union_of(children: Vec<Self>) -> Self {
        Self::new(NodeKind::Union(children))
    }

    /// Creates a negation of `child`.
    pub fn not(child: Self) -> Self {
        Self::new(NodeKind::Not(Box::new(child)))
    }

    /// Creates an optional match of `child`.
    pub fn optional(child: Self) -> Self {
        Self::new(NodeKind::Optional(Box::new(child)))
    }

    /// Returns the builder form of this node with its mask replaced.
    pub fn with_field_mask(mut self, mask: FieldMask) -> Self {
        self.field_mask = mask;
        self
    }

    /// The node's kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The fields this node is restricted to.
    pub fn field_mask(&self) -> FieldMask {
        self.field_mask
    }

    /// Restricts this node to `mask`, replacing the previous mask.
    pub fn set_field_mask(&mut self, mask: FieldMask) {
        self.field_mask = mask;
    }

    /// Returns true for a phrase that must match exactly.
    pub fn is_exact(&self) -> bool {
        matches!(self.kind, NodeKind::Phrase { exact: true, .. })
    }

    /// Child nodes, in order. Leaves have none.
    pub fn children(&self) -> &[Self] {
        match &self.kind {
            NodeKind::Phrase { children, .. } | NodeKind::Union(children) => children,
            NodeKind::Not(child) | NodeKind::Optional(child) => slice::from_ref(child.as_ref()),
            NodeKind::Term(_) | NodeKind::Prefix(_) => &[],
        }
    }

    /// Appends `child` to a phrase or union node.
    pub fn append_child(&mut self, child: Self) -> Result<(), AstError> {
        let children = match &mut self.kind {
            NodeKind::Phrase { children, .. } | NodeKind::Union(children) => children,
            other => return Err(AstError::InvalidAppend(other.name())),
        };
        children.try_reserve(1).map_err(|_| AstError::OutOfMemory)?;
        children.push(child);
        Ok(())
    }

    /// Consumes the node, returning its kind. The field mask is discarded.
    pub fn into_kind(mut self) -> NodeKind {
        mem::replace(&mut self.kind, NodeKind::Term(String::new()))
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children());
        }
        count
    }

    /// Detaches and returns this node's children, leaving it a leaf.
    fn take_children(&mut self) -> Vec<Self> {
        if !self.kind.has_children() {
            return Vec::new();
        }
        match mem::replace(&mut self.kind, NodeKind::Term(String::new())) {
            NodeKind::Phrase { children, .. } | NodeKind::Union(children) => children,
            NodeKind::Not(child) | NodeKind::Optional(child) => vec![*child],
            NodeKind::Term(_) | NodeKind::Prefix(_) => Vec::new(),
        }
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match &self.kind {
            NodeKind::Term(s) => write!(f, "{prefix}Term({s:?})")?,
            NodeKind::Prefix(s) => write!(f, "{prefix}Prefix({s:?})")?,
            NodeKind::Phrase { exact: true, .. } => write!(f, "{prefix}Phrase(exact)")?,
            NodeKind::Phrase { exact: false, .. } => write!(f, "{prefix}Phrase")?,
            NodeKind::Union(_) => write!(f, "{prefix}Union")?,
            NodeKind::Not(_) => write!(f, "{prefix}Not")?,
            NodeKind::Optional(_) => write!(f, "{prefix}Optional")?,
        }
        if !self.field_mask.is_all() {
            write!(f, " @{}", self.field_mask)?;
        }
        writeln!(f)?;
        for child in self.children() {
            child.fmt_tree(f, indent + 1)?;
        }
        Ok(())
    }

    /// Formats the node back into query syntax.
    ///
    /// Field masks are not rendered; use [`Self::to_query_string_with`] to name them.
    pub fn to_query_string(&self) -> String {
        self.fmt_query_string(None, false)
    }

    /// Formats the node back into query syntax, rendering field masks as `@name:`
    /// modifiers using the names in `schema`.
    pub fn to_query_string_with(&self, schema: &Schema) -> String {
        self.fmt_query_string(Some(schema), false)
    }

    /// Internal helper for query string formatting.
    fn fmt_query_string(&self, schema: Option<&Schema>, nested: bool) -> String {
        let modifier = schema.and_then(|s| modifier_for(self.field_mask, s));
        let grouped = nested || modifier.is_some();

        let body = match &self.kind {
            NodeKind::Term(s) => s.clone(),
            NodeKind::Prefix(s) => format!("{s}*"),
            NodeKind::Phrase {
                children,
                exact: true,
            } => {
                let words: Vec<String> = children
                    .iter()
                    .map(|c| c.fmt_query_string(schema, true))
                    .collect();
                format!("\"{}\"", words.join(" "))
            }
            NodeKind::Phrase {
                children,
                exact: false,
            } => {
                let parts: Vec<String> = children
                    .iter()
                    .map(|c| c.fmt_query_string(schema, true))
                    .collect();
                if grouped {
                    format!("({})", parts.join(" "))
                } else {
                    parts.join(" ")
                }
            }
            NodeKind::Union(children) => {
                let parts: Vec<String> = children
                    .iter()
                    .map(|c| c.fmt_query_string(schema, true))
                    .collect();
                parts.join("|")
            }
            NodeKind::Not(child) => format!("-{}", child.fmt_query_string(schema, true)),
            NodeKind::Optional(child) => format!("~{}", child.fmt_query_string(schema, true)),
        };

        match modifier {
            Some(m) => format!("{m}:{body}"),
            None => body,
        }
    }
}

/// Renders `mask` as `@a|b` using the schema's names, if it names any field.
fn modifier_for(mask: FieldMask, schema: &Schema) -> Option<String> {
    if mask.is_all() {
        return None;
    }
    let names: Vec<&str> = mask.bits().filter_map(|bit| schema.name_of(bit)).collect();
    if names.is_empty() {
        return None;
    }
    Some(format!("@{}", names.join("|")))
}

impl Drop for QueryNode {
    /// Tears the subtree down with an explicit work-list so that deeply nested queries
    /// cannot overflow the call stack.
    fn drop(&mut self) {
        let mut pending = self.take_children();
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.take_children());
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
