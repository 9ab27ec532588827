use std::rc::Rc;

use crate::value::Value;

/// Index of a node in an [`ExprTree`] arena.
///
/// Parent links are stored as indices rather than owning references: the
/// arena owns every node, children vectors own the indices of their
/// subtrees, and a parent back-reference is just a non-owning `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub usize);

/// Zero-argument supplier backing a [`ExprKind::LazyFunctionValue`] node.
///
/// Lazy nodes are never produced by the parser; embedding code inserts
/// them for values computed outside the normal evaluation path.
pub type Supplier = Rc<dyn Fn() -> Value>;

/// The closed set of expression node kinds.
#[derive(Clone)]
pub enum ExprKind {
    /// Tree root. Evaluates to null when empty, to its only child's value
    /// when it has one, and to the concatenated string forms otherwise.
    Root,

    /// Literal number, text or boolean.
    Constant(Value),

    /// Explicit null.
    Null,

    /// Dotted property path resolved against the evaluation context.
    ///
    /// # Examples
    /// ```text
    /// this.name
    /// data.price
    /// ```
    Value(String),

    /// Bare parenthesized sequence that is not a function call; evaluates
    /// to the concatenation of its children's string forms.
    Group,

    /// Call of a registered builtin; the node name is the function name
    /// and the children are the argument expressions.
    FunctionCall,

    /// A function call followed by postfix transforms (array index,
    /// trailing path, filter), applied left to right to the call result.
    FunctionValueChain,

    /// Conditional: condition, true branch, optional false branch.
    If,

    /// Side-effect iteration: list expression plus a body evaluated once
    /// per element with the context scoped to that element.
    Each,

    /// List filtering: list expression plus a per-element predicate.
    Filter,

    /// Array index, reachable only through the postfix chain path.
    Array,

    /// Host-supplied deferred value.
    LazyFunctionValue(Supplier),
}

impl ExprKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Root => "Root",
            ExprKind::Constant(_) => "Constant",
            ExprKind::Null => "Null",
            ExprKind::Value(_) => "Value",
            ExprKind::Group => "Group",
            ExprKind::FunctionCall => "FunctionCall",
            ExprKind::FunctionValueChain => "FunctionValueChain",
            ExprKind::If => "If",
            ExprKind::Each => "Each",
            ExprKind::Filter => "Filter",
            ExprKind::Array => "Array",
            ExprKind::LazyFunctionValue(_) => "LazyFunctionValue",
        }
    }

    /// Fixed maximum child count for the control forms; `None` means
    /// unbounded. Exceeding the bound is a structural error at build time.
    pub fn max_arity(&self) -> Option<usize> {
        match self {
            ExprKind::If => Some(3),
            ExprKind::Each => Some(2),
            ExprKind::Filter => Some(2),
            ExprKind::Array => Some(1),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ExprKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprKind::Constant(v) => write!(f, "Constant({:?})", v),
            ExprKind::Value(path) => write!(f, "Value({:?})", path),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// One node of the expression tree.
#[derive(Debug, Clone)]
pub struct ExprNode {
    pub kind: ExprKind,
    /// Set for reserved words and function calls.
    pub name: Option<String>,
    /// Back-reference; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Depth from the root, root = 0. Always `parent.level + 1`.
    pub level: usize,
    /// Ordered children; the order is evaluation order.
    pub children: Vec<NodeId>,
}

/// Arena-allocated expression tree produced by the builder.
///
/// Trees are created fresh for every evaluation and discarded afterwards;
/// nothing in here is cached or shared between invocations.
#[derive(Debug)]
pub struct ExprTree {
    nodes: Vec<ExprNode>,
    root: NodeId,
}

impl ExprTree {
    pub fn new() -> Self {
        let root = ExprNode {
            kind: ExprKind::Root,
            name: None,
            parent: None,
            level: 0,
            children: Vec::new(),
        };
        ExprTree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ExprNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ExprNode {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Append a new node under `parent`. Returns `Err` with the parent's
    /// kind name when the parent's fixed arity would be exceeded.
    pub fn append(
        &mut self,
        parent: NodeId,
        kind: ExprKind,
        name: Option<String>,
    ) -> Result<NodeId, &'static str> {
        let parent_node = &self.nodes[parent.0];
        if let Some(max) = parent_node.kind.max_arity() {
            if parent_node.children.len() >= max {
                return Err(parent_node.kind.name());
            }
        }
        let level = parent_node.level + 1;
        let id = NodeId(self.nodes.len());
        self.nodes.push(ExprNode {
            kind,
            name,
            parent: Some(parent),
            level,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Re-parent `child` under a fresh node of the given kind, which takes
    /// the child's place in the original parent's child list. Used to wrap
    /// a completed function call into a [`ExprKind::FunctionValueChain`].
    pub fn wrap(&mut self, child: NodeId, kind: ExprKind) -> NodeId {
        let parent = self.nodes[child.0].parent;
        let level = self.nodes[child.0].level;
        let wrapper = NodeId(self.nodes.len());
        self.nodes.push(ExprNode {
            kind,
            name: None,
            parent,
            level,
            children: vec![child],
        });
        if let Some(p) = parent {
            let slot = self.nodes[p.0]
                .children
                .iter()
                .position(|&c| c == child)
                .expect("wrapped node must be a child of its parent");
            self.nodes[p.0].children[slot] = wrapper;
        }
        self.nodes[child.0].parent = Some(wrapper);
        self.renumber(child, level + 1);
        wrapper
    }

    fn renumber(&mut self, id: NodeId, level: usize) {
        self.nodes[id.0].level = level;
        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.renumber(child, level + 1);
        }
    }
}

impl Default for ExprTree {
    fn default() -> Self {
        Self::new()
    }
}
