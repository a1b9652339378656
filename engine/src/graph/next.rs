//! Next-step result from a graph node: continue linear chain, jump to a
//! node, or end. The graph runner uses this to decide the next node.

/// Next step after running a node.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow linear edge order; if current node is last, equivalent to End.
    Continue,
    /// Run the node with the given id next.
    Node(String),
    /// Stop and return the current state.
    End,
}
