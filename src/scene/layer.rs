use tracing::debug;

use crate::scene::node::{Node, NodeId};

/// Ordered container of overlay nodes, redrawn as a unit.
///
/// Attach/detach mark the layer dirty; [`Layer::draw`] clears the flag and bumps an
/// observable draw counter. Node mutations through [`Layer::get_mut`] are expected to be
/// followed by an explicit [`Layer::draw`] when they change what is painted. Nodes are
/// kept in insertion order, which is also paint order.
#[derive(Debug, Default)]
pub struct Layer {
    nodes: Vec<(NodeId, Node)>,
    next_id: u64,
    draw_count: u64,
    dirty: bool,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node and return its handle.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        debug!(node = %id.0, kind = node.kind(), "attach node");
        self.nodes.push((id, node));
        self.dirty = true;
        id
    }

    /// Detach and return the node for `id`, if present.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let pos = self.nodes.iter().position(|(n, _)| *n == id)?;
        let (_, node) = self.nodes.remove(pos);
        debug!(node = %id.0, kind = node.kind(), "detach node");
        self.dirty = true;
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|(n, _)| *n == id).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|(n, _)| *n == id)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|(n, _)| *n == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in paint order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Redraw the layer: clears the dirty flag and bumps the draw counter.
    pub fn draw(&mut self) {
        self.draw_count += 1;
        self.dirty = false;
    }

    /// Number of explicit redraws since creation.
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// True when the layer has been mutated since the last [`Layer::draw`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
