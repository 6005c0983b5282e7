//! Headless doubles for driving a feed without a terminal.
//!
//! [`LayoutTree`] is a synthetic positioned tree, [`FakeViewport`] exposes
//! it through the [`Viewport`] trait with settable scroll and window size,
//! and [`RecordingLoadMore`] records every page request. Combined with
//! [`ManualClock`](crate::debounce::ManualClock) this makes the whole
//! observe → evaluate → load cycle deterministic in a plain `#[test]`.
//!
//! # Example
//!
//! ```
//! use feedkit_core::testing::{FakeViewport, RecordingLoadMore};
//! use feedkit_core::LoadMore;
//!
//! let vp = FakeViewport::with_list("posts_list", 0.0, 500.0, 800.0, 600.0);
//! assert_eq!(vp.inner_height, 600.0);
//!
//! let recorder: RecordingLoadMore<String> = RecordingLoadMore::new();
//! recorder.load_more(&"alice/x".to_string());
//! assert_eq!(recorder.calls(), vec!["alice/x".to_string()]);
//! ```

use crate::layout::LayoutNode;
use crate::monitor::Viewport;
use crate::pagination::LoadMore;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Index of a node within a [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    offset_top: f64,
    height: f64,
    parent: Option<NodeId>,
}

/// What an id unknown to the tree reads as.
const DETACHED: NodeData = NodeData {
    offset_top: 0.0,
    height: 0.0,
    parent: None,
};

/// An arena of positioned nodes.
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    nodes: Vec<NodeData>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no offset parent.
    pub fn add_root(&mut self, offset_top: f64, height: f64) -> NodeId {
        self.push(offset_top, height, None)
    }

    /// Add a node positioned relative to `parent`.
    pub fn add_child(&mut self, parent: NodeId, offset_top: f64, height: f64) -> NodeId {
        self.push(offset_top, height, Some(parent))
    }

    /// Re-point a node's offset parent. Allows building cycles on purpose.
    ///
    /// Unknown ids are ignored.
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.parent = parent;
        }
    }

    /// Unknown ids are ignored.
    pub fn set_height(&mut self, node: NodeId, height: f64) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.height = height;
        }
    }

    /// Borrow a node for layout queries. An id from another tree reads as a
    /// detached node of zero size.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    fn push(&mut self, offset_top: f64, height: f64, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(NodeData {
            offset_top,
            height,
            parent,
        });
        NodeId(self.nodes.len() - 1)
    }
}

/// A node of a [`LayoutTree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a LayoutTree,
    id: NodeId,
}

impl NodeRef<'_> {
    fn data(&self) -> &NodeData {
        self.tree.nodes.get(self.id.0).unwrap_or(&DETACHED)
    }
}

impl LayoutNode for NodeRef<'_> {
    fn offset_top(&self) -> f64 {
        self.data().offset_top
    }

    fn offset_height(&self) -> f64 {
        self.data().height
    }

    fn offset_parent(&self) -> Option<Self> {
        self.data().parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }
}

/// A viewport over a [`LayoutTree`] with directly settable geometry.
#[derive(Debug, Clone, Default)]
pub struct FakeViewport {
    pub tree: LayoutTree,
    pub ids: HashMap<String, NodeId>,
    pub scroll_top: f64,
    pub inner_width: f64,
    pub inner_height: f64,
}

impl FakeViewport {
    /// A window with nothing mounted in it.
    pub fn empty(inner_width: f64, inner_height: f64) -> Self {
        Self {
            inner_width,
            inner_height,
            ..Self::default()
        }
    }

    /// A window whose document holds one list element `id` at `offset_top`
    /// with the given height.
    pub fn with_list(
        id: &str,
        offset_top: f64,
        height: f64,
        inner_width: f64,
        inner_height: f64,
    ) -> Self {
        let mut vp = Self::empty(inner_width, inner_height);
        let body = vp.tree.add_root(0.0, offset_top + height);
        let list = vp.tree.add_child(body, offset_top, height);
        vp.ids.insert(id.to_string(), list);
        vp
    }

    /// Change the height of the element registered as `id`.
    pub fn set_element_height(&mut self, id: &str, height: f64) {
        if let Some(node) = self.ids.get(id) {
            self.tree.set_height(*node, height);
        }
    }

    /// Forget the element registered as `id`, as if it was unmounted.
    pub fn remove_element(&mut self, id: &str) {
        self.ids.remove(id);
    }
}

impl Viewport for FakeViewport {
    type Node<'a> = NodeRef<'a>;

    fn element_by_id(&self, id: &str) -> Option<NodeRef<'_>> {
        self.ids.get(id).map(|node| self.tree.node(*node))
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn inner_height(&self) -> f64 {
        self.inner_height
    }

    fn inner_width(&self) -> f64 {
        self.inner_width
    }
}

/// A [`LoadMore`] that records every anchor it is called with.
///
/// Clones share the same record, so keep one clone for assertions and hand
/// the other to the feed.
#[derive(Debug)]
pub struct RecordingLoadMore<R> {
    calls: Rc<RefCell<Vec<R>>>,
}

impl<R> RecordingLoadMore<R> {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl<R: Clone> RecordingLoadMore<R> {
    /// Every anchor received so far, oldest first.
    pub fn calls(&self) -> Vec<R> {
        self.calls.borrow().clone()
    }
}

impl<R> Clone for RecordingLoadMore<R> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
        }
    }
}

impl<R> Default for RecordingLoadMore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> LoadMore<R> for RecordingLoadMore<R> {
    fn load_more(&self, anchor: &R) {
        self.calls.borrow_mut().push(anchor.clone());
    }
}
