//! Rendering surface — the environment the detector measures text in.
//!
//! The detector never owns a layout engine. It drives one through the
//! [`Surface`] trait: create an off-screen container, create and clone
//! text samples inside it, restyle them, query their rendered size, and
//! remove them again. A browser document, a headless layout tree, or a
//! scripted test double can all sit behind it.
//!
//! ```text
//! live root
//!   └── container   (absolute, off-screen, reference family, 40px)
//!         ├── probe "Lobster, serif"
//!         ├── probe "Inter, serif"
//!         └── ...
//! ```

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sample::OFFSCREEN_OFFSET;

// ── Dimensions ──────────────────────────────────────────────────────

/// Rendered size of a node, in the surface's logical units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

// ── Container style ─────────────────────────────────────────────────

/// Style of the off-screen container that hosts the sample and probes.
///
/// Children inherit `font_family` and `font_size` unless they override
/// them. Position does not affect metrics; it only keeps the nodes out of
/// the visible area.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerStyle {
    pub left: f32,
    pub top: f32,
    pub font_family: String,
    pub font_size: f32,
}

impl ContainerStyle {
    /// Off-screen container rendering `font_family` at `font_size`.
    pub fn offscreen(font_family: impl Into<String>, font_size: f32) -> Self {
        Self {
            left: OFFSCREEN_OFFSET,
            top: OFFSCREEN_OFFSET,
            font_family: font_family.into(),
            font_size,
        }
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// Faults raised by the environment itself.
///
/// These are precondition failures (missing node, broken layout backend),
/// not detection outcomes. The detector logs them and folds them into its
/// normal failure result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Layout backend error: {0}")]
    Backend(String),
    #[error("Surface is unavailable")]
    Unavailable,
}

// ── Surface trait ───────────────────────────────────────────────────

/// A live rendering environment capable of hosting measurable text nodes.
///
/// Every sample created through [`Surface::create_sample`] or
/// [`Surface::clone_node`] must be laid out as an absolutely positioned,
/// non-wrapping text run, so its width is the full single-line advance.
pub trait Surface {
    /// Handle to a node in the environment.
    type Node: Clone + Debug + PartialEq;

    /// Create a container attached to the live root.
    fn create_container(&mut self, style: &ContainerStyle) -> Result<Self::Node, SurfaceError>;

    /// Create a text sample as the last child of `parent`.
    fn create_sample(&mut self, parent: &Self::Node, text: &str)
        -> Result<Self::Node, SurfaceError>;

    /// Deep-clone `node` (text and style) and attach the copy to `parent`.
    fn clone_node(&mut self, node: &Self::Node, parent: &Self::Node)
        -> Result<Self::Node, SurfaceError>;

    /// Override the font stack of `node`.
    fn set_font_family(&mut self, node: &Self::Node, stack: &str) -> Result<(), SurfaceError>;

    /// Rendered size of `node` under the current font state.
    fn measure(&mut self, node: &Self::Node) -> Result<Dimensions, SurfaceError>;

    /// Remove `node` and its whole subtree from the environment.
    fn remove(&mut self, node: &Self::Node) -> Result<(), SurfaceError>;
}

/// Shared single-threaded handle: lets a run and the code that registers
/// fonts use the same environment between timer ticks.
impl<S: Surface> Surface for Rc<RefCell<S>> {
    type Node = S::Node;

    fn create_container(&mut self, style: &ContainerStyle) -> Result<Self::Node, SurfaceError> {
        self.borrow_mut().create_container(style)
    }

    fn create_sample(
        &mut self,
        parent: &Self::Node,
        text: &str,
    ) -> Result<Self::Node, SurfaceError> {
        self.borrow_mut().create_sample(parent, text)
    }

    fn clone_node(
        &mut self,
        node: &Self::Node,
        parent: &Self::Node,
    ) -> Result<Self::Node, SurfaceError> {
        self.borrow_mut().clone_node(node, parent)
    }

    fn set_font_family(&mut self, node: &Self::Node, stack: &str) -> Result<(), SurfaceError> {
        self.borrow_mut().set_font_family(node, stack)
    }

    fn measure(&mut self, node: &Self::Node) -> Result<Dimensions, SurfaceError> {
        self.borrow_mut().measure(node)
    }

    fn remove(&mut self, node: &Self::Node) -> Result<(), SurfaceError> {
        self.borrow_mut().remove(node)
    }
}

// ===================================================================
// Tests
// ===================================================================
