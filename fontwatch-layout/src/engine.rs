use rustc_hash::FxHashMap;
use taffy::prelude::*;
use taffy::{TaffyError, TaffyTree};
use thiserror::Error;
use uuid::Uuid;

use fontwatch_core::{ContainerStyle, Dimensions, Surface, SurfaceError};

use crate::measure::TextMeasure;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Taffy error: {0}")]
    Taffy(#[from] TaffyError),
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),
}

impl From<LayoutError> for SurfaceError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::NodeNotFound(id) => SurfaceError::NodeNotFound(id.to_string()),
            LayoutError::Taffy(e) => SurfaceError::Backend(e.to_string()),
        }
    }
}

/// Headless surface configuration.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Size of the live root ("viewport").
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Inherited by nodes that set no family of their own.
    pub default_font_family: String,
    pub default_font_size: f32,
    /// Snap layout results to whole pixels, like element offset sizes.
    pub round_to_pixels: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 800.0,
            default_font_family: "serif".to_string(),
            default_font_size: 16.0,
            round_to_pixels: true,
        }
    }
}

/// Per-node text and font state, stored as the Taffy node context.
#[derive(Clone, Debug, Default)]
struct NodeData {
    text: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    /// Inherited values, refreshed before every layout pass.
    computed_family: String,
    computed_size: f32,
}

/// Layout-tree stand-in for a live document, backed by Taffy.
///
/// Nodes are addressed by `Uuid`. Text leaves are laid out as absolutely
/// positioned, non-wrapping runs measured through `M`. Layout is only
/// recomputed when the tree changed or the measurer reports a new font
/// generation.
pub struct HeadlessSurface<M> {
    taffy: TaffyTree<NodeData>,
    root: NodeId,

    /// Bidirectional mapping between surface ids and Taffy nodes
    id_to_node: FxHashMap<Uuid, NodeId>,
    node_to_id: FxHashMap<NodeId, Uuid>,

    measurer: M,
    config: SurfaceConfig,

    dirty: bool,
    measured_generation: u64,
}

impl<M: TextMeasure> HeadlessSurface<M> {
    pub fn new(measurer: M, config: SurfaceConfig) -> Result<Self, LayoutError> {
        let mut taffy = TaffyTree::new();
        if config.round_to_pixels {
            taffy.enable_rounding();
        } else {
            taffy.disable_rounding();
        }
        let root = taffy.new_leaf(Style {
            size: Size {
                width: Dimension::length(config.viewport_width),
                height: Dimension::length(config.viewport_height),
            },
            ..Style::default()
        })?;
        let measured_generation = measurer.generation();

        Ok(Self {
            taffy,
            root,
            id_to_node: FxHashMap::default(),
            node_to_id: FxHashMap::default(),
            measurer,
            config,
            dirty: true,
            measured_generation,
        })
    }

    /// Surface with [`SurfaceConfig::default`].
    pub fn with_measurer(measurer: M) -> Result<Self, LayoutError> {
        Self::new(measurer, SurfaceConfig::default())
    }

    // ---------------------------------------------------------------
    // Style helpers
    // ---------------------------------------------------------------

    fn absolute_style(left: f32, top: f32) -> Style {
        Style {
            position: Position::Absolute,
            inset: taffy::Rect {
                left: LengthPercentageAuto::length(left),
                top: LengthPercentageAuto::length(top),
                right: LengthPercentageAuto::auto(),
                bottom: LengthPercentageAuto::auto(),
            },
            ..Style::default()
        }
    }

    fn text_style() -> Style {
        Style {
            position: Position::Absolute,
            ..Style::default()
        }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    fn node(&self, id: Uuid) -> Result<NodeId, LayoutError> {
        self.id_to_node
            .get(&id)
            .copied()
            .ok_or(LayoutError::NodeNotFound(id))
    }

    fn track(&mut self, node: NodeId) -> Uuid {
        let id = Uuid::new_v4();
        self.id_to_node.insert(id, node);
        self.node_to_id.insert(node, id);
        self.dirty = true;
        id
    }

    /// Add an absolutely positioned container under the root.
    pub fn add_container(&mut self, style: &ContainerStyle) -> Result<Uuid, LayoutError> {
        let node = self.taffy.new_leaf_with_context(
            Self::absolute_style(style.left, style.top),
            NodeData {
                font_family: Some(style.font_family.clone()),
                font_size: Some(style.font_size),
                ..NodeData::default()
            },
        )?;
        self.taffy.add_child(self.root, node)?;
        Ok(self.track(node))
    }

    /// Add a text leaf as the last child of `parent`.
    pub fn add_text(&mut self, parent: Uuid, text: &str) -> Result<Uuid, LayoutError> {
        let parent_node = self.node(parent)?;
        let node = self.taffy.new_leaf_with_context(
            Self::text_style(),
            NodeData {
                text: Some(text.to_string()),
                ..NodeData::default()
            },
        )?;
        self.taffy.add_child(parent_node, node)?;
        Ok(self.track(node))
    }

    /// Deep-copy `id` (style, text, font overrides) under `parent`.
    pub fn deep_clone(&mut self, id: Uuid, parent: Uuid) -> Result<Uuid, LayoutError> {
        let source = self.node(id)?;
        let parent_node = self.node(parent)?;
        let (copy, copy_id) = self.clone_subtree(source)?;
        self.taffy.add_child(parent_node, copy)?;
        Ok(copy_id)
    }

    fn clone_subtree(&mut self, source: NodeId) -> Result<(NodeId, Uuid), LayoutError> {
        let style = self.taffy.style(source)?.clone();
        let data = self.taffy.get_node_context(source).cloned().unwrap_or_default();
        let copy = self.taffy.new_leaf_with_context(style, data)?;
        let copy_id = self.track(copy);
        for child in self.taffy.children(source)? {
            let (child_copy, _) = self.clone_subtree(child)?;
            self.taffy.add_child(copy, child_copy)?;
        }
        Ok((copy, copy_id))
    }

    /// Override the font stack of a node.
    pub fn set_family(&mut self, id: Uuid, stack: &str) -> Result<(), LayoutError> {
        let node = self.node(id)?;
        if let Some(data) = self.taffy.get_node_context_mut(node) {
            data.font_family = Some(stack.to_string());
        }
        self.taffy.mark_dirty(node)?;
        self.dirty = true;
        Ok(())
    }

    /// Remove a node and everything below it.
    pub fn remove_subtree(&mut self, id: Uuid) -> Result<(), LayoutError> {
        let top = self.node(id)?;
        let mut nodes = vec![top];
        let mut i = 0;
        while i < nodes.len() {
            nodes.extend(self.taffy.children(nodes[i])?);
            i += 1;
        }
        // Leaves first, so no removal ever orphans a still-tracked child.
        for node in nodes.into_iter().rev() {
            self.taffy.remove(node)?;
            if let Some(id) = self.node_to_id.remove(&node) {
                self.id_to_node.remove(&id);
            }
        }
        self.dirty = true;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Layout computation
    // ---------------------------------------------------------------

    /// Recompute layout if the tree or the available fonts changed.
    pub fn compute_layout(&mut self) -> Result<(), LayoutError> {
        let generation = self.measurer.generation();
        if generation != self.measured_generation {
            log::debug!(
                "HeadlessSurface: font generation {} -> {generation}, relayout",
                self.measured_generation
            );
            for node in self.id_to_node.values() {
                self.taffy.mark_dirty(*node)?;
            }
            self.measured_generation = generation;
            self.dirty = true;
        }
        if !self.dirty {
            return Ok(());
        }

        let family = self.config.default_font_family.clone();
        let size = self.config.default_font_size;
        self.cascade(self.root, &family, size)?;

        let available = Size {
            width: AvailableSpace::Definite(self.config.viewport_width),
            height: AvailableSpace::Definite(self.config.viewport_height),
        };
        let Self {
            taffy,
            measurer,
            root,
            ..
        } = self;
        taffy.compute_layout_with_measure(
            *root,
            available,
            |known, _available, _node, context, _style| {
                let Some(data) = context else {
                    return Size::ZERO;
                };
                let Some(text) = data.text.as_deref() else {
                    return Size::ZERO;
                };
                let measured = measurer.measure_text(text, &data.computed_family, data.computed_size);
                Size {
                    width: known.width.unwrap_or(measured.width),
                    height: known.height.unwrap_or(measured.height),
                }
            },
        )?;

        self.dirty = false;
        Ok(())
    }

    /// Resolve inherited font family and size top-down.
    fn cascade(&mut self, node: NodeId, family: &str, size: f32) -> Result<(), LayoutError> {
        let (family, size) = match self.taffy.get_node_context_mut(node) {
            Some(data) => {
                data.computed_family = data.font_family.clone().unwrap_or_else(|| family.to_string());
                data.computed_size = data.font_size.unwrap_or(size);
                (data.computed_family.clone(), data.computed_size)
            }
            None => (family.to_string(), size),
        };
        for child in self.taffy.children(node)? {
            self.cascade(child, &family, size)?;
        }
        Ok(())
    }

    /// Rendered size of a node, recomputing layout first if needed.
    pub fn dimensions(&mut self, id: Uuid) -> Result<Dimensions, LayoutError> {
        let node = self.node(id)?;
        self.compute_layout()?;
        let layout = self.taffy.layout(node)?;
        Ok(Dimensions::new(layout.size.width, layout.size.height))
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Number of nodes created through this surface that still exist.
    pub fn node_count(&self) -> usize {
        self.id_to_node.len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.id_to_node.contains_key(&id)
    }

    /// Direct children of a node, in order.
    pub fn children(&self, id: Uuid) -> Result<Vec<Uuid>, LayoutError> {
        let node = self.node(id)?;
        Ok(self
            .taffy
            .children(node)?
            .into_iter()
            .filter_map(|child| self.node_to_id.get(&child).copied())
            .collect())
    }

    /// Font stack set directly on a node, if any.
    pub fn font_family(&self, id: Uuid) -> Result<Option<String>, LayoutError> {
        let node = self.node(id)?;
        Ok(self
            .taffy
            .get_node_context(node)
            .and_then(|data| data.font_family.clone()))
    }

    /// Text content of a node, if it is a text leaf.
    pub fn text(&self, id: Uuid) -> Result<Option<String>, LayoutError> {
        let node = self.node(id)?;
        Ok(self
            .taffy
            .get_node_context(node)
            .and_then(|data| data.text.clone()))
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Mutable access to the measurer, e.g. to register fonts.
    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }
}

impl<M: TextMeasure> Surface for HeadlessSurface<M> {
    type Node = Uuid;

    fn create_container(&mut self, style: &ContainerStyle) -> Result<Uuid, SurfaceError> {
        Ok(self.add_container(style)?)
    }

    fn create_sample(&mut self, parent: &Uuid, text: &str) -> Result<Uuid, SurfaceError> {
        Ok(self.add_text(*parent, text)?)
    }

    fn clone_node(&mut self, node: &Uuid, parent: &Uuid) -> Result<Uuid, SurfaceError> {
        Ok(self.deep_clone(*node, *parent)?)
    }

    fn set_font_family(&mut self, node: &Uuid, stack: &str) -> Result<(), SurfaceError> {
        Ok(self.set_family(*node, stack)?)
    }

    fn measure(&mut self, node: &Uuid) -> Result<Dimensions, SurfaceError> {
        Ok(self.dimensions(*node)?)
    }

    fn remove(&mut self, node: &Uuid) -> Result<(), SurfaceError> {
        Ok(self.remove_subtree(*node)?)
    }
}

// ===================================================================
// Tests
// ===================================================================
