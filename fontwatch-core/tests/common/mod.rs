//! Scripted surface for driving runs under tokio's paused clock.

use std::collections::HashMap;

use fontwatch_core::{ContainerStyle, Dimensions, Surface, SurfaceError};
use tokio::time::Instant;

pub const BASE_WIDTH: f32 = 800.0;
pub const BASE_HEIGHT: f32 = 46.0;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<u64>,
    stack: Option<String>,
}

/// Each family becomes metric-distinct at a scheduled instant; families
/// without a schedule never do.
#[derive(Debug, Default)]
pub struct ScheduledSurface {
    next: u64,
    nodes: HashMap<u64, Node>,
    load_at: HashMap<String, Instant>,
    /// Measurements of nodes without a font override (baselines).
    pub baseline_measurements: usize,
    pub containers_created: usize,
}

impl ScheduledSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// `family` renders distinctly from `at` onward.
    pub fn load_at(&mut self, family: &str, at: Instant) {
        self.load_at.insert(family.to_string(), at);
    }

    /// Nodes currently present in the environment.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn insert(&mut self, parent: Option<u64>, stack: Option<String>) -> u64 {
        self.next += 1;
        self.nodes.insert(self.next, Node { parent, stack });
        self.next
    }

    fn descendants(&self, root: u64) -> Vec<u64> {
        let mut out = vec![root];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            out.extend(
                self.nodes
                    .iter()
                    .filter(|(_, n)| n.parent == Some(current))
                    .map(|(id, _)| *id),
            );
            i += 1;
        }
        out
    }
}

impl Surface for ScheduledSurface {
    type Node = u64;

    fn create_container(&mut self, _style: &ContainerStyle) -> Result<u64, SurfaceError> {
        self.containers_created += 1;
        Ok(self.insert(None, None))
    }

    fn create_sample(&mut self, parent: &u64, _text: &str) -> Result<u64, SurfaceError> {
        Ok(self.insert(Some(*parent), None))
    }

    fn clone_node(&mut self, node: &u64, parent: &u64) -> Result<u64, SurfaceError> {
        let stack = self
            .nodes
            .get(node)
            .ok_or_else(|| SurfaceError::NodeNotFound(node.to_string()))?
            .stack
            .clone();
        Ok(self.insert(Some(*parent), stack))
    }

    fn set_font_family(&mut self, node: &u64, stack: &str) -> Result<(), SurfaceError> {
        let entry = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| SurfaceError::NodeNotFound(node.to_string()))?;
        entry.stack = Some(stack.to_string());
        Ok(())
    }

    fn measure(&mut self, node: &u64) -> Result<Dimensions, SurfaceError> {
        let stack = self
            .nodes
            .get(node)
            .ok_or_else(|| SurfaceError::NodeNotFound(node.to_string()))?
            .stack
            .clone();
        let Some(stack) = stack else {
            self.baseline_measurements += 1;
            return Ok(Dimensions::new(BASE_WIDTH, BASE_HEIGHT));
        };
        let family = stack.split(',').next().unwrap_or_default().trim();
        let active = self
            .load_at
            .get(family)
            .is_some_and(|at| Instant::now() >= *at);
        let width = if active { BASE_WIDTH - 120.0 } else { BASE_WIDTH };
        Ok(Dimensions::new(width, BASE_HEIGHT))
    }

    fn remove(&mut self, node: &u64) -> Result<(), SurfaceError> {
        if !self.nodes.contains_key(node) {
            return Err(SurfaceError::NodeNotFound(node.to_string()));
        }
        for id in self.descendants(*node) {
            self.nodes.remove(&id);
        }
        Ok(())
    }
}
