//! Probe set — one cloned sample per requested family occurrence.
//!
//! Probes are kept in request order. A probe stays *pending* while its
//! measurement matches the baseline; once it diverges its node is removed
//! from the surface and the probe is marked *settled*, but the entry (and
//! its family name) is kept for the final accounting.

use crate::baseline::ReferenceMetrics;
use crate::sample::SampleSpec;
use crate::settle::Settlement;
use crate::surface::{Surface, SurfaceError};

/// One candidate family under observation.
#[derive(Clone, Debug)]
pub struct Probe<N> {
    family: String,
    /// Live node while pending and attached; `None` once settled or released.
    node: Option<N>,
    settled: bool,
}

impl<N> Probe<N> {
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }
}

/// All probes of one run.
#[derive(Clone, Debug)]
pub struct ProbeSet<N> {
    probes: Vec<Probe<N>>,
}

impl<N: Clone> ProbeSet<N> {
    /// Unattached probes for `families`. Duplicates get their own entry.
    pub fn new<I, F>(families: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            probes: families
                .into_iter()
                .map(|family| Probe {
                    family: family.into(),
                    node: None,
                    settled: false,
                })
                .collect(),
        }
    }

    /// Clone `template` into `container` once per probe and apply the
    /// `"<family>, <reference>"` stack to each copy.
    ///
    /// Stops at the first fault; probes attached so far are left in the
    /// container and go away with it.
    pub fn attach<S>(
        &mut self,
        surface: &mut S,
        template: &N,
        container: &N,
        sample: &SampleSpec,
    ) -> Result<(), SurfaceError>
    where
        S: Surface<Node = N>,
    {
        for probe in &mut self.probes {
            let node = surface.clone_node(template, container)?;
            probe.node = Some(node.clone());
            surface.set_font_family(&node, &sample.stack_for(&probe.family))?;
        }
        Ok(())
    }

    /// Measure every pending, attached probe once and remove the ones
    /// whose dimensions diverged from `baseline`.
    ///
    /// Returns how many probes settled during this sweep.
    pub fn sweep<S, P>(
        &mut self,
        surface: &mut S,
        baseline: &ReferenceMetrics,
        settlement: &P,
    ) -> Result<usize, SurfaceError>
    where
        S: Surface<Node = N>,
        P: Settlement + ?Sized,
    {
        let mut newly_settled = 0;
        for probe in self.probes.iter_mut().filter(|p| !p.settled) {
            let Some(node) = probe.node.clone() else {
                continue;
            };
            let measured = surface.measure(&node)?;
            log::trace!(
                "Probe '{}' measured {:.1}x{:.1}",
                probe.family,
                measured.width,
                measured.height
            );
            if settlement.is_settled(measured, baseline) {
                surface.remove(&node)?;
                probe.node = None;
                probe.settled = true;
                newly_settled += 1;
                log::debug!("Font family '{}' settled", probe.family);
            }
        }
        Ok(newly_settled)
    }

    /// Forget every node handle. Called after the container (and with it
    /// every still-attached probe) has been removed from the surface.
    pub fn release(&mut self) {
        for probe in &mut self.probes {
            probe.node = None;
        }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.probes.iter().filter(|p| !p.settled).count()
    }

    /// Number of probes currently attached to the surface.
    pub fn attached_count(&self) -> usize {
        self.probes.iter().filter(|p| p.node.is_some()).count()
    }

    /// Families that have not settled, in request order.
    pub fn pending_families(&self) -> Vec<String> {
        self.probes
            .iter()
            .filter(|p| !p.settled)
            .map(|p| p.family.clone())
            .collect()
    }

    /// Families that settled, in request order.
    pub fn settled_families(&self) -> Vec<String> {
        self.probes
            .iter()
            .filter(|p| p.settled)
            .map(|p| p.family.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe<N>> {
        self.probes.iter()
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settle::DimensionsDiffer;
    use crate::surface::{ContainerStyle, Dimensions};
    use std::collections::HashMap;

    /// Flat surface: node ids are indices, width is looked up by stack.
    #[derive(Default)]
    struct TableSurface {
        next: u32,
        stacks: HashMap<u32, String>,
        live: Vec<u32>,
        widths: HashMap<String, f32>,
    }

    impl Surface for TableSurface {
        type Node = u32;

        fn create_container(&mut self, _: &ContainerStyle) -> Result<u32, SurfaceError> {
            self.next += 1;
            self.live.push(self.next);
            Ok(self.next)
        }

        fn create_sample(&mut self, _: &u32, _: &str) -> Result<u32, SurfaceError> {
            self.next += 1;
            self.live.push(self.next);
            Ok(self.next)
        }

        fn clone_node(&mut self, _: &u32, _: &u32) -> Result<u32, SurfaceError> {
            self.next += 1;
            self.live.push(self.next);
            Ok(self.next)
        }

        fn set_font_family(&mut self, node: &u32, stack: &str) -> Result<(), SurfaceError> {
            self.stacks.insert(*node, stack.to_string());
            Ok(())
        }

        fn measure(&mut self, node: &u32) -> Result<Dimensions, SurfaceError> {
            let stack = self.stacks.get(node).cloned().unwrap_or_default();
            let width = self.widths.get(&stack).copied().unwrap_or(100.0);
            Ok(Dimensions::new(width, 46.0))
        }

        fn remove(&mut self, node: &u32) -> Result<(), SurfaceError> {
            self.live.retain(|n| n != node);
            Ok(())
        }
    }

    const BASE: ReferenceMetrics = ReferenceMetrics {
        width: 100.0,
        height: 46.0,
    };

    fn attached(surface: &mut TableSurface, families: &[&str]) -> ProbeSet<u32> {
        let spec = SampleSpec::default();
        let container = surface
            .create_container(&ContainerStyle::offscreen("serif", 40.0))
            .unwrap();
        let template = surface.create_sample(&container, &spec.text).unwrap();
        let mut set = ProbeSet::new(families.iter().copied());
        set.attach(surface, &template, &container, &spec).unwrap();
        set
    }

    #[test]
    fn test_attach_applies_font_stack() {
        let mut surface = TableSurface::default();
        let set = attached(&mut surface, &["Lobster", "Inter"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.attached_count(), 2);

        let stacks: Vec<&String> = set
            .iter()
            .map(|p| &surface.stacks[p.node().unwrap()])
            .collect();
        assert_eq!(stacks, vec!["Lobster, serif", "Inter, serif"]);
    }

    #[test]
    fn test_sweep_removes_settled_nodes() {
        let mut surface = TableSurface::default();
        surface.widths.insert("Lobster, serif".into(), 140.0);
        let mut set = attached(&mut surface, &["Lobster", "Inter"]);
        let live_before = surface.live.len();

        let settled = set.sweep(&mut surface, &BASE, &DimensionsDiffer).unwrap();
        assert_eq!(settled, 1);
        assert_eq!(surface.live.len(), live_before - 1);
        assert_eq!(set.pending_families(), vec!["Inter"]);
        assert_eq!(set.settled_families(), vec!["Lobster"]);

        // A settled probe is not measured again.
        let settled = set.sweep(&mut surface, &BASE, &DimensionsDiffer).unwrap();
        assert_eq!(settled, 0);
    }

    #[test]
    fn test_duplicates_tracked_independently() {
        let mut surface = TableSurface::default();
        let mut set = attached(&mut surface, &["Lobster", "Lobster"]);
        assert_eq!(set.pending_count(), 2);

        // Settle only the first occurrence by changing its stack directly.
        let first = *set.iter().next().unwrap().node().unwrap();
        surface.stacks.insert(first, "loaded".into());
        surface.widths.insert("loaded".into(), 90.0);

        set.sweep(&mut surface, &BASE, &DimensionsDiffer).unwrap();
        assert_eq!(set.settled_families(), vec!["Lobster"]);
        assert_eq!(set.pending_families(), vec!["Lobster"]);
    }

    #[test]
    fn test_release_forgets_nodes_keeps_names() {
        let mut surface = TableSurface::default();
        let mut set = attached(&mut surface, &["A", "B", "C"]);
        set.release();
        assert_eq!(set.attached_count(), 0);
        assert_eq!(set.pending_families(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_unattached_probes_are_skipped() {
        let mut surface = TableSurface::default();
        let mut set: ProbeSet<u32> = ProbeSet::new(["A"]);
        let settled = set.sweep(&mut surface, &BASE, &DimensionsDiffer).unwrap();
        assert_eq!(settled, 0);
        assert_eq!(set.pending_count(), 1);
    }
}
