//! Walks the routing model into a [`GraphDescription`].
//!
//! Each track yields at most one node (memoized by id). Sends and the main
//! output become deduplicated edges. A stack of the tracks currently being
//! visited refuses any edge back onto that stack, so the result is acyclic
//! whatever the model contains. Gaps are logged, recorded as
//! [`BuildDiagnostic`]s, and skipped.

use super::description::{
    BuildDiagnostic, GraphConnectionDescription, GraphDescription, GraphNode, GraphNodeId,
    GraphNodeKind,
};
use crate::model::{Edit, Scene, TrackKind};
use ensemble_core::TrackId;
use std::collections::{HashMap, HashSet};

pub struct GraphBuilder<'a> {
    edit: &'a Edit,
    nodes: Vec<GraphNode>,
    by_track: HashMap<TrackId, GraphNodeId>,
    visiting: Vec<TrackId>,
    edges: HashSet<(GraphNodeId, GraphNodeId)>,
    connections: Vec<GraphConnectionDescription>,
    diagnostics: Vec<BuildDiagnostic>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(edit: &'a Edit) -> Self {
        Self {
            edit,
            nodes: Vec::new(),
            by_track: HashMap::new(),
            visiting: Vec::new(),
            edges: HashSet::new(),
            connections: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Build from every reachable track of the edit.
    pub fn build_all(self) -> GraphDescription {
        let tracks = self.edit.reachable_tracks();
        self.build(&tracks)
    }

    /// Build from a scene's tracks, or from all tracks if the scene lists none.
    pub fn build_scene(self, scene: &Scene) -> GraphDescription {
        if scene.tracks.is_empty() {
            self.build_all()
        } else {
            self.build(&scene.tracks)
        }
    }

    /// Build from `tracks`. Folders are expanded into their children.
    pub fn build(mut self, tracks: &[TrackId]) -> GraphDescription {
        for &id in tracks {
            self.root(id);
        }
        tracing::debug!(
            "Built graph description: {} node(s), {} connection(s), {} diagnostic(s)",
            self.nodes.len(),
            self.connections.len(),
            self.diagnostics.len()
        );
        GraphDescription {
            nodes: self.nodes,
            connections: self.connections,
            diagnostics: self.diagnostics,
        }
    }

    fn root(&mut self, id: TrackId) {
        let edit = self.edit;
        match edit.track(id) {
            None => {
                tracing::warn!("Track {id} requested for graph build does not exist");
                self.diagnostics.push(BuildDiagnostic::MissingTrack {
                    referenced_by: None,
                    missing: id,
                });
            }
            Some(track) if track.is_folder() => {
                for &child in track.children() {
                    self.root(child);
                }
            }
            Some(_) => {
                self.visit(id);
            }
        }
    }

    /// Get or create the node for a non-folder track that exists.
    fn visit(&mut self, id: TrackId) -> Option<GraphNodeId> {
        if let Some(&node) = self.by_track.get(&id) {
            return Some(node);
        }
        let edit = self.edit;
        let track = edit.track(id)?;

        let kind = match track.kind {
            TrackKind::Audio { .. } | TrackKind::Record { .. } => GraphNodeKind::AudioTrack,
            TrackKind::Aux => GraphNodeKind::AuxTrack,
            TrackKind::Folder { .. } => return None,
        };

        let node = GraphNodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            id: node,
            track: id,
            name: track.name.clone(),
            kind,
            format: track.format,
            output: None,
            sends: Vec::new(),
            plugins: track.plugins.clone(),
            clips: track.clips().to_vec(),
            is_graph_start: true,
        });
        self.by_track.insert(id, node);

        self.visiting.push(id);
        for send in &track.sends {
            if let Some(destination) = self.link(node, id, send.destination) {
                let sends = &mut self.nodes[node.0].sends;
                if !sends.contains(&destination) {
                    sends.push(destination);
                }
            }
        }
        if let Some(output) = track.output {
            if let Some(destination) = self.link(node, id, output) {
                self.nodes[node.0].output = Some(destination);
            }
        }
        self.visiting.pop();

        Some(node)
    }

    /// Resolve `to` and record the edge `source → to`.
    fn link(&mut self, source: GraphNodeId, from: TrackId, to: TrackId) -> Option<GraphNodeId> {
        if self.visiting.contains(&to) {
            tracing::warn!("Routing {from} -> {to} would create a cycle; edge dropped");
            self.diagnostics
                .push(BuildDiagnostic::CycleRejected { from, to });
            return None;
        }
        let edit = self.edit;
        match edit.track(to) {
            None => {
                tracing::warn!("Track {from} routes to missing track {to}; edge dropped");
                self.diagnostics.push(BuildDiagnostic::MissingTrack {
                    referenced_by: Some(from),
                    missing: to,
                });
                return None;
            }
            Some(track) if track.is_folder() => {
                tracing::warn!("Track {from} routes to folder {to}; edge dropped");
                self.diagnostics
                    .push(BuildDiagnostic::NotRoutable { from, to });
                return None;
            }
            Some(_) => {}
        }

        let destination = self.visit(to)?;
        self.nodes[destination.0].is_graph_start = false;
        if self.edges.insert((source, destination)) {
            self.connections.push(GraphConnectionDescription {
                source,
                destination,
            });
        }
        Some(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Track;
    use proptest::prelude::*;

    fn id(n: u64) -> TrackId {
        TrackId::new(n)
    }

    /// Two tracks send to one aux; a third is isolated.
    #[test]
    fn test_two_senders_one_aux_one_isolated() {
        let mut edit = Edit::new();
        edit.add_track(Track::audio(id(1), "a")).unwrap();
        edit.add_track(Track::audio(id(2), "b")).unwrap();
        edit.add_track(Track::audio(id(3), "c")).unwrap();
        edit.add_track(Track::aux(id(10), "verb")).unwrap();
        edit.add_send(id(1), id(10)).unwrap();
        edit.add_send(id(2), id(10)).unwrap();

        let description = GraphBuilder::new(&edit).build(&[id(1), id(2), id(3)]);

        assert_eq!(description.connections().len(), 2);
        // Two senders and the aux are routed; the isolated track still gets its own node.
        assert_eq!(description.nodes().len(), 4);
        assert_eq!(description.graph_starts().count(), 3);
        let aux = description.node_for_track(id(10)).unwrap();
        assert!(!aux.is_graph_start);
        assert_eq!(aux.kind, GraphNodeKind::AuxTrack);
        assert!(description.node_for_track(id(3)).unwrap().is_graph_start);
        assert!(description.diagnostics().is_empty());
    }

    #[test]
    fn test_one_node_per_track_with_shared_destination() {
        let mut edit = Edit::new();
        edit.add_track(Track::aux(id(100), "master")).unwrap();
        for n in 1..=4 {
            edit.add_track(Track::audio(id(n), "t").with_output(id(100)))
                .unwrap();
        }
        let description = GraphBuilder::new(&edit).build_all();
        assert_eq!(description.nodes().len(), 5);
        assert_eq!(description.connections().len(), 4);
        assert_eq!(description.graph_starts().count(), 4);
    }

    #[test]
    fn test_send_and_output_to_same_track_dedup() {
        let mut edit = Edit::new();
        edit.add_track(Track::aux(id(2), "bus")).unwrap();
        edit.add_track(Track::audio(id(1), "a").with_output(id(2)))
            .unwrap();
        edit.add_send(id(1), id(2)).unwrap();
        edit.add_send(id(1), id(2)).unwrap();

        let description = GraphBuilder::new(&edit).build_all();
        assert_eq!(description.connections().len(), 1);
        let a = description.node_for_track(id(1)).unwrap();
        assert_eq!(a.sends.len(), 1);
        assert_eq!(a.output, a.sends.first().copied());
    }

    #[test]
    fn test_cycle_is_refused() {
        let mut edit = Edit::new();
        edit.add_track(Track::aux(id(1), "a").with_output(id(2)))
            .unwrap();
        edit.add_track(Track::aux(id(2), "b").with_output(id(1)))
            .unwrap();

        let description = GraphBuilder::new(&edit).build_all();
        assert_eq!(description.nodes().len(), 2);
        assert_eq!(description.connections().len(), 1);
        assert_eq!(
            description.diagnostics(),
            &[BuildDiagnostic::CycleRejected {
                from: id(2),
                to: id(1)
            }]
        );
    }

    #[test]
    fn test_self_send_is_refused() {
        let mut edit = Edit::new();
        edit.add_track(Track::aux(id(1), "a")).unwrap();
        edit.add_send(id(1), id(1)).unwrap();

        let description = GraphBuilder::new(&edit).build_all();
        assert!(description.connections().is_empty());
        assert_eq!(description.diagnostics().len(), 1);
    }

    #[test]
    fn test_missing_tracks_are_skipped() {
        let mut edit = Edit::new();
        edit.add_track(Track::audio(id(1), "a").with_output(id(42)))
            .unwrap();

        let description = GraphBuilder::new(&edit).build(&[id(1), id(7)]);
        assert_eq!(description.nodes().len(), 1);
        assert!(description.node_for_track(id(42)).is_none());
        assert_eq!(
            description.diagnostics(),
            &[
                BuildDiagnostic::MissingTrack {
                    referenced_by: Some(id(1)),
                    missing: id(42)
                },
                BuildDiagnostic::MissingTrack {
                    referenced_by: None,
                    missing: id(7)
                },
            ]
        );
    }

    #[test]
    fn test_folders_are_flattened() {
        let mut edit = Edit::new();
        edit.add_track(Track::folder(id(1), "drums")).unwrap();
        edit.add_child(id(1), Track::audio(id(2), "kick")).unwrap();
        edit.add_child(id(1), Track::record(id(3), "snare", 0))
            .unwrap();
        edit.add_track(Track::audio(id(4), "bass").with_output(id(1)))
            .unwrap();

        let description = GraphBuilder::new(&edit).build_all();
        assert_eq!(description.nodes().len(), 3);
        assert!(description.node_for_track(id(1)).is_none());
        assert_eq!(
            description.node_for_track(id(3)).unwrap().kind,
            GraphNodeKind::AudioTrack
        );
        assert_eq!(
            description.diagnostics(),
            &[BuildDiagnostic::NotRoutable {
                from: id(4),
                to: id(1)
            }]
        );
    }

    #[test]
    fn test_scene_without_tracks_builds_everything() {
        let mut edit = Edit::new();
        edit.add_track(Track::audio(id(1), "a")).unwrap();
        edit.add_track(Track::audio(id(2), "b")).unwrap();
        let all = edit.add_scene("all", Vec::new(), None);
        let one = edit.add_scene("one", vec![id(2)], None);

        let scene = edit.scene(all).unwrap();
        assert_eq!(GraphBuilder::new(&edit).build_scene(scene).nodes().len(), 2);
        let scene = edit.scene(one).unwrap();
        assert_eq!(GraphBuilder::new(&edit).build_scene(scene).nodes().len(), 1);
    }

    fn topology() -> impl Strategy<Value = Vec<(bool, Option<u64>, Vec<u64>)>> {
        // Targets range past the track count so some references dangle.
        (2usize..12).prop_flat_map(|n| {
            let max = n as u64 + 3;
            prop::collection::vec(
                (
                    any::<bool>(),
                    prop::option::of(0..max),
                    prop::collection::vec(0..max, 0..4),
                ),
                n,
            )
        })
    }

    proptest! {
        #[test]
        fn test_built_descriptions_are_deduplicated_and_acyclic(spec in topology()) {
            let mut edit = Edit::new();
            for (n, (aux, output, _)) in spec.iter().enumerate() {
                let track = if *aux {
                    Track::aux(id(n as u64), "t")
                } else {
                    Track::audio(id(n as u64), "t")
                };
                edit.add_track(track).unwrap();
                edit.set_output(id(n as u64), output.map(id)).unwrap();
            }
            for (n, (_, _, sends)) in spec.iter().enumerate() {
                for &to in sends {
                    edit.add_send(id(n as u64), id(to)).unwrap();
                }
            }

            let description = GraphBuilder::new(&edit).build_all();

            let mut pairs = HashSet::new();
            for c in description.connections() {
                prop_assert!(pairs.insert((c.source, c.destination)));
                prop_assert!(c.source != c.destination);
                prop_assert!(c.source.0 < description.nodes().len());
                prop_assert!(c.destination.0 < description.nodes().len());
            }

            let mut tracks = HashSet::new();
            for node in description.nodes() {
                prop_assert!(tracks.insert(node.track));
                prop_assert!(edit.track(node.track).is_some());
            }

            // Kahn's algorithm consumes every node only if there is no cycle.
            let count = description.nodes().len();
            let mut in_degree = vec![0usize; count];
            for c in description.connections() {
                in_degree[c.destination.0] += 1;
            }
            let mut ready: Vec<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
            let mut seen = 0;
            while let Some(i) = ready.pop() {
                seen += 1;
                for c in description.connections().iter().filter(|c| c.source.0 == i) {
                    in_degree[c.destination.0] -= 1;
                    if in_degree[c.destination.0] == 0 {
                        ready.push(c.destination.0);
                    }
                }
            }
            prop_assert_eq!(seen, count);
        }
    }
}
