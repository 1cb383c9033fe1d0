//! Concrete processing graph: boxed processors joined by per-channel connections.
//!
//! Structural edits (`add`, `connect`, `remove`, ...) happen on the control
//! thread and mark the graph dirty. [`ProcessingGraph::prepare`] or
//! [`ProcessingGraph::commit`] recomputes the processing order; until then
//! [`ProcessingGraph::process_block`] renders silence rather than walking a
//! stale order.

use crate::buffer::AudioBuffer;
use crate::processor::{AudioProcessor, Passthrough, ProcessContext};
use crate::{Error, Result};
use std::collections::{HashSet, VecDeque};

/// Handle to a node in a [`ProcessingGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// One channel of one node feeding one channel of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: NodeId,
    pub source_channel: usize,
    pub destination: NodeId,
    pub destination_channel: usize,
}

#[derive(Debug, Clone, Copy)]
struct Input {
    source: usize,
    source_channel: usize,
    channel: usize,
}

struct Slot {
    processor: Box<dyn AudioProcessor>,
    buffer: AudioBuffer,
    inputs: Vec<Input>,
}

pub struct ProcessingGraph {
    slots: Vec<Option<Slot>>,
    connections: Vec<Connection>,
    connection_set: HashSet<Connection>,
    order: Vec<usize>,
    sink: NodeId,
    sample_rate: f64,
    block_size: usize,
    prepared: bool,
    dirty: bool,
}

impl ProcessingGraph {
    pub const DEFAULT_BLOCK_SIZE: usize = 512;

    /// Create a graph whose hardware sink has `output_channels` channels.
    pub fn new(output_channels: usize) -> Self {
        let block_size = Self::DEFAULT_BLOCK_SIZE;
        let sink = Slot {
            processor: Box::new(Passthrough::new("hardware-out", output_channels)),
            buffer: AudioBuffer::new(output_channels, block_size),
            inputs: Vec::new(),
        };
        Self {
            slots: vec![Some(sink)],
            connections: Vec::new(),
            connection_set: HashSet::new(),
            order: Vec::new(),
            sink: NodeId(0),
            sample_rate: 44100.0,
            block_size,
            prepared: false,
            dirty: true,
        }
    }

    /// The hardware-output sink node.
    pub fn output_node(&self) -> NodeId {
        self.sink
    }

    pub fn output_channels(&self) -> usize {
        self.channels(self.sink).unwrap_or(0)
    }

    pub fn add(&mut self, mut processor: Box<dyn AudioProcessor>) -> NodeId {
        let channels = processor.channels();
        if self.prepared {
            processor.prepare(self.sample_rate, self.block_size);
        }
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Slot {
            processor,
            buffer: AudioBuffer::new(channels, self.block_size),
            inputs: Vec::new(),
        }));
        self.dirty = true;
        id
    }

    /// Remove a node and every connection touching it. The sink cannot be removed.
    pub fn remove(&mut self, node: NodeId) -> Option<Box<dyn AudioProcessor>> {
        if node == self.sink {
            return None;
        }
        let slot = self.slots.get_mut(node.index())?.take()?;
        self.connections
            .retain(|c| c.source != node && c.destination != node);
        self.connection_set
            .retain(|c| c.source != node && c.destination != node);
        self.dirty = true;
        Some(slot.processor)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.slot(node).is_some()
    }

    pub fn channels(&self, node: NodeId) -> Option<usize> {
        self.slot(node).map(|s| s.processor.channels())
    }

    pub fn processor_name(&self, node: NodeId) -> Option<&str> {
        self.slot(node).map(|s| s.processor.name())
    }

    /// Live nodes, including the sink.
    pub fn node_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Connect one channel of `source` to one channel of `destination`.
    ///
    /// Returns `Ok(false)` when the exact connection already exists.
    pub fn connect(
        &mut self,
        source: NodeId,
        source_channel: usize,
        destination: NodeId,
        destination_channel: usize,
    ) -> Result<bool> {
        if source == destination {
            return Err(Error::SelfConnection(source));
        }
        if source == self.sink {
            return Err(Error::SinkAsSource);
        }
        self.check_channel(source, source_channel)?;
        self.check_channel(destination, destination_channel)?;

        let connection = Connection {
            source,
            source_channel,
            destination,
            destination_channel,
        };
        if !self.connection_set.insert(connection) {
            return Ok(false);
        }
        self.connections.push(connection);
        self.dirty = true;
        Ok(true)
    }

    /// Remove every connection from `source` to `destination`. Returns how many went.
    pub fn disconnect(&mut self, source: NodeId, destination: NodeId) -> usize {
        let before = self.connections.len();
        self.connections
            .retain(|c| !(c.source == source && c.destination == destination));
        self.connection_set
            .retain(|c| !(c.source == source && c.destination == destination));
        let removed = before - self.connections.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connections_between(&self, source: NodeId, destination: NodeId) -> usize {
        self.connections
            .iter()
            .filter(|c| c.source == source && c.destination == destination)
            .count()
    }

    pub fn is_connected(&self, source: NodeId, destination: NodeId) -> bool {
        self.connections_between(source, destination) > 0
    }

    /// Drop every node except the sink.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.connections.clear();
        self.connection_set.clear();
        self.order.clear();
        self.dirty = true;
    }

    /// Allocate buffers for `block_size` frames, prepare every processor and
    /// compute the processing order.
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = block_size;
        for slot in self.slots.iter_mut().flatten() {
            let channels = slot.processor.channels();
            slot.buffer = AudioBuffer::new(channels, block_size);
            slot.processor.prepare(sample_rate, block_size);
        }
        self.prepared = true;
        self.commit();
    }

    /// Recompute the processing order after structural edits.
    pub fn commit(&mut self) {
        let count = self.slots.len();
        let mut in_degree = vec![0usize; count];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut seen = HashSet::new();

        for c in &self.connections {
            let (s, d) = (c.source.index(), c.destination.index());
            if seen.insert((s, d)) {
                adjacency[s].push(d);
                in_degree[d] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..count)
            .filter(|&i| self.slots[i].is_some() && in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(count);

        while let Some(index) = queue.pop_front() {
            order.push(index);
            for &next in &adjacency[index] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        let live = self.node_count();
        if order.len() != live {
            tracing::warn!(
                "Cycle in processing graph: ordered {} of {} nodes, the rest stay silent",
                order.len(),
                live
            );
        }

        for slot in self.slots.iter_mut().flatten() {
            slot.inputs.clear();
        }
        for c in &self.connections {
            if let Some(slot) = self.slots[c.destination.index()].as_mut() {
                slot.inputs.push(Input {
                    source: c.source.index(),
                    source_channel: c.source_channel,
                    channel: c.destination_channel,
                });
            }
        }

        self.order = order;
        self.dirty = false;
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn needs_commit(&self) -> bool {
        self.dirty
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Render one block into `output` (RT-safe).
    ///
    /// At most `block_size` frames are rendered; the sink's channels are copied
    /// into `output` and any extra output channels are silenced.
    pub fn process_block(&mut self, output: &mut AudioBuffer, context: &ProcessContext<'_>) {
        if !self.prepared || self.dirty {
            output.clear();
            return;
        }

        let frames = output.frames().min(self.block_size);

        for position in 0..self.order.len() {
            let index = self.order[position];
            let (before, rest) = self.slots.split_at_mut(index);
            let Some((current, after)) = rest.split_first_mut() else {
                continue;
            };
            let Some(Slot {
                processor,
                buffer,
                inputs,
            }) = current.as_mut()
            else {
                continue;
            };

            buffer.set_frames(frames);
            buffer.clear();
            for input in inputs.iter() {
                let source = if input.source < index {
                    before[input.source].as_ref()
                } else {
                    after[input.source - index - 1].as_ref()
                };
                if let Some(source) = source {
                    buffer.add_channel_from(input.channel, &source.buffer, input.source_channel);
                }
            }
            processor.process(buffer, context);
        }

        match self.slots[self.sink.index()].as_ref() {
            Some(sink) => output.copy_from(&sink.buffer),
            None => output.clear(),
        }
    }

    /// Reset every processor's internal state (delay lines, smoothers).
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.processor.reset();
        }
    }

    fn slot(&self, node: NodeId) -> Option<&Slot> {
        self.slots.get(node.index()).and_then(Option::as_ref)
    }

    fn check_channel(&self, node: NodeId, channel: usize) -> Result<()> {
        let channels = self.channels(node).ok_or(Error::UnknownNode(node))?;
        if channel >= channels {
            return Err(Error::ChannelOutOfRange {
                node,
                channel,
                channels,
            });
        }
        Ok(())
    }
}
