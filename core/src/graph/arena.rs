//! Node arena — chunked slot pool with a recycling free list.
//!
//! Slots are handed out as `NodeId` handles. Storage grows one chunk at a
//! time; released slots are threaded onto a free list through their
//! `next_sibling` field and reused before any new chunk is requested. The
//! whole arena can be dropped at once with `free_all` without walking the
//! free list.
//!
//! `NodePool` is the seam for custom allocators. Every capture session owns
//! its pool, so independent sessions never share allocator state.

use tracing::error;

use crate::types::node::{Node, NodeId};


/// Storage backend for snapshot nodes.
pub trait NodePool {
    /// Hand out a slot holding `Node::default()`.
    fn allocate(&mut self) -> NodeId;

    /// Return a slot to the pool. The handle must not be used afterwards.
    fn release(&mut self, id: NodeId);

    fn node(&self, id: NodeId) -> &Node;

    fn node_mut(&mut self, id: NodeId) -> &mut Node;

    /// Drop every slot, live or free. All outstanding handles become invalid.
    fn free_all(&mut self);
}


/// Default pool: fixed-size chunks plus a free list.
#[derive(Debug)]
pub struct Arena {
    chunk_slots: usize,
    chunks: Vec<Vec<Node>>,
    free_head: Option<NodeId>,
    free_len: usize,
}


impl Arena {
    /// Create an empty arena that grows `chunk_slots` slots at a time.
    pub fn new(chunk_slots: usize) -> Self {
        Arena {
            chunk_slots: chunk_slots.max(1),
            chunks: Vec::new(),
            free_head: None,
            free_len: 0,
        }
    }

    /// Slots currently handed out.
    pub fn live(&self) -> usize {
        self.capacity() - self.free_len
    }

    /// Slots waiting on the free list.
    pub fn free_slots(&self) -> usize {
        self.free_len
    }

    /// Total slots across all chunks.
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_slots
    }

    pub fn chunks(&self) -> usize {
        self.chunks.len()
    }

    fn locate(&self, id: NodeId) -> (usize, usize) {
        (id.index() / self.chunk_slots, id.index() % self.chunk_slots)
    }

    /// Append one chunk and thread its slots onto the free list, lowest index
    /// first.
    fn grow(&mut self) {
        let base = self.capacity();
        if base + self.chunk_slots > u32::MAX as usize {
            error!(capacity = base, "node arena exhausted its handle space");
            std::process::abort();
        }
        let mut chunk: Vec<Node> = Vec::new();
        if chunk.try_reserve_exact(self.chunk_slots).is_err() {
            error!(slots = self.chunk_slots, "node arena could not allocate a chunk");
            std::process::abort();
        }
        for offset in 0..self.chunk_slots {
            let next = if offset + 1 < self.chunk_slots {
                Some(NodeId((base + offset + 1) as u32))
            } else {
                self.free_head
            };
            chunk.push(Node {
                next_sibling: next,
                ..Node::default()
            });
        }
        self.chunks.push(chunk);
        self.free_head = Some(NodeId(base as u32));
        self.free_len += self.chunk_slots;
    }
}


impl Default for Arena {
    fn default() -> Self {
        Arena::new(32)
    }
}


impl NodePool for Arena {
    fn allocate(&mut self) -> NodeId {
        if self.free_head.is_none() {
            self.grow();
        }
        let id = match self.free_head {
            Some(id) => id,
            None => unreachable!("grow always refills the free list"),
        };
        let slot = self.node_mut(id);
        let next = slot.next_sibling;
        *slot = Node::default();
        self.free_head = next;
        self.free_len -= 1;
        id
    }

    fn release(&mut self, id: NodeId) {
        let head = self.free_head;
        let slot = self.node_mut(id);
        *slot = Node {
            next_sibling: head,
            ..Node::default()
        };
        self.free_head = Some(id);
        self.free_len += 1;
    }

    fn node(&self, id: NodeId) -> &Node {
        let (chunk, offset) = self.locate(id);
        &self.chunks[chunk][offset]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let (chunk, offset) = self.locate(id);
        &mut self.chunks[chunk][offset]
    }

    fn free_all(&mut self) {
        self.chunks.clear();
        self.free_head = None;
        self.free_len = 0;
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
