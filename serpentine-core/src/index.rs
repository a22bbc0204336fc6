//! Spatial index of committed segments
//!
//! Segments are grouped into chains by pivot, the coordinate every cell of
//! the segment shares. Chains live in a dense slot array; a separate sorted
//! list of slot numbers gives O(log P) lookup by pivot. Chain nodes come
//! from a fixed pool threaded by a free list, so the index never allocates.
//!
//! ```text
//! order:  [ 3 ][ 0 ][ 1 ]          sorted by pivot
//!           │    │    │
//! chains: [x=20][x=41][---][x=7]   slot 2 free
//!           │
//! nodes:  [20..35 L0] → [60..62 L1] → end   newest first
//! ```

use heapless::Vec;
use serpentine_protocol::Layer;

use crate::geometry::{Point, Segment};

/// Distinct pivots per index (every `u8` coordinate)
pub const MAX_PIVOTS: usize = 256;

/// Segment nodes per index
pub const MAX_ENTRIES: usize = 3 * crate::ring::RING_CAPACITY;

/// Errors from index mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndexError {
    /// Node pool or chain slots exhausted
    Full,
    /// No matching segment to remove
    NotFound,
}

/// One indexed segment, reduced to its span along the moving axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Entry {
    pub near: u8,
    pub far: u8,
    pub layer: Layer,
}

impl Entry {
    /// Check if `along` falls inside the span on `layer`
    pub fn covers(&self, along: u8, layer: Layer) -> bool {
        self.layer == layer && self.near.min(self.far) <= along && along <= self.near.max(self.far)
    }
}

#[derive(Debug, Clone, Copy)]
struct Chain {
    pivot: u8,
    first: u16,
    /// Zero marks a free slot
    len: u16,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    entry: Entry,
    next: Option<u16>,
}

/// Fixed-capacity pivot index
///
/// `P` bounds distinct pivots, `N` bounds stored segments.
#[derive(Debug, Clone)]
pub struct SpatialIndex<const P: usize, const N: usize> {
    chains: [Chain; P],
    order: Vec<u16, P>,
    nodes: [Node; N],
    free: Option<u16>,
    len: usize,
}

impl<const P: usize, const N: usize> Default for SpatialIndex<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const P: usize, const N: usize> SpatialIndex<P, N> {
    /// Create an empty index
    pub fn new() -> Self {
        let blank = Entry {
            near: 0,
            far: 0,
            layer: Layer::Upper,
        };
        Self {
            chains: [Chain {
                pivot: 0,
                first: 0,
                len: 0,
            }; P],
            order: Vec::new(),
            nodes: core::array::from_fn(|i| Node {
                entry: blank,
                next: (i + 1 < N).then(|| (i + 1) as u16),
            }),
            free: (N > 0).then_some(0),
            len: 0,
        }
    }

    /// Number of stored segments
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct pivots in use
    pub fn pivots(&self) -> usize {
        self.order.len()
    }

    fn find(&self, pivot: u8) -> Result<usize, usize> {
        self.order
            .binary_search_by_key(&pivot, |&slot| self.chains[usize::from(slot)].pivot)
    }

    /// All segments sharing `pivot`, newest first
    pub fn lookup(&self, pivot: u8) -> Entries<'_, P, N> {
        let next = self
            .find(pivot)
            .ok()
            .map(|pos| self.chains[usize::from(self.order[pos])].first);
        Entries { index: self, next }
    }

    /// Check if any segment on `pivot` covers `along` on `layer`
    pub fn hits(&self, pivot: u8, along: u8, layer: Layer) -> bool {
        self.lookup(pivot).any(|e| e.covers(along, layer))
    }

    /// Add a segment span under `pivot`
    pub fn insert(&mut self, pivot: u8, near: u8, far: u8, layer: Layer) -> Result<(), IndexError> {
        let node = self.free.ok_or(IndexError::Full)?;

        let slot = match self.find(pivot) {
            Ok(pos) => usize::from(self.order[pos]),
            Err(pos) => {
                let slot = self
                    .chains
                    .iter()
                    .position(|c| c.len == 0)
                    .ok_or(IndexError::Full)?;
                self.order
                    .insert(pos, slot as u16)
                    .map_err(|_| IndexError::Full)?;
                self.chains[slot] = Chain {
                    pivot,
                    first: node,
                    len: 0,
                };
                slot
            }
        };

        let n = usize::from(node);
        self.free = self.nodes[n].next;

        let chain = &mut self.chains[slot];
        self.nodes[n] = Node {
            entry: Entry { near, far, layer },
            next: (chain.len > 0).then_some(chain.first),
        };
        chain.first = node;
        chain.len += 1;
        self.len += 1;
        Ok(())
    }

    /// Remove a segment from `pivot` whose near or far end is `endpoint`
    ///
    /// Returns [`IndexError::NotFound`] if no segment on `layer` matches.
    pub fn remove(&mut self, pivot: u8, endpoint: u8, layer: Layer) -> Result<Entry, IndexError> {
        self.unlink(pivot, |e| {
            e.layer == layer && (e.near == endpoint || e.far == endpoint)
        })
    }

    /// Remove the segment with exactly this span
    ///
    /// Collinear segments may share an endpoint, so callers that know both
    /// ends should prefer this over [`remove`](Self::remove).
    pub fn remove_span(&mut self, pivot: u8, near: u8, far: u8, layer: Layer) -> Result<Entry, IndexError> {
        self.unlink(pivot, |e| e.layer == layer && e.near == near && e.far == far)
    }

    fn unlink(&mut self, pivot: u8, matches: impl Fn(&Entry) -> bool) -> Result<Entry, IndexError> {
        let pos = self.find(pivot).map_err(|_| IndexError::NotFound)?;
        let slot = usize::from(self.order[pos]);

        let mut prev: Option<u16> = None;
        let mut cursor = Some(self.chains[slot].first);
        while let Some(i) = cursor {
            let node = self.nodes[usize::from(i)];
            if matches(&node.entry) {
                match prev {
                    Some(p) => self.nodes[usize::from(p)].next = node.next,
                    None => {
                        if let Some(next) = node.next {
                            self.chains[slot].first = next;
                        }
                    }
                }
                self.nodes[usize::from(i)].next = self.free;
                self.free = Some(i);
                self.len -= 1;

                let chain = &mut self.chains[slot];
                chain.len -= 1;
                if chain.len == 0 {
                    self.order.remove(pos);
                }
                return Ok(node.entry);
            }
            prev = cursor;
            cursor = node.next;
        }

        Err(IndexError::NotFound)
    }
}

/// Iterator over one chain
pub struct Entries<'a, const P: usize, const N: usize> {
    index: &'a SpatialIndex<P, N>,
    next: Option<u16>,
}

impl<const P: usize, const N: usize> Iterator for Entries<'_, P, N> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let node = self.index.nodes.get(usize::from(self.next?))?;
        self.next = node.next;
        Some(node.entry)
    }
}

/// Index pair used by a match
///
/// Vertical segments are keyed by x, horizontal ones by y.
#[derive(Debug, Clone, Default)]
pub struct Trails {
    pub vertical: SpatialIndex<MAX_PIVOTS, MAX_ENTRIES>,
    pub horizontal: SpatialIndex<MAX_PIVOTS, MAX_ENTRIES>,
}

impl Trails {
    pub fn new() -> Self {
        Self::default()
    }

    fn side(&mut self, segment: &Segment) -> &mut SpatialIndex<MAX_PIVOTS, MAX_ENTRIES> {
        if segment.is_vertical() {
            &mut self.vertical
        } else {
            &mut self.horizontal
        }
    }

    /// Index a committed segment
    pub fn insert(&mut self, segment: &Segment) -> Result<(), IndexError> {
        let (near, far) = segment.span();
        self.side(segment)
            .insert(segment.pivot(), near, far, segment.layer)
    }

    /// Drop a segment that became open again
    pub fn remove(&mut self, segment: &Segment) -> Result<(), IndexError> {
        let (near, far) = segment.span();
        self.side(segment)
            .remove_span(segment.pivot(), near, far, segment.layer)
            .map(|_| ())
    }

    /// Check if any committed segment covers `p` on `layer`
    pub fn hits(&self, p: Point, layer: Layer) -> bool {
        self.vertical.hits(p.x, p.y, layer) || self.horizontal.hits(p.y, p.x, layer)
    }

    /// Total segments stored
    pub fn len(&self) -> usize {
        self.vertical.len() + self.horizontal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
