use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use scrollkit_common::{Collidable, EntityId, Error, Rect, Result, collides};
use scrollkit_kernel::World;

use crate::ObjectSource;

/// Row-major index of a grid cell: `col + row * cols`.
pub type CellId = usize;

/// Uniform-grid spatial hash over a bounded world rect.
///
/// Objects are stored by key in every cell their rect touches, so two
/// overlapping objects always share at least one bucket as long as the
/// overlap lies inside the world. Overlaps entirely outside the world rect
/// are not detected.
#[derive(Debug, Clone)]
pub struct SpatialHash<K> {
    rect: Rect,
    cell_size: f32,
    rows: usize,
    cols: usize,
    buckets: Vec<Vec<K>>,
    membership: HashMap<K, Vec<CellId>>,
    coll_tests: usize,
}

impl<K: Copy + Eq + Hash> SpatialHash<K> {
    /// Create an empty hash covering `rect` with square cells of `cell_size`.
    pub fn new(rect: Rect, cell_size: f32) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(Error::invalid(format!(
                "cell_size must be positive, got {cell_size}"
            )));
        }
        if ![rect.x, rect.y, rect.w, rect.h].iter().all(|v| v.is_finite()) {
            return Err(Error::invalid(format!("world rect {rect} is not finite")));
        }
        let cols = (rect.w / cell_size).ceil();
        let rows = (rect.h / cell_size).ceil();
        if cols < 1.0 || rows < 1.0 {
            return Err(Error::invalid(format!(
                "world rect {rect} has no cells at cell_size {cell_size}"
            )));
        }
        let (rows, cols) = (rows as usize, cols as usize);
        tracing::debug!(rows, cols, cell_size, "created spatial hash");
        Ok(Self {
            rect,
            cell_size,
            rows,
            cols,
            buckets: (0..rows * cols).map(|_| Vec::new()).collect(),
            membership: HashMap::new(),
            coll_tests: 0,
        })
    }

    /// World bounds covered by the grid.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of keys currently added (including any that have gone stale).
    pub fn len(&self) -> usize {
        self.membership.len()
    }

    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.membership.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.membership.keys().copied()
    }

    /// Pairwise comparisons made by the last `collide_all_*` call.
    pub fn coll_tests(&self) -> usize {
        self.coll_tests
    }

    /// Id of the cell containing the world point, or `None` off the grid.
    pub fn cell_id_at(&self, x: f32, y: f32) -> Option<CellId> {
        let col = ((x - self.rect.x) / self.cell_size).floor();
        let row = ((y - self.rect.y) / self.cell_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f32 || row >= self.rows as f32 {
            return None;
        }
        Some(col as usize + row as usize * self.cols)
    }

    /// World rect of a cell. The last row and column may extend past the
    /// world rect when its size is not a multiple of the cell size.
    pub fn cell_rect(&self, id: CellId) -> Option<Rect> {
        if id >= self.buckets.len() {
            return None;
        }
        let (col, row) = (id % self.cols, id / self.cols);
        Some(Rect::new(
            self.rect.x + col as f32 * self.cell_size,
            self.rect.y + row as f32 * self.cell_size,
            self.cell_size,
            self.cell_size,
        ))
    }

    /// Keys stored in one cell. Unknown ids yield an empty slice.
    pub fn bucket(&self, id: CellId) -> &[K] {
        self.buckets.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells a key currently occupies.
    pub fn cells_of(&self, key: K) -> &[CellId] {
        self.membership.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of every cell the rect touches after clipping it to the world.
    pub fn intersect(&self, rect: &Rect) -> Vec<CellId> {
        let Some(clipped) = self.rect.clip(rect) else {
            return Vec::new();
        };
        let (c0, c1) = self.span(
            clipped.left() - self.rect.x,
            clipped.right() - self.rect.x,
            self.cols,
        );
        let (r0, r1) = self.span(
            clipped.top() - self.rect.y,
            clipped.bottom() - self.rect.y,
            self.rows,
        );
        let mut ids = Vec::with_capacity((c1 - c0 + 1) * (r1 - r0 + 1));
        for row in r0..=r1 {
            for col in c0..=c1 {
                ids.push(col + row * self.cols);
            }
        }
        ids
    }

    /// First and last cell index covered by the offset range `lo..hi`.
    fn span(&self, lo: f32, hi: f32, count: usize) -> (usize, usize) {
        let last_index = (count - 1) as f32;
        let first = (lo / self.cell_size).floor().clamp(0.0, last_index);
        let last = ((hi / self.cell_size).ceil() - 1.0).clamp(first, last_index);
        (first as usize, last as usize)
    }

    /// Insert or re-insert `key` with the given rect.
    ///
    /// Any previous placement is removed first. Returns true when the rect
    /// lies fully inside the world bounds; a rect that is partly outside is
    /// still added to the cells it does touch.
    pub fn add(&mut self, key: K, rect: &Rect) -> bool {
        self.remove(key);
        let cells = self.intersect(rect);
        for &id in &cells {
            self.buckets[id].push(key);
        }
        self.membership.insert(key, cells);
        self.rect.contains_rect(rect)
    }

    /// Remove `key` from every bucket it occupies. Returns false if absent.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(cells) = self.membership.remove(&key) else {
            return false;
        };
        for id in cells {
            let bucket = &mut self.buckets[id];
            if let Some(pos) = bucket.iter().position(|k| *k == key) {
                bucket.swap_remove(pos);
            }
        }
        true
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.membership.clear();
    }

    /// Replace the contents with the given keys and rects.
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = (K, Rect)>) {
        self.clear();
        for (key, rect) in items {
            self.add(key, &rect);
        }
    }

    /// Contents of every bucket the rect touches, concatenated.
    ///
    /// A key spanning several of those cells appears once per cell.
    pub fn get_nearby(&self, rect: &Rect) -> Vec<K> {
        self.intersect(rect)
            .into_iter()
            .flat_map(|id| self.buckets[id].iter().copied())
            .collect()
    }

    /// Keys whose live object rect overlaps `rect`, each reported once.
    pub fn query_rect<S>(&self, rect: &Rect, source: &S) -> Vec<K>
    where
        S: ObjectSource<K> + ?Sized,
    {
        let mut seen = HashSet::new();
        self.get_nearby(rect)
            .into_iter()
            .filter(|k| seen.insert(*k))
            .filter(|k| {
                source
                    .resolve(*k)
                    .is_some_and(|obj| obj.rect().overlaps(rect))
            })
            .collect()
    }

    /// Keys colliding with `key`, excluding itself, each reported once in
    /// bucket order. A stale `key` collides with nothing.
    pub fn collide<S>(&self, key: K, source: &S) -> Vec<K>
    where
        S: ObjectSource<K> + ?Sized,
    {
        let Some(obj) = source.resolve(key) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.get_nearby(&obj.rect())
            .into_iter()
            .filter(|k| *k != key && seen.insert(*k))
            .filter(|k| source.resolve(*k).is_some_and(|other| collides(obj, other)))
            .collect()
    }

    /// Whether anything collides with `key`.
    pub fn collide_any<S>(&self, key: K, source: &S) -> bool
    where
        S: ObjectSource<K> + ?Sized,
    {
        let Some(obj) = source.resolve(key) else {
            return false;
        };
        self.intersect(&obj.rect()).into_iter().any(|id| {
            self.buckets[id].iter().any(|k| {
                *k != key && source.resolve(*k).is_some_and(|other| collides(obj, other))
            })
        })
    }

    /// Every colliding pair found within a shared cell, as a symmetric map:
    /// if `a` maps to `b` then `b` maps to `a`.
    ///
    /// With `rect`, only cells touching it are scanned.
    pub fn collide_all_map<S>(&mut self, source: &S, rect: Option<&Rect>) -> HashMap<K, Vec<K>>
    where
        S: ObjectSource<K> + ?Sized,
    {
        let mut hits: HashMap<K, Vec<K>> = HashMap::new();
        self.scan_pairs(source, rect, |a, b| {
            hits.entry(a).or_default().push(b);
            hits.entry(b).or_default().push(a);
        });
        hits
    }

    /// Every colliding pair found within a shared cell, each unordered pair
    /// listed once.
    pub fn collide_all_list<S>(&mut self, source: &S, rect: Option<&Rect>) -> Vec<(K, K)>
    where
        S: ObjectSource<K> + ?Sized,
    {
        let mut pairs = Vec::new();
        self.scan_pairs(source, rect, |a, b| pairs.push((a, b)));
        pairs
    }

    fn scan_pairs<S>(&mut self, source: &S, rect: Option<&Rect>, mut on_hit: impl FnMut(K, K))
    where
        S: ObjectSource<K> + ?Sized,
    {
        let cells: Vec<CellId> = match rect {
            Some(r) => self.intersect(r),
            None => (0..self.buckets.len()).collect(),
        };
        let mut tests = 0;
        let mut reported: HashSet<(K, K)> = HashSet::new();
        for id in cells {
            let bucket = &self.buckets[id];
            for (i, &ka) in bucket.iter().enumerate() {
                let Some(a) = source.resolve(ka) else {
                    continue;
                };
                for &kb in &bucket[i + 1..] {
                    let Some(b) = source.resolve(kb) else {
                        continue;
                    };
                    tests += 1;
                    if collides(a, b)
                        && !reported.contains(&(kb, ka))
                        && reported.insert((ka, kb))
                    {
                        on_hit(ka, kb);
                    }
                }
            }
        }
        self.coll_tests = tests;
        tracing::trace!(tests, pairs = reported.len(), "collide-all scan complete");
    }

    /// Drop every key that no longer resolves. Returns how many were dropped.
    pub fn purge_stale<S>(&mut self, source: &S) -> usize
    where
        S: ObjectSource<K> + ?Sized,
    {
        let stale: Vec<K> = self
            .membership
            .keys()
            .copied()
            .filter(|k| source.resolve(*k).is_none())
            .collect();
        for key in &stale {
            self.remove(*key);
        }
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "purged stale keys");
        }
        stale.len()
    }
}

impl SpatialHash<EntityId> {
    /// Rebuild the hash from every body in the world.
    pub fn rebuild_from_world(&mut self, world: &World) {
        self.rebuild(world.entities().iter().map(|(id, body)| (*id, body.rect)));
    }
}
