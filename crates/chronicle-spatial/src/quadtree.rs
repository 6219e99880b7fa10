//! Generic axis-aligned quadtree spatial index.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle, closed on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.w
            && self.x + self.w >= other.x
            && self.y <= other.y + other.h
            && self.y + self.h >= other.y
    }

    fn quadrants(&self) -> [Rect; 4] {
        let hw = self.w / 2.0;
        let hh = self.h / 2.0;
        [
            Rect::new(self.x, self.y, hw, hh),               // bottom-left
            Rect::new(self.x + hw, self.y, hw, hh),           // bottom-right
            Rect::new(self.x, self.y + hh, hw, hh),           // top-left
            Rect::new(self.x + hw, self.y + hh, hw, hh),      // top-right
        ]
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry<T> {
    x: f64,
    y: f64,
    data: T,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

struct Node<T> {
    bounds: Rect,
    depth: usize,
    entries: Vec<Entry<T>>,
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Clone> Node<T> {
    fn new(bounds: Rect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, x: f64, y: f64, data: T, max_entries: usize, max_depth: usize) {
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if child.bounds.contains_point(x, y) {
                    child.insert(x, y, data, max_entries, max_depth);
                    return;
                }
            }
            // Fits no child (e.g. straddles a boundary neither owns): keep
            // on this node as the fallback bucket.
            self.entries.push(Entry { x, y, data });
            return;
        }

        self.entries.push(Entry { x, y, data });
        if self.entries.len() > max_entries && self.depth < max_depth {
            self.subdivide(max_entries, max_depth);
        }
    }

    fn subdivide(&mut self, max_entries: usize, max_depth: usize) {
        let quadrants = self.bounds.quadrants();
        let mut children: [Node<T>; 4] = [
            Node::new(quadrants[0], self.depth + 1),
            Node::new(quadrants[1], self.depth + 1),
            Node::new(quadrants[2], self.depth + 1),
            Node::new(quadrants[3], self.depth + 1),
        ];

        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            let mut placed = false;
            for child in children.iter_mut() {
                if child.bounds.contains_point(entry.x, entry.y) {
                    child.insert(entry.x, entry.y, entry.data.clone(), max_entries, max_depth);
                    placed = true;
                    break;
                }
            }
            if !placed {
                self.entries.push(entry);
            }
        }
        self.children = Some(Box::new(children));
    }

    fn remove(&mut self, x: f64, y: f64, data: &T, max_entries: usize) -> bool
    where
        T: PartialEq,
    {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.x == x && e.y == y && &e.data == data)
        {
            self.entries.remove(pos);
            return true;
        }
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if child.remove(x, y, data, max_entries) {
                    return true;
                }
            }
        }
        false
    }

    fn query_rect(&self, rect: &Rect, out: &mut Vec<T>) {
        if !self.bounds.intersects(rect) {
            return;
        }
        for entry in &self.entries {
            if rect.contains_point(entry.x, entry.y) {
                out.push(entry.data.clone());
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_rect(rect, out);
            }
        }
    }

    fn collect_all(&self, out: &mut Vec<(f64, f64, T)>) {
        for entry in &self.entries {
            out.push((entry.x, entry.y, entry.data.clone()));
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.collect_all(out);
            }
        }
    }

    fn max_depth_reached(&self) -> usize {
        match &self.children {
            None => self.depth,
            Some(children) => children.iter().map(|c| c.max_depth_reached()).max().unwrap_or(self.depth),
        }
    }

    fn size(&self) -> usize {
        let own = self.entries.len();
        match &self.children {
            None => own,
            Some(children) => own + children.iter().map(|c| c.size()).sum::<usize>(),
        }
    }
}

// ---------------------------------------------------------------------------
// Quadtree
// ---------------------------------------------------------------------------

/// A generic axis-aligned quadtree, parametric over payload type `T`.
///
/// Nodes subdivide once their entry count exceeds `max_entries` *and* their
/// depth is below `max_depth`; entries that don't fit any child after
/// subdivision remain on the parent as a fallback bucket, so no entry is
/// ever lost.
pub struct Quadtree<T> {
    bounds: Rect,
    max_entries: usize,
    max_depth: usize,
    root: Node<T>,
}

impl<T: Clone + PartialEq> Quadtree<T> {
    pub fn new(bounds: Rect, max_entries: usize, max_depth: usize) -> Self {
        Self {
            bounds,
            max_entries,
            max_depth,
            root: Node::new(bounds, 0),
        }
    }

    /// Insert `data` at `(x, y)`. Returns `false` without inserting if the
    /// point lies outside the root bounds.
    pub fn insert(&mut self, x: f64, y: f64, data: T) -> bool {
        if !self.bounds.contains_point(x, y) {
            return false;
        }
        self.root.insert(x, y, data, self.max_entries, self.max_depth);
        true
    }

    /// Remove the first entry (in DFS order) matching `(x, y, data)`
    /// exactly. Returns whether an entry was removed.
    pub fn remove(&mut self, x: f64, y: f64, data: &T) -> bool {
        self.root.remove(x, y, data, self.max_entries)
    }

    pub fn query_rect(&self, x: f64, y: f64, w: f64, h: f64) -> Vec<T> {
        let mut out = Vec::new();
        self.root.query_rect(&Rect::new(x, y, w, h), &mut out);
        out
    }

    /// Payloads whose squared distance to `(cx, cy)` is `<= r * r`.
    pub fn query_radius(&self, cx: f64, cy: f64, r: f64) -> Vec<T> {
        let r2 = r * r;
        let mut all = Vec::new();
        self.root.collect_all(&mut all);
        all.into_iter()
            .filter(|(x, y, _)| {
                let dx = x - cx;
                let dy = y - cy;
                dx * dx + dy * dy <= r2
            })
            .map(|(_, _, data)| data)
            .collect()
    }

    /// The `k` payloads nearest to `(x, y)`, sorted nearest-first.
    /// Correctness over performance: brute-force collect and sort.
    pub fn query_nearest(&self, x: f64, y: f64, k: usize) -> Vec<T> {
        let mut all = Vec::new();
        self.root.collect_all(&mut all);
        all.sort_by(|(ax, ay, _), (bx, by, _)| {
            let da = (ax - x).powi(2) + (ay - y).powi(2);
            let db = (bx - x).powi(2) + (by - y).powi(2);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        all.into_iter().take(k).map(|(_, _, data)| data).collect()
    }

    pub fn size(&self) -> usize {
        self.root.size()
    }

    pub fn clear(&mut self) {
        self.root = Node::new(self.bounds, 0);
    }

    /// Rebuild the tree from scratch from its current entries. Useful after
    /// many removals have left a subdivided tree sparser than
    /// `max_entries` would newly warrant.
    pub fn rebalance(&mut self) {
        let mut all = Vec::new();
        self.root.collect_all(&mut all);
        self.root = Node::new(self.bounds, 0);
        for (x, y, data) in all {
            self.root.insert(x, y, data, self.max_entries, self.max_depth);
        }
    }

    pub fn get_bounds(&self) -> Rect {
        self.bounds
    }

    /// The deepest subdivision level actually reached.
    pub fn get_depth(&self) -> usize {
        self.root.max_depth_reached()
    }

    pub fn get_entries(&self) -> Vec<(f64, f64, T)> {
        let mut all = Vec::new();
        self.root.collect_all(&mut all);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Quadtree<&'static str> {
        Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 8, 8)
    }

    #[test]
    fn insert_outside_bounds_fails_silently() {
        let mut qt = tree();
        assert!(!qt.insert(200.0, 200.0, "nope"));
        assert_eq!(qt.size(), 0);
    }

    #[test]
    fn insert_query_remove_roundtrip() {
        let mut qt = tree();
        assert!(qt.insert(10.0, 10.0, "a"));
        assert!(qt.query_radius(10.0, 10.0, 0.0).contains(&"a"));
        assert!(qt.remove(10.0, 10.0, &"a"));
        assert!(!qt.query_radius(10.0, 10.0, 0.0).contains(&"a"));
    }

    #[test]
    fn quadtree_seed_scenario() {
        let mut qt = tree();
        qt.insert(10.0, 10.0, "a");
        qt.insert(90.0, 90.0, "b");
        qt.insert(15.0, 15.0, "c");

        let mut radius_result = qt.query_radius(10.0, 10.0, 10.0);
        radius_result.sort();
        assert_eq!(radius_result, vec!["a", "c"]);

        let nearest = qt.query_nearest(0.0, 0.0, 2);
        assert_eq!(nearest, vec!["a", "c"]);
    }

    #[test]
    fn subdivides_past_max_entries() {
        let mut qt = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2, 8);
        for i in 0..10 {
            qt.insert(i as f64, i as f64, i);
        }
        assert!(qt.get_depth() > 0);
        assert_eq!(qt.size(), 10, "no entry should be lost across subdivision");
    }

    #[test]
    fn max_depth_saturation_keeps_entries_on_node() {
        let mut qt = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1, 1);
        // All points identical -- every subdivision attempt places them in
        // the same child, so depth saturates quickly and entries pile up.
        for i in 0..20 {
            qt.insert(5.0, 5.0, i);
        }
        assert_eq!(qt.size(), 20);
        assert!(qt.get_depth() <= 1);
    }

    #[test]
    fn clear_empties_tree() {
        let mut qt = tree();
        qt.insert(1.0, 1.0, "a");
        qt.clear();
        assert_eq!(qt.size(), 0);
    }

    #[test]
    fn rebalance_preserves_all_entries() {
        let mut qt = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2, 8);
        for i in 0..20 {
            qt.insert(i as f64, (i * 2) as f64 % 100.0, i);
        }
        let before = qt.size();
        qt.rebalance();
        assert_eq!(qt.size(), before);
    }

    #[test]
    fn query_rect_boundary_inclusive() {
        let mut qt = tree();
        qt.insert(50.0, 50.0, "center");
        let results = qt.query_rect(50.0, 50.0, 0.0, 0.0);
        assert_eq!(results, vec!["center"]);
    }
}
