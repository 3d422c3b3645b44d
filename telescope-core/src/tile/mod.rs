//! # Tiles
//!
//! A sparse grid of baked textures per frame. Tiles are square, `tile_world_size` frame units on
//! a side, and keyed by their integer cell. A tile is created (dirty) the first time a stroke
//! touches it and stays around for the rest of the session.
//!
//! ```text
//!  absent --stroke--> dirty --bake--> clean --stroke--> dirty
//! ```

pub mod cache;

pub use cache::{BakeReport, TileCache};

use crate::{render::TextureHandle, util::Rect, DVec2};

/// Rects touching more tiles than this aren't tiled at all and always draw raw.
pub const MAX_TILES_PER_RECT: usize = 4096;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TileKey {
    pub x: i32,
    pub y: i32,
    /// Level of detail. Only level 0 exists for now.
    pub lod: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub key: TileKey,
    pub rect: Rect,
    pub texture: Option<TextureHandle>,
    pub dirty: bool,
}
impl Tile {
    /// Clean and backed by a texture, and so usable in place of the strokes under it.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.dirty && self.texture.is_some()
    }
}

/// Inclusive rectangle of tile keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange {
    pub x: std::ops::RangeInclusive<i32>,
    pub y: std::ops::RangeInclusive<i32>,
}
impl KeyRange {
    #[must_use]
    pub fn len(&self) -> usize {
        let span = |range: &std::ops::RangeInclusive<i32>| {
            usize::try_from(i64::from(*range.end()) - i64::from(*range.start()) + 1).unwrap_or(0)
        };
        span(&self.x).saturating_mul(span(&self.y))
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
        self.y.clone().flat_map(move |y| {
            self.x.clone().map(move |x| TileKey { x, y, lod: 0 })
        })
    }
}

#[derive(Debug)]
pub struct TileGrid {
    tile_world_size: f64,
    tiles: hashbrown::HashMap<TileKey, Tile>,
}
impl TileGrid {
    #[must_use]
    pub fn new(tile_world_size: f64) -> Self {
        Self {
            tile_world_size,
            tiles: hashbrown::HashMap::new(),
        }
    }
    #[must_use]
    pub fn tile_world_size(&self) -> f64 {
        self.tile_world_size
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
    #[must_use]
    pub fn get(&self, key: &TileKey) -> Option<&Tile> {
        self.tiles.get(key)
    }
    pub(crate) fn get_mut(&mut self, key: &TileKey) -> Option<&mut Tile> {
        self.tiles.get_mut(key)
    }
    /// All tiles, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }
    /// The frame-local square covered by a key.
    #[must_use]
    pub fn key_rect(&self, key: TileKey) -> Rect {
        let size = self.tile_world_size;
        let min = DVec2::new(f64::from(key.x) * size, f64::from(key.y) * size);
        Rect::new(min, min + DVec2::new(size, size))
    }
    /// Every key whose square touches `rect`. `None` if the rect is empty, not finite, or covers
    /// more than [`MAX_TILES_PER_RECT`] tiles.
    #[must_use]
    pub fn keys_overlapping(&self, rect: &Rect) -> Option<KeyRange> {
        use az::SaturatingAs;
        let finite = [rect.min.x, rect.min.y, rect.max.x, rect.max.y]
            .iter()
            .all(|v| v.is_finite());
        if rect.is_empty() || !finite || !(self.tile_world_size > 0.0) {
            return None;
        }
        let cell = |v: f64| (v / self.tile_world_size).floor().saturating_as::<i32>();
        let range = KeyRange {
            x: cell(rect.min.x)..=cell(rect.max.x),
            y: cell(rect.min.y)..=cell(rect.max.y),
        };
        (range.len() <= MAX_TILES_PER_RECT).then_some(range)
    }
    /// Dirty every tile touching `rect`, creating the missing ones. Returns how many were touched.
    pub fn mark_dirty(&mut self, rect: &Rect) -> usize {
        let Some(range) = self.keys_overlapping(rect) else {
            log::debug!("not tiling {rect:?}");
            return 0;
        };
        for key in range.keys() {
            let rect = self.key_rect(key);
            self.tiles
                .entry(key)
                .and_modify(|tile| tile.dirty = true)
                .or_insert_with(|| Tile {
                    key,
                    rect,
                    texture: None,
                    dirty: true,
                });
        }
        range.len()
    }
    /// Is every tile under `rect` present and valid?
    #[must_use]
    pub fn is_covered(&self, rect: &Rect) -> bool {
        let Some(range) = self.keys_overlapping(rect) else {
            return false;
        };
        let covered = range
            .keys()
            .all(|key| self.tiles.get(&key).is_some_and(Tile::is_valid));
        covered
    }
    /// Keys of dirty tiles, sorted so bake order is stable.
    #[must_use]
    pub fn dirty_keys(&self) -> Vec<TileKey> {
        let mut keys: Vec<TileKey> = self
            .tiles
            .values()
            .filter(|tile| tile.dirty)
            .map(|tile| tile.key)
            .collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rect(min: (f64, f64), max: (f64, f64)) -> Rect {
        Rect::new(DVec2::new(min.0, min.1), DVec2::new(max.0, max.1))
    }

    #[test]
    fn negative_cells_floor() {
        let grid = TileGrid::new(100.0);
        let range = grid.keys_overlapping(&rect((-150.0, -1.0), (10.0, 99.0))).unwrap();
        assert_eq!(range.x, -2..=0);
        assert_eq!(range.y, -1..=0);
        assert_eq!(range.len(), 6);
        assert_eq!(range.keys().count(), 6);
    }
    #[test]
    fn dirty_then_clean_then_dirty() {
        let mut grid = TileGrid::new(100.0);
        let stroke = rect((10.0, 10.0), (20.0, 20.0));
        assert_eq!(grid.mark_dirty(&stroke), 1);
        assert!(!grid.is_covered(&stroke));

        let key = TileKey { x: 0, y: 0, lod: 0 };
        let tile = grid.get_mut(&key).unwrap();
        tile.texture = Some(TextureHandle(1));
        tile.dirty = false;
        assert!(grid.is_covered(&stroke));
        // Spilling into a tile that doesn't exist isn't covered.
        assert!(!grid.is_covered(&rect((90.0, 10.0), (120.0, 20.0))));

        grid.mark_dirty(&rect((50.0, 50.0), (60.0, 60.0)));
        assert!(grid.get(&key).unwrap().dirty);
        // Texture is kept for re-baking.
        assert_eq!(grid.get(&key).unwrap().texture, Some(TextureHandle(1)));
        assert_eq!(grid.dirty_keys(), vec![key]);
    }
    #[test]
    fn huge_or_broken_rects_are_not_tiled() {
        let mut grid = TileGrid::new(1.0);
        assert_eq!(grid.mark_dirty(&rect((0.0, 0.0), (1.0e6, 1.0e6))), 0);
        assert_eq!(grid.mark_dirty(&rect((0.0, 0.0), (f64::NAN, 1.0))), 0);
        assert_eq!(grid.mark_dirty(&Rect::EMPTY), 0);
        assert!(grid.is_empty());
    }
}
