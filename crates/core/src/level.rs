//! The level grid handed to gameplay: tiles, the category overlay, masks,
//! entities and stair positions.

use serde::Serialize;
use slotmap::SlotMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::catalog::{ShapeKind, TerrainId};
use crate::types::{Category, EntityId, Pos, TileKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    Monster { template: String, difficulty: u32 },
    Item { template: String },
    Door { open: bool },
    Chest { archetype: String, contents: Vec<String> },
    Trap { template: String },
    Plant { template: String },
}

impl EntityKind {
    pub fn is_monster(&self) -> bool {
        matches!(self, EntityKind::Monster { .. })
    }

    fn glyph(&self) -> char {
        match self {
            EntityKind::Monster { template, .. } => {
                template.chars().next().map_or('M', |first| first.to_ascii_uppercase())
            }
            EntityKind::Item { .. } => '!',
            EntityKind::Door { open: true } => '\'',
            EntityKind::Door { open: false } => '+',
            EntityKind::Chest { .. } => '=',
            EntityKind::Trap { .. } => '^',
            EntityKind::Plant { .. } => '&',
        }
    }

    fn tag(&self) -> u8 {
        match self {
            EntityKind::Monster { .. } => 0,
            EntityKind::Item { .. } => 1,
            EntityKind::Door { .. } => 2,
            EntityKind::Chest { .. } => 3,
            EntityKind::Trap { .. } => 4,
            EntityKind::Plant { .. } => 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub pos: Pos,
    pub kind: EntityKind,
}

/// Footprint of a room that survived placement, kept for decoration,
/// respawn and invariant checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlacedRoom {
    pub terrain: TerrainId,
    pub shape: ShapeKind,
    pub origin: Pos,
    pub width: usize,
    pub height: usize,
    pub inner: Vec<Pos>,
    pub walls: Vec<Pos>,
    pub doors: Vec<Pos>,
    pub convexes: Vec<Pos>,
}

impl PlacedRoom {
    pub fn outer(&self) -> impl Iterator<Item = Pos> + '_ {
        self.walls.iter().chain(self.inner.iter()).copied()
    }
}

#[derive(Clone, Debug)]
pub struct Level {
    pub width: usize,
    pub height: usize,
    pub depth: u32,
    pub biome: String,
    tiles: Vec<TileKind>,
    categories: Vec<Category>,
    tunnel_allowed: Vec<bool>,
    protected: Vec<bool>,
    /// Cells currently in view; gameplay owns updates.
    pub visible: Vec<bool>,
    pub explored: Vec<bool>,
    entities: SlotMap<EntityId, Entity>,
    occupancy: Vec<Option<EntityId>>,
    pub ascend: Option<Pos>,
    pub descend: Option<Pos>,
    pub starting_monster_count: usize,
    pub rooms: Vec<PlacedRoom>,
}

impl Level {
    pub fn new(width: usize, height: usize, depth: u32, biome: &str, fill: TileKind) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            depth,
            biome: biome.to_string(),
            tiles: vec![fill; cells],
            categories: vec![Category::Void; cells],
            tunnel_allowed: vec![true; cells],
            protected: vec![false; cells],
            visible: vec![false; cells],
            explored: vec![false; cells],
            entities: SlotMap::with_key(),
            occupancy: vec![None; cells],
            ascend: None,
            descend: None,
            starting_monster_count: 0,
            rooms: Vec::new(),
        }
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| (pos.y as usize) * self.width + (pos.x as usize))
    }

    /// Every cell in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Pos { y, x }))
    }

    pub fn tile_at(&self, pos: Pos) -> TileKind {
        self.index(pos).map_or(TileKind::Bedrock, |index| self.tiles[index])
    }

    pub fn category_at(&self, pos: Pos) -> Category {
        self.index(pos).map_or(Category::MapBorder, |index| self.categories[index])
    }

    pub fn is_protected(&self, pos: Pos) -> bool {
        self.index(pos).is_none_or(|index| self.protected[index])
    }

    pub fn is_tunnel_allowed(&self, pos: Pos) -> bool {
        self.index(pos).is_some_and(|index| self.tunnel_allowed[index])
    }

    pub fn is_visible(&self, pos: Pos) -> bool {
        self.index(pos).is_some_and(|index| self.visible[index])
    }

    pub fn is_walkable_and_safe(&self, pos: Pos) -> bool {
        self.index(pos).is_some_and(|index| self.tiles[index].is_walkable_and_safe())
    }

    pub fn set_tile(&mut self, pos: Pos, tile: TileKind) {
        if let Some(index) = self.index(pos) {
            self.tiles[index] = tile;
        }
    }

    pub fn set_category(&mut self, pos: Pos, category: Category) {
        if let Some(index) = self.index(pos) {
            self.categories[index] = category;
        }
    }

    /// Writes tile and category together.
    pub fn stamp(&mut self, pos: Pos, tile: TileKind, category: Category) {
        if let Some(index) = self.index(pos) {
            self.tiles[index] = tile;
            self.categories[index] = category;
        }
    }

    pub fn set_tunnel_allowed(&mut self, pos: Pos, allowed: bool) {
        if let Some(index) = self.index(pos) {
            self.tunnel_allowed[index] = allowed;
        }
    }

    pub fn set_protected(&mut self, pos: Pos, protected: bool) {
        if let Some(index) = self.index(pos) {
            self.protected[index] = protected;
        }
    }

    pub fn count_category(&self, category: Category) -> usize {
        self.categories.iter().filter(|&&current| current == category).count()
    }

    pub fn entity_at(&self, pos: Pos) -> Option<EntityId> {
        self.index(pos).and_then(|index| self.occupancy[index])
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        self.entity_at(pos).is_some()
    }

    /// Places an entity; `None` when the cell is outside the map or taken.
    pub fn spawn(&mut self, pos: Pos, kind: EntityKind) -> Option<EntityId> {
        let index = self.index(pos)?;
        if self.occupancy[index].is_some() {
            return None;
        }
        let id = self.entities.insert(Entity { pos, kind });
        self.occupancy[index] = Some(id);
        Some(id)
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        if let Some(index) = self.index(entity.pos) {
            self.occupancy[index] = None;
        }
        Some(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn monster_count(&self) -> usize {
        self.entities.values().filter(|entity| entity.kind.is_monster()).count()
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend((self.width as u32).to_le_bytes());
        bytes.extend((self.height as u32).to_le_bytes());
        bytes.extend(self.depth.to_le_bytes());
        bytes.extend(self.tiles.iter().map(|&tile| tile as u8));
        bytes.extend(self.categories.iter().map(|&category| category as u8));
        for index in 0..self.tiles.len() {
            bytes.push(u8::from(self.tunnel_allowed[index]) | (u8::from(self.protected[index]) << 1));
        }
        for stair in [self.ascend, self.descend] {
            match stair {
                Some(pos) => {
                    bytes.push(1);
                    bytes.extend(pos.y.to_le_bytes());
                    bytes.extend(pos.x.to_le_bytes());
                }
                None => bytes.push(0),
            }
        }
        bytes.extend((self.starting_monster_count as u32).to_le_bytes());

        bytes.extend((self.entities.len() as u32).to_le_bytes());
        for entity in self.entities.values() {
            bytes.extend(entity.pos.y.to_le_bytes());
            bytes.extend(entity.pos.x.to_le_bytes());
            bytes.push(entity.kind.tag());
            match &entity.kind {
                EntityKind::Monster { template, difficulty } => {
                    push_str(&mut bytes, template);
                    bytes.extend(difficulty.to_le_bytes());
                }
                EntityKind::Item { template }
                | EntityKind::Trap { template }
                | EntityKind::Plant { template } => push_str(&mut bytes, template),
                EntityKind::Door { open } => bytes.push(u8::from(*open)),
                EntityKind::Chest { archetype, contents } => {
                    push_str(&mut bytes, archetype);
                    bytes.extend((contents.len() as u32).to_le_bytes());
                    for item in contents {
                        push_str(&mut bytes, item);
                    }
                }
            }
        }
        bytes
    }

    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }

    /// Lit glyphs, one row per line, entities drawn over their tiles.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Pos { y: y as i32, x: x as i32 };
                let glyph = self
                    .entity_at(pos)
                    .and_then(|id| self.entity(id))
                    .map_or_else(|| self.tile_at(pos).props().glyph_lit, |entity| entity.kind.glyph());
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

fn push_str(bytes: &mut Vec<u8>, text: &str) {
    bytes.extend((text.len() as u32).to_le_bytes());
    bytes.extend(text.as_bytes());
}
