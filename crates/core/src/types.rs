use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct EntityId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Generation-time role of a cell, kept separately from the visual tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Void,
    RoomWall,
    RoomInner,
    Tunnel,
    Door,
    DoorConvex,
    Grass,
    GrassCore,
    Water,
    WaterCore,
    Pit,
    PitCore,
    Hole,
    Trap,
    Plant,
    AscendStair,
    DescendStair,
    MapBorder,
}

impl Category {
    pub fn is_door_like(self) -> bool {
        matches!(self, Category::Door | Category::DoorConvex)
    }

    pub fn is_stair(self) -> bool {
        matches!(self, Category::AscendStair | Category::DescendStair)
    }
}

/// Static properties of a tile, looked up through [`TileKind::props`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileProps {
    pub name: &'static str,
    pub walkable: bool,
    pub safe: bool,
    pub flammable: bool,
    pub transparent: bool,
    pub glyph_lit: char,
    pub glyph_dark: char,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Bedrock,
    Wall,
    CaveWall,
    Floor,
    Dirt,
    Corridor,
    Door,
    Grass,
    Water,
    DeepWater,
    Pit,
    Chasm,
    Hole,
    Trap,
    AscendStair,
    DescendStair,
}

impl TileKind {
    pub fn props(self) -> TileProps {
        let (name, walkable, safe, flammable, transparent, glyph_lit, glyph_dark) = match self {
            TileKind::Bedrock => ("bedrock", false, false, false, false, '#', '#'),
            TileKind::Wall => ("stone wall", false, false, false, false, '#', '#'),
            TileKind::CaveWall => ("cave wall", false, false, false, false, '%', '%'),
            TileKind::Floor => ("floor", true, true, false, true, '.', ' '),
            TileKind::Dirt => ("dirt", true, true, false, true, ',', ' '),
            TileKind::Corridor => ("corridor", true, true, false, true, '.', ' '),
            TileKind::Door => ("door", true, true, true, false, '+', '+'),
            TileKind::Grass => ("grass", true, true, true, true, '"', ' '),
            TileKind::Water => ("water", true, true, false, true, '~', '~'),
            TileKind::DeepWater => ("deep water", true, true, false, true, '≈', '≈'),
            TileKind::Pit => ("pit edge", true, false, false, true, ':', ' '),
            TileKind::Chasm => ("chasm", false, false, false, true, ' ', ' '),
            TileKind::Hole => ("hole", true, false, false, true, 'o', ' '),
            TileKind::Trap => ("trap", true, false, false, true, '^', ' '),
            TileKind::AscendStair => ("upward staircase", true, true, false, true, '<', '<'),
            TileKind::DescendStair => ("downward staircase", true, true, false, true, '>', '>'),
        };
        TileProps { name, walkable, safe, flammable, transparent, glyph_lit, glyph_dark }
    }

    pub fn is_walkable(self) -> bool {
        self.props().walkable
    }

    pub fn is_walkable_and_safe(self) -> bool {
        let props = self.props();
        props.walkable && props.safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_direction_undoes_step() {
        let origin = Pos { y: 4, x: 7 };
        for direction in Direction::ALL {
            assert_eq!(origin.step(direction).step(direction.opposite()), origin);
        }
    }

    #[test]
    fn hazard_tiles_are_walkable_but_unsafe() {
        for tile in [TileKind::Pit, TileKind::Hole, TileKind::Trap] {
            assert!(tile.is_walkable());
            assert!(!tile.is_walkable_and_safe(), "{tile:?} must not count as safe");
        }
        assert!(!TileKind::Chasm.is_walkable());
        assert!(TileKind::DeepWater.is_walkable_and_safe());
    }
}
