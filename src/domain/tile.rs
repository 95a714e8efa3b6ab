/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Solid, // walls and floors, blocks movement
    Empty, // open space
}

impl TileKind {
    /// Decode a map file tile code: `0` = Solid, `1` = Empty.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TileKind::Solid),
            1 => Some(TileKind::Empty),
            _ => None,
        }
    }

    /// Does this tile block the player's bounding box?
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Solid)
    }
}
