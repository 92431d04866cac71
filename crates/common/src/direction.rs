use crate::ids::Coords;
use strum::{EnumIter, IntoEnumIterator};

/// The four cardinal exits. Exits are derived from coordinate adjacency
/// rather than stored per-room, so this enum is the only
/// vocabulary of movement the core ever needs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, EnumIter)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Coordinate delta for this direction. North/South move along `y`,
    /// East/West along `x`; north increases `y`.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn apply(&self, coords: Coords) -> Coords {
        let (dx, dy) = self.delta();
        Coords::new(coords.x + dx, coords.y + dy)
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    /// The reserved single-letter aliases (`n/s/e/w`). Command registration
    /// must strip these from any non-direction command's alias list (see
    /// `RESERVED_DIRECTION_ALIASES`).
    pub fn alias(&self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::South => "s",
            Direction::East => "e",
            Direction::West => "w",
        }
    }

    /// Parses a verb token (name or single-letter alias) into a direction.
    /// Case-insensitive, matching the dispatcher's lowercase lookup key.
    pub fn parse(token: &str) -> Option<Direction> {
        let lower = token.to_ascii_lowercase();
        Direction::iter().find(|d| d.name() == lower || d.alias() == lower)
    }
}

/// Reserved for movement; any other command's registered aliases that
/// collide with these are stripped with a warning.
pub const RESERVED_DIRECTION_ALIASES: [&str; 4] = ["n", "s", "e", "w"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_round_trips_through_opposite() {
        for d in Direction::iter() {
            let start = Coords::new(3, -2);
            let moved = d.apply(start);
            let back = d.opposite().apply(moved);
            assert_eq!(start, back);
        }
    }

    #[test]
    fn parse_accepts_aliases_and_names() {
        assert_eq!(Direction::parse("n"), Some(Direction::North));
        assert_eq!(Direction::parse("North"), Some(Direction::North));
        assert_eq!(Direction::parse("nope"), None);
    }
}
