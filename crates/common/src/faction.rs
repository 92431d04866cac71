use serde::{Deserialize, Serialize};

/// A group tag on players, monsters, and NPCs used to classify hostility at
/// display and aggro time.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Faction(pub String);

impl Faction {
    pub fn new(tag: impl Into<String>) -> Self {
        Faction(tag.into())
    }
}

/// How a display bucket (room view, aggro decision) should treat an entity
/// relative to the viewing player's faction.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Relation {
    Friendly,
    Neutral,
    Hostile,
}

/// Small table of faction pairs considered neutral toward one another.
/// Identical factions are always `Friendly`; anything not listed here and
/// not identical is `Hostile`.
#[derive(Clone, Debug, Default)]
pub struct FactionRelations {
    neutral_pairs: Vec<(Faction, Faction)>,
}

impl FactionRelations {
    pub fn new() -> Self {
        Self {
            neutral_pairs: Vec::new(),
        }
    }

    pub fn mark_neutral(&mut self, a: Faction, b: Faction) {
        self.neutral_pairs.push((a, b));
    }

    pub fn classify(&self, viewer: &Faction, other: &Faction) -> Relation {
        if viewer == other {
            return Relation::Friendly;
        }
        let is_neutral = self
            .neutral_pairs
            .iter()
            .any(|(a, b)| (a == viewer && b == other) || (a == other && b == viewer));
        if is_neutral {
            Relation::Neutral
        } else {
            Relation::Hostile
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_faction_is_friendly() {
        let rel = FactionRelations::new();
        let f = Faction::new("townsfolk");
        assert_eq!(rel.classify(&f, &f), Relation::Friendly);
    }

    #[test]
    fn unlisted_pair_is_hostile_by_default() {
        let rel = FactionRelations::new();
        assert_eq!(
            rel.classify(&Faction::new("townsfolk"), &Faction::new("bandits")),
            Relation::Hostile
        );
    }

    #[test]
    fn listed_pair_is_neutral_either_order() {
        let mut rel = FactionRelations::new();
        rel.mark_neutral(Faction::new("townsfolk"), Faction::new("rangers"));
        assert_eq!(
            rel.classify(&Faction::new("rangers"), &Faction::new("townsfolk")),
            Relation::Neutral
        );
    }
}
