/// Badge tiers, ascending by the trip count required to unlock them.
const TIERS: [(&str, u32); 5] = [
    ("New Traveler", 0),
    ("Explorer", 1),
    ("Adventurer", 3),
    ("Globetrotter", 6),
    ("World Citizen", 10),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub name: &'static str,
    pub tier: usize,
    pub next_threshold: Option<u32>,
}

impl Badge {
    /// Trips still needed to reach the next tier, zero at the top.
    pub fn remaining(&self, trip_count: u32) -> u32 {
        self.next_threshold
            .map(|threshold| threshold.saturating_sub(trip_count))
            .unwrap_or(0)
    }
}

/// Highest tier whose threshold is <= the trip count. `next_threshold` is
/// the following tier's threshold, or None once the top tier is reached.
pub fn badge_for(trip_count: u32) -> Badge {
    let tier = TIERS
        .iter()
        .rposition(|(_, threshold)| trip_count >= *threshold)
        .unwrap_or(0);
    Badge {
        name: TIERS[tier].0,
        tier,
        next_threshold: TIERS.get(tier + 1).map(|(_, threshold)| *threshold),
    }
}
