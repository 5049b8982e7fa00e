use serde::Serialize;
use utoipa::ToSchema;

/// Scoreboard fragment for one zone, with the zone's own score first so each
/// player reads "YOU | OPP" on their mirrored half.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct ZoneScores {
    /// The zone's own score.
    pub own: u32,
    /// The opposing zone's score.
    pub opponent: u32,
}

/// Expand a slot-indexed score pair into both zones' mirrored views.
pub fn mirrored(scores: [u32; 2]) -> [ZoneScores; 2] {
    [
        ZoneScores {
            own: scores[0],
            opponent: scores[1],
        },
        ZoneScores {
            own: scores[1],
            opponent: scores[0],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_zone_reads_its_own_score_first() {
        let zones = mirrored([3, 1]);
        assert_eq!(zones[0], ZoneScores { own: 3, opponent: 1 });
        assert_eq!(zones[1], ZoneScores { own: 1, opponent: 3 });
    }
}
