//! 助言的なタイル占有チェック
//!
//! 「あのタイルには既に別のワーカーが向かっている」をワーカーの
//! 進行中ミッションの線形走査で判定する。ロックではないので、同一
//! tick 内で後から処理されるワーカーとの競合は原理的に残る
//! （影響が小さいので許容しているレース）。

use bevy::prelude::*;

use crate::entities::digger::{Continuation, DiggerMission};
use crate::world::grid::GridPos;

#[derive(Debug, Clone, Copy)]
pub struct InflightClaim {
    pub digger: Entity,
    pub target: Option<GridPos>,
    pub arming_trap: Option<Entity>,
}

/// 今 tick の進行中ミッションのスナップショット。ワーカーが
/// ミッションを確定するたびに追記され、後続ワーカーから見える
#[derive(Debug, Default)]
pub struct ClaimBoard {
    claims: Vec<InflightClaim>,
}

impl ClaimBoard {
    pub fn record_mission(&mut self, digger: Entity, mission: &DiggerMission) {
        if mission.continuation == Continuation::None {
            return;
        }
        self.claims.push(InflightClaim {
            digger,
            target: mission.target_tile,
            arming_trap: mission.arming_trap,
        });
    }

    /// ミッション確定時の追記
    pub fn record(&mut self, digger: Entity, target: GridPos) {
        self.claims.push(InflightClaim {
            digger,
            target: Some(target),
            arming_trap: None,
        });
    }

    pub fn record_arming(&mut self, digger: Entity, trap: Entity) {
        self.claims.push(InflightClaim {
            digger,
            target: None,
            arming_trap: Some(trap),
        });
    }

    /// 自分以外のワーカーが同じタイルに収束中か
    pub fn converging_on(&self, exclude: Entity, tile: GridPos) -> bool {
        self.claims
            .iter()
            .any(|c| c.digger != exclude && c.target == Some(tile))
    }

    /// 指定の罠を装填しに向かっているワーカーがいるか
    pub fn arming_in_progress(&self, trap: Entity) -> bool {
        self.claims.iter().any(|c| c.arming_trap == Some(trap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn converging_excludes_self() {
        let ids = entities(2);
        let mut board = ClaimBoard::default();
        let tile = GridPos::new(4, 4);
        board.record(ids[0], tile);

        assert!(!board.converging_on(ids[0], tile));
        assert!(board.converging_on(ids[1], tile));
        assert!(!board.converging_on(ids[1], GridPos::new(5, 4)));
    }

    #[test]
    fn arming_claim_is_visible() {
        let ids = entities(2);
        let mut board = ClaimBoard::default();
        board.record_arming(ids[0], ids[1]);
        assert!(board.arming_in_progress(ids[1]));
        assert!(!board.arming_in_progress(ids[0]));
    }
}
