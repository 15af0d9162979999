//! 採掘目標への接近位置の導出
//!
//! 掘削タスクは作業タイルそのものには立てない。目標の 4 側面のうち
//! ワーカーに向いた側から順に、距離 2 の基準タイルとその左右隣を
//! 立ち位置候補として試す。

use crate::constants::DIG_APPROACH_DISTANCE;
use crate::systems::context::{SchedulerCtx, WorkerCtx};
use crate::world::grid::{CARDINALS, GridPos};

/// 候補の横ずらしオフセット。基準タイル→左隣→右隣の順に試す
const LATERAL_OFFSETS: [i32; 3] = [0, -1, 1];

/// 掘削目標 `target` の周囲から到達可能な立ち位置を返す
///
/// 立ち位置は (a) 有効な掘削位置で、(b) 積載上限の金塊に塞がれておらず、
/// (c) 他のワーカーが収束中でなく、(d) 経路が引けること。
pub(crate) fn dig_approach_position(
    ctx: &mut SchedulerCtx,
    worker: &WorkerCtx,
    target: GridPos,
) -> Option<GridPos> {
    if !ctx.terrain.is_diggable_side(ctx.colony, target) {
        return None;
    }

    // ワーカーに面した側面から試し始める
    let dx = target.x - worker.pos.x;
    let dy = target.y - worker.pos.y;
    let mut side = if dy.abs() >= dx.abs() {
        if dy > 0 { 0 } else { 2 }
    } else if dx > 0 {
        3
    } else {
        1
    };

    for _ in 0..4 {
        let base = target.offset_scaled(CARDINALS[side], DIG_APPROACH_DISTANCE);
        if ctx.terrain.is_valid_dig_position(ctx.colony, base) {
            for lateral in LATERAL_OFFSETS {
                let stand = if lateral == 0 {
                    base
                } else {
                    let turned = (side as i32 + lateral).rem_euclid(4) as usize;
                    base.offset(CARDINALS[turned])
                };
                if !ctx.terrain.is_valid_dig_position(ctx.colony, stand) {
                    continue;
                }
                if ctx.terrain.gold_pile_at_capacity(stand) {
                    continue;
                }
                if ctx.claims.converging_on(worker.entity, stand) {
                    continue;
                }
                if ctx.planner.can_reach(worker.entity, worker.pos, stand) {
                    return Some(stand);
                }
            }
        }
        side = (side + 1) % 4;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestBed, TestWorker};

    #[test]
    fn stand_faces_the_worker_first() {
        let mut bed = TestBed::new();
        let digger = bed.entity();
        let mut worker = TestWorker::new(digger, GridPos::new(5, 2));
        let target = GridPos::new(5, 8);

        let stand = dig_approach_position(&mut bed.ctx(), &worker.ctx(), target);
        // ワーカーは目標の北側にいるので、北側面 (5, 6) が最初に選ばれる
        assert_eq!(stand, Some(GridPos::new(5, 6)));
    }

    #[test]
    fn no_diggable_side_means_no_stand() {
        let mut bed = TestBed::new();
        let target = GridPos::new(5, 5);
        bed.terrain.not_diggable.insert(target);
        let digger = bed.entity();
        let mut worker = TestWorker::new(digger, GridPos::new(5, 2));
        assert_eq!(dig_approach_position(&mut bed.ctx(), &worker.ctx(), target), None);
    }

    #[test]
    fn claimed_stand_falls_back_to_lateral_neighbour() {
        let mut bed = TestBed::new();
        let other = bed.entity();
        let digger = bed.entity();
        let target = GridPos::new(5, 8);
        // 正面の基準タイルを別ワーカーが先取りしている
        bed.claims.record(other, GridPos::new(5, 6));
        let mut worker = TestWorker::new(digger, GridPos::new(5, 2));

        let stand = dig_approach_position(&mut bed.ctx(), &worker.ctx(), target);
        assert_eq!(stand, Some(GridPos::new(4, 6)));
    }

    #[test]
    fn capped_gold_pile_blocks_the_stand() {
        let mut bed = TestBed::new();
        let digger = bed.entity();
        let target = GridPos::new(5, 8);
        bed.terrain.capped_gold.insert(GridPos::new(5, 6));
        let mut worker = TestWorker::new(digger, GridPos::new(5, 2));

        let stand = dig_approach_position(&mut bed.ctx(), &worker.ctx(), target);
        assert_eq!(stand, Some(GridPos::new(4, 6)));
    }

    #[test]
    fn unreachable_everywhere_fails() {
        let mut bed = TestBed::new();
        bed.planner.unreachable_all = true;
        let digger = bed.entity();
        let mut worker = TestWorker::new(digger, GridPos::new(5, 2));
        assert_eq!(
            dig_approach_position(&mut bed.ctx(), &worker.ctx(), GridPos::new(5, 8)),
            None
        );
    }
}
