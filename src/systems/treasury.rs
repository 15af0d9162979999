//! 運搬中の金の金庫返納
//!
//! 返納先が見つからない場合は原因を三通りに切り分けて通知する。
//! どの失敗も致命ではなく、ワーカーは次の機会に再試行する。

use bevy::prelude::*;

use crate::constants::{NOTICE_THROTTLE_TICKS, TREASURY_CHECK_INTERVAL};
use crate::entities::digger::{Continuation, DiggerCursor};
use crate::events::{NoticeKind, WorldEventKind};
use crate::systems::consume::commit_move;
use crate::systems::context::{SchedulerCtx, WorkerCtx};
use crate::world::rooms::RoomKind;

/// 金庫チェックのスロットルが明けているか
pub(crate) fn treasury_check_due(cursor: &DiggerCursor, tick: u64) -> bool {
    tick.saturating_sub(cursor.last_treasury_check_tick) > TREASURY_CHECK_INTERVAL
}

/// 金を持っていれば最寄りの空きのある金庫へ向かわせる
///
/// 戻り値は返納行動を開始したかどうか。失敗理由ごとの通知:
/// (a) 金庫が一つも無い / (b) 空きのある金庫はあるが到達できない /
/// (c) 金庫はあるがどこも満杯。
pub fn return_gold_to_treasury(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    if worker.digger.gold_carried == 0 {
        return false;
    }

    let room = ctx
        .world
        .nearest_reachable_room_with_spare_capacity(
            &*ctx.planner,
            worker.entity,
            worker.pos,
            ctx.colony,
            RoomKind::Treasury,
            1,
        )
        .map(|r| (r.entity, r.pos));
    if let Some((room_entity, room_pos)) = room {
        if commit_move(ctx, worker, room_pos, true, Continuation::DropGoldAtTreasury) {
            worker.mission.target_entity = Some(room_entity);
            debug!(
                "TREASURY: digger {:?} returning {} gold",
                worker.entity, worker.digger.gold_carried
            );
            return true;
        }
        return false;
    }

    // 失敗原因の切り分け
    if !ctx.world.colony_has_room(ctx.colony, RoomKind::Treasury) {
        ctx.notifier.owner_message(
            ctx.outbox,
            ctx.tick,
            ctx.colony,
            ctx.colony_observed,
            NoticeKind::TreasuryNeeded,
            NOTICE_THROTTLE_TICKS,
            true,
        );
        ctx.notifier.world_event(
            ctx.outbox,
            ctx.tick,
            ctx.colony,
            WorldEventKind::TreasuryNeeded,
            None,
            None,
            false,
        );
        return false;
    }
    if ctx
        .world
        .any_room_with_spare_capacity(ctx.colony, RoomKind::Treasury, 1)
    {
        // 空きはどこかにあるのに経路が無い
        ctx.notifier.owner_message(
            ctx.outbox,
            ctx.tick,
            ctx.colony,
            ctx.colony_observed,
            NoticeKind::NoRouteToTreasury,
            NOTICE_THROTTLE_TICKS,
            true,
        );
        return false;
    }
    ctx.notifier.owner_message(
        ctx.outbox,
        ctx.tick,
        ctx.colony,
        ctx.colony_observed,
        NoticeKind::TreasuryTooSmall,
        NOTICE_THROTTLE_TICKS,
        true,
    );
    ctx.notifier.world_event(
        ctx.outbox,
        ctx.tick,
        ctx.colony,
        WorldEventKind::TreasuryFull,
        None,
        None,
        true,
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestBed, TestWorker};
    use crate::world::grid::GridPos;

    fn gold_carrier(bed: &mut TestBed) -> TestWorker {
        let entity = bed.entity();
        let mut worker = TestWorker::new(entity, GridPos::new(2, 2));
        worker.digger.gold_carried = 120;
        worker
    }

    #[test]
    fn no_gold_is_a_noop() {
        let mut bed = TestBed::new();
        let entity = bed.entity();
        let mut worker = TestWorker::new(entity, GridPos::new(2, 2));
        assert!(!return_gold_to_treasury(&mut bed.ctx(), &mut worker.ctx()));
        assert!(bed.outbox.notices.is_empty());
    }

    #[test]
    fn drops_gold_at_nearest_reachable_treasury() {
        let mut bed = TestBed::new();
        let far = bed.add_room(RoomKind::Treasury, GridPos::new(14, 14), 10, 0);
        let near = bed.add_room(RoomKind::Treasury, GridPos::new(4, 4), 10, 0);
        let mut worker = gold_carrier(&mut bed);

        assert!(return_gold_to_treasury(&mut bed.ctx(), &mut worker.ctx()));
        assert_eq!(worker.mission.continuation, Continuation::DropGoldAtTreasury);
        assert_eq!(worker.mission.target_entity, Some(near));
        assert_ne!(worker.mission.target_entity, Some(far));
    }

    #[test]
    fn missing_treasury_raises_build_notice_and_event() {
        let mut bed = TestBed::new();
        let mut worker = gold_carrier(&mut bed);
        assert!(!return_gold_to_treasury(&mut bed.ctx(), &mut worker.ctx()));
        assert_eq!(bed.outbox.notices.len(), 1);
        assert_eq!(bed.outbox.notices[0].kind, NoticeKind::TreasuryNeeded);
        assert_eq!(bed.outbox.events.len(), 1);
        assert_eq!(bed.outbox.events[0].kind, WorldEventKind::TreasuryNeeded);
        assert!(!bed.outbox.events[0].important);
    }

    #[test]
    fn unreachable_treasury_raises_no_route_notice() {
        let mut bed = TestBed::new();
        let pos = GridPos::new(12, 12);
        bed.add_room(RoomKind::Treasury, pos, 10, 0);
        bed.planner.unreachable.insert(pos);
        let mut worker = gold_carrier(&mut bed);

        assert!(!return_gold_to_treasury(&mut bed.ctx(), &mut worker.ctx()));
        assert_eq!(bed.outbox.notices.len(), 1);
        assert_eq!(bed.outbox.notices[0].kind, NoticeKind::NoRouteToTreasury);
        assert!(bed.outbox.events.is_empty());
    }

    #[test]
    fn full_treasuries_raise_too_small_notice_and_event() {
        let mut bed = TestBed::new();
        bed.add_room(RoomKind::Treasury, GridPos::new(6, 6), 0, 0);
        let mut worker = gold_carrier(&mut bed);

        assert!(!return_gold_to_treasury(&mut bed.ctx(), &mut worker.ctx()));
        assert_eq!(bed.outbox.notices.len(), 1);
        assert_eq!(bed.outbox.notices[0].kind, NoticeKind::TreasuryTooSmall);
        assert_eq!(bed.outbox.events.len(), 1);
        assert_eq!(bed.outbox.events[0].kind, WorldEventKind::TreasuryFull);
        assert!(bed.outbox.events[0].important);
    }
}
