//! tick ごとのトップレベル選択
//!
//! ワーカー 1 体あたりの流れ: 継続ヒューリスティック → リフレッシュ
//! （期限つき） → 共有スタック消費 → 金庫返納フォールバック → 待機。
//! ワーカーはコロニーのロスター順（挿入順で安定）に処理される。

use bevy::prelude::*;

use crate::entities::colony::Colony;
use crate::entities::digger::{Digger, DiggerCursor, DiggerMission, SeekingTask};
use crate::events::{ShortageNotice, StackRefreshed, TaskDispatched, WorldEventRequest};
use crate::relationships::ColonyDiggers;
use crate::systems::SimTick;
use crate::systems::claims::ClaimBoard;
use crate::systems::consume::{AbortReason, DispatchResult, consume_stack};
use crate::systems::context::{SchedulerCtx, WorkerCtx};
use crate::systems::continuity::continue_last_job;
use crate::systems::notify::{Notifier, Outbox};
use crate::systems::stack::{ReinforceStaging, TaskStack, refresh_stack_if_due};
use crate::systems::treasury::{return_gold_to_treasury, treasury_check_due};
use crate::world::grid::GridPos;
use crate::world::oracle::{NavPlanner, TerrainOracle};
use crate::world::snapshot::WorldScanParams;

/// 1 ワーカー 1 tick 分の選択結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// 直前ジョブの継続で仕事が見つかった
    Continued,
    /// 共有スタックから払い出された（金庫チェック差し込みを含む）
    Dispatched,
    /// 運搬金の返納に向かった
    ReturningGold,
    /// 走査が打ち切られた。この tick は何もしない
    Stalled(AbortReason),
    /// 仕事なし
    Idle,
}

/// ワーカー 1 体分の仕事選択
pub fn select_digger_task(
    ctx: &mut SchedulerCtx,
    worker: &mut WorkerCtx,
    stack: &mut TaskStack,
    staging: &mut ReinforceStaging,
) -> SelectionOutcome {
    if continue_last_job(ctx, worker, stack, staging) {
        return SelectionOutcome::Continued;
    }
    refresh_stack_if_due(ctx, stack, staging);
    match consume_stack(ctx, worker, stack) {
        DispatchResult::Dispatched => SelectionOutcome::Dispatched,
        DispatchResult::Aborted(reason) => SelectionOutcome::Stalled(reason),
        DispatchResult::Exhausted => {
            if treasury_check_due(worker.cursor, ctx.tick) {
                worker.cursor.last_treasury_check_tick = ctx.tick;
                if return_gold_to_treasury(ctx, worker) {
                    return SelectionOutcome::ReturningGold;
                }
            }
            SelectionOutcome::Idle
        }
    }
}

/// 仕事を探している全ワーカーを処理するシステム
#[allow(clippy::too_many_arguments)]
pub fn digger_task_selection_system(
    mut commands: Commands,
    tick: Res<SimTick>,
    scans: WorldScanParams,
    terrain: Res<TerrainOracle>,
    mut planner: ResMut<NavPlanner>,
    mut notifier: ResMut<Notifier>,
    mut q_colonies: Query<(
        Entity,
        &Colony,
        &ColonyDiggers,
        &mut TaskStack,
        &mut ReinforceStaging,
    )>,
    mut q_seekers: Query<
        (Entity, &Digger, &GridPos, &mut DiggerCursor, &mut DiggerMission),
        With<SeekingTask>,
    >,
    q_working: Query<(Entity, &DiggerMission), (With<Digger>, Without<SeekingTask>)>,
    mut out_notices: MessageWriter<ShortageNotice>,
    mut out_events: MessageWriter<WorldEventRequest>,
    mut out_dispatched: MessageWriter<TaskDispatched>,
    mut out_refreshed: MessageWriter<StackRefreshed>,
) {
    let world = scans.snapshot();

    // 進行中ミッションのスナップショット。ワーカーがコミットするたびに
    // 追記されるので、同一 tick 内でも先勝ちのクレームが後続に見える
    let mut claims = ClaimBoard::default();
    for (entity, mission) in q_working.iter() {
        claims.record_mission(entity, mission);
    }
    for (entity, _, _, _, mission) in q_seekers.iter() {
        claims.record_mission(entity, mission);
    }

    let mut outbox = Outbox::default();
    let mut rng = rand::thread_rng();

    for (colony_entity, colony, roster, mut stack, mut staging) in q_colonies.iter_mut() {
        for &digger in roster.iter() {
            let Ok((_, stats, pos, mut cursor, mut mission)) = q_seekers.get_mut(digger) else {
                continue;
            };
            let mut ctx = SchedulerCtx {
                tick: tick.0,
                colony: colony_entity,
                colony_observed: colony.observed,
                tends_to_imprison: colony.tends_to_imprison,
                world: &world,
                terrain: &*terrain.0,
                planner: &mut *planner.0,
                claims: &mut claims,
                notifier: &mut notifier,
                outbox: &mut outbox,
                rng: &mut rng,
            };
            let mut worker = WorkerCtx {
                entity: digger,
                pos: *pos,
                digger: stats,
                cursor: &mut cursor,
                mission: &mut mission,
            };
            let outcome =
                select_digger_task(&mut ctx, &mut worker, &mut stack, &mut staging);
            match outcome {
                SelectionOutcome::Continued
                | SelectionOutcome::Dispatched
                | SelectionOutcome::ReturningGold => {
                    commands.entity(digger).remove::<SeekingTask>();
                }
                SelectionOutcome::Stalled(reason) => {
                    debug!("SELECT: digger {:?} stalled this tick: {:?}", digger, reason);
                }
                SelectionOutcome::Idle => {}
            }
        }
    }

    for notice in outbox.notices.drain(..) {
        out_notices.write(notice);
    }
    for event in outbox.events.drain(..) {
        out_events.write(event);
    }
    for dispatch in outbox.dispatches.drain(..) {
        out_dispatched.write(dispatch);
    }
    for refresh in outbox.refreshes.drain(..) {
        out_refreshed.write(refresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiggerTasksPlugin;
    use crate::entities::digger::{Continuation, LastJob};
    use crate::relationships::DiggerOf;
    use crate::systems::stack::TaskKind;
    use crate::test_support::{FlatTerrain, OpenPlanner, TestBed, TestWorker};
    use crate::world::items::{DigDesignation, DigKind, GoldPile, OwnedBy};

    #[test]
    fn continuity_takes_priority_over_stack() {
        let mut bed = TestBed::new();
        let mut stack = TaskStack::default();
        stack.reset(bed.tick);
        stack.push(GridPos::new(3, 3), TaskKind::PickUpGoldPile);
        bed.add_gold(GridPos::new(3, 3));
        let mut staging = ReinforceStaging::default();
        // 整地を続けていたワーカーの足元に整地対象がある
        bed.terrain.improvable.insert(GridPos::new(5, 5));
        let entity = bed.entity();
        let mut worker = TestWorker::new(entity, GridPos::new(5, 5));
        worker.cursor.last_job = LastJob::ImproveConvert;
        worker.cursor.stack_tick = bed.tick;
        worker.cursor.last_treasury_check_tick = bed.tick;

        let outcome =
            select_digger_task(&mut bed.ctx(), &mut worker.ctx(), &mut stack, &mut staging);
        assert_eq!(outcome, SelectionOutcome::Continued);
        assert_eq!(worker.mission.continuation, Continuation::ArriveAtImprove);
        // スタックには手を付けていない
        assert_eq!(stack.entries[0].kind, TaskKind::PickUpGoldPile);
    }

    #[test]
    fn exhausted_stack_falls_back_to_treasury_check() {
        let mut bed = TestBed::new();
        let treasury = bed.add_room(crate::world::rooms::RoomKind::Treasury, GridPos::new(9, 9), 10, 0);
        let mut stack = TaskStack::default();
        stack.reset(bed.tick);
        let mut staging = ReinforceStaging::default();
        let entity = bed.entity();
        let mut worker = TestWorker::new(entity, GridPos::new(5, 5));
        worker.cursor.stack_tick = bed.tick;
        worker.digger.gold_carried = 80;
        worker.cursor.last_treasury_check_tick = 0; // 期限切れ

        let outcome =
            select_digger_task(&mut bed.ctx(), &mut worker.ctx(), &mut stack, &mut staging);
        assert_eq!(outcome, SelectionOutcome::ReturningGold);
        assert_eq!(worker.mission.target_entity, Some(treasury));
        assert_eq!(worker.cursor.last_treasury_check_tick, bed.tick);
    }

    #[test]
    fn idle_when_nothing_to_do() {
        let mut bed = TestBed::new();
        let mut stack = TaskStack::default();
        stack.reset(bed.tick);
        let mut staging = ReinforceStaging::default();
        let entity = bed.entity();
        let mut worker = TestWorker::new(entity, GridPos::new(5, 5));
        worker.cursor.stack_tick = bed.tick;
        worker.cursor.last_treasury_check_tick = bed.tick;

        let outcome =
            select_digger_task(&mut bed.ctx(), &mut worker.ctx(), &mut stack, &mut staging);
        assert_eq!(outcome, SelectionOutcome::Idle);
    }

    /// プラグイン一式を通した煙テスト。採掘指定 1 件が 1 tick で
    /// ワーカーに払い出されることを確認する
    #[test]
    fn plugin_dispatches_dig_through_full_tick() {
        let mut app = App::new();
        app.add_plugins(DiggerTasksPlugin);
        app.insert_resource(TerrainOracle(Box::new(FlatTerrain::default())));
        app.insert_resource(NavPlanner(Box::new(OpenPlanner::default())));

        let colony = app
            .world_mut()
            .spawn((
                Colony {
                    observed: true,
                    tends_to_imprison: true,
                },
                TaskStack::default(),
                ReinforceStaging::default(),
            ))
            .id();
        let digger = app
            .world_mut()
            .spawn((
                Digger::default(),
                GridPos::new(5, 2),
                DiggerCursor::default(),
                DiggerMission::default(),
                SeekingTask,
                DiggerOf(colony),
            ))
            .id();
        app.world_mut().spawn((
            DigDesignation { kind: DigKind::Dig },
            GridPos::new(5, 8),
            OwnedBy(colony),
        ));

        app.update();

        let mission = app.world().get::<DiggerMission>(digger).unwrap();
        assert_eq!(mission.continuation, Continuation::ArriveAtDig);
        assert!(app.world().get::<SeekingTask>(digger).is_none());
        let cursor = app.world().get::<DiggerCursor>(digger).unwrap();
        assert_eq!(cursor.last_job, LastJob::Dig);

        let dispatched = app.world().resource::<Messages<TaskDispatched>>();
        assert!(!dispatched.is_empty());
    }

    /// 同一 tick に同じ金塊を狙う 2 ワーカーのうち勝つのは 1 体だけ
    #[test]
    fn same_tick_claims_are_visible_to_later_workers() {
        let mut app = App::new();
        app.add_plugins(DiggerTasksPlugin);
        app.insert_resource(TerrainOracle(Box::new(FlatTerrain::default())));
        app.insert_resource(NavPlanner(Box::new(OpenPlanner::default())));

        let colony = app
            .world_mut()
            .spawn((Colony::default(), TaskStack::default(), ReinforceStaging::default()))
            .id();
        let pile = GridPos::new(3, 3);
        app.world_mut().spawn((GoldPile { amount: 200 }, pile));
        let first = app
            .world_mut()
            .spawn((
                Digger::default(),
                GridPos::new(2, 3),
                DiggerCursor::default(),
                DiggerMission::default(),
                SeekingTask,
                DiggerOf(colony),
            ))
            .id();
        let second = app
            .world_mut()
            .spawn((
                Digger::default(),
                GridPos::new(4, 3),
                DiggerCursor::default(),
                DiggerMission::default(),
                SeekingTask,
                DiggerOf(colony),
            ))
            .id();

        app.update();

        let first_mission = app.world().get::<DiggerMission>(first).unwrap();
        let second_mission = app.world().get::<DiggerMission>(second).unwrap();
        let winners = [first_mission, second_mission]
            .iter()
            .filter(|m| m.continuation == Continuation::PickUpGoldPile)
            .count();
        assert_eq!(winners, 1);
    }
}
