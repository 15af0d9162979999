//! 共有スタックの消費と払い出し検証
//!
//! エントリは生成から最大 128 tick 遅れて消費されるため、払い出しの
//! 直前に種別ごとの前提条件を取り直す。無効化の扱いは種別で異なり、
//! 「このエントリだけ飛ばす」「クリアして次へ」「走査ごと打ち切る」を
//! 種別ごとに使い分ける。

use bevy::prelude::*;

use crate::constants::{NOTICE_THROTTLE_TICKS, STACK_MAX_TASKS};
use crate::entities::digger::{Continuation, LastJob};
use crate::events::{NoticeKind, TaskDispatched, WorldEventKind};
use crate::systems::approach::dig_approach_position;
use crate::systems::context::{SchedulerCtx, WorkerCtx};
use crate::systems::stack::{TaskKind, TaskStack};
use crate::systems::treasury::{return_gold_to_treasury, treasury_check_due};
use crate::world::grid::GridPos;
use crate::world::items::{CrateFlavor, DigKind, SpellFlavor};
use crate::world::rooms::RoomKind;

/// 走査を打ち切った理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// 必要な部屋が無い・満杯・到達不能
    ResourceShortage,
    /// 対象が生成時から消えていた・取り合いに負けた
    StaleTarget,
    /// 経路が引けなかった。より深い到達性の問題が疑われるので
    /// この tick はこれ以上スタックを漁らない
    PathFailure,
}

/// `consume_stack` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Dispatched,
    Aborted(AbortReason),
    Exhausted,
}

/// 移動をコミットしてミッションを確定する共通処理
///
/// プランナが経路を引けなければ false（ミッションは触らない）。
pub(crate) fn commit_move(
    ctx: &mut SchedulerCtx,
    worker: &mut WorkerCtx,
    dest: GridPos,
    with_storage: bool,
    continuation: Continuation,
) -> bool {
    if !ctx
        .planner
        .plan_approach_and_move(worker.entity, worker.pos, dest, with_storage)
    {
        return false;
    }
    worker.mission.clear();
    worker.mission.continuation = continuation;
    worker.mission.target_tile = Some(dest);
    ctx.claims.record(worker.entity, dest);
    ctx.outbox.dispatches.push(TaskDispatched {
        digger: worker.entity,
        colony: ctx.colony,
        continuation,
        target: dest,
    });
    true
}

/// カーソル位置から共有スタックを走査し、最初に払い出せたタスクで
/// ワーカーをコミットする
pub fn consume_stack(
    ctx: &mut SchedulerCtx,
    worker: &mut WorkerCtx,
    stack: &mut TaskStack,
) -> DispatchResult {
    // 世代スタンプの同期。スタックが作り直されていたら先頭から読み直す
    if worker.cursor.stack_tick != stack.last_refresh_tick {
        worker.cursor.stack_tick = stack.last_refresh_tick;
        worker.cursor.index = 0;
    }
    // 上流の不変量違反からの回復。tick を落とすほどのことではない
    if stack.len > STACK_MAX_TASKS {
        error!(
            "DISPATCH: stack length {} out of range, clamping to {}",
            stack.len, STACK_MAX_TASKS
        );
        stack.len = STACK_MAX_TASKS;
    }

    while worker.cursor.index < stack.len {
        let slot = worker.cursor.index;
        let entry = stack.entries[slot];
        worker.cursor.index += 1;

        match entry.kind {
            TaskKind::None => {}

            TaskKind::ImproveDungeon => {
                if !ctx.terrain.slab_improvable(ctx.colony, entry.pos) {
                    stack.entries[slot].kind = TaskKind::None;
                    continue;
                }
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    continue;
                }
                if !commit_move(ctx, worker, entry.pos, false, Continuation::ArriveAtImprove) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.work_tile = Some(entry.pos);
                worker.cursor.last_job = LastJob::ImproveConvert;
                return DispatchResult::Dispatched;
            }

            TaskKind::ConvertDungeon => {
                if !ctx.terrain.slab_convertible(ctx.colony, entry.pos) {
                    stack.entries[slot].kind = TaskKind::None;
                    continue;
                }
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    continue;
                }
                if !commit_move(ctx, worker, entry.pos, false, Continuation::ArriveAtConvert) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.work_tile = Some(entry.pos);
                worker.cursor.last_job = LastJob::ImproveConvert;
                return DispatchResult::Dispatched;
            }

            TaskKind::ReinforceWall => {
                // 金庫チェックの期限が切れていたらここで差し込む。
                // カーソルを戻して同じエントリを次回に再試行する
                if treasury_check_due(worker.cursor, ctx.tick) {
                    worker.cursor.index -= 1;
                    worker.cursor.last_treasury_check_tick = ctx.tick;
                    let _ = return_gold_to_treasury(ctx, worker);
                    return DispatchResult::Dispatched;
                }
                if !ctx.terrain.slab_reinforceable(ctx.colony, entry.pos) {
                    stack.entries[slot].kind = TaskKind::None;
                    continue;
                }
                let Some(stand) = ctx.terrain.uncrowded_reinforce_stand(entry.pos) else {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                };
                if !commit_move(ctx, worker, stand, false, Continuation::ArriveAtReinforce) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.work_tile = Some(entry.pos);
                worker.cursor.last_job = LastJob::Reinforce;
                return DispatchResult::Dispatched;
            }

            TaskKind::PickUpUnconscious => {
                // 収監する方針でなければエントリは残したまま飛ばす
                if !ctx.world.colony_has_room(ctx.colony, RoomKind::Prison)
                    || !ctx.tends_to_imprison
                {
                    continue;
                }
                if ctx
                    .world
                    .nearest_reachable_room_with_spare_capacity(
                        &*ctx.planner,
                        worker.entity,
                        worker.pos,
                        ctx.colony,
                        RoomKind::Prison,
                        1,
                    )
                    .is_none()
                {
                    if !ctx
                        .world
                        .any_room_with_spare_capacity(ctx.colony, RoomKind::Prison, 1)
                    {
                        ctx.notifier.owner_message(
                            ctx.outbox,
                            ctx.tick,
                            ctx.colony,
                            ctx.colony_observed,
                            NoticeKind::PrisonTooSmall,
                            NOTICE_THROTTLE_TICKS,
                            true,
                        );
                    }
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::ResourceShortage);
                }
                let Some(body) = ctx.world.unconscious_body_at(entry.pos).map(|b| b.entity)
                else {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                };
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                }
                if !commit_move(ctx, worker, entry.pos, false, Continuation::PickUpUnconscious) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.target_entity = Some(body);
                return DispatchResult::Dispatched;
            }

            TaskKind::PickUpCorpse => {
                if !ctx.world.colony_has_room(ctx.colony, RoomKind::Graveyard) {
                    continue;
                }
                if ctx
                    .world
                    .nearest_reachable_room_with_spare_capacity(
                        &*ctx.planner,
                        worker.entity,
                        worker.pos,
                        ctx.colony,
                        RoomKind::Graveyard,
                        1,
                    )
                    .is_none()
                {
                    if !ctx
                        .world
                        .any_room_with_spare_capacity(ctx.colony, RoomKind::Graveyard, 1)
                    {
                        ctx.notifier.owner_message(
                            ctx.outbox,
                            ctx.tick,
                            ctx.colony,
                            ctx.colony_observed,
                            NoticeKind::GraveyardTooSmall,
                            NOTICE_THROTTLE_TICKS,
                            true,
                        );
                    }
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::ResourceShortage);
                }
                let Some(corpse) = ctx.world.corpse_at(entry.pos).map(|c| c.entity) else {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                };
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                }
                if !commit_move(ctx, worker, entry.pos, false, Continuation::PickUpCorpse) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.target_entity = Some(corpse);
                return DispatchResult::Dispatched;
            }

            TaskKind::PickUpSpellObject => {
                if !ctx.world.colony_has_room(ctx.colony, RoomKind::Library) {
                    continue;
                }
                if ctx
                    .world
                    .nearest_reachable_room_with_spare_item_capacity(
                        &*ctx.planner,
                        worker.entity,
                        worker.pos,
                        ctx.colony,
                        RoomKind::Library,
                    )
                    .is_none()
                {
                    if !ctx
                        .world
                        .any_room_with_spare_item_capacity(ctx.colony, RoomKind::Library)
                    {
                        ctx.notifier.owner_message(
                            ctx.outbox,
                            ctx.tick,
                            ctx.colony,
                            ctx.colony_observed,
                            NoticeKind::LibraryTooSmall,
                            NOTICE_THROTTLE_TICKS,
                            true,
                        );
                    }
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::ResourceShortage);
                }
                let Some(spell) = ctx.world.spell_at(entry.pos).copied() else {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                };
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                }
                if !commit_move(ctx, worker, entry.pos, false, Continuation::PickUpSpellObject) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.target_entity = Some(spell.entity);
                let event = match spell.flavor {
                    SpellFlavor::Spellbook => WorldEventKind::SpellbookFound,
                    SpellFlavor::SpecialBox => WorldEventKind::SpecialBoxFound,
                };
                ctx.notifier.world_event(
                    ctx.outbox,
                    ctx.tick,
                    ctx.colony,
                    event,
                    Some(entry.pos),
                    Some(spell.entity),
                    true,
                );
                return DispatchResult::Dispatched;
            }

            TaskKind::PickUpTrapObjectForArming => {
                let Some(crate_view) = ctx.world.crate_at(entry.pos).copied() else {
                    stack.entries[slot].kind = TaskKind::None;
                    continue;
                };
                if crate_view.flavor != CrateFlavor::Trap {
                    continue;
                }
                let claims = &*ctx.claims;
                let Some(trap) = ctx
                    .world
                    .empty_trap_for_model(ctx.colony, crate_view.model, |t| {
                        claims.arming_in_progress(t)
                    })
                    .map(|t| t.entity)
                else {
                    continue;
                };
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    continue;
                }
                if !commit_move(ctx, worker, entry.pos, false, Continuation::PickUpTrapCrate) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.target_entity = Some(crate_view.entity);
                worker.mission.arming_trap = Some(trap);
                ctx.claims.record_arming(worker.entity, trap);
                return DispatchResult::Dispatched;
            }

            TaskKind::PickUpTrapForWorkshop => {
                if !ctx.world.colony_has_room(ctx.colony, RoomKind::Workshop) {
                    continue;
                }
                if ctx
                    .world
                    .nearest_reachable_room_with_spare_item_capacity(
                        &*ctx.planner,
                        worker.entity,
                        worker.pos,
                        ctx.colony,
                        RoomKind::Workshop,
                    )
                    .is_none()
                {
                    if !ctx
                        .world
                        .any_room_with_spare_item_capacity(ctx.colony, RoomKind::Workshop)
                    {
                        ctx.notifier.owner_message(
                            ctx.outbox,
                            ctx.tick,
                            ctx.colony,
                            ctx.colony_observed,
                            NoticeKind::WorkshopTooSmall,
                            NOTICE_THROTTLE_TICKS,
                            true,
                        );
                    }
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::ResourceShortage);
                }
                let Some(crate_view) = ctx.world.crate_at(entry.pos).copied() else {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                };
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                }
                if !commit_move(
                    ctx,
                    worker,
                    entry.pos,
                    false,
                    Continuation::PickUpCrateForWorkshop,
                ) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.target_entity = Some(crate_view.entity);
                let event = match crate_view.flavor {
                    CrateFlavor::Trap => WorldEventKind::TrapCrateFound,
                    CrateFlavor::Door => WorldEventKind::DoorCrateFound,
                };
                ctx.notifier.world_event(
                    ctx.outbox,
                    ctx.tick,
                    ctx.colony,
                    event,
                    Some(entry.pos),
                    Some(crate_view.entity),
                    true,
                );
                return DispatchResult::Dispatched;
            }

            TaskKind::DigOrMine => {
                let Some(dig) = ctx.world.dig_at(ctx.colony, entry.pos).copied() else {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::StaleTarget);
                };
                let Some(stand) = dig_approach_position(ctx, worker, entry.pos) else {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                };
                let continuation = match dig.kind {
                    DigKind::Dig => Continuation::ArriveAtDig,
                    DigKind::Mine => Continuation::ArriveAtMine,
                };
                if !commit_move(ctx, worker, stand, false, continuation) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.dig_designation = Some(dig.entity);
                worker.mission.work_tile = Some(entry.pos);
                worker.cursor.last_dig_target = Some(entry.pos);
                worker.cursor.last_job = LastJob::Dig;
                return DispatchResult::Dispatched;
            }

            TaskKind::PickUpGoldPile => {
                // 既に積載上限なら拾わず、返納の好機として扱う
                if worker.digger.gold_carried >= worker.digger.gold_capacity {
                    if treasury_check_due(worker.cursor, ctx.tick) {
                        worker.cursor.last_treasury_check_tick = ctx.tick;
                        let _ = return_gold_to_treasury(ctx, worker);
                    }
                    return DispatchResult::Dispatched;
                }
                let Some(pile) = ctx.world.gold_pile_at(entry.pos).map(|g| g.entity) else {
                    stack.entries[slot].kind = TaskKind::None;
                    continue;
                };
                if ctx.claims.converging_on(worker.entity, entry.pos) {
                    continue;
                }
                if !commit_move(ctx, worker, entry.pos, false, Continuation::PickUpGoldPile) {
                    stack.entries[slot].kind = TaskKind::None;
                    return DispatchResult::Aborted(AbortReason::PathFailure);
                }
                worker.mission.target_entity = Some(pile);
                return DispatchResult::Dispatched;
            }
        }
    }
    DispatchResult::Exhausted
}
