//! 直前ジョブ継続ヒューリスティック
//!
//! 共有スタックに頼る前に、直前にやっていたカテゴリの仕事を現在地の
//! 近傍から探す。移動の無駄を減らすための局所性バイアスで、見つかった
//! 仕事のカテゴリ（試したカテゴリと違うこともある）を記録して返す。

use rand::Rng;

use crate::constants::{
    REINFORCE_BACKLOG_MIN, SPIRAL_AREA_MAX_CELLS, SPIRAL_LOCAL_MAX_CELLS, WORLD_SCAN_CEILING,
};
use bevy::prelude::*;

use crate::entities::digger::{Continuation, LastJob};
use crate::events::NoticeKind;
use crate::systems::approach::dig_approach_position;
use crate::systems::consume::commit_move;
use crate::systems::context::{SchedulerCtx, WorkerCtx};
use crate::systems::spiral::spiral_search;
use crate::systems::stack::{ReinforceStaging, TaskStack, refresh_stack_if_due};
use crate::world::grid::{CARDINALS, GridPos};
use crate::world::items::DigKind;
use crate::world::rooms::RoomKind;
use crate::world::snapshot::DigView;

/// 直前のジョブカテゴリに従って近場の仕事を探す
///
/// 見つかれば `last_job` を実際に見つかったカテゴリへ更新して true。
/// どの枝も不発なら `last_job` を `None` に戻して false を返し、
/// 呼び出し側はスタック消費へ進む。
pub fn continue_last_job(
    ctx: &mut SchedulerCtx,
    worker: &mut WorkerCtx,
    stack: &mut TaskStack,
    staging: &mut ReinforceStaging,
) -> bool {
    match worker.cursor.last_job {
        LastJob::None => return false,

        LastJob::Dig => {
            if check_out_undug_place(ctx, worker) || check_out_undug_area(ctx, worker) {
                worker.cursor.last_job = LastJob::Dig;
                return true;
            }
            if check_out_convert_place(ctx, worker) || check_out_improve_place(ctx, worker) {
                worker.cursor.last_job = LastJob::ImproveConvert;
                return true;
            }
            // 掘り尽くした。スタックを作り直してから広域で整地を探す
            refresh_stack_if_due(ctx, stack, staging);
            if search_improve_convert_area(ctx, worker) {
                worker.cursor.last_job = LastJob::ImproveConvert;
                return true;
            }
        }

        LastJob::ImproveConvert => {
            if check_out_convert_place(ctx, worker) || check_out_improve_place(ctx, worker) {
                worker.cursor.last_job = LastJob::ImproveConvert;
                return true;
            }
            refresh_stack_if_due(ctx, stack, staging);
            if search_improve_convert_area(ctx, worker) {
                worker.cursor.last_job = LastJob::ImproveConvert;
                return true;
            }
            // 整地も尽きたら広域の掘削へカテゴリを切り替える
            if check_out_undug_area(ctx, worker) {
                worker.cursor.last_job = LastJob::Dig;
                return true;
            }
        }

        LastJob::Reinforce => {
            refresh_stack_if_due(ctx, stack, staging);
            // 自分のスナップショット以降にスタックが更新されていて、
            // かつ補強バックログが十分残っているときだけ続行する
            let refreshed_since_snapshot = stack.last_refresh_tick != worker.cursor.stack_tick;
            if refreshed_since_snapshot
                && stack.reinforce_backlog() >= REINFORCE_BACKLOG_MIN
                && (check_out_reinforce_place(ctx, worker)
                    || check_out_reinforce_area(ctx, worker))
            {
                worker.cursor.last_job = LastJob::Reinforce;
                return true;
            }
        }

        LastJob::Train => {
            if worker.digger.trainable && worker.digger.training_affordable {
                let room = ctx
                    .world
                    .nearest_reachable_room_with_spare_capacity(
                        &*ctx.planner,
                        worker.entity,
                        worker.pos,
                        ctx.colony,
                        RoomKind::TrainingRoom,
                        1,
                    )
                    .map(|r| (r.entity, r.pos));
                if let Some((room_entity, room_pos)) = room {
                    if commit_move(
                        ctx,
                        worker,
                        room_pos,
                        false,
                        Continuation::ArriveAtTrainingRoom,
                    ) {
                        worker.mission.target_entity = Some(room_entity);
                        return true;
                    }
                } else if !ctx.world.any_room_with_spare_capacity(
                    ctx.colony,
                    RoomKind::TrainingRoom,
                    1,
                ) {
                    // どこにも空きが無いときだけ知らせる（経路切れは黙る）
                    ctx.notifier.owner_message(
                        ctx.outbox,
                        ctx.tick,
                        ctx.colony,
                        ctx.colony_observed,
                        NoticeKind::TrainingTooSmall,
                        0,
                        true,
                    );
                }
            }
        }
    }

    worker.cursor.last_job = LastJob::None;
    false
}

// ============================================================
// 掘削の継続
// ============================================================

/// 直前の掘削目標の隣接 4 方位に残っている指定を探す
fn check_out_undug_place(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    let Some(origin) = worker.cursor.last_dig_target else {
        return false;
    };
    let mut dir = ctx.rng.gen_range(0..4usize);
    for _ in 0..4 {
        let neighbour = origin.offset(CARDINALS[dir]);
        if let Some(dig) = ctx.world.dig_at(ctx.colony, neighbour).copied() {
            if try_dig(ctx, worker, &dig) {
                return true;
            }
        }
        dir = (dir + 1) % 4;
    }
    false
}

/// コロニーの指定リスト全体から請け負える掘削を探す
fn check_out_undug_area(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    let world = ctx.world;
    for (i, dig) in world.digs.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("CONTINUITY: dig designation scan exceeded ceiling, aborting scan");
            break;
        }
        if dig.owner != ctx.colony {
            continue;
        }
        if !ctx.terrain.tile_revealed(ctx.colony, dig.pos) {
            continue;
        }
        let dig = *dig;
        if try_dig(ctx, worker, &dig) {
            return true;
        }
    }
    false
}

fn try_dig(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx, dig: &DigView) -> bool {
    let Some(stand) = dig_approach_position(ctx, worker, dig.pos) else {
        return false;
    };
    let continuation = match dig.kind {
        DigKind::Dig => Continuation::ArriveAtDig,
        DigKind::Mine => Continuation::ArriveAtMine,
    };
    if !commit_move(ctx, worker, stand, false, continuation) {
        return false;
    }
    worker.mission.dig_designation = Some(dig.entity);
    worker.mission.work_tile = Some(dig.pos);
    worker.cursor.last_dig_target = Some(dig.pos);
    true
}

// ============================================================
// 整地・転換の継続
// ============================================================

/// 転換スポットとして使えるなら移動をコミットする
fn try_convert_spot(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx, tile: GridPos) -> bool {
    if !ctx.terrain.slab_convertible(ctx.colony, tile) {
        return false;
    }
    if ctx.claims.converging_on(worker.entity, tile) {
        return false;
    }
    if !commit_move(ctx, worker, tile, false, Continuation::ArriveAtConvert) {
        return false;
    }
    worker.mission.work_tile = Some(tile);
    true
}

fn try_improve_spot(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx, tile: GridPos) -> bool {
    if !ctx.terrain.slab_improvable(ctx.colony, tile) {
        return false;
    }
    if ctx.claims.converging_on(worker.entity, tile) {
        return false;
    }
    if !commit_move(ctx, worker, tile, false, Continuation::ArriveAtImprove) {
        return false;
    }
    worker.mission.work_tile = Some(tile);
    true
}

/// 現在地とその近傍リングで転換対象を探す
fn check_out_convert_place(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    let origin = worker.pos;
    if try_convert_spot(ctx, worker, origin) {
        return true;
    }
    let start = ctx.rng.gen_range(0..4usize);
    spiral_search(origin, start, SPIRAL_LOCAL_MAX_CELLS, |tile| {
        try_convert_spot(ctx, worker, tile)
    })
    .is_some()
}

/// 現在地とその近傍リングで整地対象を探す
fn check_out_improve_place(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    let origin = worker.pos;
    if try_improve_spot(ctx, worker, origin) {
        return true;
    }
    let start = ctx.rng.gen_range(0..4usize);
    spiral_search(origin, start, SPIRAL_LOCAL_MAX_CELLS, |tile| {
        try_improve_spot(ctx, worker, tile)
    })
    .is_some()
}

/// 広域スパイラルで整地・転換のどちらかを探す
fn search_improve_convert_area(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    let start = ctx.rng.gen_range(0..4usize);
    let origin = worker.pos;
    spiral_search(origin, start, SPIRAL_AREA_MAX_CELLS, |tile| {
        try_convert_spot(ctx, worker, tile) || try_improve_spot(ctx, worker, tile)
    })
    .is_some()
}

// ============================================================
// 補強の継続
// ============================================================

fn try_reinforce_spot(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx, tile: GridPos) -> bool {
    if !ctx.terrain.slab_reinforceable(ctx.colony, tile) {
        return false;
    }
    let Some(stand) = ctx.terrain.uncrowded_reinforce_stand(tile) else {
        return false;
    };
    if ctx.claims.converging_on(worker.entity, stand) {
        return false;
    }
    if !commit_move(ctx, worker, stand, false, Continuation::ArriveAtReinforce) {
        return false;
    }
    worker.mission.work_tile = Some(tile);
    true
}

fn check_out_reinforce_place(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    let start = ctx.rng.gen_range(0..4usize);
    let origin = worker.pos;
    spiral_search(origin, start, SPIRAL_LOCAL_MAX_CELLS, |tile| {
        try_reinforce_spot(ctx, worker, tile)
    })
    .is_some()
}

fn check_out_reinforce_area(ctx: &mut SchedulerCtx, worker: &mut WorkerCtx) -> bool {
    let start = ctx.rng.gen_range(0..4usize);
    let origin = worker.pos;
    spiral_search(origin, start, SPIRAL_AREA_MAX_CELLS, |tile| {
        try_reinforce_spot(ctx, worker, tile)
    })
    .is_some()
}
