//! タスクジェネレータ群
//!
//! リフレッシュのたびに固定の優先順で呼ばれ、それぞれ担当カテゴリの
//! ワールドコレクションを走査して適格なタスクを積む。容量プールは
//! 全ジェネレータで共有なので、候補ごとに残容量を確認する。
//! 生成時に重複排除はしない（消費時の再検証に任せる方が安い）。

use bevy::prelude::*;

use crate::constants::WORLD_SCAN_CEILING;
use crate::events::NoticeKind;
use crate::systems::context::SchedulerCtx;
use crate::systems::stack::{ReinforceStaging, TaskKind, TaskStack};
use crate::world::grid::GridPos;
use crate::world::items::CrateFlavor;
use crate::world::rooms::RoomKind;

/// 気絶した敵クリーチャーの回収タスク
pub(crate) fn add_unconscious_bodies(
    ctx: &mut SchedulerCtx,
    stack: &mut TaskStack,
    quota: usize,
) -> usize {
    let mut added = 0;
    for (i, body) in ctx.world.unconscious.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("STACK: unconscious body scan exceeded ceiling, aborting scan");
            break;
        }
        if added >= quota || stack.is_full() {
            break;
        }
        // 自コロニーのクリーチャーは収監対象ではない
        if body.owner == ctx.colony {
            continue;
        }
        if !ctx.terrain.tile_revealed(ctx.colony, body.pos) {
            continue;
        }
        stack.push(body.pos, TaskKind::PickUpUnconscious);
        added += 1;
    }
    added
}

/// 死体の墓地搬送タスク
///
/// 墓地が無ければ何も積まない。墓地はあるが空きが無い場合、最初の
/// 適格死体の時点で不足通知を出して走査を打ち切る。
pub(crate) fn add_unclaimed_corpses(
    ctx: &mut SchedulerCtx,
    stack: &mut TaskStack,
    quota: usize,
) -> usize {
    if !ctx.world.colony_has_room(ctx.colony, RoomKind::Graveyard) {
        debug!("STACK: colony {:?} has no graveyard", ctx.colony);
        return 0;
    }
    let has_space = ctx
        .world
        .any_room_with_spare_capacity(ctx.colony, RoomKind::Graveyard, 1);

    let mut added = 0;
    for (i, corpse) in ctx.world.corpses.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("STACK: corpse scan exceeded ceiling, aborting scan");
            break;
        }
        if added >= quota || stack.is_full() {
            break;
        }
        if !corpse.settled || !corpse.rottable || corpse.stored.is_some() {
            continue;
        }
        if !has_space {
            debug!("STACK: colony {:?} has no free graveyard space", ctx.colony);
            ctx.notifier.owner_message(
                ctx.outbox,
                ctx.tick,
                ctx.colony,
                ctx.colony_observed,
                NoticeKind::GraveyardTooSmall,
                crate::constants::NOTICE_THROTTLE_TICKS,
                true,
            );
            break;
        }
        if !ctx.terrain.tile_revealed(ctx.colony, corpse.pos) {
            continue;
        }
        stack.push(corpse.pos, TaskKind::PickUpCorpse);
        added += 1;
    }
    added
}

/// 床に落ちている呪文書・スペシャルボックスの回収タスク
pub(crate) fn add_unclaimed_spell_objects(
    ctx: &mut SchedulerCtx,
    stack: &mut TaskStack,
    quota: usize,
) -> usize {
    let mut added = 0;
    for (i, spell) in ctx.world.spells.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("STACK: spell object scan exceeded ceiling, aborting scan");
            break;
        }
        if added >= quota || stack.is_full() {
            break;
        }
        if spell.stored.is_some() {
            continue;
        }
        if !ctx.terrain.tile_revealed(ctx.colony, spell.pos) {
            continue;
        }
        stack.push(spell.pos, TaskKind::PickUpSpellObject);
        added += 1;
    }
    added
}

/// 再装填待ちの罠にクレートを運ぶタスク
///
/// タスクの位置は罠ではなくクレート側。対応するクレートが無い罠や、
/// 既に誰かが装填に向かっている罠は飛ばす。
pub(crate) fn add_empty_traps(ctx: &mut SchedulerCtx, stack: &mut TaskStack, quota: usize) -> usize {
    let mut added = 0;
    for (i, trap) in ctx.world.traps.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("STACK: trap scan exceeded ceiling, aborting scan");
            break;
        }
        if added >= quota || stack.is_full() {
            break;
        }
        if trap.owner != ctx.colony || trap.armed {
            continue;
        }
        if ctx.claims.arming_in_progress(trap.entity) {
            continue;
        }
        let matching_crate = ctx.world.crates.iter().find(|c| {
            c.flavor == CrateFlavor::Trap
                && c.model == trap.model
                && c.stored.is_none()
                && c.owner.is_none_or(|o| o == ctx.colony)
        });
        let Some(crate_view) = matching_crate else {
            continue;
        };
        stack.push(crate_view.pos, TaskKind::PickUpTrapObjectForArming);
        added += 1;
    }
    added
}

/// 採掘指定のタスク
pub(crate) fn add_dig_designations(
    ctx: &mut SchedulerCtx,
    stack: &mut TaskStack,
    quota: usize,
) -> usize {
    let mut added = 0;
    for (i, dig) in ctx.world.digs.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("STACK: dig designation scan exceeded ceiling, aborting scan");
            break;
        }
        if added >= quota || stack.is_full() {
            break;
        }
        if dig.owner != ctx.colony {
            continue;
        }
        if !ctx.terrain.tile_revealed(ctx.colony, dig.pos) {
            continue;
        }
        if !ctx.terrain.is_diggable_side(ctx.colony, dig.pos) {
            continue;
        }
        stack.push(dig.pos, TaskKind::DigOrMine);
        added += 1;
    }
    added
}

/// 整地・転換スイープ
///
/// クォータではなくマップ形状そのものが走査境界。行優先で全スラブを
/// 一巡し、転換対象を優先して積む。補強対象の壁はステージングへ送り、
/// 後段のジェネレータがメインスタックへ合流させる。端のスラブも
/// 通常の候補（範囲外アクセスは構造的に発生しない）。
pub(crate) fn add_improve_convert_sweep(
    ctx: &mut SchedulerCtx,
    stack: &mut TaskStack,
    staging: &mut ReinforceStaging,
) {
    let (width, height) = ctx.terrain.map_size();
    'sweep: for y in 0..height {
        for x in 0..width {
            if stack.is_full() && staging.is_full() {
                break 'sweep;
            }
            let tile = GridPos::new(x, y);
            if !stack.is_full() {
                if ctx.terrain.slab_convertible(ctx.colony, tile) {
                    stack.push(tile, TaskKind::ConvertDungeon);
                } else if ctx.terrain.slab_improvable(ctx.colony, tile) {
                    stack.push(tile, TaskKind::ImproveDungeon);
                }
            }
            if ctx.terrain.slab_reinforceable(ctx.colony, tile) {
                staging.push(tile);
            }
        }
    }
}

/// 床に落ちている金塊の回収タスク
pub(crate) fn add_unclaimed_gold_piles(ctx: &mut SchedulerCtx, stack: &mut TaskStack) -> usize {
    let mut added = 0;
    for (i, pile) in ctx.world.gold_piles.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("STACK: gold pile scan exceeded ceiling, aborting scan");
            break;
        }
        if stack.is_full() {
            break;
        }
        if pile.stored.is_some() {
            continue;
        }
        if !ctx.terrain.tile_revealed(ctx.colony, pile.pos) {
            continue;
        }
        stack.push(pile.pos, TaskKind::PickUpGoldPile);
        added += 1;
    }
    added
}

/// 工房へ納めるべき罠・扉クレートの回収タスク
///
/// 納品先（空きスロットのある工房）が無ければカテゴリごと諦める。
pub(crate) fn add_workshop_crates(ctx: &mut SchedulerCtx, stack: &mut TaskStack) -> usize {
    if !ctx.world.colony_has_room(ctx.colony, RoomKind::Workshop)
        || !ctx
            .world
            .any_room_with_spare_item_capacity(ctx.colony, RoomKind::Workshop)
    {
        return 0;
    }

    let mut added = 0;
    for (i, crate_view) in ctx.world.crates.iter().enumerate() {
        if i >= WORLD_SCAN_CEILING {
            error!("STACK: crate scan exceeded ceiling, aborting scan");
            break;
        }
        if stack.is_full() {
            break;
        }
        if !crate_view.owner.is_none_or(|o| o == ctx.colony) {
            continue;
        }
        if crate_view.stored == Some(RoomKind::Workshop) {
            continue;
        }
        if !ctx.terrain.tile_claimed_by(ctx.colony, crate_view.pos) {
            continue;
        }
        stack.push(crate_view.pos, TaskKind::PickUpTrapForWorkshop);
        added += 1;
    }
    added
}

/// ステージング済み補強位置をメインスタックへ合流させる
pub(crate) fn add_staged_reinforcements(
    stack: &mut TaskStack,
    staging: &ReinforceStaging,
) -> usize {
    let mut added = 0;
    for pos in &staging.entries {
        if stack.is_full() {
            break;
        }
        stack.push(*pos, TaskKind::ReinforceWall);
        added += 1;
    }
    added
}
