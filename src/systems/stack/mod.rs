//! コロニー共有のタスクスタックと再生成スケジューラ
//!
//! スタックは差分更新しない。リフレッシュのたびに全消去してから
//! ジェネレータ群で作り直す（部分状態を他ワーカーに見せないため）。

pub mod generators;

use bevy::prelude::*;

use crate::constants::{REINFORCE_STAGING_MAX, STACK_MAX_TASKS, STACK_REFRESH_INTERVAL};
use crate::events::StackRefreshed;
use crate::systems::context::SchedulerCtx;
use crate::world::grid::GridPos;

/// スタックに積まれるタスクの種別
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskKind {
    #[default]
    None,
    DigOrMine,
    ImproveDungeon,
    ConvertDungeon,
    ReinforceWall,
    PickUpUnconscious,
    PickUpCorpse,
    PickUpSpellObject,
    PickUpTrapObjectForArming,
    PickUpTrapForWorkshop,
    PickUpGoldPile,
}

/// スタックの 1 スロット。消費済み・失効は kind を None に戻す
#[derive(Reflect, Debug, Clone, Copy, Default)]
pub struct TaskEntry {
    pub pos: GridPos,
    pub kind: TaskKind,
}

/// コロニーごとの固定容量タスクスタック
///
/// `len` を超えるスロットは失効扱い。リフレッシュ間は読み取り専用で、
/// 全ワーカーが同じ内容を観測する（消費時の None 化だけが例外）。
#[derive(Component, Debug)]
pub struct TaskStack {
    pub entries: [TaskEntry; STACK_MAX_TASKS],
    pub len: usize,
    pub last_refresh_tick: u64,
    ever_refreshed: bool,
}

impl Default for TaskStack {
    fn default() -> Self {
        Self {
            entries: [TaskEntry::default(); STACK_MAX_TASKS],
            len: 0,
            last_refresh_tick: 0,
            ever_refreshed: false,
        }
    }
}

impl TaskStack {
    pub fn is_full(&self) -> bool {
        self.len >= STACK_MAX_TASKS
    }

    /// 空きがあれば積む。満杯なら何もしない（バックプレッシャー）
    pub fn push(&mut self, pos: GridPos, kind: TaskKind) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries[self.len] = TaskEntry { pos, kind };
        self.len += 1;
        true
    }

    /// 全スロットを None 化して長さを 0 に戻し、世代スタンプを進める
    pub fn reset(&mut self, tick: u64) {
        for entry in self.entries.iter_mut().take(self.len) {
            entry.kind = TaskKind::None;
        }
        self.len = 0;
        self.last_refresh_tick = tick;
        self.ever_refreshed = true;
    }

    /// 再生成が必要か（スロットル判定）
    pub fn refresh_due(&self, tick: u64) -> bool {
        !self.ever_refreshed
            || tick.saturating_sub(self.last_refresh_tick) >= STACK_REFRESH_INTERVAL
    }

    /// 現スタック中の生きている補強タスク数
    pub fn reinforce_backlog(&self) -> usize {
        self.entries
            .iter()
            .take(self.len.min(STACK_MAX_TASKS))
            .filter(|e| e.kind == TaskKind::ReinforceWall)
            .count()
    }
}

/// 補強位置のステージングリスト
///
/// 整地/転換スイープが生産者となって補強対象を貯め、リフレッシュの
/// 最後にメインスタックへ挿入順のまま合流する。
#[derive(Component, Debug, Default)]
pub struct ReinforceStaging {
    pub entries: Vec<GridPos>,
}

impl ReinforceStaging {
    pub fn is_full(&self) -> bool {
        self.entries.len() >= REINFORCE_STAGING_MAX
    }

    pub fn push(&mut self, pos: GridPos) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(pos);
        true
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// リフレッシュ間隔が明けていればスタックを丸ごと再生成する
///
/// 戻り値は実際に再生成したかどうか。ジェネレータは固定の優先順で
/// 呼ばれ、どれも残容量を見ながら積む（容量プールは全員で共有）。
pub fn refresh_stack_if_due(
    ctx: &mut SchedulerCtx,
    stack: &mut TaskStack,
    staging: &mut ReinforceStaging,
) -> bool {
    if !stack.refresh_due(ctx.tick) {
        return false;
    }
    stack.reset(ctx.tick);
    staging.reset();

    generators::add_unconscious_bodies(ctx, stack, crate::constants::QUOTA_UNCONSCIOUS);
    generators::add_unclaimed_corpses(ctx, stack, crate::constants::QUOTA_CORPSES);
    generators::add_unclaimed_spell_objects(ctx, stack, crate::constants::QUOTA_SPELLS);
    generators::add_empty_traps(ctx, stack, crate::constants::QUOTA_EMPTY_TRAPS);
    generators::add_dig_designations(ctx, stack, crate::constants::QUOTA_DIG);
    generators::add_improve_convert_sweep(ctx, stack, staging);
    generators::add_unclaimed_gold_piles(ctx, stack);
    generators::add_workshop_crates(ctx, stack);
    generators::add_staged_reinforcements(stack, staging);

    debug!(
        "STACK: colony {:?} rebuilt with {} tasks at tick {}",
        ctx.colony, stack.len, ctx.tick
    );
    ctx.outbox.refreshes.push(StackRefreshed {
        colony: ctx.colony,
        tick: ctx.tick,
        tasks: stack.len,
    });
    true
}
