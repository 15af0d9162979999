//! スケジューラが発行するメッセージ
//!
//! 通知 UI・イベントログはこのクレートの外側。ここではメッセージを
//! 流すだけで、表示・音声はホストが解釈する。

use bevy::prelude::*;

use crate::entities::digger::Continuation;
use crate::world::grid::GridPos;

/// 不足通知の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    TreasuryNeeded,
    NoRouteToTreasury,
    TreasuryTooSmall,
    GraveyardTooSmall,
    PrisonTooSmall,
    LibraryTooSmall,
    WorkshopTooSmall,
    TrainingTooSmall,
}

/// 資源不足のユーザー向け通知（スロットル済み）
#[derive(Message, Debug, Clone)]
pub struct ShortageNotice {
    pub colony: Entity,
    pub kind: NoticeKind,
    pub important: bool,
}

/// ワールドイベントの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEventKind {
    TreasuryNeeded,
    TreasuryFull,
    SpellbookFound,
    SpecialBoxFound,
    TrapCrateFound,
    DoorCrateFound,
}

/// マップ上のイベント発生要求
#[derive(Message, Debug, Clone)]
pub struct WorldEventRequest {
    pub colony: Entity,
    pub kind: WorldEventKind,
    pub pos: Option<GridPos>,
    pub related: Option<Entity>,
    pub important: bool,
}

/// ワーカーにタスクが割り当てられた
#[derive(Message, Debug, Clone)]
pub struct TaskDispatched {
    pub digger: Entity,
    pub colony: Entity,
    pub continuation: Continuation,
    pub target: GridPos,
}

/// コロニーのタスクスタックが再生成された
#[derive(Message, Debug, Clone)]
pub struct StackRefreshed {
    pub colony: Entity,
    pub tick: u64,
    pub tasks: usize,
}
