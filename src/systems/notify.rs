//! スロットル付き通知
//!
//! 同じ不足を毎 tick 連呼しないよう、(コロニー, 種別) ごとに
//! 最終発行 tick を覚えて窓内の再発行を抑止する。

use bevy::prelude::*;
use std::collections::HashMap;

use crate::events::{
    NoticeKind, ShortageNotice, StackRefreshed, TaskDispatched, WorldEventKind, WorldEventRequest,
};
use crate::world::grid::GridPos;

/// 選択システムの 1 回分の出力バッファ。終了時にメッセージへ排出する
#[derive(Debug, Default)]
pub struct Outbox {
    pub notices: Vec<ShortageNotice>,
    pub events: Vec<WorldEventRequest>,
    pub dispatches: Vec<TaskDispatched>,
    pub refreshes: Vec<StackRefreshed>,
}

/// 通知スロットルの帳簿
#[derive(Resource, Debug, Default)]
pub struct Notifier {
    last_notice: HashMap<(Entity, NoticeKind), u64>,
    last_event: HashMap<(Entity, WorldEventKind), u64>,
}

impl Notifier {
    /// 主観測者向けの不足通知。`window == 0` はスロットルなし
    #[allow(clippy::too_many_arguments)]
    pub fn owner_message(
        &mut self,
        outbox: &mut Outbox,
        tick: u64,
        colony: Entity,
        observed: bool,
        kind: NoticeKind,
        window: u64,
        important: bool,
    ) {
        if !observed {
            return;
        }
        if window > 0 {
            if let Some(&last) = self.last_notice.get(&(colony, kind)) {
                if tick.saturating_sub(last) < window {
                    return;
                }
            }
        }
        self.last_notice.insert((colony, kind), tick);
        outbox.notices.push(ShortageNotice {
            colony,
            kind,
            important,
        });
    }

    /// ワールドイベントの発生要求。近接した同種イベントは窓内でまとめる
    #[allow(clippy::too_many_arguments)]
    pub fn world_event(
        &mut self,
        outbox: &mut Outbox,
        tick: u64,
        colony: Entity,
        kind: WorldEventKind,
        pos: Option<GridPos>,
        related: Option<Entity>,
        important: bool,
    ) {
        if let Some(&last) = self.last_event.get(&(colony, kind)) {
            if tick.saturating_sub(last) < crate::constants::NOTICE_THROTTLE_TICKS {
                return;
            }
        }
        self.last_event.insert((colony, kind), tick);
        outbox.events.push(WorldEventRequest {
            colony,
            kind,
            pos,
            related,
            important,
        });
    }
}
