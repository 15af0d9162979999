//! 部屋コンポーネント
//!
//! 容量の帳簿付け（使用量の増減）はホスト側の責務。スケジューラは
//! 空き容量を読むだけ。

use bevy::prelude::*;

/// スケジューラが区別する部屋種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKind {
    Treasury,
    Prison,
    Graveyard,
    Library,
    Workshop,
    TrainingRoom,
}

/// 部屋エンティティに付与される容量ビュー
///
/// `capacity` はクリーチャー/金の収容数、`item_capacity` は
/// 納品物（呪文書・罠クレートなど）の収容数。
#[derive(Component, Debug, Clone, Copy)]
pub struct Room {
    pub kind: RoomKind,
    pub used_capacity: u32,
    pub total_capacity: u32,
    pub used_item_capacity: u32,
    pub total_item_capacity: u32,
}

impl Room {
    pub fn spare_capacity(&self) -> u32 {
        self.total_capacity.saturating_sub(self.used_capacity)
    }

    pub fn spare_item_capacity(&self) -> u32 {
        self.total_item_capacity.saturating_sub(self.used_item_capacity)
    }
}
