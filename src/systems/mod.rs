//! スケジューラのシステム群
//!
//! 実行順: Tick（シミュレーション時刻の前進） → Select（仕事選択）。
//! どちらも Update スケジュール上で動き、1 回のスケジュール実行が
//! 1 シミュレーション tick に相当する。

use bevy::prelude::*;

pub mod approach;
pub mod claims;
pub mod consume;
pub mod context;
pub mod continuity;
pub mod notify;
pub mod selection;
pub mod spiral;
pub mod stack;
pub mod treasury;

/// スケジューラのフェーズ
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerSet {
    Tick,
    Select,
}

/// シミュレーション tick カウンタ
///
/// リフレッシュ間隔・金庫チェック間隔・通知スロットルはすべて
/// このカウンタを基準にする。
#[derive(Resource, Debug, Default)]
pub struct SimTick(pub u64);

pub fn advance_sim_tick_system(mut tick: ResMut<SimTick>) {
    tick.0 += 1;
}
