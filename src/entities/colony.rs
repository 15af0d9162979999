//! コロニー（タスクスタックの所有者）

use bevy::prelude::*;

/// コロニーエンティティのマーカー兼ポリシーフラグ
///
/// コロニーには `TaskStack` と `ReinforceStaging` を併せて付与すること。
#[derive(Component, Debug, Clone, Copy)]
pub struct Colony {
    /// 主観測者（プレイヤー）のコロニーか。不足通知はこのフラグが
    /// 立っているコロニーにだけ出す
    pub observed: bool,
    /// 気絶した敵を収監する方針か。PickUpUnconscious の前提条件
    pub tends_to_imprison: bool,
}

impl Default for Colony {
    fn default() -> Self {
        Self {
            observed: false,
            tends_to_imprison: true,
        }
    }
}
