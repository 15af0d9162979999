//! グリッド座標と方位の基本型

use bevy::prelude::*;

/// タイルグリッド上の座標
///
/// ワールド側エンティティ（死体・金塊・指定など）とワーカーの双方に
/// コンポーネントとして付与される。スケジューラ内部の計算もすべて
/// この座標系で行う。
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[reflect(Component)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 方位デルタ分ずらした座標を返す
    pub fn offset(self, delta: (i32, i32)) -> Self {
        Self {
            x: self.x + delta.0,
            y: self.y + delta.1,
        }
    }

    /// 方位デルタを scale 倍してずらした座標を返す
    pub fn offset_scaled(self, delta: (i32, i32), scale: i32) -> Self {
        Self {
            x: self.x + delta.0 * scale,
            y: self.y + delta.1 * scale,
        }
    }

    /// グリッド距離の二乗（部屋の最近傍判定用）
    pub fn distance_sq(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// 4方位の巡回順。スパイラル探索と接近位置導出が共有する
pub const CARDINALS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
