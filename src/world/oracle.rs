//! 外部コラボレータの接合面
//!
//! 地形述語と経路プランナはこのクレートの外側（ホストゲーム）が実装する。
//! スケジューラは問い合わせるだけで、地形表現や経路探索そのものは持たない。

use bevy::prelude::*;

use crate::world::grid::GridPos;

/// タイル述語レイヤ
///
/// 「このタイルは掘れるか」「このコロニーに可視か」といった空間判定を
/// 答える。判定の実体（スラブ種別、視界計算など）はホスト側にある。
pub trait SpatialPredicates: Send + Sync {
    /// スラブグリッドの寸法 (幅, 高さ)。スイープ走査の境界になる
    fn map_size(&self) -> (i32, i32);

    /// タイルがコロニーに開示済みか
    fn tile_revealed(&self, colony: Entity, tile: GridPos) -> bool;

    /// タイルのスラブをコロニーが領有しているか
    fn tile_claimed_by(&self, colony: Entity, tile: GridPos) -> bool;

    /// 採掘指定タイルに掘削可能な側面が残っているか
    fn is_diggable_side(&self, colony: Entity, tile: GridPos) -> bool;

    /// ワーカーが立って掘れる有効位置か
    fn is_valid_dig_position(&self, colony: Entity, tile: GridPos) -> bool;

    /// タイル上の金塊が積載上限に達しているか
    fn gold_pile_at_capacity(&self, tile: GridPos) -> bool;

    /// スラブが「整地（壁の平滑化）」対象か
    fn slab_improvable(&self, colony: Entity, tile: GridPos) -> bool;

    /// スラブが「転換（床の塗り替え）」対象か
    fn slab_convertible(&self, colony: Entity, tile: GridPos) -> bool;

    /// スラブが補強対象の壁か
    fn slab_reinforceable(&self, colony: Entity, tile: GridPos) -> bool;

    /// 補強対象に隣接する、混雑していない立ち位置を導出する
    fn uncrowded_reinforce_stand(&self, tile: GridPos) -> Option<GridPos>;
}

/// 移動プランナ
///
/// `plan_approach_and_move` は成功時にワーカーを経路にコミットする
/// （副作用あり）。false は経路が見つからなかったことを意味する。
pub trait MovementPlanner: Send + Sync {
    /// 経路が存在するかの純粋な判定。部屋の最近傍選択などに使う
    fn can_reach(&self, worker: Entity, from: GridPos, to: GridPos) -> bool;

    /// 目的地への移動を計画し、ワーカーをコミットする
    fn plan_approach_and_move(
        &mut self,
        worker: Entity,
        from: GridPos,
        to: GridPos,
        with_storage: bool,
    ) -> bool;
}

/// ホストが挿入する地形述語リソース
#[derive(Resource)]
pub struct TerrainOracle(pub Box<dyn SpatialPredicates>);

/// ホストが挿入する経路プランナリソース
#[derive(Resource)]
pub struct NavPlanner(pub Box<dyn MovementPlanner>);
