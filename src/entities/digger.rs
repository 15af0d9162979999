//! ワーカー（ディガー）側のコンポーネント

use bevy::prelude::*;

use crate::world::grid::GridPos;

/// ワーカーの基礎ステータス
///
/// 訓練可否・訓練費の支払い可否はクリーチャー計算側（ホスト）が
/// 毎 tick 反映する。スケジューラは読むだけ。
#[derive(Component, Debug, Clone, Copy)]
pub struct Digger {
    pub gold_carried: u32,
    pub gold_capacity: u32,
    pub trainable: bool,
    pub training_affordable: bool,
}

impl Default for Digger {
    fn default() -> Self {
        Self {
            gold_carried: 0,
            gold_capacity: 500,
            trainable: false,
            training_affordable: false,
        }
    }
}

/// このワーカーが今 tick 仕事を探していることを示すマーカー
///
/// ホストの行動ステートマシンが付与し、ミッションが確定すると
/// 選択システムが取り除く。
#[derive(Component, Debug, Default)]
pub struct SeekingTask;

/// 直前にやっていた仕事のカテゴリ。継続ヒューリスティックの決定キー
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastJob {
    #[default]
    None,
    Dig,
    ImproveConvert,
    Reinforce,
    Train,
}

/// 共有スタックへの消費カーソルとワーカー個別のスロットル状態
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct DiggerCursor {
    /// 次に読むスタックインデックス
    pub index: usize,
    /// カーソルが前提とするスタック世代（lastRefreshTick のスタンプ）。
    /// コロニー側と食い違っていたら index を 0 に巻き戻す
    pub stack_tick: u64,
    pub last_job: LastJob,
    /// 最後に金庫チェックを行った tick
    pub last_treasury_check_tick: u64,
    /// 最後に請け負った採掘指定の位置。近傍の掘り継ぎ探索の起点
    pub last_dig_target: Option<GridPos>,
}

/// 到着後にワーカーが取る行動
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    #[default]
    None,
    ArriveAtDig,
    ArriveAtMine,
    ArriveAtImprove,
    ArriveAtConvert,
    ArriveAtReinforce,
    PickUpUnconscious,
    PickUpCorpse,
    PickUpSpellObject,
    PickUpTrapCrate,
    PickUpCrateForWorkshop,
    PickUpGoldPile,
    DropGoldAtTreasury,
    ArriveAtTrainingRoom,
}

/// 確定済みミッション（移動先と到着後の継続行動）
///
/// 他のワーカーはこのコンポーネントを走査して「そのタイルには既に
/// 誰かが向かっている」を判定する。ロックではなく助言的チェック。
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct DiggerMission {
    pub continuation: Continuation,
    /// 移動のコミット先タイル（立ち位置）。衝突チェックの対象
    pub target_tile: Option<GridPos>,
    /// 拾得対象・目的の部屋などのエンティティ参照
    pub target_entity: Option<Entity>,
    /// 装填しに行く罠
    pub arming_trap: Option<Entity>,
    /// 請け負った採掘指定
    pub dig_designation: Option<Entity>,
    /// 作業対象タイル（補強する壁、掘る壁など。立ち位置とは別）
    pub work_tile: Option<GridPos>,
}

impl DiggerMission {
    /// 新しいミッションを積む前の初期化
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
