//! スケジューラが走査するワールド側エンティティのコンポーネント
//!
//! これらはホストゲームのシステムが付け外しするマーカー/データで、
//! スケジューラは毎 tick のスナップショット収集で読むだけ。

use bevy::prelude::*;

/// ワールドエンティティの所有コロニーへの参照
#[derive(Component, Debug, Clone, Copy)]
pub struct OwnedBy(pub Entity);

/// ワーカーに運搬中のエンティティ。運搬中は全カテゴリで対象外
#[derive(Component, Debug, Default)]
pub struct BeingCarried;

/// 部屋に収容済みのエンティティ（墓地の死体、図書室の呪文書など）
#[derive(Component, Debug, Clone, Copy)]
pub struct StoredInRoom {
    pub room: Entity,
    pub kind: crate::world::rooms::RoomKind,
}

/// 気絶して倒れているクリーチャー
#[derive(Component, Debug, Default)]
pub struct UnconsciousBody;

/// 死体
#[derive(Component, Debug, Clone, Copy)]
pub struct Corpse {
    /// 地面に静止しているか（落下中・演出中は対象外）
    pub settled: bool,
    /// 墓地で腐敗させられる種別か
    pub rottable: bool,
}

/// 拾得対象の呪文オブジェクトの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellFlavor {
    Spellbook,
    SpecialBox,
}

/// 床に落ちている呪文書・スペシャルボックス
#[derive(Component, Debug, Clone, Copy)]
pub struct SpellObject {
    pub flavor: SpellFlavor,
}

/// 設置済みの罠。`armed == false` なら再装填待ち
#[derive(Component, Debug, Clone, Copy)]
pub struct ArmableTrap {
    pub model: u16,
    pub armed: bool,
}

/// クレートの中身の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrateFlavor {
    Trap,
    Door,
}

/// 罠・扉のクレート。`model` は装填先の罠モデルと突き合わせる
#[derive(Component, Debug, Clone, Copy)]
pub struct TrapCrate {
    pub model: u16,
    pub flavor: CrateFlavor,
}

/// 床に落ちている金塊
#[derive(Component, Debug, Clone, Copy)]
pub struct GoldPile {
    pub amount: u32,
}

/// 採掘指定の種別。Mine は金・宝石スラブ向け
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigKind {
    Dig,
    Mine,
}

/// プレイヤーが発行した採掘指定
#[derive(Component, Debug, Clone, Copy)]
pub struct DigDesignation {
    pub kind: DigKind,
}
