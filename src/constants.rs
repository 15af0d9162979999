//! スケジューラのポリシー定数

// ----- タスクスタック -----
/// コロニーごとのタスクスタック容量
pub const STACK_MAX_TASKS: usize = 64;
/// スタック全体を再生成する最短間隔（tick）
pub const STACK_REFRESH_INTERVAL: u64 = 128;

// ----- ジェネレータのクォータ -----
pub const QUOTA_UNCONSCIOUS: usize = STACK_MAX_TASKS / 4 - 1;
pub const QUOTA_CORPSES: usize = STACK_MAX_TASKS / 4 - 1;
pub const QUOTA_SPELLS: usize = STACK_MAX_TASKS / 12;
pub const QUOTA_EMPTY_TRAPS: usize = STACK_MAX_TASKS / 6;
pub const QUOTA_DIG: usize = STACK_MAX_TASKS * 5 / 8;

// ----- 補強ステージング -----
/// 補強サブスタックの容量
pub const REINFORCE_STAGING_MAX: usize = STACK_MAX_TASKS;
/// 継続ヒューリスティックが補強枝を試す最低バックログ
pub const REINFORCE_BACKLOG_MIN: usize = 3;

// ----- ワーカー側スロットル -----
/// 金庫チェックの間隔（tick）。この間隔を超えたら運搬金の返納を確認する
pub const TREASURY_CHECK_INTERVAL: u64 = 128;

// ----- 探索境界 -----
/// ワールドコレクション走査の上限。超過は破損リスト扱い
pub const WORLD_SCAN_CEILING: usize = 2048;
/// 近傍スパイラル探索の訪問セル上限（1リング分）
pub const SPIRAL_LOCAL_MAX_CELLS: usize = 8;
/// エリアスパイラル探索の訪問セル上限
pub const SPIRAL_AREA_MAX_CELLS: usize = 2048;
/// 採掘目標への接近位置を導出するときの立ち位置距離
pub const DIG_APPROACH_DISTANCE: i32 = 2;

// ----- 通知 -----
/// 不足通知のスロットル窓（tick）
pub const NOTICE_THROTTLE_TICKS: u64 = 1000;
