//! ディガー向けタスク割り当てスケジューラ
//!
//! コロニー単位で共有される固定容量のタスクスタックを周期的に再生成し、
//! 多数のワーカーがそれぞれのカーソルで同時に消費していく。払い出しの
//! 直前に前提条件を取り直し、同じタイルへの殺到は進行中ミッションの
//! 走査（助言的チェック）で避ける。スタックより先に「直前にやっていた
//! 仕事の続き」を近傍スパイラルで探すことで移動の無駄を抑える。
//!
//! 経路探索の実体・地形表現・部屋容量の帳簿付け・通知 UI はホスト側の
//! 責務で、このクレートは `TerrainOracle` / `NavPlanner` リソースと
//! コンポーネント経由で問い合わせるだけ。
//!
//! # 使用例
//! ```ignore
//! App::new()
//!     .add_plugins(DiggerTasksPlugin)
//!     .insert_resource(TerrainOracle(Box::new(MyTerrain::new())))
//!     .insert_resource(NavPlanner(Box::new(MyPlanner::new())));
//!
//! // コロニーとワーカーを用意する
//! let colony = commands
//!     .spawn((Colony::default(), TaskStack::default(), ReinforceStaging::default()))
//!     .id();
//! commands.spawn((
//!     Digger::default(),
//!     GridPos::new(5, 5),
//!     DiggerCursor::default(),
//!     DiggerMission::default(),
//!     SeekingTask,
//!     DiggerOf(colony),
//! ));
//! ```

pub mod constants;
pub mod entities;
pub mod events;
pub mod relationships;
pub mod systems;
pub mod world;

#[cfg(test)]
mod test_support;

use bevy::prelude::*;

use crate::systems::SchedulerSet;

pub use crate::entities::colony::Colony;
pub use crate::entities::digger::{
    Continuation, Digger, DiggerCursor, DiggerMission, LastJob, SeekingTask,
};
pub use crate::relationships::{ColonyDiggers, DiggerOf};
pub use crate::systems::stack::{ReinforceStaging, TaskKind, TaskStack};
pub use crate::world::grid::GridPos;
pub use crate::world::oracle::{MovementPlanner, NavPlanner, SpatialPredicates, TerrainOracle};

pub struct DiggerTasksPlugin;

impl Plugin for DiggerTasksPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<systems::SimTick>()
            .init_resource::<systems::notify::Notifier>()
            // Events
            .add_message::<events::ShortageNotice>()
            .add_message::<events::WorldEventRequest>()
            .add_message::<events::TaskDispatched>()
            .add_message::<events::StackRefreshed>()
            // Reflection
            .register_type::<GridPos>()
            .register_type::<DiggerOf>()
            .register_type::<ColonyDiggers>()
            .register_type::<DiggerCursor>()
            .register_type::<DiggerMission>()
            // tick を進めてから全ワーカーの選択を回す
            .configure_sets(Update, (SchedulerSet::Tick, SchedulerSet::Select).chain())
            .add_systems(
                Update,
                (
                    systems::advance_sim_tick_system.in_set(SchedulerSet::Tick),
                    systems::selection::digger_task_selection_system.in_set(SchedulerSet::Select),
                ),
            );
    }
}
