//! 選択処理のコンテキスト束
//!
//! 引数の山を 2 つの文脈にまとめる。`SchedulerCtx` はコロニー単位で
//! 共有される読み取りビューと外部コラボレータ、`WorkerCtx` は処理中
//! ワーカーの可変状態。

use bevy::prelude::*;
use rand::RngCore;

use crate::entities::digger::{Digger, DiggerCursor, DiggerMission};
use crate::systems::claims::ClaimBoard;
use crate::systems::notify::{Notifier, Outbox};
use crate::world::grid::GridPos;
use crate::world::oracle::{MovementPlanner, SpatialPredicates};
use crate::world::snapshot::WorldSnapshot;

pub struct SchedulerCtx<'a> {
    pub tick: u64,
    pub colony: Entity,
    pub colony_observed: bool,
    pub tends_to_imprison: bool,
    pub world: &'a WorldSnapshot,
    pub terrain: &'a dyn SpatialPredicates,
    pub planner: &'a mut dyn MovementPlanner,
    pub claims: &'a mut ClaimBoard,
    pub notifier: &'a mut Notifier,
    pub outbox: &'a mut Outbox,
    pub rng: &'a mut dyn RngCore,
}

pub struct WorkerCtx<'a> {
    pub entity: Entity,
    pub pos: GridPos,
    pub digger: &'a Digger,
    pub cursor: &'a mut DiggerCursor,
    pub mission: &'a mut DiggerMission,
}
