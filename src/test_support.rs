//! テスト用のフェイクコラボレータとワールド組み立てヘルパ
//!
//! 地形述語は「基本すべて許可、例外を集合で指定」、整地・転換・補強の
//! 適格性は「指定した集合だけ真」という向きで作ってある。

use std::collections::HashSet;

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::entities::digger::{Digger, DiggerCursor, DiggerMission};
use crate::systems::claims::ClaimBoard;
use crate::systems::context::{SchedulerCtx, WorkerCtx};
use crate::systems::notify::{Notifier, Outbox};
use crate::world::grid::GridPos;
use crate::world::items::{CrateFlavor, DigKind, SpellFlavor};
use crate::world::oracle::{MovementPlanner, SpatialPredicates};
use crate::world::rooms::RoomKind;
use crate::world::snapshot::{
    BodyView, CorpseView, CrateView, DigView, GoldPileView, RoomView, SpellView, TrapView,
    WorldSnapshot,
};

/// 許可ベースの平坦な地形フェイク
pub(crate) struct FlatTerrain {
    pub size: (i32, i32),
    pub hidden: HashSet<GridPos>,
    pub not_diggable: HashSet<GridPos>,
    pub invalid_stand: HashSet<GridPos>,
    pub capped_gold: HashSet<GridPos>,
    pub unclaimed: HashSet<GridPos>,
    pub improvable: HashSet<GridPos>,
    pub convertible: HashSet<GridPos>,
    pub reinforceable: HashSet<GridPos>,
    pub crowded: HashSet<GridPos>,
}

impl Default for FlatTerrain {
    fn default() -> Self {
        Self {
            size: (16, 16),
            hidden: HashSet::new(),
            not_diggable: HashSet::new(),
            invalid_stand: HashSet::new(),
            capped_gold: HashSet::new(),
            unclaimed: HashSet::new(),
            improvable: HashSet::new(),
            convertible: HashSet::new(),
            reinforceable: HashSet::new(),
            crowded: HashSet::new(),
        }
    }
}

impl SpatialPredicates for FlatTerrain {
    fn map_size(&self) -> (i32, i32) {
        self.size
    }

    fn tile_revealed(&self, _colony: Entity, tile: GridPos) -> bool {
        !self.hidden.contains(&tile)
    }

    fn tile_claimed_by(&self, _colony: Entity, tile: GridPos) -> bool {
        !self.unclaimed.contains(&tile)
    }

    fn is_diggable_side(&self, _colony: Entity, tile: GridPos) -> bool {
        !self.not_diggable.contains(&tile)
    }

    fn is_valid_dig_position(&self, _colony: Entity, tile: GridPos) -> bool {
        !self.invalid_stand.contains(&tile)
    }

    fn gold_pile_at_capacity(&self, tile: GridPos) -> bool {
        self.capped_gold.contains(&tile)
    }

    fn slab_improvable(&self, _colony: Entity, tile: GridPos) -> bool {
        self.improvable.contains(&tile)
    }

    fn slab_convertible(&self, _colony: Entity, tile: GridPos) -> bool {
        self.convertible.contains(&tile)
    }

    fn slab_reinforceable(&self, _colony: Entity, tile: GridPos) -> bool {
        self.reinforceable.contains(&tile)
    }

    fn uncrowded_reinforce_stand(&self, tile: GridPos) -> Option<GridPos> {
        if self.crowded.contains(&tile) {
            None
        } else {
            Some(tile.offset((0, 1)))
        }
    }
}

/// どこへでも経路が引けるプランナ。拒否はフラグと集合で指定する
#[derive(Default)]
pub(crate) struct OpenPlanner {
    pub deny_all_moves: bool,
    pub unreachable_all: bool,
    pub unreachable: HashSet<GridPos>,
    /// コミットされた移動の記録 (worker, 目的地, storage フラグ)
    pub planned: Vec<(Entity, GridPos, bool)>,
}

impl MovementPlanner for OpenPlanner {
    fn can_reach(&self, _worker: Entity, _from: GridPos, to: GridPos) -> bool {
        !self.unreachable_all && !self.unreachable.contains(&to)
    }

    fn plan_approach_and_move(
        &mut self,
        worker: Entity,
        _from: GridPos,
        to: GridPos,
        with_storage: bool,
    ) -> bool {
        if self.deny_all_moves || self.unreachable_all || self.unreachable.contains(&to) {
            return false;
        }
        self.planned.push((worker, to, with_storage));
        true
    }
}

/// スケジューラ 1 式分のテスト環境
pub(crate) struct TestBed {
    pub world: WorldSnapshot,
    pub terrain: FlatTerrain,
    pub planner: OpenPlanner,
    pub claims: ClaimBoard,
    pub notifier: Notifier,
    pub outbox: Outbox,
    pub rng: StdRng,
    pub colony: Entity,
    pub observed: bool,
    pub tends_to_imprison: bool,
    pub tick: u64,
    entity_mint: World,
}

impl TestBed {
    pub fn new() -> Self {
        let mut entity_mint = World::new();
        let colony = entity_mint.spawn_empty().id();
        Self {
            world: WorldSnapshot::default(),
            terrain: FlatTerrain::default(),
            planner: OpenPlanner::default(),
            claims: ClaimBoard::default(),
            notifier: Notifier::default(),
            outbox: Outbox::default(),
            rng: StdRng::seed_from_u64(7),
            colony,
            observed: true,
            tends_to_imprison: true,
            tick: 1000,
            entity_mint,
        }
    }

    /// 新しいエンティティ ID を払い出す
    pub fn entity(&mut self) -> Entity {
        self.entity_mint.spawn_empty().id()
    }

    pub fn ctx(&mut self) -> SchedulerCtx<'_> {
        SchedulerCtx {
            tick: self.tick,
            colony: self.colony,
            colony_observed: self.observed,
            tends_to_imprison: self.tends_to_imprison,
            world: &self.world,
            terrain: &self.terrain,
            planner: &mut self.planner,
            claims: &mut self.claims,
            notifier: &mut self.notifier,
            outbox: &mut self.outbox,
            rng: &mut self.rng,
        }
    }

    // ----- スナップショットの組み立て -----

    pub fn add_unconscious(&mut self, pos: GridPos, owner: Entity) -> Entity {
        let entity = self.entity();
        self.world.unconscious.push(BodyView { entity, pos, owner });
        entity
    }

    pub fn add_corpse(&mut self, pos: GridPos) -> Entity {
        let entity = self.entity();
        self.world.corpses.push(CorpseView {
            entity,
            pos,
            settled: true,
            rottable: true,
            stored: None,
        });
        entity
    }

    pub fn add_spell(&mut self, pos: GridPos, flavor: SpellFlavor) -> Entity {
        let entity = self.entity();
        self.world.spells.push(SpellView {
            entity,
            pos,
            flavor,
            stored: None,
        });
        entity
    }

    pub fn add_trap(&mut self, pos: GridPos, model: u16, armed: bool, owner: Entity) -> Entity {
        let entity = self.entity();
        self.world.traps.push(TrapView {
            entity,
            pos,
            model,
            armed,
            owner,
        });
        entity
    }

    pub fn add_crate(
        &mut self,
        pos: GridPos,
        model: u16,
        flavor: CrateFlavor,
        owner: Option<Entity>,
    ) -> Entity {
        let entity = self.entity();
        self.world.crates.push(CrateView {
            entity,
            pos,
            model,
            flavor,
            owner,
            stored: None,
        });
        entity
    }

    pub fn add_gold(&mut self, pos: GridPos) -> Entity {
        let entity = self.entity();
        self.world.gold_piles.push(GoldPileView {
            entity,
            pos,
            stored: None,
        });
        entity
    }

    /// 自コロニーの採掘指定
    pub fn add_dig(&mut self, pos: GridPos, kind: DigKind) -> Entity {
        let entity = self.entity();
        let owner = self.colony;
        self.world.digs.push(DigView {
            entity,
            pos,
            owner,
            kind,
        });
        entity
    }

    /// 自コロニーの部屋。空き容量を直接指定する
    pub fn add_room(
        &mut self,
        kind: RoomKind,
        pos: GridPos,
        spare_capacity: u32,
        spare_item_capacity: u32,
    ) -> Entity {
        let entity = self.entity();
        let owner = self.colony;
        self.world.rooms.push(RoomView {
            entity,
            pos,
            owner,
            kind,
            spare_capacity,
            spare_item_capacity,
        });
        entity
    }
}

/// ワーカー 1 体分のテスト状態
pub(crate) struct TestWorker {
    pub entity: Entity,
    pub pos: GridPos,
    pub digger: Digger,
    pub cursor: DiggerCursor,
    pub mission: DiggerMission,
}

impl TestWorker {
    pub fn new(entity: Entity, pos: GridPos) -> Self {
        Self {
            entity,
            pos,
            digger: Digger::default(),
            cursor: DiggerCursor::default(),
            mission: DiggerMission::default(),
        }
    }

    pub fn ctx(&mut self) -> WorkerCtx<'_> {
        WorkerCtx {
            entity: self.entity,
            pos: self.pos,
            digger: &self.digger,
            cursor: &mut self.cursor,
            mission: &mut self.mission,
        }
    }
}
