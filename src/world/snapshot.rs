//! ワールドスナップショット
//!
//! 選択システムの冒頭で毎 tick 一度だけクエリからビューを収集し、
//! ジェネレータと検証の両方が同じ読み取り専用ビューを参照する。
//! 走査中にエンティティが消えた場合はスナップショットに行が無い
//! だけで、無効参照のデリファレンスは構造的に起こらない。

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::world::grid::GridPos;
use crate::world::items::{
    ArmableTrap, BeingCarried, Corpse, CrateFlavor, DigDesignation, DigKind, GoldPile, OwnedBy,
    SpellFlavor, SpellObject, StoredInRoom, TrapCrate, UnconsciousBody,
};
use crate::world::oracle::MovementPlanner;
use crate::world::rooms::{Room, RoomKind};

#[derive(Debug, Clone, Copy)]
pub struct BodyView {
    pub entity: Entity,
    pub pos: GridPos,
    pub owner: Entity,
}

#[derive(Debug, Clone, Copy)]
pub struct CorpseView {
    pub entity: Entity,
    pub pos: GridPos,
    pub settled: bool,
    pub rottable: bool,
    pub stored: Option<RoomKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct SpellView {
    pub entity: Entity,
    pub pos: GridPos,
    pub flavor: SpellFlavor,
    pub stored: Option<RoomKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct TrapView {
    pub entity: Entity,
    pub pos: GridPos,
    pub model: u16,
    pub armed: bool,
    pub owner: Entity,
}

#[derive(Debug, Clone, Copy)]
pub struct CrateView {
    pub entity: Entity,
    pub pos: GridPos,
    pub model: u16,
    pub flavor: CrateFlavor,
    /// None は中立（どのコロニーでも回収できる）
    pub owner: Option<Entity>,
    pub stored: Option<RoomKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct GoldPileView {
    pub entity: Entity,
    pub pos: GridPos,
    pub stored: Option<RoomKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct DigView {
    pub entity: Entity,
    pub pos: GridPos,
    pub owner: Entity,
    pub kind: DigKind,
}

#[derive(Debug, Clone, Copy)]
pub struct RoomView {
    pub entity: Entity,
    pub pos: GridPos,
    pub owner: Entity,
    pub kind: RoomKind,
    pub spare_capacity: u32,
    pub spare_item_capacity: u32,
}

/// 1 tick 分のワールドビュー
#[derive(Debug, Default)]
pub struct WorldSnapshot {
    pub unconscious: Vec<BodyView>,
    pub corpses: Vec<CorpseView>,
    pub spells: Vec<SpellView>,
    pub traps: Vec<TrapView>,
    pub crates: Vec<CrateView>,
    pub gold_piles: Vec<GoldPileView>,
    pub digs: Vec<DigView>,
    pub rooms: Vec<RoomView>,
}

impl WorldSnapshot {
    // ----- タイル位置での再検索（消費時の再検証用） -----

    pub fn unconscious_body_at(&self, pos: GridPos) -> Option<&BodyView> {
        self.unconscious.iter().find(|b| b.pos == pos)
    }

    pub fn corpse_at(&self, pos: GridPos) -> Option<&CorpseView> {
        self.corpses
            .iter()
            .find(|c| c.pos == pos && c.settled && c.rottable && c.stored.is_none())
    }

    pub fn spell_at(&self, pos: GridPos) -> Option<&SpellView> {
        self.spells.iter().find(|s| s.pos == pos && s.stored.is_none())
    }

    pub fn crate_at(&self, pos: GridPos) -> Option<&CrateView> {
        self.crates.iter().find(|c| c.pos == pos)
    }

    pub fn gold_pile_at(&self, pos: GridPos) -> Option<&GoldPileView> {
        self.gold_piles.iter().find(|g| g.pos == pos && g.stored.is_none())
    }

    pub fn dig_at(&self, owner: Entity, pos: GridPos) -> Option<&DigView> {
        self.digs.iter().find(|d| d.owner == owner && d.pos == pos)
    }

    /// 指定モデルの未装填罠のうち、まだ誰も装填に向かっていないもの
    pub fn empty_trap_for_model(
        &self,
        owner: Entity,
        model: u16,
        arming_in_progress: impl Fn(Entity) -> bool,
    ) -> Option<&TrapView> {
        self.traps.iter().find(|t| {
            t.owner == owner && t.model == model && !t.armed && !arming_in_progress(t.entity)
        })
    }

    // ----- 部屋レジストリ照会 -----

    pub fn colony_has_room(&self, colony: Entity, kind: RoomKind) -> bool {
        self.rooms.iter().any(|r| r.owner == colony && r.kind == kind)
    }

    pub fn any_room_with_spare_capacity(&self, colony: Entity, kind: RoomKind, min: u32) -> bool {
        self.rooms
            .iter()
            .any(|r| r.owner == colony && r.kind == kind && r.spare_capacity >= min)
    }

    pub fn any_room_with_spare_item_capacity(&self, colony: Entity, kind: RoomKind) -> bool {
        self.rooms
            .iter()
            .any(|r| r.owner == colony && r.kind == kind && r.spare_item_capacity >= 1)
    }

    /// ワーカーから到達可能で空き容量のある最寄りの部屋
    pub fn nearest_reachable_room_with_spare_capacity(
        &self,
        planner: &dyn MovementPlanner,
        worker: Entity,
        from: GridPos,
        colony: Entity,
        kind: RoomKind,
        min: u32,
    ) -> Option<&RoomView> {
        self.rooms
            .iter()
            .filter(|r| r.owner == colony && r.kind == kind && r.spare_capacity >= min)
            .filter(|r| planner.can_reach(worker, from, r.pos))
            .min_by_key(|r| from.distance_sq(r.pos))
    }

    /// ワーカーから到達可能で納品スロットの空きがある最寄りの部屋
    pub fn nearest_reachable_room_with_spare_item_capacity(
        &self,
        planner: &dyn MovementPlanner,
        worker: Entity,
        from: GridPos,
        colony: Entity,
        kind: RoomKind,
    ) -> Option<&RoomView> {
        self.rooms
            .iter()
            .filter(|r| r.owner == colony && r.kind == kind && r.spare_item_capacity >= 1)
            .filter(|r| planner.can_reach(worker, from, r.pos))
            .min_by_key(|r| from.distance_sq(r.pos))
    }
}

/// スナップショット収集用のクエリ束
#[derive(SystemParam)]
pub struct WorldScanParams<'w, 's> {
    q_unconscious: Query<
        'w,
        's,
        (Entity, &'static GridPos, &'static OwnedBy),
        (With<UnconsciousBody>, Without<BeingCarried>),
    >,
    q_corpses: Query<
        'w,
        's,
        (Entity, &'static GridPos, &'static Corpse, Option<&'static StoredInRoom>),
        Without<BeingCarried>,
    >,
    q_spells: Query<
        'w,
        's,
        (Entity, &'static GridPos, &'static SpellObject, Option<&'static StoredInRoom>),
        Without<BeingCarried>,
    >,
    q_traps: Query<'w, 's, (Entity, &'static GridPos, &'static ArmableTrap, &'static OwnedBy)>,
    q_crates: Query<
        'w,
        's,
        (
            Entity,
            &'static GridPos,
            &'static TrapCrate,
            Option<&'static OwnedBy>,
            Option<&'static StoredInRoom>,
        ),
        Without<BeingCarried>,
    >,
    q_gold: Query<
        'w,
        's,
        (Entity, &'static GridPos, &'static GoldPile, Option<&'static StoredInRoom>),
        Without<BeingCarried>,
    >,
    q_digs: Query<'w, 's, (Entity, &'static GridPos, &'static DigDesignation, &'static OwnedBy)>,
    q_rooms: Query<'w, 's, (Entity, &'static GridPos, &'static Room, &'static OwnedBy)>,
}

impl WorldScanParams<'_, '_> {
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            unconscious: self
                .q_unconscious
                .iter()
                .map(|(entity, pos, owner)| BodyView { entity, pos: *pos, owner: owner.0 })
                .collect(),
            corpses: self
                .q_corpses
                .iter()
                .map(|(entity, pos, corpse, stored)| CorpseView {
                    entity,
                    pos: *pos,
                    settled: corpse.settled,
                    rottable: corpse.rottable,
                    stored: stored.map(|s| s.kind),
                })
                .collect(),
            spells: self
                .q_spells
                .iter()
                .map(|(entity, pos, spell, stored)| SpellView {
                    entity,
                    pos: *pos,
                    flavor: spell.flavor,
                    stored: stored.map(|s| s.kind),
                })
                .collect(),
            traps: self
                .q_traps
                .iter()
                .map(|(entity, pos, trap, owner)| TrapView {
                    entity,
                    pos: *pos,
                    model: trap.model,
                    armed: trap.armed,
                    owner: owner.0,
                })
                .collect(),
            crates: self
                .q_crates
                .iter()
                .map(|(entity, pos, crate_info, owner, stored)| CrateView {
                    entity,
                    pos: *pos,
                    model: crate_info.model,
                    flavor: crate_info.flavor,
                    owner: owner.map(|o| o.0),
                    stored: stored.map(|s| s.kind),
                })
                .collect(),
            gold_piles: self
                .q_gold
                .iter()
                .map(|(entity, pos, _gold, stored)| GoldPileView {
                    entity,
                    pos: *pos,
                    stored: stored.map(|s| s.kind),
                })
                .collect(),
            digs: self
                .q_digs
                .iter()
                .map(|(entity, pos, dig, owner)| DigView {
                    entity,
                    pos: *pos,
                    owner: owner.0,
                    kind: dig.kind,
                })
                .collect(),
            rooms: self
                .q_rooms
                .iter()
                .map(|(entity, pos, room, owner)| RoomView {
                    entity,
                    pos: *pos,
                    owner: owner.0,
                    kind: room.kind,
                    spare_capacity: room.spare_capacity(),
                    spare_item_capacity: room.spare_item_capacity(),
                })
                .collect(),
        }
    }
}
