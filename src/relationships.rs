//! ECS Relationships モジュール
//!
//! ワーカーとコロニーの所属関係を Bevy 0.17 の Relationship 機能で管理します。

use bevy::prelude::*;

/// ワーカーがコロニーに所属していることを示す Relationship
/// ワーカー側に付与される（ワーカー → コロニーへの参照）
///
/// # 使用例
/// ```ignore
/// commands.entity(digger_entity).insert(DiggerOf(colony_entity));
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
#[relationship(relationship_target = ColonyDiggers)]
pub struct DiggerOf(pub Entity);

impl Default for DiggerOf {
    fn default() -> Self {
        Self(Entity::PLACEHOLDER)
    }
}

/// コロニーが抱えるワーカーの一覧を保持する RelationshipTarget
/// コロニー側に自動的に付与・維持される
///
/// 挿入順が保たれるため、tick ごとのワーカー処理順はこの並びで安定する。
#[derive(Component, Reflect, Debug, Default)]
#[reflect(Component)]
#[relationship_target(relationship = DiggerOf)]
pub struct ColonyDiggers(Vec<Entity>);

impl ColonyDiggers {
    /// 所属ワーカー一覧をイテレータで取得
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }
}
