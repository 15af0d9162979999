//! ワールド側の型とコラボレータ接合面

pub mod grid;
pub mod items;
pub mod oracle;
pub mod rooms;
pub mod snapshot;
