//! 正方スパイラル探索
//!
//! ワーカーの現在地を中心に、辺の長さが 1,1,2,2,3,3,… と伸びる
//! 古典的な正方スパイラルで外側へ歩き、各セルで適格述語を試す。
//! 訪問セル数が上限に達したら失敗（エラーではない）。マップ外の
//! セルも「訪問」として数えるので、マップ端でも必ず停止する。

use crate::world::grid::{CARDINALS, GridPos};

/// 最初に適格だったセルを返す。`visit` が true を返したセルで打ち切る
///
/// `start_dir` は 0..4 の開始方位。呼び出し側が疑似乱数で選ぶことで
/// ワーカーごとに別の方向から探し始め、同じセルへの殺到を減らす。
pub fn spiral_search(
    origin: GridPos,
    start_dir: usize,
    max_cells: usize,
    mut visit: impl FnMut(GridPos) -> bool,
) -> Option<GridPos> {
    let mut pos = origin;
    let mut dir = start_dir % 4;
    let mut side_len = 1usize;
    let mut visited = 0usize;

    loop {
        // 同じ辺長を 2 辺分歩いてから伸ばす
        for _ in 0..2 {
            for _ in 0..side_len {
                if visited >= max_cells {
                    return None;
                }
                pos = pos.offset(CARDINALS[dir]);
                visited += 1;
                if visit(pos) {
                    return Some(pos);
                }
            }
            dir = (dir + 1) % 4;
        }
        side_len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    fn terminates_on_fully_ineligible_area(#[case] start_dir: usize) {
        let mut visited = 0usize;
        let found = spiral_search(GridPos::new(0, 0), start_dir, 100, |_| {
            visited += 1;
            false
        });
        assert!(found.is_none());
        assert_eq!(visited, 100);
    }

    #[test]
    fn finds_adjacent_cell_first() {
        let target = GridPos::new(1, 0);
        let found = spiral_search(GridPos::new(0, 0), 1, 8, |p| p == target);
        assert_eq!(found, Some(target));
    }

    #[test]
    fn ring_expands_outward() {
        // 辺長 1,1,2,2 で最初のリング 8 セルを一巡する
        let mut cells = Vec::new();
        spiral_search(GridPos::new(0, 0), 0, 8, |p| {
            cells.push(p);
            false
        });
        assert_eq!(cells.len(), 8);
        for p in &cells {
            assert!(p.x.abs() <= 1 && p.y.abs() <= 1, "cell {p:?} outside ring 1");
        }
        // 原点は再訪しない
        assert!(!cells.contains(&GridPos::new(0, 0)));
    }

    #[test]
    fn zero_cell_limit_visits_nothing() {
        let mut visited = 0usize;
        let found = spiral_search(GridPos::new(3, 3), 2, 0, |_| {
            visited += 1;
            true
        });
        assert!(found.is_none());
        assert_eq!(visited, 0);
    }
}
