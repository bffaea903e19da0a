//! Ruled/whitespace table reconstruction from word geometry.
//!
//! Grounded on the teacher's `layout::table_detector`: find vertically
//! aligned word starts (candidate columns), find horizontally aligned
//! words (candidate rows), then fold each row's words into the nearest
//! column to produce a `Vec<Vec<String>>` grid — most bank statement PDFs
//! have no ruling-line annotations at all, so alignment is the only signal
//! available, exactly the teacher's own "simplified implementation" note.

use crate::geometry::{y_bands, Word};

/// A rectangular table: rows of cell text, column-major alignment already
/// resolved. Cells may contain embedded newlines when multiple y-bands
/// were folded into one logical row cell (not attempted here — each row is
/// one y-band, matching most statement line items).
pub type TableGrid = Vec<Vec<String>>;

const ROW_TOLERANCE: f32 = 3.0;
const COLUMN_TOLERANCE: f32 = 8.0;
const MIN_ROWS: usize = 2;
const MIN_COLS: usize = 2;

/// Detect tables among a single page's words.
pub fn detect_tables(words: &[Word]) -> Vec<TableGrid> {
    if words.len() < 4 {
        return vec![];
    }
    let bands = y_bands(words, ROW_TOLERANCE);
    let rows: Vec<&Vec<usize>> = bands.iter().filter(|b| b.len() >= 1).collect();
    if rows.len() < MIN_ROWS {
        return vec![];
    }

    let columns = cluster_columns(words, &bands);
    if columns.len() < MIN_COLS {
        return vec![];
    }

    let mut grid = Vec::with_capacity(rows.len());
    for band in &rows {
        let mut cells: Vec<String> = vec![String::new(); columns.len()];
        for &idx in band.iter() {
            let w = &words[idx];
            let col = nearest_column(&columns, w.x0);
            if !cells[col].is_empty() {
                cells[col].push(' ');
            }
            cells[col].push_str(&w.text);
        }
        grid.push(cells);
    }
    vec![grid]
}

/// Cluster word left-edges across all rows into shared column start
/// positions (the teacher's vertical-alignment grouping, generalized from
/// pairwise block comparison to a tolerance-bucketed histogram).
fn cluster_columns(words: &[Word], bands: &[Vec<usize>]) -> Vec<f32> {
    let mut starts: Vec<f32> = bands
        .iter()
        .flat_map(|band| band.iter().map(|&i| words[i].x0))
        .collect();
    starts.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut clusters: Vec<(f32, usize)> = Vec::new(); // (running mean, count)
    for x in starts {
        match clusters.last_mut() {
            Some((mean, count)) if (x - *mean).abs() <= COLUMN_TOLERANCE => {
                *mean = (*mean * *count as f32 + x) / (*count as f32 + 1.0);
                *count += 1;
            }
            _ => clusters.push((x, 1)),
        }
    }
    // A cluster only counts as a column if it recurs across multiple rows.
    clusters
        .into_iter()
        .filter(|(_, count)| *count >= MIN_ROWS)
        .map(|(mean, _)| mean)
        .collect()
}

fn nearest_column(columns: &[f32], x: f32) -> usize {
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - x).abs().partial_cmp(&(*b - x).abs()).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(text: &str, x0: f32, top: f32) -> Word {
        Word {
            text: text.to_string(),
            x0,
            x1: x0 + 20.0,
            top,
            bottom: top + 10.0,
            page: 0,
        }
    }

    #[test]
    fn reconstructs_simple_grid() {
        let words = vec![
            w("Date", 0.0, 0.0),
            w("Description", 50.0, 0.0),
            w("Balance", 150.0, 0.0),
            w("01", 0.0, 20.0),
            w("Deposit", 50.0, 20.0),
            w("100.00", 150.0, 20.0),
            w("02", 0.0, 40.0),
            w("Withdrawal", 50.0, 40.0),
            w("50.00", 150.0, 40.0),
        ];
        let tables = detect_tables(&words);
        assert_eq!(tables.len(), 1);
        let grid = &tables[0];
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], vec!["Date", "Description", "Balance"]);
        assert_eq!(grid[1][0], "01");
    }

    #[test]
    fn too_few_words_yields_no_table() {
        let words = vec![w("Total", 0.0, 0.0)];
        assert!(detect_tables(&words).is_empty());
    }
}
