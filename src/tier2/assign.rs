//! Word-to-column assignment (spec §4.D.2): each word below the header
//! span is assigned to the unique column whose interval contains its
//! x-midpoint; unmatched words are discarded silently.

use std::collections::HashMap;

use crate::geometry::Word;
use crate::model::{ColumnKind, ColumnLayout};

/// One y-band's words, grouped by the column they fall in.
pub type BandRow = HashMap<ColumnKind, String>;

/// Assign every word in `band` (a list of word indices into `words`,
/// already x-sorted) to its column, joining multiple words in the same
/// column with spaces.
pub fn assign_band(words: &[Word], band: &[usize], layout: &ColumnLayout) -> BandRow {
    let mut row: BandRow = HashMap::new();
    for &idx in band {
        let word = &words[idx];
        if let Some(kind) = layout.column_at(word.x_mid()) {
            row.entry(kind)
                .and_modify(|s| {
                    s.push(' ');
                    s.push_str(&word.text);
                })
                .or_insert_with(|| word.text.clone());
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Interval;
    use indexmap::IndexMap;

    fn w(text: &str, x0: f32, x1: f32) -> Word {
        Word {
            text: text.to_string(),
            x0,
            x1,
            top: 0.0,
            bottom: 10.0,
            page: 0,
        }
    }

    #[test]
    fn assigns_words_to_nearest_column_interval() {
        let words = vec![w("01", 0.0, 10.0), w("Payment", 20.0, 50.0), w("to", 52.0, 60.0)];
        let mut columns = IndexMap::new();
        columns.insert(ColumnKind::TransactionDate, Interval::new(0.0, 15.0));
        columns.insert(ColumnKind::Description, Interval::new(15.0, 100.0));
        let layout = ColumnLayout {
            columns,
            header_y_min: 0.0,
            header_y_max: 10.0,
        };
        let row = assign_band(&words, &[0, 1, 2], &layout);
        assert_eq!(row[&ColumnKind::TransactionDate], "01");
        assert_eq!(row[&ColumnKind::Description], "Payment to");
    }

    #[test]
    fn discards_words_outside_any_column() {
        let words = vec![w("WATERMARK", 500.0, 600.0)];
        let layout = ColumnLayout {
            columns: {
                let mut m = IndexMap::new();
                m.insert(ColumnKind::Balance, Interval::new(0.0, 100.0));
                m
            },
            header_y_min: 0.0,
            header_y_max: 10.0,
        };
        let row = assign_band(&words, &[0], &layout);
        assert!(row.is_empty());
    }
}
