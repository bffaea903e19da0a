//! Column-layout discovery (spec §4.D.1): header candidate scoring against
//! the word-geometry alias map, column interval computation.

use indexmap::IndexMap;

use crate::geometry::{y_bands, Interval, Word};
use crate::model::{ColumnKind, ColumnLayout};

const HEADER_MERGE_SPAN: f32 = 16.0;
const Y_BAND_TOLERANCE: f32 = 4.0;

/// Word-geometry alias map (spec §6: a superset of the table-path map).
fn alias(token: &str) -> Option<ColumnKind> {
    match token {
        "date" | "txn date" | "trans date" | "transaction date" | "posting date" | "date & time"
        | "date and time" | "transaction" | "trans" => Some(ColumnKind::TransactionDate),
        "value date" | "effective date" => Some(ColumnKind::ValueDate),
        "description" | "particulars" | "details" | "narrative" | "remarks" | "transaction details" => {
            Some(ColumnKind::Description)
        }
        "payee" | "beneficiary" | "sender" => Some(ColumnKind::Counterparty),
        "cheque" | "chq" | "cheque no" => Some(ColumnKind::Cheque),
        "reference" | "ref" | "ref no" => Some(ColumnKind::Reference),
        "debit" | "withdrawal" | "withdrawals" | "dr" | "debit amount" | "payments" | "withdrawal amount" => {
            Some(ColumnKind::Withdrawal)
        }
        "credit" | "deposit" | "deposits" | "cr" | "credit amount" | "receipts" | "deposit amount" => {
            Some(ColumnKind::Deposit)
        }
        "balance" | "running balance" | "closing balance" | "available balance" | "ledger balance" => {
            Some(ColumnKind::Balance)
        }
        "currency" | "ccy" | "curr" => Some(ColumnKind::Currency),
        _ => None,
    }
}

struct HeaderCandidate {
    word_indices: Vec<usize>,
    y_min: f32,
    y_max: f32,
    score: u32,
    has_amount: bool,
    has_balance: bool,
}

/// Discover the best-scoring header candidate and its derived column
/// layout for one page's words, or `None` when no valid candidate exists
/// (page likely has no table at all).
pub fn discover(words: &[Word]) -> Option<ColumnLayout> {
    if words.is_empty() {
        return None;
    }
    let bands = y_bands(words, Y_BAND_TOLERANCE);
    let candidates = build_candidates(words, &bands);

    let best = candidates
        .into_iter()
        .filter(|c| c.has_amount && c.has_balance)
        .max_by_key(|c| c.score)?;

    Some(build_layout(words, &best))
}

fn build_candidates(words: &[Word], bands: &[Vec<usize>]) -> Vec<HeaderCandidate> {
    let mut candidates = Vec::new();
    for start in 0..bands.len() {
        let mut word_indices = bands[start].clone();
        let mut y_min = band_y_min(words, &bands[start]);
        let mut y_max = band_y_max(words, &bands[start]);

        // single-band candidate
        candidates.push(score_candidate(words, word_indices.clone(), y_min, y_max));

        // merge with immediately-following bands while within the 16pt span
        for next in bands.iter().skip(start + 1) {
            let next_y_min = band_y_min(words, next);
            if next_y_min - y_max > HEADER_MERGE_SPAN {
                break;
            }
            word_indices.extend(next.iter().copied());
            y_min = y_min.min(band_y_min(words, next));
            y_max = y_max.max(band_y_max(words, next));
            candidates.push(score_candidate(words, word_indices.clone(), y_min, y_max));
        }
    }
    candidates
}

fn band_y_min(words: &[Word], band: &[usize]) -> f32 {
    band.iter().map(|&i| words[i].top).fold(f32::INFINITY, f32::min)
}

fn band_y_max(words: &[Word], band: &[usize]) -> f32 {
    band.iter().map(|&i| words[i].bottom).fold(f32::NEG_INFINITY, f32::max)
}

fn score_candidate(words: &[Word], word_indices: Vec<usize>, y_min: f32, y_max: f32) -> HeaderCandidate {
    let mut score = 0u32;
    let mut has_amount = false;
    let mut has_balance = false;
    for (kind, _, _) in matched_phrases(words, &word_indices) {
        score += 1;
        match kind {
            ColumnKind::Withdrawal | ColumnKind::Deposit => has_amount = true,
            ColumnKind::Balance => has_balance = true,
            _ => {}
        }
    }
    HeaderCandidate {
        word_indices,
        y_min,
        y_max,
        score,
        has_amount,
        has_balance,
    }
}

fn clean(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii()).collect::<String>().to_lowercase()
}

/// Group a header candidate's words into same-line rows (within
/// `Y_BAND_TOLERANCE`), left-to-right within each row, so adjacent words can
/// be joined into phrases before alias lookup.
fn group_into_rows(words: &[Word], word_indices: &[usize]) -> Vec<Vec<usize>> {
    let mut sorted: Vec<usize> = word_indices.to_vec();
    sorted.sort_by(|&a, &b| words[a].top.partial_cmp(&words[b].top).unwrap());

    let mut rows: Vec<Vec<usize>> = Vec::new();
    for idx in sorted {
        match rows
            .iter_mut()
            .find(|row| (words[row[0]].top - words[idx].top).abs() <= Y_BAND_TOLERANCE)
        {
            Some(row) => row.push(idx),
            None => rows.push(vec![idx]),
        }
    }
    for row in &mut rows {
        row.sort_by(|&a, &b| words[a].x0.partial_cmp(&words[b].x0).unwrap());
    }
    rows
}

/// Greedily match the longest alias phrase (up to 3 words) starting at each
/// row position, consuming the words it spans. Most alias-map entries are
/// multi-word ("value date", "running balance") but `content::show_text`
/// emits one `Word` per whitespace-split token, so single-word lookups
/// alone would never reach them.
fn matched_phrases(words: &[Word], word_indices: &[usize]) -> Vec<(ColumnKind, f32, Vec<usize>)> {
    const MAX_PHRASE_WORDS: usize = 3;
    let mut matches = Vec::new();
    for row in group_into_rows(words, word_indices) {
        let mut i = 0;
        while i < row.len() {
            let max_len = MAX_PHRASE_WORDS.min(row.len() - i);
            let found = (1..=max_len).rev().find_map(|window_len| {
                let window = &row[i..i + window_len];
                let text = window.iter().map(|&idx| clean(&words[idx].text)).collect::<Vec<_>>().join(" ");
                alias(text.trim()).map(|kind| (kind, window_len))
            });
            match found {
                Some((kind, window_len)) => {
                    let window = &row[i..i + window_len];
                    let x_mid = window.iter().map(|&idx| words[idx].x_mid()).sum::<f32>() / window_len as f32;
                    matches.push((kind, x_mid, window.to_vec()));
                    i += window_len;
                }
                None => i += 1,
            }
        }
    }
    matches
}

fn build_layout(words: &[Word], candidate: &HeaderCandidate) -> ColumnLayout {
    let mut slots: Vec<(ColumnKind, f32)> = matched_phrases(words, &candidate.word_indices)
        .into_iter()
        .map(|(kind, x_mid, _)| (kind, x_mid))
        .collect();
    slots.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    slots.dedup_by_key(|(kind, _)| *kind);

    let mut columns = IndexMap::new();
    for (i, (kind, x_mid)) in slots.iter().enumerate() {
        let left = if i == 0 {
            f32::NEG_INFINITY
        } else {
            (slots[i - 1].1 + x_mid) / 2.0
        };
        let right = if i + 1 == slots.len() {
            f32::INFINITY
        } else {
            (x_mid + slots[i + 1].1) / 2.0
        };
        columns.insert(*kind, Interval::new(left, right));
    }

    ColumnLayout {
        columns,
        header_y_min: candidate.y_min,
        header_y_max: candidate.y_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(text: &str, x0: f32, x1: f32, top: f32, bottom: f32) -> Word {
        Word {
            text: text.to_string(),
            x0,
            x1,
            top,
            bottom,
            page: 0,
        }
    }

    #[test]
    fn discovers_single_line_header() {
        let words = vec![
            w("Date", 0.0, 20.0, 0.0, 10.0),
            w("Description", 30.0, 80.0, 0.0, 10.0),
            w("Withdrawal", 90.0, 130.0, 0.0, 10.0),
            w("Balance", 140.0, 180.0, 0.0, 10.0),
            w("01", 0.0, 10.0, 20.0, 30.0),
        ];
        let layout = discover(&words).unwrap();
        assert!(layout.is_valid());
        assert!(layout.columns.contains_key(&ColumnKind::Withdrawal));
    }

    #[test]
    fn merges_two_line_header_within_16pt() {
        let words = vec![
            w("Date", 0.0, 20.0, 0.0, 10.0),
            w("Withdrawal", 30.0, 80.0, 0.0, 10.0),
            w("Balance", 90.0, 130.0, 0.0, 8.0),
            w("(SGD)", 90.0, 130.0, 10.0, 18.0),
        ];
        let layout = discover(&words).unwrap();
        assert!(layout.is_valid());
        assert!(layout.header_y_max - layout.header_y_min <= 18.0);
    }

    #[test]
    fn joins_adjacent_words_into_multi_word_alias() {
        let words = vec![
            w("Value", 0.0, 20.0, 0.0, 10.0),
            w("Date", 22.0, 42.0, 0.0, 10.0),
            w("Withdrawal", 50.0, 100.0, 0.0, 10.0),
            w("Running", 110.0, 140.0, 0.0, 10.0),
            w("Balance", 142.0, 172.0, 0.0, 10.0),
        ];
        let layout = discover(&words).unwrap();
        assert!(layout.is_valid());
        assert!(layout.columns.contains_key(&ColumnKind::ValueDate));
        assert!(layout.columns.contains_key(&ColumnKind::Balance));
    }

    #[test]
    fn no_valid_header_returns_none() {
        let words = vec![w("Hello", 0.0, 10.0, 0.0, 10.0), w("World", 20.0, 30.0, 0.0, 10.0)];
        assert!(discover(&words).is_none());
    }
}
