//! Adaptive page batching (spec §4.E step 4): batch size derived from the
//! mean characters per page, with a one-page overlap between batches.

/// A contiguous run of page indices submitted to the chat model together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub pages: Vec<usize>,
}

fn batch_size_for(mean_chars_per_page: f64) -> usize {
    if mean_chars_per_page > 1500.0 {
        2
    } else if mean_chars_per_page > 1000.0 {
        3
    } else {
        5
    }
}

/// Split `page_texts` (one entry per page, in order) into overlapping
/// batches. Consecutive batches share their last/first page so
/// transactions split across a page boundary are recoverable by the
/// dedup pass.
pub fn build_batches(page_texts: &[String]) -> Vec<Batch> {
    if page_texts.is_empty() {
        return Vec::new();
    }
    let total_chars: usize = page_texts.iter().map(|t| t.chars().count()).sum();
    let mean = total_chars as f64 / page_texts.len() as f64;
    let size = batch_size_for(mean);

    let mut batches = Vec::new();
    let mut start = 0usize;
    while start < page_texts.len() {
        let end = (start + size).min(page_texts.len());
        batches.push(Batch {
            pages: (start..end).collect(),
        });
        if end == page_texts.len() {
            break;
        }
        start = end - 1; // one-page overlap
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_pages_use_two_page_batches() {
        let pages = vec!["x".repeat(2000), "x".repeat(2000), "x".repeat(2000)];
        let batches = build_batches(&pages);
        assert_eq!(batches[0].pages, vec![0, 1]);
    }

    #[test]
    fn sparse_pages_use_five_page_batches() {
        let pages: Vec<String> = (0..6).map(|_| "short".to_string()).collect();
        let batches = build_batches(&pages);
        assert_eq!(batches[0].pages.len(), 5);
    }

    #[test]
    fn batches_overlap_by_one_page() {
        let pages = vec!["x".repeat(2000); 4];
        let batches = build_batches(&pages);
        assert!(batches.len() >= 2);
        let last_of_first = *batches[0].pages.last().unwrap();
        let first_of_second = batches[1].pages[0];
        assert_eq!(last_of_first, first_of_second);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(build_batches(&[]).is_empty());
    }
}
