//! Scanned-PDF heuristic (spec §4.A): a document is scanned iff the mean
//! extractable character count per page is below ~20.

const SCANNED_MEAN_CHARS_THRESHOLD: f64 = 20.0;

pub fn is_scanned(pages_text: &[String]) -> bool {
    if pages_text.is_empty() {
        return false;
    }
    let total: usize = pages_text.iter().map(|t| t.chars().filter(|c| !c.is_whitespace()).count()).sum();
    let mean = total as f64 / pages_text.len() as f64;
    mean < SCANNED_MEAN_CHARS_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_near_empty_pages_as_scanned() {
        let pages = vec!["".to_string(), "  \n ".to_string()];
        assert!(is_scanned(&pages));
    }

    #[test]
    fn does_not_flag_text_heavy_pages() {
        let pages = vec!["01 Dec Payment to ABC Pte Ltd 100.00 1,234.56".to_string()];
        assert!(!is_scanned(&pages));
    }
}
