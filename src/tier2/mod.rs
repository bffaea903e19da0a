//! Tier-2 Word-Geometry Extractor (spec §4.D) — the intellectual core.
//! Column-layout discovery per page, word-to-column assignment, row
//! assembly via a state machine, reverse-chronological correction, and
//! currency-section segmentation.

pub mod assign;
pub mod currency;
pub mod layout;
pub mod quirks;
pub mod reverse;
pub mod rowstate;

use crate::error::Result;
use crate::geometry::y_bands;
use crate::model::{ColumnLayout, Transaction};
use crate::pdf::PdfAccess;
use quirks::BankQuirks;
use rowstate::RowAssembler;

const Y_BAND_TOLERANCE: f32 = 4.0;
const ABANDONMENT_THRESHOLD: usize = 3;

/// Run the full Tier-2 cascade. Returns empty when fewer than 3
/// transactions are produced (spec §4.D.7), signalling the caller to fall
/// through to Tier 3.
pub fn extract(pdf: &dyn PdfAccess, bank: &str) -> Result<Vec<Transaction>> {
    let quirks = BankQuirks::for_bank(bank);
    let mut current_currency = "SGD".to_string();
    let mut assembler = RowAssembler::new(&quirks, current_currency.clone());
    let mut cached_layout: Option<ColumnLayout> = None;

    for page in 0..pdf.page_count() {
        let words = pdf.page_words(page)?;
        if words.is_empty() {
            continue;
        }

        if let Some(layout) = layout::discover(&words) {
            cached_layout = Some(layout);
        }
        let Some(layout) = cached_layout.as_ref() else {
            continue;
        };

        let bands = y_bands(&words, Y_BAND_TOLERANCE);
        for band in &bands {
            let band_y = words[band[0]].top;
            if band_y >= layout.header_y_min && band_y <= layout.header_y_max {
                continue;
            }
            if let Some(code) = row_currency_code(&words, band) {
                if code != current_currency {
                    let section_before = assembler.account_section();
                    assembler.flush();
                    let mut next = RowAssembler::new(&quirks, code.to_string());
                    next.set_account_section(section_before + 1);
                    assembler = replace_and_drain(assembler, next);
                    current_currency = code.to_string();
                }
                continue;
            }

            let row = assign::assign_band(&words, band, layout);
            if row.is_empty() {
                continue;
            }
            if let Some(code) = row
                .get(&crate::model::ColumnKind::Currency)
                .and_then(|cell| currency::column_currency_code(cell))
            {
                if code != current_currency {
                    let section_before = assembler.account_section();
                    assembler.flush();
                    let mut next = RowAssembler::new(&quirks, code.to_string());
                    next.set_account_section(section_before + 1);
                    assembler = replace_and_drain(assembler, next);
                    current_currency = code.to_string();
                }
            }
            assembler.feed(&row, page);
        }
    }

    let transactions = assembler.finish();
    let transactions = reverse::maybe_reverse(transactions);

    if transactions.len() < ABANDONMENT_THRESHOLD {
        Ok(Vec::new())
    } else {
        Ok(transactions)
    }
}

/// Swap in a freshly-sectioned assembler, carrying over everything already
/// emitted by the outgoing one.
fn replace_and_drain<'a>(old: RowAssembler<'a>, new: RowAssembler<'a>) -> RowAssembler<'a> {
    let mut new = new;
    new.absorb_emitted(old.finish());
    new
}

fn row_currency_code(words: &[crate::geometry::Word], band: &[usize]) -> Option<&'static str> {
    if band.len() != 1 {
        return None;
    }
    currency::standalone_currency_code(&words[band[0]].text)
}
