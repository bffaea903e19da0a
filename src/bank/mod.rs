//! Bank Identifier (spec §4.B): vision → product names → keywords,
//! stopping at the first confident result.

pub mod aliases;

use regex::RegexBuilder;

use crate::model::{BankLayout, DetectionSource};
use crate::pdf::PdfAccess;
use crate::tier3::VisionModel;

const VISION_PROMPT_PREFIX: &str = "Identify the issuing bank of this statement. Answer with exactly one of: ";

/// Run the three-step cascade. `vision` is `None` when no vision
/// capability is wired, per spec §4.B step 1.
pub async fn identify(
    pdf: &dyn PdfAccess,
    vision: Option<&dyn VisionModel>,
) -> BankLayout {
    if let Some(vision) = vision {
        if let Some(layout) = vision_step(pdf, vision).await {
            log::debug!("bank: identified '{}' via vision logo crop (confidence {})", layout.bank, layout.confidence);
            return layout;
        }
        log::debug!("bank: vision step did not return a known bank, falling through to product matching");
    }
    if let Some(layout) = product_step(pdf) {
        log::debug!("bank: identified '{}' via product-name literal (confidence {})", layout.bank, layout.confidence);
        return layout;
    }
    let layout = keyword_step(pdf);
    if layout.bank == "unknown" {
        log::warn!("bank: no vision/product/keyword match, identification fell back to 'unknown'");
    } else {
        log::debug!("bank: identified '{}' via keyword match (confidence {})", layout.bank, layout.confidence);
    }
    layout
}

async fn vision_step(pdf: &dyn PdfAccess, vision: &dyn VisionModel) -> Option<BankLayout> {
    if pdf.page_count() == 0 {
        return None;
    }
    let png = pdf.render_page(0, 150.0).ok()?;
    let crop = crop_top_fraction(&png, 0.20)?;
    let prompt = format!("{VISION_PROMPT_PREFIX}{}", aliases::KNOWN_BANKS.join(", "));
    let answer = vision.analyze_image(&crop, &prompt).await.ok()?;
    let cleaned = answer.trim();
    aliases::KNOWN_BANKS
        .iter()
        .find(|&&bank| cleaned.eq_ignore_ascii_case(bank))
        .map(|&bank| BankLayout {
            bank: bank.to_string(),
            confidence: 0.9,
            source: DetectionSource::Vision,
        })
}

fn crop_top_fraction(png_bytes: &[u8], fraction: f32) -> Option<Vec<u8>> {
    let img = image::load_from_memory(png_bytes).ok()?;
    let height = (img.height() as f32 * fraction).round().max(1.0) as u32;
    let cropped = img.crop_imm(0, 0, img.width(), height.min(img.height()));
    let mut out = Vec::new();
    cropped
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageOutputFormat::Png)
        .ok()?;
    Some(out)
}

fn product_step(pdf: &dyn PdfAccess) -> Option<BankLayout> {
    let text = first_n_pages_text(pdf, 3).to_uppercase();
    for (literal, bank) in aliases::PRODUCT_NAMES {
        if text.contains(literal) {
            return Some(BankLayout {
                bank: bank.to_string(),
                confidence: 0.95,
                source: DetectionSource::Product,
            });
        }
    }
    None
}

fn keyword_step(pdf: &dyn PdfAccess) -> BankLayout {
    let text = first_n_pages_text(pdf, 3).to_uppercase();
    for (bank, keywords) in aliases::KEYWORDS {
        for keyword in *keywords {
            if keyword_matches(&text, keyword) {
                return BankLayout {
                    bank: bank.to_string(),
                    confidence: 0.6,
                    source: DetectionSource::Keyword,
                };
            }
        }
    }
    BankLayout {
        bank: "unknown".to_string(),
        confidence: 0.0,
        source: DetectionSource::Keyword,
    }
}

fn keyword_matches(haystack: &str, keyword: &str) -> bool {
    let trimmed = keyword.trim();
    let pattern = format!(r"\b{}\b", regex::escape(trimmed));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}

fn first_n_pages_text(pdf: &dyn PdfAccess, n: usize) -> String {
    (0..pdf.page_count().min(n))
        .filter_map(|p| pdf.page_text(p).ok())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::FakePdfAccess;

    #[tokio::test]
    async fn product_name_beats_keyword() {
        let pdf = FakePdfAccess {
            texts: vec!["STATEMENT OF ACCOUNT\nAUTOSAVE ACCOUNT\nOCBC BRANCH MENTIONED".into()],
            ..Default::default()
        };
        let layout = identify(&pdf, None).await;
        assert_eq!(layout.bank, "DBS");
        assert_eq!(layout.source, DetectionSource::Product);
    }

    #[tokio::test]
    async fn keyword_short_name_requires_word_boundary() {
        let pdf = FakePdfAccess {
            texts: vec!["this is OCBCish nonsense with no real bank name".into()],
            ..Default::default()
        };
        let layout = identify(&pdf, None).await;
        assert_eq!(layout.bank, "unknown");
    }

    #[tokio::test]
    async fn keyword_matches_hsbc() {
        let pdf = FakePdfAccess {
            texts: vec!["HSBC Bank (Singapore) Limited".into()],
            ..Default::default()
        };
        let layout = identify(&pdf, None).await;
        assert_eq!(layout.bank, "HSBC");
        assert_eq!(layout.source, DetectionSource::Keyword);
    }
}
