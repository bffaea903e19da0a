//! Content-stream interpreter: walks `BT/ET`, text-positioning, and
//! text-showing operators to produce word geometry. Scaled down from the
//! teacher's `extractors::text` — no embedded CID font program parsing;
//! glyph advance is approximated from the declared font size, which is
//! sufficient for column-interval discovery (§4.D never needs sub-glyph
//! precision).

use super::lexer::{Lexer, Token};
use super::object::Object;
use crate::geometry::Word;

/// Average glyph width as a fraction of font size, used when no font
/// metrics are available. Matches common serif/sans body text fairly
/// closely for the ASCII range bank statements are written in.
const AVG_GLYPH_WIDTH_EM: f32 = 0.5;

#[derive(Clone, Copy)]
struct TextMatrix {
    // Only translation is tracked; statements do not rotate/skew text.
    tx: f32,
    ty: f32,
}

struct TextState {
    matrix: TextMatrix,
    line_matrix: TextMatrix,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: TextMatrix { tx: 0.0, ty: 0.0 },
            line_matrix: TextMatrix { tx: 0.0, ty: 0.0 },
            font_size: 10.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
        }
    }
}

/// Extract words from a decoded content stream, given the page height
/// (needed to flip PDF's bottom-up `y` into the spec's top-down `top`).
pub fn extract_words(content: &[u8], page_height: f32, page_index: usize) -> Vec<Word> {
    let mut lexer = Lexer::new(content);
    let mut operands: Vec<Object> = Vec::new();
    let mut state = TextState::default();
    let mut in_text = false;
    let mut words = Vec::new();

    while let Some(tok) = lexer.next_token() {
        match tok {
            Token::Int(n) => operands.push(Object::Int(n)),
            Token::Real(r) => operands.push(Object::Real(r)),
            Token::Str(s) => operands.push(Object::Str(s)),
            Token::Name(n) => operands.push(Object::Name(n)),
            Token::ArrayStart => {
                let arr = read_array(&mut lexer);
                operands.push(Object::Array(arr));
            }
            Token::ArrayEnd | Token::DictStart | Token::DictEnd => {
                operands.clear();
            }
            Token::Keyword(op) => {
                apply_operator(
                    &op,
                    &operands,
                    &mut state,
                    &mut in_text,
                    page_height,
                    page_index,
                    &mut words,
                );
                operands.clear();
            }
        }
    }
    words
}

fn read_array(lexer: &mut Lexer) -> Vec<Object> {
    let mut items = Vec::new();
    while let Some(tok) = lexer.next_token() {
        match tok {
            Token::ArrayEnd => break,
            Token::Int(n) => items.push(Object::Int(n)),
            Token::Real(r) => items.push(Object::Real(r)),
            Token::Str(s) => items.push(Object::Str(s)),
            Token::Name(n) => items.push(Object::Name(n)),
            _ => {}
        }
    }
    items
}

fn num(operands: &[Object], idx: usize) -> f32 {
    operands.get(idx).and_then(|o| o.as_f64()).unwrap_or(0.0) as f32
}

#[allow(clippy::too_many_arguments)]
fn apply_operator(
    op: &str,
    operands: &[Object],
    state: &mut TextState,
    in_text: &mut bool,
    page_height: f32,
    page_index: usize,
    words: &mut Vec<Word>,
) {
    match op {
        "BT" => {
            *in_text = true;
            state.matrix = TextMatrix { tx: 0.0, ty: 0.0 };
            state.line_matrix = TextMatrix { tx: 0.0, ty: 0.0 };
        }
        "ET" => *in_text = false,
        "Tf" => {
            if operands.len() >= 2 {
                state.font_size = num(operands, 1);
            }
        }
        "Tc" => state.char_spacing = num(operands, 0),
        "Tw" => state.word_spacing = num(operands, 0),
        "Td" | "TD" => {
            let dx = num(operands, 0);
            let dy = num(operands, 1);
            state.line_matrix.tx += dx;
            state.line_matrix.ty += dy;
            state.matrix = state.line_matrix;
        }
        "T*" => {
            state.line_matrix.ty -= state.font_size * 1.15;
            state.matrix = state.line_matrix;
        }
        "Tm" if operands.len() >= 6 => {
            let tx = num(operands, 4);
            let ty = num(operands, 5);
            state.matrix = TextMatrix { tx, ty };
            state.line_matrix = state.matrix;
        }
        "Tj" if *in_text => {
            if let Some(Object::Str(s)) = operands.first() {
                show_text(s, state, page_height, page_index, words);
            }
        }
        "'" if *in_text => {
            state.line_matrix.ty -= state.font_size * 1.15;
            state.matrix = state.line_matrix;
            if let Some(Object::Str(s)) = operands.first() {
                show_text(s, state, page_height, page_index, words);
            }
        }
        "\"" if *in_text && operands.len() >= 3 => {
            state.word_spacing = num(operands, 0);
            state.char_spacing = num(operands, 1);
            state.line_matrix.ty -= state.font_size * 1.15;
            state.matrix = state.line_matrix;
            if let Some(Object::Str(s)) = operands.get(2) {
                show_text(s, state, page_height, page_index, words);
            }
        }
        "TJ" if *in_text => {
            if let Some(Object::Array(items)) = operands.first() {
                for item in items {
                    match item {
                        Object::Str(s) => show_text(s, state, page_height, page_index, words),
                        Object::Int(_) | Object::Real(_) => {
                            let adj = item.as_f64().unwrap_or(0.0) as f32;
                            state.matrix.tx -= adj / 1000.0 * state.font_size;
                        }
                        _ => {}
                    }
                }
            }
        }
        _ => {}
    }
}

/// Decode raw string bytes into text assuming a single-byte, roughly
/// WinAnsi/Latin-1-compatible simple font (the common case for bank
/// statement body text; CID/Type0 fonts are out of scope per SPEC_FULL §4.A).
fn decode_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Advance the text matrix by the string's approximate width and emit one
/// `Word` per whitespace-delimited run (PDF producers commonly emit a
/// separate `Tj`/`TJ` string per visual word already, so this mostly
/// passes runs through, but guards against multi-word literal strings).
fn show_text(
    bytes: &[u8],
    state: &mut TextState,
    page_height: f32,
    page_index: usize,
    words: &mut Vec<Word>,
) {
    let text = decode_bytes(bytes);
    let glyph_width = state.font_size * AVG_GLYPH_WIDTH_EM;
    let ascent = state.font_size * 0.75;
    let descent = state.font_size * 0.25;

    let start_x = state.matrix.tx;
    let text_y = state.matrix.ty;
    let mut cursor = start_x;
    let mut word_start: Option<f32> = None;
    let mut word_text = String::new();

    for ch in text.chars() {
        let advance = glyph_width + state.char_spacing;
        if ch.is_whitespace() {
            flush_word(&mut word_text, &mut word_start, cursor, text_y, ascent, descent, page_height, page_index, words);
            cursor += advance.max(glyph_width) + state.word_spacing;
        } else {
            if word_start.is_none() {
                word_start = Some(cursor);
            }
            word_text.push(ch);
            cursor += advance;
        }
    }
    flush_word(&mut word_text, &mut word_start, cursor, text_y, ascent, descent, page_height, page_index, words);
    state.matrix.tx = cursor;
}

#[allow(clippy::too_many_arguments)]
fn flush_word(
    word_text: &mut String,
    word_start: &mut Option<f32>,
    cursor: f32,
    text_y: f32,
    ascent: f32,
    descent: f32,
    page_height: f32,
    page_index: usize,
    words: &mut Vec<Word>,
) {
    if let Some(x0) = word_start.take() {
        if !word_text.is_empty() {
            let top = page_height - (text_y + ascent);
            let bottom = page_height - (text_y - descent);
            words.push(Word {
                text: std::mem::take(word_text),
                x0,
                x1: cursor,
                top,
                bottom,
                page: page_index,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_word() {
        let content = b"BT /F1 10 Tf 10 700 Td (Hello) Tj ET";
        let words = extract_words(content, 792.0, 0);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "Hello");
    }

    #[test]
    fn splits_multiple_words_on_whitespace() {
        let content = b"BT /F1 10 Tf 10 700 Td (01 Dec Payment) Tj ET";
        let words = extract_words(content, 792.0, 0);
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].text, "01");
        assert_eq!(words[1].text, "Dec");
        assert_eq!(words[2].text, "Payment");
    }

    #[test]
    fn tj_array_adjustments_do_not_emit_spurious_words() {
        let content = b"BT /F1 10 Tf 10 700 Td [(Bal) -20 (ance)] TJ ET";
        let words = extract_words(content, 792.0, 0);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Bal");
        assert_eq!(words[1].text, "ance");
    }
}
