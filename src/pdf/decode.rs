//! Stream filter decoding. Only the filters bank-statement PDFs actually
//! use are implemented; anything else surfaces as `Error::UnsupportedFilter`
//! rather than silently losing data.

use flate2::read::ZlibDecoder;
use std::io::Read;

use crate::error::{Error, Result};
use crate::pdf::object::{Dict, Object};

/// Decode a stream's raw bytes according to its `/Filter` entry (a single
/// name or an array of names, applied in order).
pub fn decode_stream(dict: &Dict, raw: &[u8]) -> Result<Vec<u8>> {
    let filters = filter_names(dict);
    let mut data = raw.to_vec();
    for filter in filters {
        data = match filter.as_str() {
            "FlateDecode" | "Fl" => flate_decode(&data)?,
            "ASCIIHexDecode" | "AHx" => ascii_hex_decode(&data),
            "ASCII85Decode" | "A85" => ascii85_decode(&data),
            other => return Err(Error::UnsupportedFilter(other.to_string())),
        };
    }
    Ok(data)
}

fn filter_names(dict: &Dict) -> Vec<String> {
    match dict.get("Filter") {
        Some(Object::Name(n)) => vec![n.clone()],
        Some(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::UnsupportedFilter(format!("FlateDecode: {e}")))?;
    Ok(out)
}

fn ascii_hex_decode(data: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = data
        .iter()
        .copied()
        .take_while(|&b| b != b'>')
        .filter(|b| b.is_ascii_hexdigit())
        .collect();
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16).unwrap_or(0) as u8;
            let lo = pair.get(1).and_then(|b| (*b as char).to_digit(16)).unwrap_or(0) as u8;
            (hi << 4) | lo
        })
        .collect()
}

fn ascii85_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut group = [0u8; 5];
    let mut count = 0;
    for &b in data {
        if b == b'~' {
            break;
        }
        if b == b'z' && count == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(b'!'..=b'u').contains(&b) {
            continue;
        }
        group[count] = b - b'!';
        count += 1;
        if count == 5 {
            push_ascii85_group(&group, 5, &mut out);
            count = 0;
        }
    }
    if count > 0 {
        for slot in group.iter_mut().skip(count) {
            *slot = 84;
        }
        push_ascii85_group(&group, count, &mut out);
    }
    out
}

fn push_ascii85_group(group: &[u8; 5], used: usize, out: &mut Vec<u8>) {
    let mut value: u32 = 0;
    for &g in group {
        value = value.wrapping_mul(85).wrapping_add(g as u32);
    }
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[..used.saturating_sub(1).max(1)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_hex() {
        let decoded = ascii_hex_decode(b"48656C6C6F>");
        assert_eq!(decoded, b"Hello");
    }
}
