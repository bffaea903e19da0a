//! PDF container structure: header, cross-reference table, trailer, and
//! the page tree. Classic (non-cross-reference-stream) xref format only,
//! with a brute-force object scan fallback when the xref table is missing
//! or inconsistent — the same recovery posture as the teacher's
//! `xref_reconstruction.rs`, simplified to a single "scan for `N G obj`"
//! pass.

use std::collections::HashMap;

use regex::bytes::Regex;

use super::decode::decode_stream;
use super::object::{Dict, Object};
use super::parser::Parser;
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Container {
    buf: Vec<u8>,
    offsets: HashMap<u32, usize>,
    trailer: Dict,
}

impl Container {
    pub fn parse(buf: Vec<u8>) -> Result<Self> {
        if !buf.starts_with(b"%PDF-") {
            return Err(Error::PdfUnreadable("missing %PDF- header".into()));
        }
        let offsets = Self::parse_xref_chain(&buf).unwrap_or_default();
        let mut container = Container {
            buf,
            offsets,
            trailer: Dict::new(),
        };
        container.trailer = container.find_trailer().unwrap_or_default();

        if container.trailer.get("Root").is_none() || container.offsets.is_empty() {
            container.rebuild_by_scanning()?;
        }
        if container.trailer.get("Root").is_none() {
            return Err(Error::PdfUnreadable(
                "could not locate document catalog".into(),
            ));
        }
        Ok(container)
    }

    fn parse_xref_chain(buf: &[u8]) -> Option<HashMap<u32, usize>> {
        let startxref = find_last(buf, b"startxref")?;
        let tail = &buf[startxref + "startxref".len()..];
        let offset: usize = std::str::from_utf8(tail)
            .ok()?
            .trim_start()
            .split_whitespace()
            .next()?
            .parse()
            .ok()?;
        let mut offsets = HashMap::new();
        Self::parse_xref_section(buf, offset, &mut offsets);
        if offsets.is_empty() {
            None
        } else {
            Some(offsets)
        }
    }

    fn parse_xref_section(buf: &[u8], offset: usize, offsets: &mut HashMap<u32, usize>) {
        if offset >= buf.len() {
            return;
        }
        let section = &buf[offset..];
        let trimmed_start = section
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(section.len());
        if !section[trimmed_start..].starts_with(b"xref") {
            return;
        }
        let mut lines = section.split(|&b| b == b'\n');
        lines.next(); // the `xref` keyword line
        let mut pending: Option<(u32, u32)> = None; // (start_obj, remaining_count)
        for raw_line in lines {
            let line = trim_bytes(raw_line);
            if line.is_empty() {
                continue;
            }
            if line == b"trailer" || line.starts_with(b"trailer") {
                break;
            }
            let text = String::from_utf8_lossy(line);
            let parts: Vec<&str> = text.split_whitespace().collect();
            match pending {
                None => {
                    if parts.len() == 2 {
                        if let (Ok(start), Ok(count)) =
                            (parts[0].parse::<u32>(), parts[1].parse::<u32>())
                        {
                            pending = Some((start, count));
                        }
                    }
                }
                Some((start, remaining)) if remaining > 0 => {
                    if parts.len() >= 3 {
                        if let Ok(off) = parts[0].parse::<usize>() {
                            if parts[2] == "n" {
                                offsets.entry(start).or_insert(off);
                            }
                        }
                    }
                    pending = if remaining - 1 == 0 {
                        None
                    } else {
                        Some((start + 1, remaining - 1))
                    };
                }
                Some(_) => {}
            }
        }
    }

    fn find_trailer(&self) -> Option<Dict> {
        let pos = find_last(&self.buf, b"trailer")?;
        let mut parser = Parser::at(&self.buf, pos + "trailer".len());
        parser.parse_object().ok()?.as_dict().cloned()
    }

    /// Recovery path: scan the whole buffer for `N G obj` markers and
    /// rebuild the offset table; find the catalog by scanning parsed
    /// dictionaries for `/Type /Catalog`.
    fn rebuild_by_scanning(&mut self) -> Result<()> {
        let re = Regex::new(r"(?m)(\d+)\s+(\d+)\s+obj\b").unwrap();
        let mut offsets = HashMap::new();
        for cap in re.captures_iter(&self.buf) {
            let m = cap.get(0).unwrap();
            if let Ok(num) = std::str::from_utf8(&cap[1]).unwrap_or("").parse::<u32>() {
                offsets.insert(num, m.start());
            }
        }
        if offsets.is_empty() {
            return Err(Error::PdfUnreadable("no indirect objects found".into()));
        }
        self.offsets = offsets;

        if self.trailer.get("Root").is_none() {
            for &num in self.offsets.keys().collect::<Vec<_>>() {
                if let Ok(obj) = self.get_object(num) {
                    if let Some(dict) = obj.as_dict() {
                        if dict.get("Type").and_then(|o| o.as_name()) == Some("Catalog") {
                            self.trailer
                                .entry("Root".to_string())
                                .or_insert(Object::Ref(num, 0));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get_object(&self, num: u32) -> Result<Object> {
        let offset = *self.offsets.get(&num).ok_or_else(|| Error::ParseError {
            offset: 0,
            reason: format!("object {num} not found in xref"),
        })?;
        let mut parser = Parser::at(&self.buf, offset);
        // Skip the `N G obj` header.
        let _ = parser.parse_object(); // object number
        let _ = parser.parse_object(); // generation
        parser.parse_object()
    }

    pub fn resolve(&self, obj: &Object) -> Result<Object> {
        match obj {
            Object::Ref(num, _) => self.get_object(*num),
            other => Ok(other.clone()),
        }
    }

    pub fn resolve_dict_entry(&self, dict: &Dict, key: &str) -> Result<Option<Object>> {
        match dict.get(key) {
            Some(obj) => Ok(Some(self.resolve(obj)?)),
            None => Ok(None),
        }
    }

    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    pub fn stream_data(&self, dict: &Dict, raw: &[u8]) -> Result<Vec<u8>> {
        decode_stream(dict, raw)
    }

    /// Walk the page tree rooted at the catalog, returning each leaf
    /// page's dictionary with `Resources`/`MediaBox` inherited from
    /// ancestor `Pages` nodes when the leaf does not declare its own.
    pub fn pages(&self) -> Result<Vec<Dict>> {
        let root = self
            .resolve_dict_entry(&self.trailer, "Root")?
            .ok_or_else(|| Error::PdfUnreadable("trailer missing /Root".into()))?;
        let catalog = root
            .as_dict()
            .ok_or_else(|| Error::PdfUnreadable("/Root is not a dictionary".into()))?;
        let pages_ref = catalog
            .get("Pages")
            .ok_or_else(|| Error::PdfUnreadable("catalog missing /Pages".into()))?;
        let pages_dict = self
            .resolve(pages_ref)?
            .as_dict()
            .cloned()
            .ok_or_else(|| Error::PdfUnreadable("/Pages is not a dictionary".into()))?;

        let mut out = Vec::new();
        let mut seen = std::collections::HashSet::new();
        self.walk_pages(&pages_dict, &Dict::new(), &mut out, &mut seen, 0)?;
        if out.is_empty() {
            return Err(Error::PdfUnreadable("document has zero pages".into()));
        }
        Ok(out)
    }

    fn walk_pages(
        &self,
        node: &Dict,
        inherited: &Dict,
        out: &mut Vec<Dict>,
        seen: &mut std::collections::HashSet<usize>,
        depth: u32,
    ) -> Result<()> {
        if depth > 64 {
            return Ok(()); // guard against cyclic /Kids
        }
        let mut merged = inherited.clone();
        for key in ["Resources", "MediaBox", "Rotate"] {
            if let Some(v) = node.get(key) {
                merged.insert(key.to_string(), v.clone());
            }
        }

        let is_pages = node.get("Type").and_then(|o| o.as_name()) == Some("Pages");
        let kids = node.get("Kids").and_then(|o| o.as_array());
        if is_pages || kids.is_some() {
            if let Some(kids) = kids {
                for kid in kids {
                    if let Some((num, _)) = kid.as_ref() {
                        if !seen.insert(num as usize) {
                            continue;
                        }
                    }
                    let resolved = self.resolve(kid)?;
                    if let Some(dict) = resolved.as_dict() {
                        self.walk_pages(dict, &merged, out, seen, depth + 1)?;
                    }
                }
            }
        } else {
            let mut page = merged;
            for (k, v) in node {
                page.insert(k.clone(), v.clone());
            }
            out.push(page);
        }
        Ok(())
    }
}

fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .enumerate()
        .rev()
        .find(|(_, w)| *w == needle)
        .map(|(i, _)| i)
}

fn trim_bytes(b: &[u8]) -> &[u8] {
    let start = b.iter().position(|&c| !c.is_ascii_whitespace()).unwrap_or(b.len());
    let end = b.iter().rposition(|&c| !c.is_ascii_whitespace()).map(|i| i + 1).unwrap_or(start);
    &b[start..end]
}
