//! GS1 payload decoder.
//!
//! Scans a raw DataMatrix / GS1-128 payload field by field. Unknown or
//! vendor-specific AIs and malformed fixed-length values are skipped up to the
//! next separator instead of rejecting the whole payload; the operator can
//! always re-scan, so extracting what is usable wins over strictness.
//!
//! Accepted forms:
//! - concatenated: `0104012345678901172612311012345`
//! - with separators: `01040123456789011012345<GS>21SN9`
//! - bracketed: `(01)04012345678901(17)261231(10)12345`

use std::sync::OnceLock;

use regex::Regex;

use crate::ai::{self, AiDef, AiField, FieldLength};
use crate::error::DecodeError;
use crate::expiry;
use crate::model::ScanResult;

/// ASCII 29, terminates variable-length fields.
pub const GROUP_SEPARATOR: char = '\u{1d}';

/// Symbology identifier some scanners prepend to GS1 DataMatrix payloads.
pub const SYMBOLOGY_PREFIX: &str = "]d2";

const GS: u8 = 0x1d;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Look for `REF…` in the raw text when no reference AI was present.
    pub ref_fallback: bool,
    /// Century base for the `YYMMDD` window (e.g. `2000`).
    pub century: i32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            ref_fallback: true,
            century: expiry::current_century(),
        }
    }
}

/// Decode with default options.
pub fn decode(raw: &str) -> Result<ScanResult, DecodeError> {
    decode_with(raw, &DecodeOptions::default())
}

pub fn decode_with(raw: &str, options: &DecodeOptions) -> Result<ScanResult, DecodeError> {
    let mut result = ScanResult {
        raw_data: raw.to_string(),
        ..Default::default()
    };

    let data = raw.strip_prefix(SYMBOLOGY_PREFIX).unwrap_or(raw);

    for (def, value) in segments(data) {
        store_field(&mut result, def, value, options);
    }

    if options.ref_fallback && result.reference.is_empty() && !result.lot.is_empty() {
        if let Some(reference) = reference_from_text(raw) {
            log::debug!("REF taken from label text: {reference}");
            result.reference = reference;
        }
    }

    if !result.has_identity() {
        return Err(DecodeError::NoIdentifyingField);
    }

    Ok(result)
}

/// Split `data` into recognized `(AI, value)` pairs, dropping everything else.
fn segments(data: &str) -> Vec<(&'static AiDef, &str)> {
    let bytes = data.as_bytes();
    let bracketed = data.starts_with('(');
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == GS {
            pos += 1;
            continue;
        }

        let (def, value_start) = if bytes[pos] == b'(' {
            match data[pos + 1..].find(')') {
                Some(rel) => {
                    let code = &data[pos + 1..pos + 1 + rel];
                    (ai::lookup(code), pos + 2 + rel)
                }
                None => (None, pos + 1),
            }
        } else if let Some(def) = data.get(pos..pos + 2).and_then(ai::lookup) {
            (Some(def), pos + 2)
        } else if let Some(def) = data.get(pos..pos + 3).and_then(ai::lookup) {
            (Some(def), pos + 3)
        } else {
            (None, pos)
        };

        let Some(def) = def else {
            let end = field_end(data, value_start, bracketed);
            log::debug!("skipping unknown AI segment {:?}", &data[pos..end]);
            pos = end.max(pos + 1);
            continue;
        };

        match def.length {
            FieldLength::Fixed(len) => {
                match data.get(value_start..value_start + len) {
                    Some(value) if value.bytes().all(|b| b.is_ascii_digit()) => {
                        out.push((def, value));
                        pos = value_start + len;
                    }
                    _ => {
                        let end = field_end(data, value_start, bracketed);
                        log::debug!("discarding malformed {} value {:?}", def.name, &data[value_start..end]);
                        pos = end.max(pos + 1);
                    }
                }
            }
            FieldLength::Variable => {
                let end = field_end(data, value_start, bracketed);
                out.push((def, &data[value_start..end]));
                pos = end.max(pos + 1);
            }
        }
    }

    out
}

/// Byte offset of the next field terminator at or after `from`: a group
/// separator, or `(` in bracketed payloads. End of input otherwise.
fn field_end(data: &str, from: usize, bracketed: bool) -> usize {
    let from = from.min(data.len());
    data.as_bytes()[from..]
        .iter()
        .position(|&b| b == GS || (bracketed && b == b'('))
        .map(|rel| from + rel)
        .unwrap_or(data.len())
}

fn store_field(result: &mut ScanResult, def: &AiDef, value: &str, options: &DecodeOptions) {
    match def.field {
        AiField::Gtin => result.gtin = value.to_string(),
        AiField::Lot => result.lot = value.to_string(),
        AiField::Expiry => {
            result.expiry_date = expiry::decode_date_in_century(value, options.century);
            if result.expiry_date.is_none() {
                log::debug!("ignoring invalid expiry date {value:?}");
            }
        }
        AiField::Serial => result.serial_number = Some(value.to_string()),
        AiField::ProductVariant | AiField::CustomerPartNumber => {
            // first reference wins
            if result.reference.is_empty() {
                result.reference = value.to_string();
            }
        }
    }
}

fn reference_from_text(raw: &str) -> Option<String> {
    static REF_PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = REF_PATTERN
        .get_or_init(|| Regex::new(r"(?i)REF[:\s]*([A-Z0-9]+)").expect("REF pattern is valid"));
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
