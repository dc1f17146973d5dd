//! GS1 Application Identifier registry.
//!
//! Only the identifiers relevant to implant traceability are listed; anything
//! else is treated as unknown and skipped by the decoder.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiField {
    Gtin,
    Lot,
    Expiry,
    Serial,
    ProductVariant,
    CustomerPartNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength {
    Fixed(usize),
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiDef {
    pub code: &'static str,
    pub field: AiField,
    pub name: &'static str,
    pub length: FieldLength,
}

pub const AI_TABLE: &[AiDef] = &[
    AiDef { code: "01", field: AiField::Gtin, name: "GTIN", length: FieldLength::Fixed(14) },
    AiDef { code: "10", field: AiField::Lot, name: "LOT", length: FieldLength::Variable },
    AiDef { code: "17", field: AiField::Expiry, name: "EXPIRY", length: FieldLength::Fixed(6) },
    AiDef { code: "21", field: AiField::Serial, name: "SERIAL", length: FieldLength::Variable },
    AiDef {
        code: "240",
        field: AiField::ProductVariant,
        name: "PRODUCT_VARIANT",
        length: FieldLength::Variable,
    },
    AiDef {
        code: "241",
        field: AiField::CustomerPartNumber,
        name: "CUSTOMER_PART_NUMBER",
        length: FieldLength::Variable,
    },
];

pub fn lookup(code: &str) -> Option<&'static AiDef> {
    AI_TABLE.iter().find(|def| def.code == code)
}

impl AiField {
    /// Both reference AIs feed the REF slot of a scan.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::ProductVariant | Self::CustomerPartNumber)
    }
}
