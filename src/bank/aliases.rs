//! Closed set of known banks, product-name literals, and keyword sets for
//! §4.B's cascade. New banks extend these tables only — §4.D's column
//! discovery stays bank-agnostic per spec §9.

/// The closed set of banks §4.B can resolve to (glossary).
pub const KNOWN_BANKS: &[&str] = &[
    "OCBC",
    "DBS",
    "POSB",
    "UOB",
    "Standard Chartered",
    "HSBC",
    "Citibank",
    "Maybank",
    "CIMB",
    "Bank of China",
    "ICBC",
    "GXS",
    "Trust",
    "MariBank",
    "Revolut",
    "Wise",
    "Aspire",
    "ANEXT",
];

/// High-confidence product-line literals, searched verbatim (case
/// sensitive on the statement's own casing is not assumed — matching is
/// done case-insensitively by the caller).
pub const PRODUCT_NAMES: &[(&str, &str)] = &[
    ("AUTOSAVE ACCOUNT", "DBS"),
    ("MULTIPLIER ACCOUNT", "DBS"),
    ("GLOBAL SAVINGS ACCOUNT", "HSBC"),
    ("EVERYDAY SAVINGS ACCOUNT", "UOB"),
    ("ONE ACCOUNT", "OCBC"),
    ("360 ACCOUNT", "OCBC"),
    ("SMARTSAVER", "POSB"),
    ("ASPIRE BUSINESS ACCOUNT", "Aspire"),
    ("ANEXT BUSINESS ACCOUNT", "ANEXT"),
];

/// Keyword sets per bank, matched with word-boundary anchoring so a short
/// name (e.g. `OCBC`) cannot match inside an unrelated longer token
/// (`OCBCish`).
pub const KEYWORDS: &[(&str, &[&str])] = &[
    ("OCBC", &["OCBC", "OVERSEA-CHINESE BANKING"]),
    ("DBS", &["DBS BANK", "DBS "]),
    ("POSB", &["POSB"]),
    ("UOB", &["UNITED OVERSEAS BANK", "UOB "]),
    ("Standard Chartered", &["STANDARD CHARTERED"]),
    ("HSBC", &["HSBC", "HONGKONG AND SHANGHAI BANKING"]),
    ("Citibank", &["CITIBANK", "CITI "]),
    ("Maybank", &["MAYBANK", "MALAYAN BANKING"]),
    ("CIMB", &["CIMB"]),
    ("Bank of China", &["BANK OF CHINA"]),
    ("ICBC", &["ICBC", "INDUSTRIAL AND COMMERCIAL BANK OF CHINA"]),
    ("GXS", &["GXS BANK", "GXS "]),
    ("Trust", &["TRUST BANK"]),
    ("MariBank", &["MARIBANK"]),
    ("Revolut", &["REVOLUT"]),
    ("Wise", &["WISE "]),
    ("Aspire", &["ASPIRE"]),
    ("ANEXT", &["ANEXT", "AIRWALLEX"]),
];

/// Bank names short enough that a plain substring match risks collisions.
pub const SHORT_NAMES: &[&str] = &["DBS", "UOB", "GXS", "CIMB", "ICBC"];
