//! Field validation for recipient records.
//!
//! Every required field is classified as present, missing, or malformed.
//! Missing fields are replaced by a fixed placeholder so that every record
//! stays renderable; nothing here ever rejects a record.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use super::common::is_blank;
use crate::source::RecipientRecord;

pub const POSTAL_CODE_PLACEHOLDER: &str = "郵便番号未記入";
pub const ADDRESS_PLACEHOLDER: &str = "住所未記入";
pub const NAME_PLACEHOLDER: &str = "氏名未記入";
/// The prefecture is only ever a prefix of the address block, so a missing
/// one is rendered as nothing.
pub const PREFECTURE_PLACEHOLDER: &str = "";

/// Honorific the composer appends to every name.
pub const HONORIFIC: char = '様';

lazy_static! {
    static ref CANONICAL_POSTAL_CODE: Regex = Regex::new(r"^[0-9]{3}-[0-9]{4}$").unwrap();
    static ref POSTAL_CODE_NOISE: Regex = Regex::new(r"[〒\s\-－ー‐―−]").unwrap();
}

/// The four fields a postcard needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Name,
    PostalCode,
    Prefecture,
    Address,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Name,
        FieldKind::PostalCode,
        FieldKind::Prefecture,
        FieldKind::Address,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::PostalCode => "postal_code",
            FieldKind::Prefecture => "prefecture",
            FieldKind::Address => "address",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FieldKind::Name => NAME_PLACEHOLDER,
            FieldKind::PostalCode => POSTAL_CODE_PLACEHOLDER,
            FieldKind::Prefecture => PREFECTURE_PLACEHOLDER,
            FieldKind::Address => ADDRESS_PLACEHOLDER,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What was wrong with (or done to) a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// Absent or blank; the placeholder was substituted.
    Missing,
    /// Present but not in the expected shape; passed through unchanged.
    Malformed,
    /// Present and rewritten into the expected shape.
    Normalized,
    /// The address looks like it is outside Japan.
    ForeignAddress,
}

/// A field-level finding with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefect {
    pub field: FieldKind,
    pub kind: DefectKind,
    pub message: String,
    pub suggestion: Option<String>,
}

impl FieldDefect {
    pub fn new(field: FieldKind, kind: DefectKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Field absent or blank.
    pub fn missing(field: FieldKind) -> Self {
        Self::new(field, DefectKind::Missing, format!("{} is empty", field))
            .with_suggestion(format!("fill in the {} column", field))
    }

    pub fn malformed_postal_code(value: &str) -> Self {
        Self::new(
            FieldKind::PostalCode,
            DefectKind::Malformed,
            format!("postal code '{}' is not in NNN-NNNN form", value),
        )
        .with_suggestion("use seven digits, e.g. 100-0001")
    }

    pub fn normalized_postal_code(from: &str, to: &str) -> Self {
        Self::new(
            FieldKind::PostalCode,
            DefectKind::Normalized,
            format!("postal code '{}' rewritten as '{}'", from, to),
        )
    }

    pub fn duplicated_prefecture(prefecture: &str) -> Self {
        Self::new(
            FieldKind::Address,
            DefectKind::Normalized,
            format!("removed duplicated prefecture '{}' from address", prefecture),
        )
    }

    pub fn foreign_address() -> Self {
        Self::new(
            FieldKind::Address,
            DefectKind::ForeignAddress,
            "address is mostly latin letters and may be outside Japan",
        )
    }
}

impl fmt::Display for FieldDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

/// All findings for one record, in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefects {
    defects: Vec<FieldDefect>,
}

impl FieldDefects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, defect: FieldDefect) {
        self.defects.push(defect);
    }

    pub fn is_empty(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefect> {
        self.defects.iter()
    }

    pub fn has(&self, field: FieldKind, kind: DefectKind) -> bool {
        self.defects
            .iter()
            .any(|d| d.field == field && d.kind == kind)
    }

    /// Numbered, one finding per line.
    pub fn to_message(&self) -> String {
        self.defects
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {}", i + 1, d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A record whose every field can be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Source row position, carried for log context.
    pub position: usize,
    pub name: String,
    pub postal_code: String,
    pub prefecture: String,
    pub address: String,
    /// Fields whose value is a placeholder.
    pub defects: BTreeSet<FieldKind>,
}

impl NormalizedRecord {
    pub fn is_substituted(&self, field: FieldKind) -> bool {
        self.defects.contains(&field)
    }

    /// Prefecture followed by the rest of the address, without repeating a
    /// prefecture the address already starts with.
    pub fn display_address(&self) -> String {
        if self.prefecture.is_empty() || self.address.starts_with(&self.prefecture) {
            self.address.clone()
        } else {
            format!("{}{}", self.prefecture, self.address)
        }
    }
}

/// Validate one record. Pure; never fails.
pub fn validate(record: &RecipientRecord) -> (NormalizedRecord, FieldDefects) {
    let mut defects = FieldDefects::new();
    let mut substituted = BTreeSet::new();

    let mut take = |field: FieldKind, value: Option<&str>, defects: &mut FieldDefects| {
        if is_blank(value) {
            defects.add(FieldDefect::missing(field));
            substituted.insert(field);
            field.placeholder().to_string()
        } else {
            value.unwrap_or_default().trim().to_string()
        }
    };

    let name = take(FieldKind::Name, record.name.as_deref(), &mut defects);
    let postal_code = take(
        FieldKind::PostalCode,
        record.postal_code.as_deref(),
        &mut defects,
    );
    let prefecture = take(
        FieldKind::Prefecture,
        record.prefecture.as_deref(),
        &mut defects,
    );
    let address = take(FieldKind::Address, record.address.as_deref(), &mut defects);

    let postal_code = if substituted.contains(&FieldKind::PostalCode) {
        postal_code
    } else {
        check_postal_code(postal_code, &mut defects)
    };

    let name = if substituted.contains(&FieldKind::Name) {
        name
    } else {
        strip_honorific(name)
    };

    let address = if substituted.contains(&FieldKind::Address) {
        address
    } else {
        let address = dedupe_prefecture(address, &prefecture, &mut defects).replace('\u{3000}', " ");
        if looks_foreign(&address) {
            defects.add(FieldDefect::foreign_address());
        }
        address
    };

    let normalized = NormalizedRecord {
        position: record.position,
        name,
        postal_code,
        prefecture,
        address,
        defects: substituted,
    };
    (normalized, defects)
}

/// Canonical codes pass unchanged; seven digits with noise are rewritten;
/// anything else passes unchanged and is reported.
fn check_postal_code(value: String, defects: &mut FieldDefects) -> String {
    if CANONICAL_POSTAL_CODE.is_match(&value) {
        return value;
    }

    let digits: String = POSTAL_CODE_NOISE
        .replace_all(&value, "")
        .chars()
        .map(fold_fullwidth_digit)
        .collect();

    if digits.len() == 7 && digits.chars().all(|c| c.is_ascii_digit()) {
        let canonical = format!("{}-{}", &digits[..3], &digits[3..]);
        defects.add(FieldDefect::normalized_postal_code(&value, &canonical));
        canonical
    } else {
        defects.add(FieldDefect::malformed_postal_code(&value));
        value
    }
}

fn fold_fullwidth_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
        _ => c,
    }
}

fn strip_honorific(name: String) -> String {
    match name.strip_suffix(HONORIFIC) {
        Some(stripped) if !stripped.trim().is_empty() => stripped.trim_end().to_string(),
        _ => name,
    }
}

fn dedupe_prefecture(address: String, prefecture: &str, defects: &mut FieldDefects) -> String {
    if prefecture.is_empty() || address.matches(prefecture).count() <= 1 {
        return address;
    }
    defects.add(FieldDefect::duplicated_prefecture(prefecture));
    address.replacen(prefecture, "", 1)
}

/// More than half of the characters are latin letters.
fn looks_foreign(address: &str) -> bool {
    let total = address.chars().count();
    if total == 0 {
        return false;
    }
    let latin = address.chars().filter(|c| c.is_ascii_alphabetic()).count();
    latin * 2 > total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, postal: &str, prefecture: &str, address: &str) -> RecipientRecord {
        let opt = |v: &str| (!v.is_empty()).then(|| v.to_string());
        RecipientRecord {
            position: 2,
            name: opt(name),
            postal_code: opt(postal),
            prefecture: opt(prefecture),
            address: opt(address),
        }
    }

    #[test]
    fn test_postal_code_compact_form_rewritten() {
        let (normalized, defects) = validate(&record("木邑敏章", "2300025", "神奈川県", "横浜市"));
        assert_eq!(normalized.postal_code, "230-0025");
        assert!(defects.has(FieldKind::PostalCode, DefectKind::Normalized));
    }

    #[test]
    fn test_postal_code_fullwidth_rewritten() {
        let (normalized, _) = validate(&record("a", "〒６１８－００１１", "京都府", "島本町"));
        assert_eq!(normalized.postal_code, "618-0011");
    }

    #[test]
    fn test_postal_code_malformed_passes_through() {
        let (normalized, defects) = validate(&record("a", "ABC123", "x", "y"));
        assert_eq!(normalized.postal_code, "ABC123");
        assert!(defects.has(FieldKind::PostalCode, DefectKind::Malformed));
        assert!(!normalized.is_substituted(FieldKind::PostalCode));
    }

    #[test]
    fn test_duplicated_prefecture_removed() {
        let (normalized, defects) =
            validate(&record("a", "230-0025", "神奈川県", "神奈川県神奈川県横浜市"));
        assert_eq!(normalized.address, "神奈川県横浜市");
        assert_eq!(normalized.display_address(), "神奈川県横浜市");
        assert!(defects.has(FieldKind::Address, DefectKind::Normalized));
    }

    #[test]
    fn test_fullwidth_space_in_address_folded() {
        let (normalized, defects) = validate(&record("a", "100-0005", "東京都", "千代田区\u{3000}丸の内1-1"));
        assert_eq!(normalized.address, "千代田区 丸の内1-1");
        assert!(defects.is_empty());
    }

    #[test]
    fn test_display_address_prefixes_prefecture() {
        let (normalized, _) = validate(&record("a", "100-0001", "東京都", "千代田区千代田1-1"));
        assert_eq!(normalized.display_address(), "東京都千代田区千代田1-1");
    }

    #[test]
    fn test_honorific_not_doubled() {
        let (normalized, _) = validate(&record("山田太郎 様", "100-0001", "東京都", "x"));
        assert_eq!(normalized.name, "山田太郎");

        let (normalized, _) = validate(&record("様", "100-0001", "東京都", "x"));
        assert_eq!(normalized.name, "様");
    }

    #[test]
    fn test_foreign_address_flagged() {
        let (_, defects) = validate(&record(
            "後藤由起子",
            "ABC123",
            "カナダ",
            "5425 Buchanan Street Burnaby BC Canada",
        ));
        assert!(defects.has(FieldKind::Address, DefectKind::ForeignAddress));
    }

    #[test]
    fn test_defect_display() {
        let defect = FieldDefect::missing(FieldKind::Name);
        assert_eq!(defect.to_string(), "[name] name is empty. fill in the name column");
    }
}
