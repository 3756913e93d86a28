use std::fmt;
use std::str::FromStr;

use crate::models::{number_text, FieldValue, Record, RecordField};

/// Which fields a search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    All,
    Field(RecordField),
}

impl SearchScope {
    /// Scopes offered by the browser's field selector, in cycle order.
    pub const CYCLE: [SearchScope; 6] = [
        Self::All,
        Self::Field(RecordField::Concepto),
        Self::Field(RecordField::Fecha),
        Self::Field(RecordField::Importe),
        Self::Field(RecordField::Saldo),
        Self::Field(RecordField::Caja),
    ];

    pub fn next(&self) -> Self {
        let idx = Self::CYCLE.iter().position(|s| s == self).unwrap_or(0);
        Self::CYCLE[(idx + 1) % Self::CYCLE.len()]
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Field(field) => write!(f, "{field}"),
        }
    }
}

impl FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Field)
        }
    }
}

fn value_contains(value: FieldValue<'_>, needle: &str) -> bool {
    match value {
        FieldValue::Text(s) => s.to_lowercase().contains(needle),
        FieldValue::Number(n) => number_text(n).contains(needle),
        FieldValue::Flag(_) | FieldValue::Missing => false,
    }
}

/// `needle` must already be lowercased.
pub fn matches(record: &Record, needle: &str, scope: SearchScope) -> bool {
    match scope {
        SearchScope::All => record.fields().any(|(field, value)| match value {
            FieldValue::Text(_) if field.name().contains("id") => false,
            other => value_contains(other, needle),
        }),
        SearchScope::Field(field) => value_contains(record.field(field), needle),
    }
}

/// Case-insensitive substring search. An empty term keeps every record;
/// input order is preserved.
pub fn filter<'a>(records: &[&'a Record], term: &str, scope: SearchScope) -> Vec<&'a Record> {
    if term.is_empty() {
        return records.to_vec();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .copied()
        .filter(|r| matches(r, &needle, scope))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{record, records};

    fn ids(found: &[&Record]) -> Vec<String> {
        found.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_all_fields_matches_numbers_and_text_but_not_ids() {
        let by_amount = record("a", "transferencia", 42.00, false);
        let by_concept = record("b", "pago 42 enero", -3.0, false);
        let by_id = record("42", "recibo luz", -7.5, false);
        let store = [&by_amount, &by_concept, &by_id];
        assert_eq!(ids(&filter(&store, "42", SearchScope::All)), vec!["a", "b"]);
    }

    #[test]
    fn test_case_insensitive() {
        let r = record("a", "Recibo LUZ Iberdrola", -7.5, false);
        let found = filter(&[&r], "luz iber", SearchScope::All);
        assert_eq!(found.len(), 1);
        let found = filter(&[&r], "LUZ", SearchScope::Field(RecordField::Concepto));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_specific_field_only() {
        let r = record("a", "pago 42", 10.0, false);
        assert!(filter(&[&r], "42", SearchScope::Field(RecordField::Importe)).is_empty());
        assert_eq!(filter(&[&r], "42", SearchScope::Field(RecordField::Concepto)).len(), 1);
        assert_eq!(filter(&[&r], "a", SearchScope::Field(RecordField::Id)).len(), 1);
    }

    #[test]
    fn test_unsupported_types_never_match() {
        let r = record("a", "x", 1.0, true);
        assert!(filter(&[&r], "true", SearchScope::Field(RecordField::IsContabilized)).is_empty());
        assert!(filter(&[&r], "true", SearchScope::All).is_empty());
        assert!(filter(&[&r], "1", SearchScope::Field(RecordField::Saldo)).is_empty());
    }

    #[test]
    fn test_negative_and_fractional_amounts() {
        let r = record("a", "x", -12.5, false);
        assert_eq!(filter(&[&r], "-12.5", SearchScope::All).len(), 1);
        assert!(filter(&[&r], "12,5", SearchScope::All).is_empty());
    }

    #[test]
    fn test_empty_term_returns_input() {
        let store = records(7);
        let refs: Vec<&Record> = store.iter().collect();
        for scope in SearchScope::CYCLE {
            assert_eq!(filter(&refs, "", scope), refs);
        }
    }

    #[test]
    fn test_idempotent_and_order_preserving() {
        let store = records(30);
        let refs: Vec<&Record> = store.iter().collect();
        let once = filter(&refs, "movimiento 1", SearchScope::All);
        let twice = filter(&once, "movimiento 1", SearchScope::All);
        assert_eq!(once, twice);
        assert_eq!(ids(&once)[..3], ["1", "10", "11"]);
    }

    #[test]
    fn test_scope_parse_and_cycle() {
        assert_eq!("all".parse::<SearchScope>(), Ok(SearchScope::All));
        assert_eq!(
            "concepto".parse::<SearchScope>(),
            Ok(SearchScope::Field(RecordField::Concepto))
        );
        assert!("nope".parse::<SearchScope>().is_err());
        assert_eq!(SearchScope::All.next(), SearchScope::Field(RecordField::Concepto));
        assert_eq!(SearchScope::Field(RecordField::Caja).next(), SearchScope::All);
        assert_eq!(SearchScope::Field(RecordField::InsertionDate).next(), SearchScope::Field(RecordField::Concepto));
    }
}
