use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A movement as delivered by the bridge or by an external statement parser,
/// before normalization. Every attribute is optional and loosely typed because
/// the producers disagree on representations (`1` vs `true`, numeric ids, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub caja: Option<Value>,
    #[serde(default)]
    pub fecha: Option<Value>,
    #[serde(default)]
    pub concepto: Option<Value>,
    #[serde(default)]
    pub importe: Option<Value>,
    #[serde(default)]
    pub saldo: Option<Value>,
    #[serde(default)]
    pub insertion_date: Option<Value>,
    #[serde(default)]
    pub is_contabilized: Option<Value>,
    #[serde(default, rename = "alreadyInDatabase")]
    pub already_in_database: Option<Value>,
}

/// One bank movement, normalized once on ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub caja: String,
    pub fecha: String,
    pub concepto: String,
    pub importe: f64,
    pub saldo: Option<f64>,
    pub insertion_date: Option<String>,
    pub is_contabilized: bool,
    #[serde(rename = "alreadyInDatabase")]
    pub already_in_database: bool,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Self {
            id: raw.id.as_ref().and_then(value_text).unwrap_or_default(),
            caja: raw.caja.as_ref().and_then(value_text).unwrap_or_default(),
            fecha: raw.fecha.as_ref().and_then(value_text).unwrap_or_default(),
            concepto: raw.concepto.as_ref().and_then(value_text).unwrap_or_default(),
            importe: raw.importe.as_ref().and_then(value_number).unwrap_or(0.0),
            saldo: raw.saldo.as_ref().and_then(value_number),
            insertion_date: raw.insertion_date.as_ref().and_then(value_text),
            is_contabilized: raw.is_contabilized.as_ref().is_some_and(value_flag),
            already_in_database: raw.already_in_database.as_ref().is_some_and(value_flag),
        }
    }
}

/// Text form of a loosely typed value. Numbers keep their JSON spelling.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric form of a loosely typed value. Strings may use a decimal comma
/// (`"1.234,56"`).
pub fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s: String = raw.chars().filter(|c| *c != '€' && !c.is_whitespace()).collect();
    if s.is_empty() {
        return None;
    }
    let s = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s
    };
    s.parse().ok()
}

/// `1`, `true`, `"1"` and `"true"` are set; everything else is unset.
pub fn value_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

/// Shortest decimal spelling of a number: `42.0` is `"42"`, `-12.5` is `"-12.5"`.
pub fn number_text(n: f64) -> String {
    format!("{n}")
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Id,
    Caja,
    Fecha,
    Concepto,
    Importe,
    Saldo,
    InsertionDate,
    IsContabilized,
    AlreadyInDatabase,
}

impl RecordField {
    pub const ALL: [RecordField; 9] = [
        Self::Id,
        Self::Caja,
        Self::Fecha,
        Self::Concepto,
        Self::Importe,
        Self::Saldo,
        Self::InsertionDate,
        Self::IsContabilized,
        Self::AlreadyInDatabase,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Caja => "caja",
            Self::Fecha => "fecha",
            Self::Concepto => "concepto",
            Self::Importe => "importe",
            Self::Saldo => "saldo",
            Self::InsertionDate => "insertion_date",
            Self::IsContabilized => "is_contabilized",
            Self::AlreadyInDatabase => "alreadyInDatabase",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Flag(bool),
    Missing,
}

impl Record {
    pub fn field(&self, field: RecordField) -> FieldValue<'_> {
        match field {
            RecordField::Id => FieldValue::Text(&self.id),
            RecordField::Caja => FieldValue::Text(&self.caja),
            RecordField::Fecha => FieldValue::Text(&self.fecha),
            RecordField::Concepto => FieldValue::Text(&self.concepto),
            RecordField::Importe => FieldValue::Number(self.importe),
            RecordField::Saldo => self.saldo.map_or(FieldValue::Missing, FieldValue::Number),
            RecordField::InsertionDate => self
                .insertion_date
                .as_deref()
                .map_or(FieldValue::Missing, FieldValue::Text),
            RecordField::IsContabilized => FieldValue::Flag(self.is_contabilized),
            RecordField::AlreadyInDatabase => FieldValue::Flag(self.already_in_database),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (RecordField, FieldValue<'_>)> + '_ {
        RecordField::ALL.into_iter().map(move |f| (f, self.field(f)))
    }
}
