//! Import preview: normalizes parsed statement records, marks the ones the
//! ledger already holds, checks the running balance and decides whether the
//! batch may be committed.

use std::cmp::Ordering;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::bridge::{ImportOutcome, LedgerBridge};
use crate::error::{CajeroError, Result};
use crate::fmt::parse_fecha;
use crate::models::{RawRecord, Record};

const BALANCE_TOLERANCE: f64 = 0.01;

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceIssue {
    /// Position of the offending record in file order.
    pub index: usize,
    pub date: String,
    pub expected: f64,
    pub actual: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BalanceCheck {
    pub issues: Vec<BalanceIssue>,
}

impl BalanceCheck {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// True when no record is dated later than the one before it.
/// Unparseable dates do not break the order.
pub fn is_descending_order(records: &[Record]) -> bool {
    records.windows(2).all(|pair| {
        match (parse_fecha(&pair[0].fecha), parse_fecha(&pair[1].fecha)) {
            (Some(prev), Some(next)) => next <= prev,
            _ => true,
        }
    })
}

/// Walk the records oldest first and check that every balance equals the
/// previous balance plus the movement amount.
pub fn check_balances(records: &[Record]) -> BalanceCheck {
    if records.len() < 2 {
        return BalanceCheck::default();
    }
    let mut chronological: Vec<(usize, &Record)> = records.iter().enumerate().collect();
    if is_descending_order(records) {
        chronological.reverse();
    }

    let mut issues = Vec::new();
    for pair in chronological.windows(2) {
        let (_, current) = pair[0];
        let (index, next) = pair[1];
        let (Some(prev_saldo), Some(saldo)) = (current.saldo, next.saldo) else {
            continue;
        };
        let expected = round2(prev_saldo + next.importe);
        let actual = round2(saldo);
        if (expected - actual).abs() > BALANCE_TOLERANCE {
            issues.push(BalanceIssue {
                index,
                date: next.fecha.clone(),
                expected,
                actual,
                difference: round2(actual - expected),
            });
        }
    }
    BalanceCheck { issues }
}

/// Newest first; unparseable dates last; ties keep their input order.
pub fn sort_by_fecha_desc(records: &mut [Record]) {
    fn key(r: &Record) -> Option<NaiveDate> {
        parse_fecha(&r.fecha)
    }
    records.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Debug, Clone)]
pub struct ImportPreview {
    /// Sorted newest first, `already_in_database` set.
    pub records: Vec<Record>,
    pub balance: BalanceCheck,
    pub is_descending_order: bool,
    pub dropped: usize,
}

impl ImportPreview {
    pub fn build(bridge: &dyn LedgerBridge, raw: Vec<RawRecord>, caja: Option<&str>) -> Result<Self> {
        let total = raw.len();
        let mut records: Vec<Record> = raw
            .into_iter()
            .map(Record::from)
            .filter(|r| {
                if r.id.is_empty() {
                    log::warn!("dropping previewed movement without id: {}", r.concepto);
                    false
                } else {
                    true
                }
            })
            .collect();
        let dropped = total - records.len();

        if let Some(caja) = caja {
            for r in &mut records {
                r.caja = caja.to_string();
            }
        }

        let is_descending_order = is_descending_order(&records);
        let balance = check_balances(&records);

        for r in &mut records {
            r.already_in_database = bridge.record_exists(&r.id)?;
        }
        sort_by_fecha_desc(&mut records);

        log::info!(
            "preview: {} movements, {} new, {} balance issues",
            records.len(),
            records.iter().filter(|r| !r.already_in_database).count(),
            balance.issues.len()
        );
        Ok(Self {
            records,
            balance,
            is_descending_order,
            dropped,
        })
    }

    pub fn new_count(&self) -> usize {
        self.records.iter().filter(|r| !r.already_in_database).count()
    }

    pub fn new_records(&self) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| !r.already_in_database)
            .cloned()
            .collect()
    }

    /// Refuses batches out of date order, and batches with balance issues
    /// unless `force` is set.
    pub fn ensure_importable(&self, force: bool) -> Result<()> {
        if !self.is_descending_order {
            return Err(CajeroError::Preview(
                "Records must be in descending date order to be imported".into(),
            ));
        }
        if !self.balance.is_valid() && !force {
            return Err(CajeroError::Preview(format!(
                "Found {} balance inconsistencies (use --force to import anyway)",
                self.balance.issues.len()
            )));
        }
        Ok(())
    }

    /// New records minus the ones deselected by id.
    pub fn selected_records(&self, skip: &[String]) -> Vec<Record> {
        for id in skip {
            if !self.records.iter().any(|r| &r.id == id && !r.already_in_database) {
                log::warn!("--skip {id} does not match a new movement");
            }
        }
        self.new_records()
            .into_iter()
            .filter(|r| !skip.contains(&r.id))
            .collect()
    }

    /// Commit the new records, leaving out the ids in `skip`.
    pub fn import(&self, bridge: &dyn LedgerBridge, force: bool, skip: &[String]) -> Result<ImportOutcome> {
        self.ensure_importable(force)?;
        let new = self.selected_records(skip);
        if new.is_empty() {
            return Ok(ImportOutcome { success: true, count: 0, error: None });
        }
        bridge.import_records(&new)
    }
}
