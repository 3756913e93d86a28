use std::fmt;
use std::str::FromStr;

use crate::models::Record;

/// Tab a movement list can be narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    Contabilized,
    NotContabilized,
}

impl Category {
    pub const TABS: [Category; 3] = [Self::All, Self::Contabilized, Self::NotContabilized];

    pub fn key(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Contabilized => "contabilized",
            Self::NotContabilized => "not_contabilized",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "Todos",
            Self::Contabilized => "Contabilizados",
            Self::NotContabilized => "No contabilizados",
        }
    }

    pub fn includes(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Contabilized => record.is_contabilized,
            Self::NotContabilized => !record.is_contabilized,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::All => Self::Contabilized,
            Self::Contabilized => Self::NotContabilized,
            Self::NotContabilized => Self::All,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "contabilized" => Ok(Self::Contabilized),
            "not_contabilized" | "not-contabilized" => Ok(Self::NotContabilized),
            other => Err(format!(
                "unknown tab '{other}' (expected all, contabilized or not_contabilized)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabCounts {
    pub all: usize,
    pub contabilized: usize,
    pub not_contabilized: usize,
}

impl TabCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::All => self.all,
            Category::Contabilized => self.contabilized,
            Category::NotContabilized => self.not_contabilized,
        }
    }
}

pub fn classify(records: &[Record], category: Category) -> Vec<&Record> {
    records.iter().filter(|r| category.includes(r)).collect()
}

/// Counts over the whole store; never affected by search or paging.
pub fn count(records: &[Record]) -> TabCounts {
    let contabilized = records.iter().filter(|r| r.is_contabilized).count();
    TabCounts {
        all: records.len(),
        contabilized,
        not_contabilized: records.len() - contabilized,
    }
}
