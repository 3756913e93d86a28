use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::{value_number, value_text};

// ---------------------------------------------------------------------------
// Lenient field readers: codes arrive as numbers or strings, amounts as
// numbers or numeric strings.
// ---------------------------------------------------------------------------

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_text))
}

fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .as_ref()
        .and_then(value_number)
        .unwrap_or(0.0))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextoSical {
    #[serde(default, deserialize_with = "lenient_text")]
    pub tcargo: Option<String>,
}

/// Budget line of an arqueo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Partida {
    #[serde(default, deserialize_with = "lenient_text")]
    pub partida: Option<String>,
    #[serde(rename = "IMPORTE_PARTIDA", default, deserialize_with = "lenient_amount")]
    pub importe: f64,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub proyecto: Option<String>,
}

/// Functional/economic line of an ado220.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aplicacion {
    #[serde(default, deserialize_with = "lenient_text")]
    pub funcional: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub economica: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cuenta: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub importe: f64,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub proyecto: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArqueoDetail {
    #[serde(default, deserialize_with = "lenient_text")]
    pub fecha: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tercero: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub caja: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub naturaleza: Option<String>,
    #[serde(default)]
    pub texto_sical: Vec<TextoSical>,
    #[serde(rename = "final", alias = "aplicaciones", default)]
    pub partidas: Vec<Partida>,
}

impl ArqueoDetail {
    /// Operation nature, `1` when unset.
    pub fn naturaleza(&self) -> &str {
        self.naturaleza.as_deref().unwrap_or("1")
    }

    /// `tcargo` texts joined with `; `, if any.
    pub fn texto(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .texto_sical
            .iter()
            .filter_map(|t| t.tcargo.as_deref())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdoDetail {
    #[serde(default, deserialize_with = "lenient_text")]
    pub fecha: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub expediente: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tercero: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub caja: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fpago: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tpago: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub texto: Option<String>,
    #[serde(default)]
    pub aplicaciones: Vec<Aplicacion>,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// An accounting operation attached to a bank movement, stored as
/// `{ "tipo": ..., "detalle": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskEnvelope", into = "TaskEnvelope")]
pub enum Task {
    Arqueo(ArqueoDetail),
    Ado220(AdoDetail),
    Generic { tipo: String, detalle: Value },
}

#[derive(Serialize, Deserialize)]
struct TaskEnvelope {
    tipo: String,
    #[serde(default)]
    detalle: Value,
}

impl TryFrom<TaskEnvelope> for Task {
    type Error = serde_json::Error;

    fn try_from(env: TaskEnvelope) -> Result<Self, Self::Error> {
        let detalle = if env.detalle.is_null() {
            Value::Object(Default::default())
        } else {
            env.detalle
        };
        Ok(match env.tipo.as_str() {
            "arqueo" => Task::Arqueo(serde_json::from_value(detalle)?),
            "ado220" => Task::Ado220(serde_json::from_value(detalle)?),
            _ => Task::Generic {
                tipo: env.tipo,
                detalle,
            },
        })
    }
}

impl From<Task> for TaskEnvelope {
    fn from(task: Task) -> Self {
        let tipo = task.tipo().to_string();
        let detalle = match task {
            Task::Arqueo(d) => serde_json::to_value(d).unwrap_or_default(),
            Task::Ado220(d) => serde_json::to_value(d).unwrap_or_default(),
            Task::Generic { detalle, .. } => detalle,
        };
        TaskEnvelope { tipo, detalle }
    }
}

impl Task {
    pub fn tipo(&self) -> &str {
        match self {
            Task::Arqueo(_) => "arqueo",
            Task::Ado220(_) => "ado220",
            Task::Generic { tipo, .. } => tipo,
        }
    }

    pub fn fecha(&self) -> Option<&str> {
        match self {
            Task::Arqueo(d) => d.fecha.as_deref(),
            Task::Ado220(d) => d.fecha.as_deref(),
            Task::Generic { detalle, .. } => detalle.get("fecha").and_then(Value::as_str),
        }
    }

    /// Sum of the line amounts. Non-numeric generic amounts count as zero.
    pub fn total(&self) -> f64 {
        match self {
            Task::Arqueo(d) => d.partidas.iter().map(|p| p.importe).sum(),
            Task::Ado220(d) => d.aplicaciones.iter().map(|a| a.importe).sum(),
            Task::Generic { detalle, .. } => generic_lines(detalle).iter().map(|l| l.importe).sum(),
        }
    }
}

/// Loosely read aplicación of a task whose `tipo` is not recognised.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericLine {
    pub economica: Option<String>,
    pub cuenta: Option<String>,
    pub importe: f64,
}

pub fn generic_lines(detalle: &Value) -> Vec<GenericLine> {
    let Some(items) = detalle.get("aplicaciones").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|app| {
            let importe = app
                .get("IMPORTE_PARTIDA")
                .and_then(value_number)
                .filter(|v| *v != 0.0)
                .or_else(|| app.get("importe").and_then(value_number))
                .unwrap_or(0.0);
            GenericLine {
                economica: app.get("economica").and_then(value_text),
                cuenta: app.get("cuenta").and_then(value_text),
                importe,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskSummary {
    pub count: usize,
    pub total: f64,
}

pub fn summarize(tasks: &[Task]) -> TaskSummary {
    TaskSummary {
        count: tasks.len(),
        total: tasks.iter().map(Task::total).sum(),
    }
}

/// Full account name for a caja code: the first three characters of the code
/// followed by `_` must prefix the account name (`"200"` → `"200_BANCO ..."`).
pub fn caja_full_name<'a>(accounts: &'a [String], code: &str) -> Option<&'a str> {
    let prefix: String = code.chars().take(3).collect();
    if prefix.is_empty() {
        return None;
    }
    let prefix = format!("{prefix}_");
    accounts
        .iter()
        .find(|a| a.starts_with(&prefix))
        .map(String::as_str)
}
