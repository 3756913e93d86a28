//! Task cards: the per-variant summary of an accounting task shown in the
//! browser and printed by `tasks list`.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::fmt::euro;
use crate::tasks::{caja_full_name, generic_lines, AdoDetail, ArqueoDetail, Task};
use crate::tui::{money_span, FOOTER_STYLE, HEADER_STYLE};

const MISSING: &str = "N/A";
const NO_NAME: &str = "Sin nombre";
const NO_TEXT: &str = "Sin texto";

#[derive(Debug, Clone, PartialEq)]
pub struct CardItem {
    pub label: String,
    pub importe: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard {
    pub badge: String,
    /// `(label, value)` groups of the header line.
    pub header: Vec<(&'static str, String)>,
    pub details: Vec<(&'static str, String)>,
    pub items_label: &'static str,
    pub items: Vec<CardItem>,
    pub total: f64,
}

fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

fn caja_label(accounts: &[String], caja: Option<&str>) -> String {
    let name = caja
        .and_then(|c| caja_full_name(accounts, c))
        .unwrap_or(NO_NAME);
    format!("{} ({name})", or_missing(caja))
}

fn with_proyecto(mut label: String, proyecto: Option<&str>) -> String {
    if let Some(p) = proyecto {
        label.push_str(&format!(" [{p}]"));
    }
    label
}

/// Build the card of a task. `accounts` resolves caja codes to full names.
pub fn build_card(task: &Task, accounts: &[String]) -> TaskCard {
    match task {
        Task::Arqueo(d) => arqueo_card(d, accounts),
        Task::Ado220(d) => ado_card(d, accounts),
        Task::Generic { tipo, detalle } => generic_card(tipo, task.fecha(), detalle),
    }
}

fn arqueo_card(d: &ArqueoDetail, accounts: &[String]) -> TaskCard {
    let items: Vec<CardItem> = d
        .partidas
        .iter()
        .map(|p| CardItem {
            label: with_proyecto(or_missing(p.partida.as_deref()), p.proyecto.as_deref()),
            importe: p.importe,
        })
        .collect();
    TaskCard {
        badge: "ARQUEO".into(),
        header: vec![
            ("FECHA", or_missing(d.fecha.as_deref())),
            ("TERCERO", or_missing(d.tercero.as_deref())),
            ("CAJA", caja_label(accounts, d.caja.as_deref())),
        ],
        details: vec![
            ("TIPO OPERACIÓN", d.naturaleza().to_string()),
            ("TEXTO", d.texto().unwrap_or_else(|| NO_TEXT.to_string())),
        ],
        items_label: "APLICACIÓN (PARTIDA)",
        total: items.iter().map(|i| i.importe).sum(),
        items,
    }
}

fn ado_card(d: &AdoDetail, accounts: &[String]) -> TaskCard {
    let items: Vec<CardItem> = d
        .aplicaciones
        .iter()
        .map(|a| {
            let label = format!(
                "{}/{} → {}",
                or_missing(a.funcional.as_deref()),
                or_missing(a.economica.as_deref()),
                a.cuenta.as_deref().unwrap_or("-"),
            );
            CardItem {
                label: with_proyecto(label, a.proyecto.as_deref()),
                importe: a.importe,
            }
        })
        .collect();
    TaskCard {
        badge: "ADO".into(),
        header: vec![
            ("FECHA", or_missing(d.fecha.as_deref())),
            ("EXPEDIENTE", or_missing(d.expediente.as_deref())),
            ("TERCERO", or_missing(d.tercero.as_deref())),
            ("CAJA", caja_label(accounts, d.caja.as_deref())),
        ],
        details: vec![
            ("F.PAGO", or_missing(d.fpago.as_deref())),
            ("T.PAGO", or_missing(d.tpago.as_deref())),
            ("TEXTO", d.texto.clone().unwrap_or_else(|| NO_TEXT.to_string())),
        ],
        items_label: "APLICACIÓN (FUNC/ECON)",
        total: items.iter().map(|i| i.importe).sum(),
        items,
    }
}

fn generic_card(tipo: &str, fecha: Option<&str>, detalle: &Value) -> TaskCard {
    let items: Vec<CardItem> = generic_lines(detalle)
        .into_iter()
        .map(|l| CardItem {
            label: format!(
                "{} → {}",
                or_missing(l.economica.as_deref()),
                l.cuenta.as_deref().unwrap_or("-")
            ),
            importe: l.importe,
        })
        .collect();
    TaskCard {
        badge: tipo.to_uppercase(),
        header: vec![("FECHA", or_missing(fecha))],
        details: vec![("", "Tipo de tarea desconocido".to_string())],
        items_label: "APLICACIONES",
        total: items.iter().map(|i| i.importe).sum(),
        items,
    }
}

fn join_groups(groups: &[(&'static str, String)]) -> String {
    groups
        .iter()
        .map(|(label, value)| {
            if label.is_empty() {
                value.clone()
            } else {
                format!("{label}: {value}")
            }
        })
        .collect::<Vec<_>>()
        .join(" • ")
}

impl TaskCard {
    /// Plain text rendering for the CLI.
    pub fn to_text(&self) -> String {
        let mut out = format!("[{}] {}\n", self.badge, join_groups(&self.header));
        out.push_str(&format!("  {}\n", join_groups(&self.details)));
        if !self.items.is_empty() {
            out.push_str(&format!("  {}:\n", self.items_label));
            for item in &self.items {
                out.push_str(&format!("    {:<40} {:>14}\n", item.label, euro(item.importe)));
            }
        }
        out.push_str(&format!("  TOTAL: {}\n", euro(self.total)));
        out
    }

    pub fn to_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(vec![
            Span::styled(format!(" {} ", self.badge), HEADER_STYLE.add_modifier(Modifier::REVERSED)),
            Span::raw(" "),
            Span::raw(join_groups(&self.header)),
        ])];
        lines.push(Line::from(format!("  {}", join_groups(&self.details))));
        if !self.items.is_empty() {
            lines.push(Line::styled(format!("  {}:", self.items_label), FOOTER_STYLE));
            for item in &self.items {
                lines.push(Line::from(vec![
                    Span::raw(format!("    {:<40} ", item.label)),
                    money_span(item.importe),
                ]));
            }
        }
        lines.push(Line::from(vec![
            Span::styled("  TOTAL: ", Style::new().add_modifier(Modifier::BOLD)),
            money_span(self.total),
        ]));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Aplicacion, Partida, TextoSical};

    fn accounts() -> Vec<String> {
        vec!["200_CAJA RURAL".to_string()]
    }

    #[test]
    fn test_arqueo_card() {
        let task = Task::Arqueo(ArqueoDetail {
            fecha: Some("15/01/2025".into()),
            caja: Some("200".into()),
            texto_sical: vec![TextoSical { tcargo: Some("INGRESO".into()) }],
            partidas: vec![Partida {
                partida: Some("39900".into()),
                importe: 100.5,
                proyecto: Some("GFA1".into()),
            }],
            ..Default::default()
        });
        let card = build_card(&task, &accounts());
        assert_eq!(card.badge, "ARQUEO");
        assert_eq!(card.header[1], ("TERCERO", "N/A".to_string()));
        assert_eq!(card.header[2].1, "200 (200_CAJA RURAL)");
        assert_eq!(card.details[0].1, "1");
        assert_eq!(card.items[0].label, "39900 [GFA1]");
        let text = card.to_text();
        assert!(text.starts_with("[ARQUEO] FECHA: 15/01/2025"));
        assert!(text.contains("TEXTO: INGRESO"));
        assert!(text.contains("TOTAL: 100,50 €"));
    }

    #[test]
    fn test_ado_card_missing_values() {
        let task = Task::Ado220(AdoDetail {
            caja: Some("999".into()),
            aplicaciones: vec![Aplicacion {
                funcional: Some("920".into()),
                economica: Some("22000".into()),
                importe: 12.0,
                ..Default::default()
            }],
            ..Default::default()
        });
        let card = build_card(&task, &accounts());
        assert_eq!(card.badge, "ADO");
        assert_eq!(card.header[3].1, "999 (Sin nombre)");
        assert_eq!(card.details[0], ("F.PAGO", "N/A".to_string()));
        assert_eq!(card.details[2], ("TEXTO", "Sin texto".to_string()));
        assert_eq!(card.items[0].label, "920/22000 → -");
        assert_eq!(card.total, 12.0);
    }

    #[test]
    fn test_generic_card() {
        let task = Task::Generic {
            tipo: "pmp".into(),
            detalle: serde_json::json!({ "aplicaciones": [{ "economica": "1", "importe": 4 }] }),
        };
        let card = build_card(&task, &[]);
        assert_eq!(card.badge, "PMP");
        let text = card.to_text();
        assert!(text.contains("Tipo de tarea desconocido"));
        assert!(text.contains("TOTAL: 4,00 €"));
        assert_eq!(card.to_lines().len(), 5);
    }
}
