//! Task creation form opened from the movement browser.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::models::{parse_decimal, Record};
use crate::tasks::{AdoDetail, Aplicacion, ArqueoDetail, Partida, Task, TextoSical};
use crate::tui::{FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Arqueo,
    Ado220,
}

impl TaskKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Arqueo => "arqueo",
            Self::Ado220 => "ado220",
        }
    }

    fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Arqueo => &["partida", "importe"],
            Self::Ado220 => &["funcional", "economica", "cuenta", "importe"],
        }
    }

    fn toggle(&self) -> Self {
        match self {
            Self::Arqueo => Self::Ado220,
            Self::Ado220 => Self::Arqueo,
        }
    }
}

/// Header fields after the tipo selector, in focus order.
const HEADER_FIELDS: [&str; 4] = ["fecha", "tercero", "caja", "texto"];

pub enum DialogAction {
    Continue,
    Cancel,
    Submit(Task),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Kind,
    Header(usize),
    Line { row: usize, col: usize },
}

pub struct TaskDialog {
    movement_id: String,
    kind: TaskKind,
    header: [String; 4],
    lines: Vec<Vec<String>>,
    default_importe: String,
    focus: Focus,
    error: Option<String>,
}

impl TaskDialog {
    pub fn new(record: &Record) -> Self {
        let caja = record
            .caja
            .split_once('_')
            .map_or(record.caja.as_str(), |(code, _)| code)
            .to_string();
        let default_importe = format!("{:.2}", record.importe.abs());
        let kind = TaskKind::Arqueo;
        let mut dialog = Self {
            movement_id: record.id.clone(),
            kind,
            header: [record.fecha.clone(), String::new(), caja, record.concepto.clone()],
            lines: Vec::new(),
            default_importe,
            focus: Focus::Kind,
            error: None,
        };
        dialog.reset_lines();
        dialog
    }

    pub fn movement_id(&self) -> &str {
        &self.movement_id
    }

    fn reset_lines(&mut self) {
        let mut first = vec![String::new(); self.kind.columns().len()];
        if let Some(last) = first.last_mut() {
            *last = self.default_importe.clone();
        }
        self.lines = vec![first];
    }

    fn add_line(&mut self) {
        self.lines.push(vec![String::new(); self.kind.columns().len()]);
        self.focus = Focus::Line { row: self.lines.len() - 1, col: 0 };
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Kind];
        order.extend((0..HEADER_FIELDS.len()).map(Focus::Header));
        for row in 0..self.lines.len() {
            for col in 0..self.kind.columns().len() {
                order.push(Focus::Line { row, col });
            }
        }
        order
    }

    fn move_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (idx + 1).min(order.len() - 1)
        } else {
            idx.saturating_sub(1)
        };
        self.focus = order[next];
    }

    fn is_last_field(&self) -> bool {
        self.focus_order().last() == Some(&self.focus)
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Kind => None,
            Focus::Header(i) => self.header.get_mut(i),
            Focus::Line { row, col } => self.lines.get_mut(row).and_then(|l| l.get_mut(col)),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogAction {
        self.error = None;
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('a') {
                self.add_line();
            }
            return DialogAction::Continue;
        }
        match key.code {
            KeyCode::Esc => return DialogAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Left | KeyCode::Right if self.focus == Focus::Kind => {
                self.kind = self.kind.toggle();
                self.reset_lines();
            }
            KeyCode::Enter => {
                if self.is_last_field() {
                    return match self.build_task() {
                        Ok(task) => DialogAction::Submit(task),
                        Err(msg) => {
                            self.error = Some(msg);
                            DialogAction::Continue
                        }
                    };
                }
                self.move_focus(true);
            }
            KeyCode::Char('+') if matches!(self.focus, Focus::Line { .. } | Focus::Kind) => {
                self.add_line();
            }
            KeyCode::Backspace => {
                if let Some(text) = self.focused_text() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.focused_text() {
                    text.push(c);
                }
            }
            _ => {}
        }
        DialogAction::Continue
    }

    fn non_empty(value: &str) -> Option<String> {
        let v = value.trim();
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    }

    /// Assemble the task; blank lines are skipped. Errors are user-facing.
    pub fn build_task(&self) -> Result<Task, String> {
        let [fecha, tercero, caja, texto] = &self.header;
        let mut amounts = Vec::new();
        for (i, line) in self.lines.iter().enumerate() {
            if line.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let raw = line.last().map(String::as_str).unwrap_or("");
            let importe = parse_decimal(raw).ok_or_else(|| format!("Invalid importe on line {}", i + 1))?;
            amounts.push((line, importe));
        }
        if amounts.is_empty() {
            return Err("Add at least one line".into());
        }

        Ok(match self.kind {
            TaskKind::Arqueo => Task::Arqueo(ArqueoDetail {
                fecha: Self::non_empty(fecha),
                tercero: Self::non_empty(tercero),
                caja: Self::non_empty(caja),
                naturaleza: None,
                texto_sical: Self::non_empty(texto)
                    .map(|t| vec![TextoSical { tcargo: Some(t) }])
                    .unwrap_or_default(),
                partidas: amounts
                    .into_iter()
                    .map(|(line, importe)| Partida {
                        partida: Self::non_empty(&line[0]),
                        importe,
                        proyecto: None,
                    })
                    .collect(),
            }),
            TaskKind::Ado220 => Task::Ado220(AdoDetail {
                fecha: Self::non_empty(fecha),
                tercero: Self::non_empty(tercero),
                caja: Self::non_empty(caja),
                texto: Self::non_empty(texto),
                aplicaciones: amounts
                    .into_iter()
                    .map(|(line, importe)| Aplicacion {
                        funcional: Self::non_empty(&line[0]),
                        economica: Self::non_empty(&line[1]),
                        cuenta: Self::non_empty(&line[2]),
                        importe,
                        proyecto: None,
                    })
                    .collect(),
                ..Default::default()
            }),
        })
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let popup = centered(area, 72, (8 + self.lines.len() as u16).min(area.height));
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Contabilizar {} ", self.movement_id))
            .title_style(HEADER_STYLE);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let field_style = |focus: Focus| {
            if self.focus == focus {
                SELECTED_STYLE
            } else {
                Style::default()
            }
        };

        let mut lines = vec![Line::from(vec![
            Span::raw("tipo:     "),
            Span::styled(format!("< {} >", self.kind.label()), field_style(Focus::Kind)),
        ])];
        for (i, name) in HEADER_FIELDS.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::raw(format!("{name:<10}")),
                Span::styled(self.header[i].clone(), field_style(Focus::Header(i))),
            ]));
        }
        lines.push(Line::styled(self.kind.columns().join(" | "), FOOTER_STYLE));
        for (row, cells) in self.lines.iter().enumerate() {
            let mut spans = Vec::new();
            for (col, cell) in cells.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::raw(" | "));
                }
                let shown = if cell.is_empty() { "_".to_string() } else { cell.clone() };
                spans.push(Span::styled(shown, field_style(Focus::Line { row, col })));
            }
            lines.push(Line::from(spans));
        }

        let footer = match &self.error {
            Some(msg) => Line::styled(msg.clone(), Style::new().fg(Color::Red)),
            None => Line::styled("Tab:next  \u{2190}/\u{2192}:tipo  Ctrl+A/+:add line  Enter:save  Esc:cancel", FOOTER_STYLE),
        };

        let [body, foot] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
        frame.render_widget(Paragraph::new(lines), body);
        frame.render_widget(Paragraph::new(footer), foot);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(dialog: &mut TaskDialog, text: &str) {
        for c in text.chars() {
            dialog.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_defaults_from_movement() {
        let dialog = TaskDialog::new(&record("m1", "Recibo", -42.5, false));
        assert_eq!(dialog.header[0], "15/01/2025");
        assert_eq!(dialog.header[2], "200");
        assert_eq!(dialog.lines, vec![vec![String::new(), "42.50".to_string()]]);
    }

    #[test]
    fn test_toggle_kind_resets_lines() {
        let mut dialog = TaskDialog::new(&record("m1", "x", 10.0, false));
        dialog.handle_key(key(KeyCode::Right));
        assert_eq!(dialog.kind, TaskKind::Ado220);
        assert_eq!(dialog.lines[0].len(), 4);
        assert_eq!(dialog.lines[0][3], "10.00");
    }

    #[test]
    fn test_fill_and_submit_arqueo() {
        let mut dialog = TaskDialog::new(&record("m1", "Ingreso", 10.0, false));
        // kind -> fecha -> tercero
        dialog.handle_key(key(KeyCode::Tab));
        dialog.handle_key(key(KeyCode::Tab));
        type_text(&mut dialog, "B123");
        // tercero -> caja -> texto -> partida
        for _ in 0..3 {
            dialog.handle_key(key(KeyCode::Enter));
        }
        type_text(&mut dialog, "39900");
        dialog.handle_key(key(KeyCode::Tab));
        let action = dialog.handle_key(key(KeyCode::Enter));
        let DialogAction::Submit(task) = action else { panic!("expected submit") };
        let Task::Arqueo(detail) = &task else { panic!("expected arqueo") };
        assert_eq!(detail.tercero.as_deref(), Some("B123"));
        assert_eq!(detail.texto().as_deref(), Some("Ingreso"));
        assert_eq!(detail.partidas[0].partida.as_deref(), Some("39900"));
        assert_eq!(task.total(), 10.0);
    }

    #[test]
    fn test_add_line_and_invalid_amount() {
        let mut dialog = TaskDialog::new(&record("m1", "x", 10.0, false));
        dialog.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL));
        assert_eq!(dialog.lines.len(), 2);
        assert_eq!(dialog.focus, Focus::Line { row: 1, col: 0 });
        type_text(&mut dialog, "1");
        dialog.handle_key(key(KeyCode::Tab));
        type_text(&mut dialog, "abc");
        assert!(matches!(dialog.handle_key(key(KeyCode::Enter)), DialogAction::Continue));
        assert!(dialog.error.as_deref().unwrap().contains("line 2"));
    }

    #[test]
    fn test_esc_cancels() {
        let mut dialog = TaskDialog::new(&record("m1", "x", 10.0, false));
        assert!(matches!(dialog.handle_key(key(KeyCode::Esc)), DialogAction::Cancel));
    }
}
