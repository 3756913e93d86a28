use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::bridge::{DialogOutcome, LedgerBridge};
use crate::cards::build_card;
use crate::fmt::{euro, fecha};
use crate::tabs::Category;
use crate::task_dialog::{DialogAction, TaskDialog};
use crate::tui::{
    self, TuiView, ViewAction, ACCOUNTED_STYLE, ACTIVE_TAB_STYLE, FOOTER_STYLE, HEADER_STYLE,
    SELECTED_STYLE,
};
use crate::view::ViewController;

enum BrowseMode {
    Normal,
    Search,
    GotoPage(String),
    ConfirmToggle(String),
    Dialog(Box<TaskDialog>),
    Cards { title: String, lines: Vec<Line<'static>>, scroll: u16 },
}

/// Interactive movement list for one account at a time.
pub struct MovementBrowser<'a> {
    bridge: &'a dyn LedgerBridge,
    accounts: Vec<String>,
    account_idx: usize,
    view: ViewController,
    selected: usize,
    mode: BrowseMode,
    status_message: Option<String>,
    last_dialog: Option<DialogOutcome>,
    table_state: TableState,
}

impl<'a> MovementBrowser<'a> {
    pub fn new(bridge: &'a dyn LedgerBridge, accounts: Vec<String>, page_size: usize) -> Self {
        Self {
            bridge,
            accounts,
            account_idx: 0,
            view: ViewController::new(page_size),
            selected: 0,
            mode: BrowseMode::Normal,
            status_message: None,
            last_dialog: None,
            table_state: TableState::default(),
        }
    }

    /// Open the account at `idx`; failures end up in the status line.
    pub fn open_account(&mut self, idx: usize) {
        let Some(caja) = self.accounts.get(idx).cloned() else {
            return;
        };
        match self.view.load_account(self.bridge, &caja) {
            Ok(()) => {
                self.account_idx = idx;
                self.selected = 0;
            }
            Err(e) => self.status_message = Some(format!("Load failed: {e}")),
        }
    }

    pub fn select_account(&mut self, caja: &str) -> bool {
        match self.accounts.iter().position(|a| a == caja) {
            Some(idx) => {
                self.open_account(idx);
                true
            }
            None => false,
        }
    }

    /// Completion notice of the most recent task dialog, if one was opened.
    pub fn last_dialog(&self) -> Option<DialogOutcome> {
        self.last_dialog
    }

    pub fn run(&mut self) -> crate::error::Result<()> {
        if self.accounts.is_empty() {
            println!("No accounts found. Import some movements first.");
            return Ok(());
        }
        if self.view.caja().is_none() {
            self.open_account(self.account_idx);
        }
        tui::run_view(self)
    }

    fn rows_on_page(&self) -> usize {
        self.view.snapshot().rows.len()
    }

    fn selected_id(&self) -> Option<String> {
        self.view
            .snapshot()
            .rows
            .get(self.selected)
            .map(|r| r.id.clone())
    }

    fn clamp_selection(&mut self) {
        let n = self.rows_on_page();
        if self.selected >= n {
            self.selected = n.saturating_sub(1);
        }
    }

    fn switch_account(&mut self, forward: bool) {
        if self.accounts.is_empty() {
            return;
        }
        let n = self.accounts.len();
        let idx = if forward {
            (self.account_idx + 1) % n
        } else {
            (self.account_idx + n - 1) % n
        };
        self.open_account(idx);
    }

    fn toggle_selected(&mut self, id: &str) {
        match self.view.toggle_accounted(self.bridge, id) {
            Ok(true) => self.status_message = Some(format!("{id} marked as accounted")),
            Ok(false) => self.status_message = Some(format!("{id} marked as not accounted")),
            Err(e) => self.status_message = Some(format!("Toggle failed: {e}")),
        }
        self.clamp_selection();
    }

    fn show_cards(&mut self, id: &str) {
        match self.bridge.list_tasks(id) {
            Ok(tasks) if tasks.is_empty() => {
                self.status_message = Some(format!("No tasks for {id}"));
            }
            Ok(tasks) => {
                let mut lines = Vec::new();
                for task in &tasks {
                    lines.extend(build_card(task, &self.accounts).to_lines());
                    lines.push(Line::default());
                }
                self.mode = BrowseMode::Cards {
                    title: format!("Tasks of {id} ({})", tasks.len()),
                    lines,
                    scroll: 0,
                };
            }
            Err(e) => {
                log::error!("listing tasks of {id} failed: {e}");
                self.status_message = Some(format!("Could not load tasks: {e}"));
            }
        }
    }

    fn finish_dialog(&mut self, dialog: &TaskDialog, action: DialogAction) -> Option<DialogOutcome> {
        match action {
            DialogAction::Continue => None,
            DialogAction::Cancel => Some(DialogOutcome::default()),
            DialogAction::Submit(task) => {
                let id = dialog.movement_id().to_string();
                match self.view.record_tasks(self.bridge, &id, &[task]) {
                    Ok(saved) => {
                        self.status_message = Some(format!("Saved {saved} task(s) for {id}"));
                        Some(DialogOutcome { success: true, saved })
                    }
                    Err(e) => {
                        self.status_message = Some(format!("Save failed: {e}"));
                        Some(DialogOutcome { success: false, saved: 0 })
                    }
                }
            }
        }
    }

    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [title_area, tabs_area, search_area, table_area, status_area, keys_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        let caja = self.view.caja().unwrap_or("-").to_string();
        frame.render_widget(
            Paragraph::new(format!(
                "Movimientos  \u{25c0} {caja} \u{25b6}  ({}/{})",
                self.account_idx + 1,
                self.accounts.len().max(1)
            ))
            .style(HEADER_STYLE),
            title_area,
        );

        let snapshot = self.view.snapshot();

        let mut tab_spans = Vec::new();
        for (i, tab) in Category::TABS.iter().enumerate() {
            if i > 0 {
                tab_spans.push(Span::raw(" | "));
            }
            let label = format!("{} ({})", tab.label(), snapshot.counts.get(*tab));
            if *tab == snapshot.active_tab {
                tab_spans.push(Span::styled(label, ACTIVE_TAB_STYLE));
            } else {
                tab_spans.push(Span::raw(label));
            }
        }
        frame.render_widget(Paragraph::new(Line::from(tab_spans)), tabs_area);

        let cursor = if matches!(self.mode, BrowseMode::Search) { "\u{2588}" } else { "" };
        frame.render_widget(
            Paragraph::new(format!(
                "Buscar [{}]: {}{cursor}",
                snapshot.scope, snapshot.search_term
            )),
            search_area,
        );

        let concept_width = table_area.width.saturating_sub(2 + 10 + 14 + 14 + 12 + 5).max(10) as usize;
        let rows: Vec<Row> = snapshot
            .rows
            .iter()
            .map(|r| {
                let (concepto, height) = tui::wrap_text(&r.concepto, concept_width);
                let mark = if r.is_contabilized {
                    Cell::from(Span::styled("\u{2713}", ACCOUNTED_STYLE))
                } else {
                    Cell::from("")
                };
                Row::new(vec![
                    mark,
                    Cell::from(fecha(&r.fecha)),
                    Cell::from(concepto),
                    Cell::from(tui::money_span(r.importe)),
                    Cell::from(r.saldo.map(euro).unwrap_or_default()),
                    Cell::from(r.id.clone()),
                ])
                .height(height)
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Length(10),
            Constraint::Fill(1),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(12),
        ];
        self.table_state
            .select((!snapshot.rows.is_empty()).then_some(self.selected));
        let table = Table::new(rows, widths)
            .header(
                Row::new(vec!["", "Fecha", "Concepto", "Importe", "Saldo", "Id"])
                    .style(HEADER_STYLE)
                    .bottom_margin(1),
            )
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        let status = format!(
            "Page {}/{} | Rows {} of {} ({})",
            snapshot.page,
            snapshot.total_pages,
            snapshot.rows.len(),
            snapshot.filtered,
            snapshot.counts.all,
        );
        let status = match &self.status_message {
            Some(msg) => format!("{status} | {msg}"),
            None => status,
        };
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), status_area);

        let keys = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                "[/]:account  1-3/Tab:tab  /:search  f:field  n/p:page  g:goto  x:toggle  c:contabilizar  v:tasks  q:quit",
            )
            .style(FOOTER_STYLE),
            BrowseMode::Search => Paragraph::new("Type to search, Enter=keep, Esc=clear").style(FOOTER_STYLE),
            BrowseMode::GotoPage(input) => Paragraph::new(format!("Go to page: {input}\u{2588}")),
            BrowseMode::ConfirmToggle(id) => {
                Paragraph::new(format!("Toggle accounted state of {id}? (y/n)"))
            }
            BrowseMode::Dialog(_) | BrowseMode::Cards { .. } => {
                Paragraph::new("Esc=close").style(FOOTER_STYLE)
            }
        };
        frame.render_widget(keys, keys_area);

        match &self.mode {
            BrowseMode::Dialog(dialog) => dialog.draw(frame, table_area),
            BrowseMode::Cards { title, lines, scroll } => {
                let block = ratatui::widgets::Block::bordered()
                    .title(format!(" {title} "))
                    .title_style(HEADER_STYLE);
                frame.render_widget(ratatui::widgets::Clear, table_area);
                frame.render_widget(
                    Paragraph::new(lines.clone()).block(block).scroll((*scroll, 0)),
                    table_area,
                );
            }
            _ => {}
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> ViewAction {
        let mode = std::mem::replace(&mut self.mode, BrowseMode::Normal);
        match mode {
            BrowseMode::Normal => return self.handle_normal_key(key.code),
            BrowseMode::Search => {
                let mut term = self.view.filter().search_term.clone();
                match key.code {
                    KeyCode::Esc => term.clear(),
                    KeyCode::Enter => {}
                    KeyCode::Backspace => {
                        term.pop();
                        self.mode = BrowseMode::Search;
                    }
                    KeyCode::Char(c) => {
                        term.push(c);
                        self.mode = BrowseMode::Search;
                    }
                    _ => self.mode = BrowseMode::Search,
                }
                self.view.set_search(&term);
                self.selected = 0;
            }
            BrowseMode::GotoPage(mut input) => match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter => {
                    if let Ok(page) = input.trim().parse::<usize>() {
                        self.view.goto_page(page);
                        self.selected = 0;
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.mode = BrowseMode::GotoPage(input);
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    input.push(c);
                    self.mode = BrowseMode::GotoPage(input);
                }
                _ => self.mode = BrowseMode::GotoPage(input),
            },
            BrowseMode::ConfirmToggle(id) => {
                if matches!(key.code, KeyCode::Char('y' | 'Y' | 's' | 'S')) {
                    self.toggle_selected(&id);
                } else {
                    self.status_message = Some("Cancelled".into());
                }
            }
            BrowseMode::Dialog(mut dialog) => {
                let action = dialog.handle_key(key);
                match self.finish_dialog(&dialog, action) {
                    Some(outcome) => {
                        log::debug!("task dialog closed: {outcome:?}");
                        self.last_dialog = Some(outcome);
                        self.clamp_selection();
                    }
                    None => self.mode = BrowseMode::Dialog(dialog),
                }
            }
            BrowseMode::Cards { title, lines, scroll } => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {}
                KeyCode::Down => self.mode = BrowseMode::Cards { title, lines, scroll: scroll + 1 },
                KeyCode::Up => {
                    self.mode = BrowseMode::Cards { title, lines, scroll: scroll.saturating_sub(1) }
                }
                _ => self.mode = BrowseMode::Cards { title, lines, scroll },
            },
        }
        ViewAction::Continue
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> ViewAction {
        self.status_message = None;
        match code {
            KeyCode::Char('q') => return ViewAction::Close,
            KeyCode::Esc => {
                self.view.set_search("");
                self.selected = 0;
            }
            KeyCode::Left | KeyCode::Char('[') => self.switch_account(false),
            KeyCode::Right | KeyCode::Char(']') => self.switch_account(true),
            KeyCode::Char(c @ '1'..='3') => {
                let idx = (c as usize) - ('1' as usize);
                self.view.select_tab(Category::TABS[idx]);
                self.selected = 0;
            }
            KeyCode::Tab => {
                self.view.select_tab(self.view.filter().active_tab.next());
                self.selected = 0;
            }
            KeyCode::Char('/') => self.mode = BrowseMode::Search,
            KeyCode::Char('f') => {
                self.view.set_scope(self.view.filter().scope.next());
                self.selected = 0;
            }
            KeyCode::Char('n') | KeyCode::PageDown => {
                self.view.next_page();
                self.selected = 0;
            }
            KeyCode::Char('p') | KeyCode::PageUp => {
                self.view.prev_page();
                self.selected = 0;
            }
            KeyCode::Char('g') => self.mode = BrowseMode::GotoPage(String::new()),
            KeyCode::Down => {
                if self.selected + 1 < self.rows_on_page() {
                    self.selected += 1;
                }
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    self.mode = BrowseMode::ConfirmToggle(id);
                }
            }
            KeyCode::Char('c') => {
                let record = self
                    .selected_id()
                    .and_then(|id| self.view.store().get(&id).cloned());
                if let Some(record) = record {
                    self.mode = BrowseMode::Dialog(Box::new(TaskDialog::new(&record)));
                }
            }
            KeyCode::Char('v') => {
                if let Some(id) = self.selected_id() {
                    self.show_cards(&id);
                }
            }
            KeyCode::Char('r') => {
                if let Err(e) = self.view.refresh(self.bridge) {
                    self.status_message = Some(format!("Refresh failed: {e}"));
                }
                self.clamp_selection();
            }
            _ => {}
        }
        ViewAction::Continue
    }
}

impl TuiView for MovementBrowser<'_> {
    fn draw(&mut self, frame: &mut Frame) {
        self.draw_frame(frame);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
        self.handle_key_event(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::MemoryBridge;
    use crate::models::fixtures::{record, records};
    use crate::models::RecordField;
    use crate::search::SearchScope;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn two_accounts() -> MemoryBridge {
        let mut all = records(30);
        let mut other = record("o1", "otra", 1.0, false);
        other.caja = "203_SANTANDER".into();
        all.push(other);
        MemoryBridge::with(all)
    }

    fn browser(bridge: &MemoryBridge) -> MovementBrowser<'_> {
        let accounts = bridge.list_accounts().unwrap();
        let mut b = MovementBrowser::new(bridge, accounts, 10);
        b.open_account(0);
        b
    }

    #[test]
    fn test_open_account_loads_records() {
        let bridge = two_accounts();
        let b = browser(&bridge);
        assert_eq!(b.view.caja(), Some("200_BANCO"));
        assert_eq!(b.view.store().len(), 30);
    }

    #[test]
    fn test_q_closes() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        assert!(matches!(b.handle_key_event(key(KeyCode::Char('q'))), ViewAction::Close));
    }

    #[test]
    fn test_switch_account_resets_filters() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        b.handle_key_event(key(KeyCode::Char('2')));
        b.handle_key_event(key(KeyCode::Char('n')));
        b.handle_key_event(key(KeyCode::Char(']')));
        assert_eq!(b.view.caja(), Some("203_SANTANDER"));
        assert_eq!(b.view.filter().active_tab, Category::All);
        assert_eq!(b.view.filter().current_page, 1);

        b.handle_key_event(key(KeyCode::Char('[')));
        assert_eq!(b.view.caja(), Some("200_BANCO"));
    }

    #[test]
    fn test_failed_switch_keeps_current_account() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        b.handle_key_event(key(KeyCode::Char('2')));
        b.handle_key_event(key(KeyCode::Down));
        let selected = b.selected;

        bridge.fail.set(true);
        b.handle_key_event(key(KeyCode::Char(']')));
        assert_eq!(b.account_idx, 0);
        assert_eq!(b.view.caja(), Some("200_BANCO"));
        assert_eq!(b.view.store().len(), 30);
        assert_eq!(b.view.filter().active_tab, Category::Contabilized);
        assert_eq!(b.selected, selected);
        assert!(b.status_message.as_deref().unwrap().starts_with("Load failed"));
    }

    #[test]
    fn test_live_search_and_esc_clears() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        b.handle_key_event(key(KeyCode::Char('n')));
        b.handle_key_event(key(KeyCode::Char('/')));
        for c in "movimiento 3".chars() {
            b.handle_key_event(key(KeyCode::Char(c)));
        }
        assert_eq!(b.view.filter().search_term, "movimiento 3");
        assert_eq!(b.view.filter().current_page, 1);
        // "Movimiento 3" and "Movimiento 30"
        assert_eq!(b.view.snapshot().filtered, 2);

        b.handle_key_event(key(KeyCode::Enter));
        assert!(matches!(b.mode, BrowseMode::Normal));
        b.handle_key_event(key(KeyCode::Esc));
        assert_eq!(b.view.filter().search_term, "");
    }

    #[test]
    fn test_field_cycle() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        b.handle_key_event(key(KeyCode::Char('f')));
        assert_eq!(b.view.filter().scope, SearchScope::Field(RecordField::Concepto));
    }

    #[test]
    fn test_goto_page_is_clamped() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        b.handle_key_event(key(KeyCode::Char('g')));
        b.handle_key_event(key(KeyCode::Char('9')));
        b.handle_key_event(key(KeyCode::Enter));
        assert_eq!(b.view.filter().current_page, 3);
    }

    #[test]
    fn test_toggle_requires_confirmation() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        let id = b.selected_id().unwrap();
        let before = b.view.store().get(&id).unwrap().is_contabilized;

        b.handle_key_event(key(KeyCode::Char('x')));
        b.handle_key_event(key(KeyCode::Char('n')));
        assert_eq!(b.view.store().get(&id).unwrap().is_contabilized, before);

        b.handle_key_event(key(KeyCode::Char('x')));
        b.handle_key_event(key(KeyCode::Char('y')));
        assert_eq!(b.view.store().get(&id).unwrap().is_contabilized, !before);
    }

    #[test]
    fn test_toggle_failure_shows_status() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        let id = b.selected_id().unwrap();
        bridge.fail.set(true);
        b.handle_key_event(key(KeyCode::Char('x')));
        b.handle_key_event(key(KeyCode::Char('y')));
        assert!(b.status_message.as_deref().unwrap().starts_with("Toggle failed"));
        assert_eq!(b.view.store().len(), 30);
        assert!(b.view.store().get(&id).is_some());
    }

    #[test]
    fn test_dialog_cancel_and_submit() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        b.handle_key_event(key(KeyCode::Char('2')));
        b.handle_key_event(key(KeyCode::Char('3')));
        let id = b.selected_id().unwrap();

        b.handle_key_event(key(KeyCode::Char('c')));
        assert!(matches!(b.mode, BrowseMode::Dialog(_)));
        b.handle_key_event(key(KeyCode::Esc));
        assert_eq!(b.last_dialog(), Some(DialogOutcome { success: false, saved: 0 }));

        b.handle_key_event(key(KeyCode::Char('c')));
        // tipo, fecha, tercero, caja, texto, partida, importe
        for _ in 0..6 {
            b.handle_key_event(key(KeyCode::Tab));
        }
        b.handle_key_event(key(KeyCode::Enter));
        assert_eq!(b.last_dialog(), Some(DialogOutcome { success: true, saved: 1 }));
        assert!(b.view.store().get(&id).unwrap().is_contabilized);
        assert_eq!(b.view.filter().active_tab, Category::NotContabilized);
    }

    #[test]
    fn test_cards_view() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        let id = b.selected_id().unwrap();
        b.handle_key_event(key(KeyCode::Char('v')));
        assert!(b.status_message.as_deref().unwrap().contains("No tasks"));

        let task = crate::tasks::Task::Generic { tipo: "pmp".into(), detalle: serde_json::json!({}) };
        bridge.save_tasks(&id, &[task]).unwrap();
        b.handle_key_event(key(KeyCode::Char('v')));
        assert!(matches!(b.mode, BrowseMode::Cards { .. }));
        b.handle_key_event(key(KeyCode::Esc));
        assert!(matches!(b.mode, BrowseMode::Normal));
    }

    #[test]
    fn test_selection_stays_on_page() {
        let bridge = two_accounts();
        let mut b = browser(&bridge);
        for _ in 0..20 {
            b.handle_key_event(key(KeyCode::Down));
        }
        assert_eq!(b.selected, 9);
        b.handle_key_event(key(KeyCode::Up));
        assert_eq!(b.selected, 8);
    }
}
