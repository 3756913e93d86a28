//! Movement list controller: owns the record store and the filter state of
//! the open account and recomputes the visible page on every event.
//!
//! Pipeline: store → tab → search → page. Counters always come from the
//! whole store.

use crate::bridge::LedgerBridge;
use crate::error::{CajeroError, Result};
use crate::models::Record;
use crate::paginate::{clamp_page, paginate, total_pages};
use crate::search::{self, SearchScope};
use crate::store::RecordStore;
use crate::tabs::{self, Category, TabCounts};
use crate::tasks::Task;

pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub active_tab: Category,
    pub search_term: String,
    pub scope: SearchScope,
    /// 1-based.
    pub current_page: usize,
    pub page_size: usize,
}

impl FilterState {
    pub fn new(page_size: usize) -> Self {
        Self {
            active_tab: Category::All,
            search_term: String::new(),
            scope: SearchScope::All,
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Identifies one load request. A response is applied only if no newer
/// request has been issued since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    caja: String,
}

impl LoadTicket {
    pub fn caja(&self) -> &str {
        &self.caja
    }
}

/// What the rendering layer needs after an event.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot<'a> {
    pub rows: Vec<&'a Record>,
    pub page: usize,
    pub total_pages: usize,
    /// Records left after tab + search.
    pub filtered: usize,
    pub counts: TabCounts,
    pub active_tab: Category,
    pub search_term: &'a str,
    pub scope: SearchScope,
}

#[derive(Debug, Default)]
pub struct ViewController {
    store: RecordStore,
    filter: FilterState,
    issued: u64,
}

impl ViewController {
    pub fn new(page_size: usize) -> Self {
        Self {
            store: RecordStore::default(),
            filter: FilterState::new(page_size),
            issued: 0,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn caja(&self) -> Option<&str> {
        self.store.caja()
    }

    // -- account lifecycle --------------------------------------------------

    /// Request an account. Nothing changes until the matching response is
    /// applied, so a failed load leaves the open account as it was.
    pub fn open_account(&mut self, caja: &str) -> LoadTicket {
        self.issue(caja)
    }

    /// Ticket for reloading the open account, if any.
    pub fn begin_refresh(&mut self) -> Option<LoadTicket> {
        let caja = self.store.caja()?.to_string();
        Some(self.issue(&caja))
    }

    fn issue(&mut self, caja: &str) -> LoadTicket {
        self.issued += 1;
        LoadTicket {
            seq: self.issued,
            caja: caja.to_string(),
        }
    }

    /// Apply a load response. Only the latest issued ticket is applied;
    /// returns `false` for anything older. A response for another account
    /// swaps the store and resets the filters.
    pub fn apply_load(&mut self, ticket: LoadTicket, records: Vec<Record>) -> bool {
        if ticket.seq != self.issued {
            log::debug!("dropping stale response #{} for {}", ticket.seq, ticket.caja);
            return false;
        }
        if self.store.caja() == Some(ticket.caja.as_str()) {
            self.store.replace(records);
        } else {
            self.store = RecordStore::new(&ticket.caja, records);
            self.reset_filters();
        }
        self.reclamp();
        true
    }

    // -- filter events ------------------------------------------------------

    pub fn select_tab(&mut self, tab: Category) {
        self.filter.active_tab = tab;
        self.filter.current_page = 1;
        self.reclamp();
    }

    pub fn set_search(&mut self, term: &str) {
        if self.filter.search_term == term {
            return;
        }
        self.filter.search_term = term.to_string();
        self.filter.current_page = 1;
        self.reclamp();
    }

    pub fn set_scope(&mut self, scope: SearchScope) {
        self.filter.scope = scope;
        self.filter.current_page = 1;
        self.reclamp();
    }

    pub fn reset_filters(&mut self) {
        self.filter.reset();
    }

    // -- paging -------------------------------------------------------------

    pub fn goto_page(&mut self, page: usize) {
        self.filter.current_page = page;
        self.reclamp();
    }

    pub fn next_page(&mut self) {
        self.goto_page(self.filter.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.goto_page(self.filter.current_page.saturating_sub(1));
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.filter.page_size)
    }

    fn reclamp(&mut self) {
        let pages = self.total_pages();
        self.filter.current_page = clamp_page(self.filter.current_page, pages);
    }

    // -- pipeline -----------------------------------------------------------

    /// Tab subset narrowed by the search term, in store order.
    pub fn filtered(&self) -> Vec<&Record> {
        let by_tab = tabs::classify(self.store.records(), self.filter.active_tab);
        search::filter(&by_tab, &self.filter.search_term, self.filter.scope)
    }

    pub fn counts(&self) -> TabCounts {
        tabs::count(self.store.records())
    }

    pub fn snapshot(&self) -> ViewSnapshot<'_> {
        let filtered = self.filtered();
        let page = paginate(&filtered, self.filter.current_page, self.filter.page_size);
        ViewSnapshot {
            rows: page.items.to_vec(),
            page: page.page,
            total_pages: page.total_pages,
            filtered: page.total,
            counts: self.counts(),
            active_tab: self.filter.active_tab,
            search_term: &self.filter.search_term,
            scope: self.filter.scope,
        }
    }

    // -- bridge-backed actions ----------------------------------------------

    /// Select an account and load its movements.
    pub fn load_account(&mut self, bridge: &dyn LedgerBridge, caja: &str) -> Result<()> {
        let ticket = self.open_account(caja);
        log::debug!("loading movements for {caja}");
        let records = bridge.list_recent_records(caja).inspect_err(|e| {
            log::error!("loading {caja} failed: {e}");
        })?;
        log::info!("loaded {} movements for {caja}", records.len());
        self.apply_load(ticket, records);
        Ok(())
    }

    /// Reload the open account, keeping filters and position.
    pub fn refresh(&mut self, bridge: &dyn LedgerBridge) -> Result<()> {
        let ticket = self
            .begin_refresh()
            .ok_or_else(|| CajeroError::Other("No account selected".into()))?;
        let records = bridge.list_recent_records(ticket.caja()).inspect_err(|e| {
            log::error!("refreshing {} failed: {e}", ticket.caja());
        })?;
        self.apply_load(ticket, records);
        Ok(())
    }

    /// Ask the bridge to flip the accounted state of a movement. The store is
    /// only updated from the bridge's confirmed answer; on failure nothing
    /// changes. Returns the new state.
    pub fn toggle_accounted(&mut self, bridge: &dyn LedgerBridge, id: &str) -> Result<bool> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| CajeroError::UnknownRecord(id.to_string()))?;
        let new_state = !record.is_contabilized;
        let ticket = self
            .begin_refresh()
            .ok_or_else(|| CajeroError::Other("No account selected".into()))?;
        log::debug!("setting {id} accounted={new_state}");
        let records = bridge
            .set_accounted_state(id, ticket.caja(), new_state)
            .inspect_err(|e| log::error!("toggle of {id} failed: {e}"))?;
        self.apply_load(ticket, records);
        Ok(new_state)
    }

    /// Store the tasks produced by a dialog session and reload.
    pub fn record_tasks(&mut self, bridge: &dyn LedgerBridge, id: &str, tasks: &[Task]) -> Result<usize> {
        if self.store.get(id).is_none() {
            return Err(CajeroError::UnknownRecord(id.to_string()));
        }
        let saved = bridge
            .save_tasks(id, tasks)
            .inspect_err(|e| log::error!("saving tasks for {id} failed: {e}"))?;
        log::info!("saved {saved} tasks for {id}");
        self.refresh(bridge)?;
        Ok(saved)
    }
}
