//! View state machine
//!
//! Owns which table or console is active. Transitions are plain functions of
//! the current state and an event, returning the effects the controller must
//! carry out. Fetched data is only applied when its [`FetchTicket`] still
//! names the active target.

/// Discriminated selection of what the operator is looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    Table(String),
    QueryConsole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// The database has no tables
    Empty,
    TableActive(String),
    ConsoleActive,
}

impl ViewState {
    pub fn target(&self) -> Option<ViewTarget> {
        match self {
            ViewState::Empty => None,
            ViewState::TableActive(name) => Some(ViewTarget::Table(name.clone())),
            ViewState::ConsoleActive => Some(ViewTarget::QueryConsole),
        }
    }

    pub fn active_table(&self) -> Option<&str> {
        match self {
            ViewState::TableActive(name) => Some(name),
            _ => None,
        }
    }
}

/// Identifies one metadata+rows fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub table: String,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEffect {
    /// Show the "no tables" view
    ShowEmpty,
    /// Show a table view, dropping whatever was displayed before
    ShowTable(String),
    ShowConsole,
    /// Enable or disable the create/reload controls
    TableControls(bool),
    /// Fetch metadata and rows for a table
    Fetch(FetchTicket),
    /// The event is not valid in the current state
    Refused(&'static str),
}

pub const RELOAD_REFUSED: &str = "reload needs an active table";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMachine {
    state: ViewState,
    tables: Vec<String>,
    sequence: u64,
}

impl Default for ViewMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewMachine {
    pub fn new() -> Self {
        Self {
            state: ViewState::Empty,
            tables: Vec::new(),
            sequence: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Table names from the last discovery, in backend order
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Create and reload only make sense with a table selected
    pub fn table_controls_enabled(&self) -> bool {
        matches!(self.state, ViewState::TableActive(_))
    }

    /// Apply a fresh table list
    ///
    /// A still-existing active table is kept and refetched, the console is
    /// kept as is, and anything else falls back to the initial rule: the
    /// first table, or `Empty` when there is none.
    pub fn tables_discovered(&mut self, tables: Vec<String>) -> Vec<ViewEffect> {
        self.tables = tables;

        match &self.state {
            ViewState::TableActive(name) if self.tables.contains(name) => {
                let name = name.clone();
                vec![ViewEffect::Fetch(self.ticket(name))]
            }
            ViewState::ConsoleActive => Vec::new(),
            _ => match self.tables.first().cloned() {
                Some(first) => self.select_table(first),
                None => {
                    self.state = ViewState::Empty;
                    vec![ViewEffect::ShowEmpty, ViewEffect::TableControls(false)]
                }
            },
        }
    }

    /// Any state to `TableActive(name)`, with a fetch for it
    pub fn select_table(&mut self, name: impl Into<String>) -> Vec<ViewEffect> {
        let name = name.into();
        self.state = ViewState::TableActive(name.clone());
        vec![
            ViewEffect::ShowTable(name.clone()),
            ViewEffect::TableControls(true),
            ViewEffect::Fetch(self.ticket(name)),
        ]
    }

    /// Any state to `ConsoleActive`
    pub fn select_console(&mut self) -> Vec<ViewEffect> {
        self.state = ViewState::ConsoleActive;
        vec![ViewEffect::ShowConsole, ViewEffect::TableControls(false)]
    }

    /// Refetch the active table; refused outside `TableActive`
    pub fn reload(&mut self) -> Vec<ViewEffect> {
        match &self.state {
            ViewState::TableActive(name) => {
                let name = name.clone();
                vec![ViewEffect::Fetch(self.ticket(name))]
            }
            _ => vec![ViewEffect::Refused(RELOAD_REFUSED)],
        }
    }

    /// Whether data fetched under `ticket` may still be applied
    ///
    /// Compares target identity only; arrival order is irrelevant.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.state.active_table() == Some(ticket.table.as_str())
    }

    fn ticket(&mut self, table: String) -> FetchTicket {
        self.sequence += 1;
        FetchTicket {
            table,
            sequence: self.sequence,
        }
    }
}
