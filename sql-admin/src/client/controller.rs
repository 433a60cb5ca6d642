//! Admin controller
//!
//! Drives the view state machine against an [`AdminApi`] and holds everything
//! an interface needs to draw: the active table snapshot, the single open
//! form session, the last console result and a status line. Errors never
//! escape an action; they end up on the status line.

use crate::client::console::{self, ConsoleResult};
use crate::client::error::ClientError;
use crate::client::form::{FormMode, FormSession};
use crate::client::render::{render, Grid};
use crate::client::request::{single_key_column, to_insert_payload, update_for_session};
use crate::client::transport::{AdminApi, ClientOptions, HttpAdminApi};
use crate::client::view::{FetchTicket, ViewEffect, ViewMachine, ViewState};
use crate::schema::{Row, RowQuery, TableMetadata, DEFAULT_PAGE_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Muted,
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub tone: StatusTone,
    pub message: String,
}

/// Metadata and rows of the active table, with the grid built from them
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub metadata: TableMetadata,
    pub rows: Vec<Row>,
    pub grid: Grid,
}

/// Outcome of fetching metadata and rows for one ticket
pub type FetchResult = Result<(TableMetadata, Vec<Row>), ClientError>;

pub struct AdminController<A: AdminApi> {
    api: A,
    page_limit: u64,
    view: ViewMachine,
    title: String,
    hint: String,
    snapshot: Option<TableSnapshot>,
    form: Option<FormSession>,
    console: Option<ConsoleResult>,
    status: StatusLine,
    last_error: Option<ClientError>,
}

impl<A: AdminApi> AdminController<A> {
    pub fn new(api: A) -> Self {
        Self::with_page_limit(api, DEFAULT_PAGE_LIMIT)
    }

    pub fn with_page_limit(api: A, page_limit: u64) -> Self {
        Self {
            api,
            page_limit,
            view: ViewMachine::new(),
            title: String::new(),
            hint: String::new(),
            snapshot: None,
            form: None,
            console: None,
            status: StatusLine {
                tone: StatusTone::Muted,
                message: String::new(),
            },
            last_error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &ViewState {
        self.view.state()
    }

    pub fn tables(&self) -> &[String] {
        self.view.tables()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn snapshot(&self) -> Option<&TableSnapshot> {
        self.snapshot.as_ref()
    }

    /// Grid of the active table; `None` while loading or after a failed load
    pub fn grid(&self) -> Option<&Grid> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.grid)
    }

    pub fn form(&self) -> Option<&FormSession> {
        self.form.as_ref()
    }

    pub fn console(&self) -> Option<&ConsoleResult> {
        self.console.as_ref()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Error raised by the most recent action, if it failed
    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    pub fn table_controls_enabled(&self) -> bool {
        self.view.table_controls_enabled()
    }

    /// `"PK: a, b"` or `"No PK"` for the loaded table
    pub fn key_summary(&self) -> Option<String> {
        self.snapshot.as_ref().map(|snapshot| {
            let keys = &snapshot.metadata.primary_key_columns;
            if keys.is_empty() {
                "No PK".to_string()
            } else {
                format!("PK: {}", keys.join(", "))
            }
        })
    }

    /// Discover tables and open the initial view
    pub async fn start(&mut self) {
        self.refresh_tabs().await;
    }

    /// Re-discover the table list from scratch
    pub async fn refresh_tabs(&mut self) {
        self.announce(StatusTone::Muted, "Reading tables...");

        match self.api.discover_tables().await {
            Ok(tables) => {
                self.announce(StatusTone::Ok, format!("Ready. Tables found: {}.", tables.len()));
                let effects = self.view.tables_discovered(tables);
                self.run_effects(effects).await;
            }
            Err(error) => self.report(error),
        }
    }

    /// Switch to a table and load it
    pub async fn select_table(&mut self, name: &str) {
        let effects = self.view.select_table(name);
        self.run_effects(effects).await;
    }

    /// Switch to a table without loading it yet
    ///
    /// The caller fetches with [`fetch`](Self::fetch) and hands the result to
    /// [`complete_fetch`](Self::complete_fetch), possibly after other
    /// selections have happened.
    pub fn begin_select(&mut self, name: &str) -> Option<FetchTicket> {
        let effects = self.view.select_table(name);
        self.present_all(effects).into_iter().next()
    }

    /// Fetch metadata and the first page of rows for a ticket
    pub async fn fetch(&self, ticket: &FetchTicket) -> FetchResult {
        let window = RowQuery {
            limit: self.page_limit,
            offset: 0,
        };
        let (metadata, rows) = tokio::try_join!(
            self.api.table_metadata(&ticket.table),
            self.api.table_rows(&ticket.table, window),
        )?;
        Ok((metadata, rows.rows))
    }

    /// Apply a fetch result if its ticket still names the active table
    ///
    /// Returns whether the result was applied.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: FetchResult) -> bool {
        if !self.view.is_current(&ticket) {
            tracing::debug!(
                table = %ticket.table,
                sequence = ticket.sequence,
                "dropping stale fetch result"
            );
            return false;
        }

        match result {
            Ok((metadata, rows)) => {
                let grid = render(&metadata.columns, &rows, true);
                self.hint = format!("{} rows.", rows.len());
                self.snapshot = Some(TableSnapshot {
                    metadata,
                    rows,
                    grid,
                });
                self.announce(StatusTone::Ok, format!("Table {} loaded.", ticket.table));
            }
            Err(error) => {
                self.snapshot = None;
                self.hint = "Failed to load table.".to_string();
                self.report(error);
            }
        }
        true
    }

    pub fn select_console(&mut self) {
        let effects = self.view.select_console();
        self.present_all(effects);
    }

    /// Refetch the active table
    pub async fn reload(&mut self) {
        let effects = self.view.reload();
        self.run_effects(effects).await;
    }

    /// Open an insert form for the loaded table, replacing any open session
    pub fn open_insert(&mut self) {
        match self.insert_session() {
            Ok(session) => {
                self.announce(StatusTone::Muted, session.subtitle());
                self.form = Some(session);
            }
            Err(error) => self.report(error),
        }
    }

    /// Open an edit form for a row of the loaded table, replacing any open session
    ///
    /// Refused without any request when the table key is not a single column.
    pub fn open_edit(&mut self, row: usize) {
        match self.edit_session(row) {
            Ok(session) => {
                self.announce(StatusTone::Muted, session.subtitle());
                self.form = Some(session);
            }
            Err(error) => self.report(error),
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) {
        let result = match self.form.as_mut() {
            Some(session) => session.set_field(name, value),
            None => Err(no_form()),
        };
        if let Err(error) = result {
            self.report(error);
        }
    }

    pub fn cancel_form(&mut self) {
        if self.form.take().is_some() {
            self.announce(StatusTone::Muted, "Cancelled.");
        }
    }

    /// Send the open form, then reload on success
    ///
    /// On failure the session stays open with the operator's input.
    pub async fn save(&mut self) {
        let Some(session) = self.form.as_ref() else {
            self.report(no_form());
            return;
        };
        let table = session.metadata.table_name.clone();

        let outcome = match session.mode {
            FormMode::Insert => {
                let values = to_insert_payload(&session.fields);
                self.api
                    .insert(&table, &values)
                    .await
                    .map(|_| "Insert OK. Reloading...")
            }
            FormMode::Edit => match update_for_session(session) {
                Ok(request) => self
                    .api
                    .update(&table, &request)
                    .await
                    .map(|_| "Update OK. Reloading..."),
                Err(error) => Err(error),
            },
        };

        match outcome {
            Ok(message) => {
                tracing::info!(table = %table, "{}", message);
                self.form = None;
                self.announce(StatusTone::Ok, message);
                self.reload().await;
            }
            Err(error) => self.report(error),
        }
    }

    /// Run console SQL and render the result
    pub async fn run_query(&mut self, sql: &str) {
        if self.view.state() != &ViewState::ConsoleActive {
            self.report(ClientError::Constraint(
                "open the query console first".to_string(),
            ));
            return;
        }

        self.announce(StatusTone::Muted, "Running SELECT...");
        match console::run_query(&self.api, sql).await {
            Ok(result) => {
                let message = result
                    .note
                    .clone()
                    .unwrap_or_else(|| format!("Done. Rows: {}", result.rows.len()));
                self.console = Some(result);
                self.announce(StatusTone::Ok, message);
            }
            Err(error) => {
                self.console = None;
                self.report(error);
            }
        }
    }

    fn insert_session(&self) -> Result<FormSession, ClientError> {
        let snapshot = self.loaded()?;
        Ok(FormSession::insert(snapshot.metadata.clone()))
    }

    fn edit_session(&self, row: usize) -> Result<FormSession, ClientError> {
        let snapshot = self.loaded()?;
        single_key_column(&snapshot.metadata)?;
        let source = snapshot
            .rows
            .get(row)
            .cloned()
            .ok_or_else(|| ClientError::Constraint(format!("there is no row {}", row + 1)))?;
        FormSession::edit(snapshot.metadata.clone(), source)
    }

    fn loaded(&self) -> Result<&TableSnapshot, ClientError> {
        match (self.view.state(), self.snapshot.as_ref()) {
            (ViewState::TableActive(_), Some(snapshot)) => Ok(snapshot),
            _ => Err(ClientError::Constraint("no table is loaded".to_string())),
        }
    }

    async fn run_effects(&mut self, effects: Vec<ViewEffect>) {
        for ticket in self.present_all(effects) {
            let result = self.fetch(&ticket).await;
            self.complete_fetch(ticket, result);
        }
    }

    /// Apply the display effects and hand back the fetches still to run
    fn present_all(&mut self, effects: Vec<ViewEffect>) -> Vec<FetchTicket> {
        let mut fetches = Vec::new();
        for effect in effects {
            match effect {
                ViewEffect::Fetch(ticket) => fetches.push(ticket),
                ViewEffect::ShowEmpty => {
                    self.title = "No tables in the database".to_string();
                    self.hint = "Create at least one table for it to show up here.".to_string();
                    self.clear_table_view();
                }
                ViewEffect::ShowTable(name) => {
                    self.title = format!("Table: {}", name);
                    self.hint = "Loading metadata and rows...".to_string();
                    self.clear_table_view();
                }
                ViewEffect::ShowConsole => {
                    self.title = "SQL query console".to_string();
                    self.hint = "SELECT statements only.".to_string();
                    self.clear_table_view();
                }
                ViewEffect::TableControls(enabled) => {
                    tracing::trace!(enabled, "table controls toggled");
                }
                ViewEffect::Refused(reason) => {
                    self.report(ClientError::Constraint(reason.to_string()));
                }
            }
        }
        fetches
    }

    /// Drop the previous target's snapshot and any open form
    fn clear_table_view(&mut self) {
        self.snapshot = None;
        self.form = None;
    }

    fn announce(&mut self, tone: StatusTone, message: impl Into<String>) {
        self.status = StatusLine {
            tone,
            message: message.into(),
        };
        self.last_error = None;
    }

    fn report(&mut self, error: ClientError) {
        tracing::warn!(%error, "admin action failed");
        self.status = StatusLine {
            tone: StatusTone::Error,
            message: error.message().to_string(),
        };
        self.last_error = Some(error);
    }
}

impl AdminController<HttpAdminApi> {
    /// Controller talking to a server over HTTP, paging by `options.page_limit`
    pub fn connect(options: &ClientOptions) -> crate::Result<Self> {
        let api = HttpAdminApi::new(options)?;
        Ok(Self::with_page_limit(api, options.page_limit))
    }
}

fn no_form() -> ClientError {
    ClientError::Constraint("no form is open".to_string())
}
