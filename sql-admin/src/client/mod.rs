//! Schema-driven admin client
//!
//! Everything here is derived from table metadata at runtime: the grid, the
//! insert and edit forms and the request payloads. The [`AdminController`]
//! ties them to a view state machine and an [`AdminApi`] transport.

pub mod console;
pub mod controller;
pub mod error;
pub mod form;
pub mod render;
pub mod request;
pub mod transport;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use console::{run_query, ConsoleResult};
pub use controller::{AdminController, StatusLine, StatusTone, TableSnapshot};
pub use error::ClientError;
pub use form::{build_form, FormField, FormMode, FormSession, Placeholder};
pub use render::{render, Cell, Grid, GridRow, RowAction};
pub use request::{to_insert_payload, to_update_payload};
pub use transport::{AdminApi, ClientOptions, HttpAdminApi, LocalAdminApi};
pub use view::{FetchTicket, ViewEffect, ViewMachine, ViewState, ViewTarget};
