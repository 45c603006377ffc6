//! Trade Pilot client library
//!
//! Client side of the Trade Pilot marketplace, where UK homeowners post
//! jobs as leads and tradespeople quote for them. Storage, auth and access
//! rules live in a hosted Supabase project; this crate owns the data
//! access, the signed-in session, form and wizard state, the trade job
//! board and the route table.
//!
//! # Example
//!
//! ```no_run
//! use tradepilot::prelude::*;
//!
//! # async fn run() -> tradepilot::error::Result<()> {
//! let app = TradePilot::from_env()?;
//! app.start().await;
//!
//! let mut board = app.job_board();
//! board.refresh().await?;
//! for column in board.board.columns() {
//!     println!("{}: {}", column.name(), column.items.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod blog;
pub mod board;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod leads;
pub mod models;
pub mod notify;
pub mod pages;
pub mod routes;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use app::TradePilot;
pub use tradepilot_auth as auth;
pub use tradepilot_postgrest as postgrest;

/// A convenience module for common imports
pub mod prelude {
    pub use crate::api::{Api, MarketplaceApi, ProfileApi};
    pub use crate::app::TradePilot;
    pub use crate::board::{Board, DragTarget, JobBoard};
    pub use crate::config::AppConfig;
    pub use crate::error::Error;
    pub use crate::models::*;
    pub use crate::notify::{Notifier, Toast};
    pub use crate::routes::Route;
    pub use crate::session::{SessionManager, SignUpProfile};
}
