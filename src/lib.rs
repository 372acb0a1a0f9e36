//! # barline
//!
//! A status bar daemon. Each configured slot polls (or listens to) a system
//! provider, a rule turns the raw value into a colored text segment, and the
//! joined bar line is published to stdout, a JSON stream or a terminal
//! preview every time any slot changes.
//!
//! ## Architecture
//!
//! ```text
//! config.toml ──▶ config ──▶ slots ──▶ Scheduler (barline-sdk)
//!                              │          │  one task per slot
//!                   presets ◀──┘          ▼
//!                   hooks              Aggregator ──▶ render (text | json)
//!                                          │
//!                                          └────────▶ app + ui (preview)
//! ```
//!
//! - **[`config`]**: the TOML/env configuration and its validation
//! - **[`slots`]**: turns configured slots into scheduler slots
//! - **[`presets`]**: the default rule for every provider kind
//! - **[`hooks`]**: runs a command when a slot changes severity
//! - **[`render`]**: text and JSON-lines sinks
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the ratatui preview
//! - **[`run`]**: keeps the scheduler and the preview's lifetimes tied
//! - **[`theme`]**: severity colors shared by every renderer
//!
//! ## Usage
//!
//! ```no_run
//! use barline::{build_scheduler, BarConfig, TextSink};
//! use barline_sdk::{shutdown_channel, Scheduler};
//!
//! # tokio_test::block_on(async {
//! let bar = BarConfig::from_toml(r#"
//! [[slots]]
//! name = "clock"
//! interval_ms = 1000
//! provider = { kind = "clock" }
//! "#).unwrap();
//!
//! let sink = TextSink::new(tokio::io::stdout(), bar.separator.clone());
//! let scheduler = build_scheduler(&bar, Scheduler::builder().sink(Box::new(sink))).unwrap();
//!
//! let (_trigger, shutdown) = shutdown_channel();
//! scheduler.run(shutdown).await.unwrap();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod events;
pub mod hooks;
pub mod presets;
pub mod render;
pub mod run;
pub mod slots;
pub mod theme;
pub mod ui;

pub use app::App;
pub use config::{BarConfig, ConfigError, ProviderConfig, SlotConfig};
pub use hooks::CommandHook;
pub use render::{render_line, JsonSink, TextSink};
pub use run::run_alongside;
pub use slots::{build_scheduler, slot_table};
pub use theme::{Palette, Rgb, Theme};
