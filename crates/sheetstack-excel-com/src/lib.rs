//! Excel COM automation strategy for sheetstack.
//!
//! Drives a real Excel instance through `excel-com-bridge.exe`, a small
//! Windows process controlled by JSON commands over stdin/stdout and run
//! under WINE on Linux (or natively on Windows). This crate provides:
//!
//! - [`ExcelBridge`] — subprocess lifecycle and the command/response wire
//! - [`Automation`] — the narrow automation surface the merge driver needs
//! - [`ExcelComStrategy`] — the `MergeStrategy` implementation that opens
//!   each source workbook read-only, copies every sheet into the growing
//!   destination, and drives the save handshake
//!
//! ```text
//! sheetstack-core (orchestrator)
//!     └── ExcelComStrategy (this crate)
//!           └── ExcelBridge ── stdio ──> excel-com-bridge.exe ── COM ──> Excel
//! ```

pub mod automation;
pub mod bridge;
pub mod driver;

pub use automation::Automation;
pub use bridge::{bridge_available, BridgeError, ExcelBridge, ExcelBridgeConfig};
pub use driver::ExcelComStrategy;
