//! This crate exposes the internal functionality of the `portsweep` TCP
//! port scanner.
//!
//! A scan probes every port of one inclusive range on one host with a plain
//! TCP connect and reports which ports accepted the connection, together
//! with how long the whole scan took.
//!
//! ## Architecture Overview
//!
//! The core scanning behaviour is managed by
//! [`Scanner`](crate::scanner::Scanner), built from a validated
//! [`ScanRequest`](crate::scanner::ScanRequest). A run follows this flow:
//!
//! 1. **Resolution**: the host is resolved once for the whole scan
//! 2. **Port Source**: a [`PortSource`](crate::port_source::PortSource)
//!    hands out each port of the range exactly once
//! 3. **Worker Pool**: a fixed number of workers take ports and probe them,
//!    forwarding the open ones
//! 4. **Collector**: findings are gathered until the last worker is done,
//!    then sorted
//! 5. **Summary**: the open ports and elapsed time become a
//!    [`ScanSummary`](crate::scanner::ScanSummary)
//!
//! ## Basic Usage Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use portsweep::scanner::{ScanRequest, Scanner};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ScanRequest::new(
//!         "127.0.0.1",                // Target host
//!         1,                          // First port
//!         1_000,                      // Last port
//!         50,                         // Workers probing at the same time
//!         Duration::from_millis(100), // Connect timeout
//!     )?;
//!
//!     let runtime = tokio::runtime::Runtime::new()?;
//!     let summary = runtime.block_on(Scanner::new(request).greppable(true).run());
//!
//!     println!("Discovered {} open ports:", summary.open_ports.len());
//!     for port in &summary.open_ports {
//!         println!("  {port}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Only an invalid request is an error, and it is raised before anything is
//! scanned. Refused connections, timeouts, unreachable hosts and failed
//! name resolution all just make ports count as not open.
#![allow(clippy::needless_doctest_main)]

pub mod tui;

pub mod input;

pub mod scanner;

pub mod port_source;

pub mod address;

pub mod limits;

pub mod output;
