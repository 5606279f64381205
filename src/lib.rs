//! timed - wall-clock timing for async function calls
//!
//! Wrap async functions with [`timed!`] (or [`Timed::wrap`]); every successful
//! call appends one JSON line to a shared [`Recorder`]. [`process_logs`]
//! then sums those lines per function and prints a grid table sorted by
//! total time.
//!
//! ```
//! use timed::{timed, Recorder, Report};
//!
//! async fn load(id: u32) -> u32 {
//!     id
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let recorder = Recorder::new();
//! let load = timed!(load, recorder.clone());
//! load.call((1,)).await;
//! load.call((2,)).await;
//!
//! let report = Report::from_recorder(&recorder).unwrap();
//! assert_eq!(report.rows().len(), 1);
//! println!("{}", report);
//! # });
//! ```

#[cfg(feature = "demo")]
pub mod cli;
pub mod error;
pub mod event;
pub mod recorder;
pub mod report;
pub mod wrapper;

pub use error::{Result, TimedError};
pub use event::{function_identity, identity_from_type_name, TimingEvent};
pub use recorder::Recorder;
pub use report::{aggregate, print_report, process_logs, AggregateEntry, Report, ReportRow};
pub use wrapper::{time_future, AsyncCall, Timed};
