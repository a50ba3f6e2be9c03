//! Solar wind signal poller.
//!
//! The crate keeps a single bounded control value approximately in sync with
//! the latest solar wind speed published as a JSON time series:
//!
//! ```text
//!   HttpSource ──fetch──▶ latest_sample() ──▶ SpeedRange::normalize() ──▶ ControlCell
//!        ▲                                                                   │
//!        └──────── spawn_poller(): immediately, then every interval         ▼
//!                                                                  render loop reads
//! ```
//!
//! `ControlCell` is the only state shared with the renderer. Failed cycles are
//! reported through a [`PollObserver`] and leave the cell untouched.

mod cell;
mod error;
mod poller;
mod sample;
mod source;

pub use cell::{ControlCell, DEFAULT_CONTROL_VALUE};
pub use error::PollError;
pub use poller::{
    poll_once, spawn_poller, PollObserver, PollerConfig, PollerHandle, Reading, TracingObserver,
    DEFAULT_POLL_INTERVAL,
};
pub use sample::{latest_sample, SpeedRange, WindSample, SPEED_COLUMN, TIMESTAMP_COLUMN};
pub use source::{HttpSource, SampleSource, DEFAULT_ENDPOINT};
