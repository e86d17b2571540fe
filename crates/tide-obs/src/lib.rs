//! Output selection and multi-rate scheduling for Tide simulations.
//!
//! An [`OutputSpec`] names the arrays one writer persists. Compiling it
//! against a grid yields an [`OutputPlan`] that extracts a [`Payload`]
//! from any [`FieldReader`](tide_core::FieldReader). The
//! [`OutputScheduler`] owns one [`WriterSchedule`] per writer and fires
//! each on its own simulation-time cadence.
//!
//! # Frame format
//!
//! [`FrameWriter`] persists payloads in a simple binary stream:
//!
//! ```text
//! [MAGIC "TIDE"] [VERSION u8] [schedule name]
//! [Frame 1] [Frame 2] ... [Frame N]
//! ```
//!
//! All integers and floats are little-endian; strings are length-prefixed
//! with a `u32`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod frame;
pub mod payload;
pub mod plan;
pub mod schedule;
pub mod sink;
pub mod spec;

pub use frame::{Frame, FrameReader, FrameWriter};
pub use payload::{OutputArray, Payload, Shape};
pub use plan::OutputPlan;
pub use schedule::{OutputScheduler, WriterSchedule, DUE_TOLERANCE};
pub use sink::{CapturedFrame, MemoryLog, MemorySink, NullSink, OutputSink};
pub use spec::{OutputEntry, OutputSpec, Selector};

/// Magic bytes at the start of every frame file.
pub const MAGIC: [u8; 4] = *b"TIDE";

/// Current binary frame format version.
pub const FORMAT_VERSION: u8 = 1;
