//! Concrete implementations of the port traits.
//!
//! | Adapter   | Implements     | Connects to                    |
//! |-----------|----------------|--------------------------------|
//! | `serial`  | PortProvider   | USB CDC ports via `serialport` |
//! |           | Transport      |                                |
//! | `clock`   | Clock          | `std::time` / `std::thread`    |
//! | `history` | SampleSink     | in-memory ring buffer          |
//! | `jsonl`   | SampleSink     | append-only JSON Lines file    |

pub mod clock;
pub mod history;
pub mod jsonl;
pub mod serial;

pub use clock::SystemClock;
pub use history::MemoryHistory;
pub use jsonl::JsonlSampleLog;
pub use serial::SerialAdapter;
