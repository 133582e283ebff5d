//! # Swarmtail
//!
//! Tail the logs of many Docker Swarm tasks as one color-tagged stream.
//!
//! ## Usage
//!
//! ```bash
//! swarmtail [-f] [-t lines] [service...]
//! ```
//!
//! ## Modules
//!
//! - `mux` - Stream multiplexing engine: tag formatting, line framing, fan-in sinks
//! - `source` - Container log sources: the `LogSource` seam, the Docker backend,
//!   filter resolution and a scriptable mock

pub mod mux;
pub mod source;
