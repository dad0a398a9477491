//! Side-effecting parts of the engine: filesystem, umask, child processes.

pub mod log;
pub mod process;
pub mod report;
pub mod scan;
pub mod umask;
