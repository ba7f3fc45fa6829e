//! nlsh Exec - runs vetted commands on the local machine.
//!
//! [`LocalExecutor`] implements the engine's
//! [`CommandExecutor`](nlsh_engine::CommandExecutor). It is only ever handed
//! commands the orchestrator has decided to run.

#[cfg(test)]
mod tests;

mod local;

pub use local::LocalExecutor;
