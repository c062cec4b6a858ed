pub(crate) mod analysis;
pub(crate) mod cli;
pub(crate) mod config;
pub(crate) mod documents;
mod entry;
pub(crate) mod handlers;
pub(crate) mod inlay_hints;
pub(crate) mod scheduler;
pub(crate) mod state;
pub(crate) mod text;
pub(crate) mod utils;

pub use entry::run;
