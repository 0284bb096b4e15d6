//! Search engines
//!
//! The coordinator only sees [`SearchEngine`]. Searches run either inside
//! this process on rayon lanes, or in a worker subprocess speaking the
//! `search` command-line contract.

mod in_process;
mod process;

pub use in_process::InProcessEngine;
pub use process::{BuildStep, ProcessEngine};

use crate::cancel::SearchControl;
use crate::error::Result;
use crate::job::{SearchJob, SearchSolution};

/// Something that can find a salt for a [`SearchJob`]
pub trait SearchEngine {
    /// Short name for logs
    fn name(&self) -> &str;

    /// One-time setup before the first job of a run
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Block until a solution is found, the search fails, or `control` stops it
    fn search(&self, job: &SearchJob, control: &SearchControl) -> Result<SearchSolution>;
}
