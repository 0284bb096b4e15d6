//! Fixtures shared by the pipeline tests

use std::path::Path;

use crate::cancel::SearchControl;
use crate::error::Result;
use crate::job::{SearchJob, SearchSolution};
use crate::engine::SearchEngine;

/// `Foo.json` init code; its hash is 0xf8b07b08...4ef3
pub(crate) const FOO_BYTECODE: &str = "0x6001600155";
pub(crate) const FOO_ADDRESS: &str = "0xb809a426a74ea8e758a5b7ae72b8a408c7ffc777";

/// Salt 10184, which puts Foo at [`FOO_ADDRESS`] under the default factory
pub(crate) fn foo_salt() -> String {
    format!("0x{:064x}", 10184)
}

pub(crate) fn foo_solution() -> SearchSolution {
    SearchSolution {
        address: FOO_ADDRESS.to_string(),
        salt: foo_salt(),
        attempts: 42,
        duration_seconds: 1.5,
        timestamp: "2024-01-01T00:00:00Z".to_string(),
    }
}

pub(crate) fn write_artifact(root: &Path, label: &str, bytecode: &str) {
    let dir = root.join(format!("{}.sol", label));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("{}.json", label)),
        format!(r#"{{"contractName": "{}", "bytecode": "{}"}}"#, label, bytecode),
    )
    .unwrap();
}

/// Engine whose answers come from a closure
pub(crate) struct StubEngine<F>(F);

impl<F> StubEngine<F>
where
    F: Fn(&SearchJob, &SearchControl) -> Result<SearchSolution>,
{
    pub(crate) fn new(respond: F) -> Self {
        Self(respond)
    }
}

impl<F> SearchEngine for StubEngine<F>
where
    F: Fn(&SearchJob, &SearchControl) -> Result<SearchSolution>,
{
    fn name(&self) -> &str {
        "stub"
    }

    fn search(&self, job: &SearchJob, control: &SearchControl) -> Result<SearchSolution> {
        (self.0)(job, control)
    }
}
