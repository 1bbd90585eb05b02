pub mod capture;
pub mod exec;
pub mod git;
pub mod paths;
pub mod project;
pub mod record;
pub mod sync;

#[cfg(test)]
pub(crate) mod testutil;
