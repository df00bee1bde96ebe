//! Command-line front end for the tax estimator.

pub mod app;
pub mod cli;
pub mod csv_loader;
pub mod logging;
pub mod report;
