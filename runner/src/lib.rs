pub mod cli;
pub mod config;
pub mod descriptor;
pub mod input;
pub mod partition;
pub mod splitter;
pub mod submitters;
