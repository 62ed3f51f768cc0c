#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

extern crate simplelog;

//Application Imports/Exports
pub mod cleaner;
pub mod constants;
pub mod filter;
pub mod refresh;
pub mod workload;
