#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod cli;
pub mod error;

mod entities;
mod harvest;
mod query;
mod render;
mod sources;
mod synonyms;
mod tables;
mod transform;
mod utils;
