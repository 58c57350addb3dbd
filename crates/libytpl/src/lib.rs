//! Library of "ytpl", contains all the logic needed for the binary

#![allow(clippy::needless_return)]
#![allow(special_module_name)] // because of module "main", dont have a better name for that
#![warn(clippy::implicit_return)]

#[macro_use]
extern crate log;

pub mod error;
pub mod locate;
pub mod main;
pub mod options;
pub mod spawn;
pub use error::Error;
