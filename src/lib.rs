#[macro_use]
extern crate serde;

mod config;
mod error;
mod keygen;
mod ledger;
mod plume;
mod serde_hex;
mod store;
mod submit;
mod vote;

pub use config::*;
pub use error::*;
pub use keygen::*;
pub use ledger::*;
pub use plume::*;
pub use serde_hex::*;
pub use store::*;
pub use submit::*;
pub use vote::*;
