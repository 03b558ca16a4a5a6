#[macro_use]
extern crate serde_derive;

pub mod content;
pub mod params;
pub mod search;
