// SPDX-License-Identifier: MIT

pub mod batch;
pub mod emit;
pub mod errors;
pub mod mutation;
pub mod reference;
mod runner;
pub mod seq;

use crate::errors::SeqPrepError;

pub fn run() -> Result<(), SeqPrepError> {
    runner::run()
}
