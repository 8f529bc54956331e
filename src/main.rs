// SPDX-License-Identifier: MIT

use seqprep::errors::SeqPrepError;

fn main() -> Result<(), SeqPrepError> {
    seqprep::run()
}
