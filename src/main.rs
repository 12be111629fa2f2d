//! hf2flm CLI
//!
//! Single-command converter from HuggingFace checkpoints to `.flm` files.
//!
//! # Usage
//!
//! ```bash
//! # Convert the default model at the default precision
//! hf2flm
//!
//! # Name the output file
//! hf2flm decicoder.flm
//!
//! # Quantize to 8-bit
//! hf2flm decicoder-int8.flm int8
//!
//! # Convert a different repository
//! hf2flm qwen.flm int4 --model Qwen/Qwen-7B
//!
//! # Convert a local checkpoint directory
//! hf2flm out.flm float16 --model ./checkpoints/decicoder
//! ```

use clap::Parser;
use hf2flm::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
