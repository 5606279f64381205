//! CLI argument parsing for the timed demo

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "timed-demo")]
#[command(version)]
#[command(about = "Time a few async calls and print the per-function summary", long_about = None)]
pub struct Cli {
    /// How many times each demo function is called
    #[arg(short = 'n', long = "calls", value_name = "N", default_value = "3")]
    pub calls: u32,

    /// Base sleep of the demo functions in milliseconds
    #[arg(long = "delay-ms", value_name = "MS", default_value = "10")]
    pub delay_ms: u64,

    /// Also call a wrapped function that fails (it is not timed)
    #[arg(long = "fail")]
    pub fail: bool,

    /// Print the raw event buffer before the table
    #[arg(long = "dump")]
    pub dump: bool,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
