mod options;
mod points;
mod progress;
mod shield;
mod skyline;

use anyhow::Result;
use clap::Parser;
use options::Cli;
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::init();
    match cli {
        Cli::Shield(shield) => shield.run(),
        Cli::Skyline(skyline) => skyline.run(),
    }
}
