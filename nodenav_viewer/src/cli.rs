use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::Parser;
use nodenav_engine::DEFAULT_MARGIN;

#[derive(Parser, Debug)]
#[command(
    about = "Walk the BSP tree of a WAD mission one node at a time",
    long_about = "Walk the BSP tree of a WAD mission one node at a time.\n\n\
                  Keys are read from stdin: L descends left, R descends right, \
                  U ascends and Q quits.",
    version
)]
pub struct Args {
    /// Mission to load, e.g. E1M1 or MAP01 (case-insensitive)
    pub mission: String,

    /// WAD archive to read the mission from
    #[arg(default_value = "DOOM.WAD")]
    pub wad: PathBuf,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Fraction of the viewport kept free around the node bounds
    #[arg(long, default_value_t = DEFAULT_MARGIN)]
    pub margin: f64,

    /// Write each rendered frame as frame_NNNN.png into this directory
    #[arg(long, value_name = "DIR")]
    pub dump_frames: Option<PathBuf>,

    /// Print one JSON object per frame instead of the heading line
    #[arg(long)]
    pub json: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "viewport must be at least 1x1 (got {}x{})",
            self.width,
            self.height
        );
        ensure!(
            (0.0..1.0).contains(&self.margin),
            "margin must be in [0, 1) (got {})",
            self.margin
        );
        Ok(())
    }

    /// Lump names are stored upper-case.
    pub fn mission_name(&self) -> String {
        self.mission.to_ascii_uppercase()
    }
}
