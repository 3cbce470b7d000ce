use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nodenav_formats::{MapData, WadReader};
use serde::Serialize;

/// List the lump directory of a WAD archive, or summarise one mission.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// WAD archive to inspect
    path: PathBuf,

    /// Load this mission (e.g. E1M1) and print its record counts instead
    #[arg(long, value_name = "NAME")]
    mission: Option<String>,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DirectoryListing {
    tag: String,
    declared: usize,
    entries: Vec<DirectoryRow>,
}

#[derive(Serialize)]
struct DirectoryRow {
    index: usize,
    name: String,
    offset: i32,
    size: i32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(mission) = args.mission.as_deref() {
        let mission = mission.to_ascii_uppercase();
        let map = MapData::load(&args.path, &mission)
            .with_context(|| format!("loading {mission} from {}", args.path.display()))?;
        let summary = map.summary();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{mission} in {}", args.path.display());
            println!("  linedefs   {:>6}", summary.linedefs);
            println!("  sidedefs   {:>6}", summary.sidedefs);
            println!("  vertexes   {:>6}", summary.vertexes);
            println!("  segments   {:>6}", summary.segments);
            println!("  subsectors {:>6}", summary.subsectors);
            println!("  nodes      {:>6}", summary.nodes);
            println!("  sectors    {:>6}", summary.sectors);
        }
        return Ok(());
    }

    let mut wad = WadReader::open(&args.path)
        .with_context(|| format!("opening WAD archive {}", args.path.display()))?;
    let entries = wad
        .entries()
        .with_context(|| format!("reading directory of {}", args.path.display()))?;

    if args.json {
        let listing = DirectoryListing {
            tag: wad.header().tag_lossy(),
            declared: wad.directory().len(),
            entries: entries
                .iter()
                .enumerate()
                .map(|(index, entry)| DirectoryRow {
                    index,
                    name: entry.name.to_string(),
                    offset: entry.start,
                    size: entry.length,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let declared = wad.directory().len();
    print!(
        "{} {} entries in {}",
        wad.header().tag_lossy(),
        entries.len(),
        args.path.display()
    );
    if declared != entries.len() {
        print!(" (header declares {declared})");
    }
    println!();
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{index:>5} {name:<8} {offset:>10} {size:>10}",
            name = entry.name.to_string(),
            offset = entry.start,
            size = entry.length
        );
    }
    Ok(())
}
