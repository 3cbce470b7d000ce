mod cli;
mod input;
mod raster;
mod scene;

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use nodenav_engine::{Command, Navigator, NodeView, Outcome, Viewport};
use nodenav_formats::MapData;
use serde::Serialize;

use crate::cli::Args;
use crate::input::{KeyReader, command_for_key};
use crate::scene::Scene;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    args.validate()?;

    let mission = args.mission_name();
    let map = MapData::load(&args.wad, &mission)
        .with_context(|| format!("loading {mission} from {}", args.wad.display()))?;
    let mut navigator = Navigator::new(&map.nodes)
        .with_context(|| format!("building BSP tree for {mission}"))?;
    info!(
        "{mission}: {} nodes, root 0x{:04x}",
        map.nodes.len(),
        navigator.current_index()
    );

    if let Some(dir) = args.dump_frames.as_ref() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let stdin = io::stdin();
    let mut keys = KeyReader::new(stdin.lock());
    let mut presenter = Presenter {
        args: &args,
        backdrop: args.dump_frames.as_ref().map(|_| Scene::backdrop(&map)),
        out: io::stdout().lock(),
        frame: 0,
    };

    let mut last = None;
    loop {
        presenter.present(&navigator, last)?;

        let Some(key) = keys.next_key().context("reading keys from stdin")? else {
            break;
        };
        last = Some(match command_for_key(key) {
            Some(Command::Quit) => break,
            Some(command) => navigator.apply(command),
            None => Outcome::Ignored,
        });
    }

    Ok(())
}

#[derive(Serialize)]
struct FrameReport<'a> {
    frame: usize,
    last: Option<Outcome>,
    heading: &'a str,
    view: &'a NodeView,
    can_descend_left: bool,
    can_descend_right: bool,
    viewport: Option<Viewport>,
    error: Option<String>,
}

/// Turns the navigator state into output: a heading line (or JSON) on
/// stdout and, when requested, a PNG per frame.
struct Presenter<'a, W> {
    args: &'a Args,
    /// Map lines, present only when frames are dumped.
    backdrop: Option<Scene>,
    out: W,
    frame: usize,
}

impl<W: Write> Presenter<'_, W> {
    fn present(&mut self, navigator: &Navigator<'_>, last: Option<Outcome>) -> Result<()> {
        let view = navigator.view();
        let heading = view.heading();
        let viewport = navigator.viewport(self.args.width, self.args.height, self.args.margin);

        let error = match &viewport {
            Ok(viewport) => {
                self.dump_frame(&view, viewport)?;
                None
            }
            Err(err) => {
                warn!("node 0x{:04x}: {err}", view.index);
                Some(err.to_string())
            }
        };

        if self.args.json {
            let report = FrameReport {
                frame: self.frame,
                last,
                heading: &heading,
                view: &view,
                can_descend_left: view.can_descend_left(),
                can_descend_right: view.can_descend_right(),
                viewport: viewport.ok(),
                error,
            };
            serde_json::to_writer(&mut self.out, &report)?;
            writeln!(self.out)?;
        } else {
            if last == Some(Outcome::Ignored) {
                writeln!(self.out, "(key ignored)")?;
            }
            writeln!(self.out, "{heading}")?;
            if let Some(error) = error {
                writeln!(self.out, "cannot frame node 0x{:04x}: {error}", view.index)?;
            }
        }
        self.out.flush()?;

        self.frame += 1;
        Ok(())
    }

    fn dump_frame(&self, view: &NodeView, viewport: &Viewport) -> Result<()> {
        let (Some(dir), Some(backdrop)) = (self.args.dump_frames.as_ref(), self.backdrop.as_ref())
        else {
            return Ok(());
        };
        let path = dir.join(format!("frame_{:04}.png", self.frame));
        backdrop
            .for_node(view)
            .render(viewport, self.args.width, self.args.height)
            .write_png(&path)
            .with_context(|| format!("writing frame {}", path.display()))
    }
}
