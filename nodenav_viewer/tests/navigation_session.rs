use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};
use serde::Deserialize;
use tempfile::tempdir;

const LEAF: u16 = 0x8000;

#[derive(Debug, Deserialize)]
struct FrameReport {
    frame: usize,
    last: Option<String>,
    heading: String,
    view: View,
    can_descend_left: bool,
    can_descend_right: bool,
    viewport: Option<Viewport>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct View {
    index: usize,
    is_root: bool,
}

#[derive(Debug, Deserialize)]
struct Viewport {
    center_x: f64,
    center_y: f64,
    scale: f64,
}

fn i16s(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn node(bbox: [i16; 8], left: u16, right: u16) -> Vec<u8> {
    let mut data = i16s(&[0, 0, 0, 10]);
    data.extend_from_slice(&i16s(&bbox));
    data.extend_from_slice(&left.to_le_bytes());
    data.extend_from_slice(&right.to_le_bytes());
    data
}

/// Three nodes: root 2 has node children 0 and 1. Node 1 has zero width.
fn write_sample_wad(path: &Path) -> Result<()> {
    let mut nodes = node([10, -10, -10, 0, 10, -10, 0, 10], LEAF, LEAF | 1);
    nodes.extend(node([5, -5, 3, 3, 5, -5, 3, 3], LEAF | 2, LEAF | 3));
    nodes.extend(node([10, -10, -10, 10, 5, -5, -5, 5], 0, 1));

    let lumps: Vec<(&str, Vec<u8>)> = vec![
        ("E1M1", Vec::new()),
        ("THINGS", Vec::new()),
        ("LINEDEFS", i16s(&[0, 1, 1, 0, 0, 0, -1, 1, 2, 1, 0, 0, 0, -1])),
        ("SIDEDEFS", vec![0; 30]),
        ("VERTEXES", i16s(&[-10, -10, 10, -10, 10, 10])),
        ("SEGS", vec![0; 12]),
        ("SSECTORS", i16s(&[1, 0, 1, 0, 1, 0, 1, 0])),
        ("NODES", nodes),
        ("SECTORS", vec![0; 26]),
    ];

    let mut data = vec![0u8; 12];
    let mut directory = Vec::new();
    for (name, payload) in &lumps {
        directory.extend_from_slice(&(data.len() as i32).to_le_bytes());
        directory.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        let mut padded = [0u8; 8];
        padded[..name.len()].copy_from_slice(name.as_bytes());
        directory.extend_from_slice(&padded);
        data.extend_from_slice(payload);
    }
    let directory_offset = data.len() as i32;
    data.extend_from_slice(&directory);
    data[0..4].copy_from_slice(b"PWAD");
    data[4..8].copy_from_slice(&(lumps.len() as i32).to_le_bytes());
    data[8..12].copy_from_slice(&directory_offset.to_le_bytes());

    fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

fn run_nodenav(args: &[&str], keys: &str) -> Result<Output> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_nodenav"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawning nodenav")?;
    let mut stdin = child.stdin.take().context("nodenav stdin")?;
    // nodenav may exit (bad mission) before reading anything.
    if let Err(err) = stdin.write_all(keys.as_bytes()) {
        if err.kind() != io::ErrorKind::BrokenPipe {
            return Err(err.into());
        }
    }
    drop(stdin);
    child.wait_with_output().context("waiting for nodenav")
}

#[test]
fn scripted_walk_reports_every_frame() -> Result<()> {
    let dir = tempdir()?;
    let wad = dir.path().join("TEST.WAD");
    write_sample_wad(&wad)?;
    let frames_dir = dir.path().join("frames");

    let output = run_nodenav(
        &[
            "e1m1",
            wad.to_str().context("wad path is not UTF-8")?,
            "--json",
            "--dump-frames",
            frames_dir.to_str().context("frames path is not UTF-8")?,
        ],
        "l\nu\nx\nr\nl\nq\nl\n",
    )?;
    assert!(
        output.status.success(),
        "nodenav failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let frames: Vec<FrameReport> = String::from_utf8(output.stdout)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;

    let indices: Vec<usize> = frames.iter().map(|f| f.view.index).collect();
    assert_eq!(indices, vec![2, 0, 2, 2, 1, 1]);
    let outcomes: Vec<Option<&str>> = frames.iter().map(|f| f.last.as_deref()).collect();
    assert_eq!(
        outcomes,
        vec![
            None,
            Some("Applied"),
            Some("Applied"),
            Some("Ignored"),
            Some("Applied"),
            Some("Ignored"),
        ]
    );
    assert!(frames.iter().enumerate().all(|(i, f)| f.frame == i));

    let root = &frames[0];
    assert!(root.view.is_root);
    assert!(root.can_descend_left && root.can_descend_right);
    assert_eq!(
        root.heading,
        "NodeNav v0.94           N:0x0002     N:0x0000   N:0x0001"
    );
    let viewport = root.viewport.as_ref().context("root viewport")?;
    assert_eq!((viewport.center_x, viewport.center_y), (0.0, 0.0));
    assert!((viewport.scale - 21.6).abs() < 1e-9);

    let degenerate = &frames[4];
    assert!(!degenerate.can_descend_left && !degenerate.can_descend_right);
    assert!(degenerate.viewport.is_none());
    assert!(
        degenerate
            .error
            .as_deref()
            .is_some_and(|e| e.contains("zero extent on the x axis"))
    );

    for frame in 0..4 {
        assert!(frames_dir.join(format!("frame_{frame:04}.png")).is_file());
    }
    assert!(!frames_dir.join("frame_0004.png").exists());
    Ok(())
}

#[test]
fn heading_mode_marks_ignored_keys() -> Result<()> {
    let dir = tempdir()?;
    let wad = dir.path().join("TEST.WAD");
    write_sample_wad(&wad)?;

    let output = run_nodenav(&["E1M1", wad.to_str().context("utf-8")?], "U\n")?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "NodeNav v0.94           N:0x0002     N:0x0000   N:0x0001",
            "(key ignored)",
            "NodeNav v0.94           N:0x0002     N:0x0000   N:0x0001",
        ]
    );
    Ok(())
}

#[test]
fn unknown_mission_fails_before_navigation() -> Result<()> {
    let dir = tempdir()?;
    let wad = dir.path().join("TEST.WAD");
    write_sample_wad(&wad)?;

    let output = run_nodenav(&["e1m9", wad.to_str().context("utf-8")?], "q\n")?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("could not find mission E1M9"),
        "unexpected stderr: {stderr}"
    );
    Ok(())
}

#[test]
fn unreadable_archive_is_reported() -> Result<()> {
    let dir = tempdir()?;
    let missing = dir.path().join("NOPE.WAD");
    let output = run_nodenav(&["E1M1", missing.to_str().context("utf-8")?], "")?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error reading archive"), "unexpected stderr: {stderr}");
    Ok(())
}
