use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use skypaint_core::bounds::BoundingVolume;
use skypaint_core::canvas::PaintingCanvas;
use skypaint_core::scene::Headless;
use skypaint_core::store::{FsStorage, SaveName, StrokeStore, Thumbnailer};
use skypaint_core::stroke::{record, StrokeRecord};
use ultraviolet::{Mat4, Vec3};

use crate::settings::Settings;
use crate::thumbnail::PngThumbnailer;

pub type Store = StrokeStore<FsStorage, PngThumbnailer>;

#[derive(Parser, Debug)]
#[command(name = "skypaint", about = "Browse, merge, and maintain saved skypaint drawings")]
pub struct Cli {
    /// Save directory, overriding the settings file.
    #[arg(long, env = "SKYPAINT_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List saves, newest first.
    List,
    /// Summarize the strokes of a save.
    Show { name: SaveName },
    Delete { name: SaveName },
    /// Copy a save's thumbnail out, or re-render it with the current settings.
    Thumbnail {
        name: SaveName,
        out: PathBuf,
        #[arg(long)]
        render: bool,
    },
    /// Save a loose strokes file into the store.
    Import { file: PathBuf },
    /// Combine several saves into a new one. Each is placed, scaled about its center and
    /// shifted, before being merged in.
    Merge {
        #[arg(required = true)]
        names: Vec<SaveName>,
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        /// Shift applied to every merged save, as `x,y,z`.
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        offset: Vec<f32>,
    },
    /// Write the current settings back, filling in anything missing.
    Settings,
}

fn open_store(root: Option<PathBuf>, settings: &Settings) -> anyhow::Result<Store> {
    let root = root
        .or_else(|| settings.store.root())
        .ok_or_else(|| anyhow::anyhow!("No save directory, pass --root"))?;
    Ok(Store::new(
        FsStorage::open(&root)?,
        PngThumbnailer::default(),
        settings.store.thumbnail_size,
    ))
}

pub fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    let root = cli.root;
    let store = || open_store(root.clone(), settings);
    match cli.command {
        Command::List => list(&store()?),
        Command::Show { name } => show(&store()?, &name, settings),
        Command::Delete { name } => Ok(store()?.delete(&name)?),
        Command::Thumbnail { name, out, render } => {
            let store = store()?;
            let png = if render {
                let records = store.read_strokes(&name)?;
                PngThumbnailer::default().render(
                    &records,
                    &settings.store.plane,
                    store.thumbnail_pixels(settings.store.display_scale),
                )?
            } else {
                store.read_image(&name)?
            };
            std::fs::write(&out, png).with_context(|| format!("writing {}", out.display()))?;
            Ok(())
        }
        Command::Import { file } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let records = record::decode(&bytes)?;
            let name = merge(&store()?, settings, [records], 1.0, Vec3::zero())?;
            println!("{name}");
            Ok(())
        }
        Command::Merge {
            names,
            scale,
            offset,
        } => {
            let offset = match offset.as_slice() {
                [] => Vec3::zero(),
                [x, y, z] => Vec3::new(*x, *y, *z),
                _ => anyhow::bail!("--offset takes exactly three values"),
            };
            let store = store()?;
            let loaded = load_all(&store, &names)?;
            let name = merge(&store, settings, loaded, scale, offset)?;
            println!("{name}");
            Ok(())
        }
        Command::Settings => {
            settings.save()?;
            if let Some(dir) = crate::settings::preferences_dir() {
                println!("{}", dir.display());
            }
            Ok(())
        }
    }
}

fn list(store: &Store) -> anyhow::Result<()> {
    use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    let names = store.list_dirs()?;
    let counts: Vec<_> = names
        .par_iter()
        .map(|name| store.read_strokes(name).map(|records| records.len()))
        .collect();
    for (name, count) in names.iter().zip(counts) {
        match count {
            Ok(count) => println!("{name}\t{count} strokes"),
            Err(e) => println!("{name}\tunreadable: {e}"),
        }
    }
    Ok(())
}

fn show(store: &Store, name: &SaveName, settings: &Settings) -> anyhow::Result<()> {
    let origin = settings.store.origin;
    let strokes = store
        .read_strokes(name)?
        .iter()
        .map(|record| record.to_stroke(origin))
        .collect::<Result<Vec<_>, _>>()?;
    let points: usize = strokes.iter().map(|s| s.points().len()).sum();
    println!("{name}: {} strokes, {points} points", strokes.len());
    if let Some(volume) =
        BoundingVolume::build(strokes.iter().flat_map(|s| s.points().iter().copied()))
    {
        let (min, max) = (volume.min(), volume.max());
        println!(
            "bounds ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
    for stroke in &strokes {
        let [r, g, b, a] = stroke.color().to_rgba8();
        println!(
            "{}\t{} points\tradius {:.4}\t#{r:02x}{g:02x}{b:02x}{a:02x}",
            stroke.id(),
            stroke.points().len(),
            stroke.radius(),
        );
    }
    Ok(())
}

/// Read several saves at once. Fails if any can't be read.
fn load_all(store: &Store, names: &[SaveName]) -> anyhow::Result<Vec<Vec<StrokeRecord>>> {
    use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    names
        .par_iter()
        .map(|name| {
            store
                .read_strokes(name)
                .with_context(|| format!("loading {name}"))
        })
        .collect()
}

/// Stage each group of records in turn, place it, and confirm it into one drawing, then save
/// that drawing as a new record.
fn merge(
    store: &Store,
    settings: &Settings,
    groups: impl IntoIterator<Item = Vec<StrokeRecord>>,
    scale: f32,
    offset: Vec3,
) -> anyhow::Result<SaveName> {
    let origin = settings.store.origin;
    let mut canvas = PaintingCanvas::new(Headless::default(), settings.canvas);
    for records in groups {
        if !canvas.stage_records(&records, origin)? {
            log::warn!("Skipping a drawing with no points.");
            continue;
        }
        canvas.apply_group_rescale(scale)?;
        canvas.apply_group_transform(&Mat4::from_translation(offset));
        let confirmed = canvas.confirm_staging();
        log::debug!("merged {confirmed} strokes");
    }
    if canvas.strokes().is_empty() {
        anyhow::bail!("Nothing to save.");
    }
    let records = canvas.snapshot_records(origin);
    Ok(store.write(
        &records,
        &settings.store.plane,
        settings.store.display_scale,
    )?)
}
