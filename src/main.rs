//! geotop-ingest: load GeoTOP borehole tables and fault traces.
//!
//! Folders default to `BOREHOLES_SOUTH_FOLDER` / `FAULTS_SOUTH_FOLDER` from
//! the environment or a `.env` file. Set `RUST_LOG` to control log output,
//! e.g. `RUST_LOG=geotop_ingest=debug`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use geotop_ingest::config::Config;
use geotop_ingest::data::DatasetSelector;
use geotop_ingest::export::{
    dataset_to_record_batch, write_fault_obj, write_faults_json, write_parquet,
};
use geotop_ingest::faults::{load_fault_meshes, ExtrusionBounds, FaultFileSelection};
use geotop_ingest::scene::{attach_meshes_to_scene, VtkScene};
use geotop_ingest::survey::{SurveyInputs, SurveyOptions};
use geotop_ingest::BoreholeDataset;

#[derive(Parser)]
#[command(name = "geotop-ingest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read settings from this .env file instead of ./.env
    #[arg(long, global = true)]
    env: Option<PathBuf>,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the borehole CSV files into one table
    Boreholes {
        /// Borehole folder (defaults to BOREHOLES_SOUTH_FOLDER)
        dir: Option<PathBuf>,

        /// File selection: few, mid or all
        #[arg(long)]
        selector: Option<String>,

        /// Write the table to a Parquet file
        #[arg(long)]
        parquet: Option<PathBuf>,

        /// Rows to print
        #[arg(long, default_value = "5")]
        head: usize,
    },

    /// Extrude fault traces into meshes
    Faults {
        /// Fault folder (defaults to FAULTS_SOUTH_FOLDER)
        dir: Option<PathBuf>,

        /// Read every matching shapefile, not only the first
        #[arg(long)]
        all_files: bool,

        /// Bottom elevation of the extruded faults
        #[arg(long, allow_hyphen_values = true)]
        zmin: Option<f64>,

        /// Top elevation of the extruded faults
        #[arg(long, allow_hyphen_values = true)]
        zmax: Option<f64>,

        /// Write the meshes as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the meshes as a legacy VTK file
        #[arg(long)]
        vtk: Option<PathBuf>,

        /// Write one OBJ file per fault into this folder
        #[arg(long)]
        obj_dir: Option<PathBuf>,
    },

    /// Load boreholes and faults together and report the model extent
    Survey {
        /// Keep only the first N faults
        #[arg(long)]
        faults: Option<usize>,

        /// Write the borehole table to a Parquet file
        #[arg(long)]
        parquet: Option<PathBuf>,

        /// Write the fault meshes as a legacy VTK file
        #[arg(long)]
        vtk: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.env.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Boreholes {
            dir,
            selector,
            parquet,
            head,
        } => {
            if let Some(dir) = dir {
                config.boreholes_folder = Some(dir);
            }
            if let Some(s) = selector {
                config.selector = s.parse::<DatasetSelector>()?;
            }
            let dataset = geotop_ingest::load_boreholes(config.boreholes_dir()?, &config.selector)
                .context("loading boreholes")?;
            if let Some(path) = parquet {
                write_parquet(&dataset, &path).context("writing parquet")?;
            }
            if !cli.quiet {
                print_boreholes(&dataset, head, cli.format)?;
            }
        }

        Commands::Faults {
            dir,
            all_files,
            zmin,
            zmax,
            json,
            vtk,
            obj_dir,
        } => {
            if let Some(dir) = dir {
                config.faults_folder = Some(dir);
            }
            if all_files {
                config.faults.files = FaultFileSelection::AllMatches;
            }
            let bounds = config.faults.bounds;
            config.faults.bounds =
                ExtrusionBounds::new(zmin.unwrap_or(bounds.zmin), zmax.unwrap_or(bounds.zmax));
            config.faults.bounds.validate()?;

            let faults = load_fault_meshes(config.faults_dir()?, &config.faults)
                .context("loading faults")?;
            let Some(faults) = faults else {
                if !cli.quiet {
                    println!("no fault files found");
                }
                return Ok(());
            };

            if let Some(path) = json {
                write_faults_json(&faults, &path).context("writing fault json")?;
            }
            if let Some(path) = vtk {
                let mut scene = VtkScene::new();
                attach_meshes_to_scene(&faults, &mut scene);
                scene.write_vtk(&path).context("writing vtk")?;
            }
            if let Some(out) = obj_dir {
                std::fs::create_dir_all(&out).context("creating obj folder")?;
                for mesh in &faults {
                    let path = out.join(format!("{}.obj", mesh.name));
                    write_fault_obj(mesh, &path).context("writing obj")?;
                }
            }
            if !cli.quiet {
                match cli.format {
                    OutputFormat::Text => {
                        for mesh in &faults {
                            println!(
                                "{}: {} vertices, {} triangles",
                                mesh.name,
                                mesh.vertex_count(),
                                mesh.cell_count()
                            );
                        }
                    }
                    OutputFormat::Json => {
                        let summary: Vec<_> = faults
                            .iter()
                            .map(|m| {
                                json!({
                                    "name": m.name,
                                    "vertices": m.vertex_count(),
                                    "cells": m.cell_count(),
                                })
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    }
                }
            }
        }

        Commands::Survey {
            faults,
            parquet,
            vtk,
        } => {
            let options = SurveyOptions {
                fault_limit: faults,
                ..SurveyOptions::default()
            };
            let survey = SurveyInputs::load(&config, &options).context("loading survey")?;

            if let Some(path) = parquet {
                write_parquet(&survey.boreholes, &path).context("writing parquet")?;
            }
            if let (Some(path), Some(faults)) = (vtk, survey.faults.as_ref()) {
                let mut scene = VtkScene::new();
                attach_meshes_to_scene(faults, &mut scene);
                scene.write_vtk(&path).context("writing vtk")?;
            }
            if !cli.quiet {
                let n_faults = survey.faults.as_ref().map_or(0, |f| f.len());
                match cli.format {
                    OutputFormat::Text => {
                        println!("rows:     {}", survey.boreholes.len());
                        println!("surfaces: {}", survey.boreholes.surfaces().join(", "));
                        println!("faults:   {n_faults}");
                        match survey.extent {
                            Some(e) => println!("extent:   {:?}", e.as_array()),
                            None => println!("extent:   unavailable"),
                        }
                    }
                    OutputFormat::Json => {
                        let summary = json!({
                            "rows": survey.boreholes.len(),
                            "surfaces": survey.boreholes.surfaces(),
                            "faults": n_faults,
                            "extent": survey.extent,
                        });
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_boreholes(dataset: &BoreholeDataset, head: usize, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "{} rows, {} columns, surfaces: {}",
                dataset.len(),
                dataset.columns.len(),
                dataset.surfaces().join(", ")
            );
            let batch = dataset_to_record_batch(dataset)?;
            let shown = batch.slice(0, head.min(batch.num_rows()));
            println!("{}", pretty_format_batches(&[shown])?);
        }
        OutputFormat::Json => {
            let summary = json!({
                "rows": dataset.len(),
                "columns": dataset.columns,
                "surfaces": dataset.surfaces(),
                "head": &dataset.records[..head.min(dataset.len())],
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
