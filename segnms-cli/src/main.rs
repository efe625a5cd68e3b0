use clap::Parser;
use ndarray::{Array2, Array3};
use segnms::{
    preset, preset_names, Instance, NmsStrategy, PostConfig, PostProcessor, Prototypes,
    RawPrediction,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Instance segmentation post-processing (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// List the built-in presets and exit.
    #[arg(long)]
    list_presets: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum NmsConfig {
    Fast {
        #[serde(default)]
        second_threshold: bool,
    },
    Traditional {
        #[serde(default)]
        inclusive_area: bool,
    },
}

impl From<NmsConfig> for NmsStrategy {
    fn from(value: NmsConfig) -> Self {
        match value {
            NmsConfig::Fast { second_threshold } => NmsStrategy::Fast { second_threshold },
            NmsConfig::Traditional { inclusive_area } => {
                NmsStrategy::Traditional { inclusive_area }
            }
        }
    }
}

/// Optional per-field overrides applied on top of the preset.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverridesJson {
    top_k: Option<usize>,
    max_detections: Option<usize>,
    nms_iou_thre: Option<f32>,
    nms_score_thre: Option<f32>,
    visual_thre: Option<f32>,
    nms: Option<NmsConfig>,
    mask_threshold: Option<f32>,
    crop: Option<bool>,
    crop_padding: Option<f32>,
}

impl OverridesJson {
    fn apply(self, base: PostConfig) -> PostConfig {
        let mut cfg = base;
        if let Some(v) = self.top_k {
            cfg.top_k = v;
        }
        if let Some(v) = self.max_detections {
            cfg.max_detections = v;
        }
        if let Some(v) = self.nms_iou_thre {
            cfg.nms_iou_thre = v;
        }
        if let Some(v) = self.nms_score_thre {
            cfg.nms_score_thre = v;
        }
        if let Some(v) = self.visual_thre {
            cfg.visual_thre = v;
        }
        if let Some(v) = self.nms {
            cfg.nms = v.into();
        }
        if let Some(v) = self.mask_threshold {
            cfg.mask.threshold = v;
        }
        if let Some(v) = self.crop {
            cfg.mask.crop = v;
        }
        if let Some(v) = self.crop_padding {
            cfg.mask.crop_padding = v;
        }
        cfg
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    preset: String,
    img_size: Option<usize>,
    input_path: String,
    output_path: Option<String>,
    overrides: OverridesJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: "coco_r101".to_string(),
            img_size: None,
            input_path: String::new(),
            output_path: None,
            overrides: OverridesJson::default(),
        }
    }
}

/// Raw network outputs for one frame, as nested JSON arrays.
#[derive(Debug, Deserialize)]
struct FrameJson {
    box_offsets: Vec<Vec<f32>>,
    class_scores: Vec<Vec<f32>>,
    mask_coeffs: Vec<Vec<f32>>,
    prototypes: Vec<Vec<Vec<f32>>>,
    image_width: usize,
    image_height: usize,
    /// Column 0 of `class_scores` is the background class.
    #[serde(default)]
    has_background: bool,
}

#[derive(Debug, Serialize)]
struct InstanceRecord {
    class_id: usize,
    class_name: &'static str,
    score: f32,
    /// Pixel box as `[x1, y1, x2, y2]`.
    bbox: [u32; 4],
    mask_area: usize,
}

#[derive(Debug, Serialize)]
struct Output {
    preset: &'static str,
    image_width: usize,
    image_height: usize,
    instances: Vec<InstanceRecord>,
}

fn to_array2(rows: &[Vec<f32>], what: &str) -> Result<Array2<f32>, Box<dyn std::error::Error>> {
    let cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != cols) {
        return Err(format!("{what}: rows have differing lengths").into());
    }
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Ok(Array2::from_shape_vec((rows.len(), cols), flat)?)
}

fn to_array3(
    planes: &[Vec<Vec<f32>>],
    what: &str,
) -> Result<Array3<f32>, Box<dyn std::error::Error>> {
    let h = planes.len();
    let w = planes.first().map_or(0, Vec::len);
    let d = planes
        .first()
        .and_then(|row| row.first())
        .map_or(0, Vec::len);
    let ragged = planes
        .iter()
        .any(|row| row.len() != w || row.iter().any(|px| px.len() != d));
    if ragged {
        return Err(format!("{what}: expected a dense H x W x K array").into());
    }
    let flat: Vec<f32> = planes.iter().flatten().flatten().copied().collect();
    Ok(Array3::from_shape_vec((h, w, d), flat)?)
}

fn record(instance: &Instance, class_names: &'static [&'static str]) -> InstanceRecord {
    let b = instance.pixel_box;
    InstanceRecord {
        class_id: instance.class_id,
        class_name: class_names.get(instance.class_id).copied().unwrap_or("?"),
        score: instance.score,
        bbox: [b.x1, b.y1, b.x2, b.y2],
        mask_area: instance.mask.area(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("segnms=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.list_presets {
        for name in preset_names() {
            println!("{name}");
        }
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.input_path.is_empty() {
        return Err("input_path must be set in the config".into());
    }

    let mut base = preset(&config.preset)?;
    if let Some(size) = config.img_size {
        if size == 0 {
            return Err("img_size must be at least 1".into());
        }
        base = base.with_img_size(size);
    }
    base.post = config.overrides.apply(base.post);
    let processor = PostProcessor::from_preset(&base)?;

    let frame_text = fs::read_to_string(&config.input_path)?;
    let frame: FrameJson = serde_json::from_str(&frame_text)?;
    let offsets = to_array2(&frame.box_offsets, "box_offsets")?;
    let scores = to_array2(&frame.class_scores, "class_scores")?;
    let coeffs = to_array2(&frame.mask_coeffs, "mask_coeffs")?;
    let protos = to_array3(&frame.prototypes, "prototypes")?;

    let raw = if frame.has_background {
        RawPrediction::with_background(offsets.view(), scores.view(), coeffs.view())?
    } else {
        RawPrediction::new(offsets.view(), scores.view(), coeffs.view())?
    };
    let protos = Prototypes::new(protos.view())?;

    let result = processor.process(&raw, &protos, frame.image_width, frame.image_height)?;
    let output = Output {
        preset: base.name,
        image_width: result.image_width,
        image_height: result.image_height,
        instances: result
            .instances
            .iter()
            .map(|inst| record(inst, base.class_names))
            .collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
