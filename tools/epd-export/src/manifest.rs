//! Manifest parsing and build orchestration
//!
//! Parses epd-assets.toml and converts every font and image it lists into
//! `{output.dir}/{name}.h`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::codegen::{generate_font_source, generate_image_source, validate_identifier};
use crate::font::{FontRequest, Selection, Validation, convert_font_to_memory};
use crate::image::{ImageOptions, convert_image_to_memory};
use epd_common::CodePointInterval;

/// Root manifest structure
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated/")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontEntry {
    pub name: String,
    pub size: u32,
    /// Font files by descending priority
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub compress: bool,
    /// Characters to export instead of intervals
    #[serde(default)]
    pub string: Option<String>,
    /// `[low, high]` pairs, defaults to the built-in interval list
    #[serde(default)]
    pub intervals: Option<Vec<[u32; 2]>>,
    #[serde(default)]
    pub additional_intervals: Vec<[u32; 2]>,
    /// Accept string characters found in any source, not only the first
    #[serde(default)]
    pub validate_fallbacks: bool,
}

impl FontEntry {
    /// Build the conversion request, resolving sources against `base_dir`
    pub fn request(&self, base_dir: &Path) -> Result<FontRequest> {
        let additional = to_intervals(&self.additional_intervals)?;
        let selection = match (&self.string, &self.intervals) {
            (Some(_), Some(_)) => anyhow::bail!(
                "Font '{}' sets both 'string' and 'intervals', pick one",
                self.name
            ),
            (Some(text), None) => {
                let validation = if self.validate_fallbacks {
                    Validation::AnySource
                } else {
                    Validation::Primary
                };
                Selection::text(text.clone(), validation)
            }
            (None, Some(intervals)) => Selection::intervals(to_intervals(intervals)?),
            (None, None) => Selection::default(),
        };

        Ok(FontRequest {
            name: self.name.clone(),
            size: self.size,
            sources: self.sources.iter().map(|p| base_dir.join(p)).collect(),
            compress: self.compress,
            selection: selection.with_additional(additional),
        })
    }
}

fn to_intervals(pairs: &[[u32; 2]]) -> Result<Vec<CodePointInterval>> {
    pairs
        .iter()
        .map(|&[low, high]| {
            CodePointInterval::new(low, high)
                .with_context(|| format!("Invalid interval [{}, {}]", low, high))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub max_height: Option<u32>,
    #[serde(default)]
    pub levels: Option<u8>,
    #[serde(default)]
    pub dither: Option<bool>,
}

impl ImageEntry {
    pub fn options(&self) -> ImageOptions {
        let defaults = ImageOptions::default();
        ImageOptions {
            max_width: self.max_width.unwrap_or(defaults.max_width),
            max_height: self.max_height.unwrap_or(defaults.max_height),
            levels: self.levels.unwrap_or(defaults.levels),
            dither: self.dither.unwrap_or(defaults.dither),
        }
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    let mut names = HashSet::new();

    for font in &manifest.fonts {
        validate_identifier(&font.name)?;
        if !names.insert(font.name.as_str()) {
            anyhow::bail!("Duplicate asset name '{}'", font.name);
        }
        if font.size == 0 {
            anyhow::bail!("Font '{}' has size 0", font.name);
        }
        if font.sources.is_empty() {
            anyhow::bail!("Font '{}' lists no sources", font.name);
        }
        let request = font.request(&manifest.base_dir)?;
        for source in &request.sources {
            if !source.exists() {
                anyhow::bail!("Font '{}' source not found: {:?}", font.name, source);
            }
        }
    }

    for image in &manifest.images {
        validate_identifier(&image.name)?;
        if !names.insert(image.name.as_str()) {
            anyhow::bail!("Duplicate asset name '{}'", image.name);
        }
        image
            .options()
            .validate()
            .with_context(|| format!("Image '{}' has invalid options", image.name))?;
        let path = manifest.base_dir.join(&image.path);
        if !path.exists() {
            anyhow::bail!("Image '{}' source not found: {:?}", image.name, path);
        }
    }

    Ok(())
}

/// Build all assets from a manifest
///
/// Every asset is converted in memory first, so a failing asset leaves no
/// partial file behind.
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<()> {
    validate(manifest)?;

    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.base_dir.join(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    // Convert fonts
    for font in &manifest.fonts {
        let output = output_dir.join(format!("{}.h", font.name));
        tracing::info!("Converting font: {} -> {:?}", font.name, output);

        let request = font.request(&manifest.base_dir)?;
        let packed = convert_font_to_memory(&request)
            .with_context(|| format!("Failed to convert font '{}'", font.name))?;
        let command_line = format!(
            "epd-export build (font '{}', {}pt, {})",
            font.name,
            font.size,
            font.sources
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let source = generate_font_source(&font.name, &packed.table, &command_line)?;
        crate::write_output(Some(&output), &source)?;
    }

    // Convert images
    for image in &manifest.images {
        let output = output_dir.join(format!("{}.h", image.name));
        tracing::info!("Converting image: {} -> {:?}", image.name, output);

        let input = manifest.base_dir.join(&image.path);
        let packed = convert_image_to_memory(&input, &image.options())
            .with_context(|| format!("Failed to convert image '{}'", image.name))?;
        let source = generate_image_source(&image.name, &packed)?;
        crate::write_output(Some(&output), &source)?;
    }

    tracing::info!(
        "Built {} fonts and {} images into {:?}",
        manifest.fonts.len(),
        manifest.images.len(),
        output_dir
    );
    Ok(())
}
