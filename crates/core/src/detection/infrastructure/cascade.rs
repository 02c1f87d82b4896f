//! Pixel-intensity-comparison cascade ("pico" facefinder format).
//!
//! Each stage is a binary decision tree whose internal nodes compare two
//! pixels at offsets relative to the scan window. Leaf predictions are
//! accumulated across trees and a window is rejected as soon as the running
//! score drops to a tree's threshold.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::detection::Detection;
use crate::shared::frame::GrayPlane;
use crate::shared::settings::Settings;

/// Bytes skipped at the start of every cascade file.
const HEADER_LEN: usize = 8;

/// Deepest tree accepted when unpacking.
const MAX_TREE_DEPTH: u32 = 16;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cascade data truncated: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("invalid cascade header: {0}")]
    InvalidHeader(String),
    #[error("no cascade file found (tried: {})", display_paths(.tried))]
    NotFound { tried: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Multi-scale sliding-window parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeParams {
    pub min_size: u32,
    pub max_size: u32,
    pub shift_factor: f64,
    pub scale_factor: f64,
}

impl From<&Settings> for CascadeParams {
    fn from(settings: &Settings) -> Self {
        Self {
            min_size: settings.min_size,
            max_size: settings.max_size,
            shift_factor: settings.shift_factor,
            scale_factor: settings.scale_factor,
        }
    }
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// An unpacked cascade. Immutable once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Cascade {
    depth: u32,
    trees: usize,
    /// Four signed offsets per node; node 0 of every tree is padding so
    /// that node `i` lives at `4 * i`.
    codes: Vec<i8>,
    predictions: Vec<f32>,
    thresholds: Vec<f32>,
}

impl Cascade {
    pub fn from_file(path: &Path) -> Result<Self, CascadeError> {
        let bytes = fs::read(path).map_err(|source| CascadeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::unpack(&bytes)
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, CascadeError> {
        let mut reader = ByteReader::new(bytes);
        reader.skip(HEADER_LEN)?;

        let depth = reader.u32()?;
        if depth > MAX_TREE_DEPTH {
            return Err(CascadeError::InvalidHeader(format!(
                "tree depth {depth} exceeds {MAX_TREE_DEPTH}"
            )));
        }
        let trees = reader.u32()? as usize;
        if trees == 0 {
            return Err(CascadeError::InvalidHeader("cascade has no trees".into()));
        }

        let leaves = 1usize << depth;
        let node_bytes = 4 * leaves - 4;
        let mut codes = Vec::with_capacity(trees * 4 * leaves);
        let mut predictions = Vec::with_capacity(trees * leaves);
        let mut thresholds = Vec::with_capacity(trees);

        for _ in 0..trees {
            codes.extend_from_slice(&[0, 0, 0, 0]);
            codes.extend(reader.take(node_bytes)?.iter().map(|&b| b as i8));
            for _ in 0..leaves {
                predictions.push(reader.f32()?);
            }
            thresholds.push(reader.f32()?);
        }

        Ok(Self {
            depth,
            trees,
            codes,
            predictions,
            thresholds,
        })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn trees(&self) -> usize {
        self.trees
    }

    /// Confidence that the `scale`-sized window centred on `(row, col)`
    /// holds a face. Non-positive values are rejections.
    pub fn classify_region(&self, row: i64, col: i64, scale: i64, plane: &GrayPlane) -> f32 {
        let leaves = 1usize << self.depth;
        let r = row * 256;
        let c = col * 256;
        let mut root = 0usize;
        let mut out = 0.0f32;

        for tree in 0..self.trees {
            let mut idx = 1usize;
            for _ in 0..self.depth {
                let code = &self.codes[root + 4 * idx..root + 4 * idx + 4];
                let p1 = plane.get(
                    (r + code[0] as i64 * scale) >> 8,
                    (c + code[1] as i64 * scale) >> 8,
                );
                let p2 = plane.get(
                    (r + code[2] as i64 * scale) >> 8,
                    (c + code[3] as i64 * scale) >> 8,
                );
                let (Some(p1), Some(p2)) = (p1, p2) else {
                    return -1.0;
                };
                idx = 2 * idx + usize::from(p1 <= p2);
            }
            out += self.predictions[leaves * tree + idx - leaves];
            if out <= self.thresholds[tree] {
                return -1.0;
            }
            root += 4 * leaves;
        }
        out - self.thresholds[self.trees - 1]
    }

    /// Scans every window size from `min_size` to `max_size` and returns the
    /// raw (unclustered) positive windows.
    pub fn run(&self, plane: &GrayPlane, params: &CascadeParams) -> Vec<Detection> {
        let rows = plane.rows() as i64;
        let cols = plane.cols() as i64;
        let mut detections = Vec::new();

        let mut scale = params.min_size as i64;
        while scale <= params.max_size as i64 {
            let step = ((params.shift_factor * scale as f64) as i64).max(1);
            let offset = scale / 2 + 1;

            let mut row = offset;
            while row <= rows - offset {
                let mut col = offset;
                while col <= cols - offset {
                    let q = self.classify_region(row, col, scale, plane);
                    if q > 0.0 {
                        detections.push(Detection::new(
                            row as i32,
                            col as i32,
                            scale as i32,
                            q as f64,
                        ));
                    }
                    col += step;
                }
                row += step;
            }

            let next = (scale as f64 * params.scale_factor) as i64;
            scale = next.max(scale + 1);
        }
        detections
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CascadeError> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.bytes.len());
        let Some(end) = end else {
            return Err(CascadeError::Truncated {
                offset: self.pos,
                needed: n,
            });
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), CascadeError> {
        self.take(n).map(|_| ())
    }

    fn u32(&mut self) -> Result<u32, CascadeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, CascadeError> {
        self.u32().map(f32::from_bits)
    }
}
