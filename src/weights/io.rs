use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::common::{ensure_dir_exists, require_dir_exists};
use crate::weights::WeightMatrix;

const MAGIC: &[u8; 4] = b"ZWM1";
const MANIFEST_FILE: &str = "manifest.json";
const WEIGHTS_FILE: &str = "weights.csr";

/// Sidecar metadata for a saved weight matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsManifest {
    version: String,
    crs: String,
    regions: Vec<String>,
    n_cells: usize,
    n_regions: usize,
    nnz: usize,
}

impl WeightsManifest {
    /// Get the CRS the weights were built in.
    pub fn crs(&self) -> &str { &self.crs }

    /// Get the region names, in column order.
    pub fn regions(&self) -> &[String] { &self.regions }
}

impl WeightMatrix {
    /// Save the matrix to a directory: `manifest.json` with the region
    /// names and CRS, plus a binary compressed-column file.
    /// Layout: "ZWM1" | n_cells(u64) | n_regions(u64) | nnz(u64)
    ///         | offsets[u64; n_regions+1] | cells[u32; nnz] | weights[f64; nnz]
    pub fn save(&self, dir: &Path, regions: &[String], crs: &str) -> Result<()> {
        if regions.len() != self.n_regions() {
            bail!("got {} region names for a matrix with {} regions", regions.len(), self.n_regions());
        }
        ensure_dir_exists(dir)?;

        let manifest = WeightsManifest {
            version: "1".into(),
            crs: crs.to_string(),
            regions: regions.to_vec(),
            n_cells: self.n_cells(),
            n_regions: self.n_regions(),
            nnz: self.nnz(),
        };
        let manifest_path = dir.join(MANIFEST_FILE);
        serde_json::to_writer_pretty(
            BufWriter::new(File::create(&manifest_path)
                .with_context(|| format!("Failed to create {}", manifest_path.display()))?),
            &manifest,
        )?;

        let (offsets, cells, weights) = self.raw_parts();
        let mut w = BufWriter::new(File::create(dir.join(WEIGHTS_FILE))?);

        // Header
        w.write_all(MAGIC)?;
        w.write_all(&(self.n_cells() as u64).to_le_bytes())?;
        w.write_all(&(self.n_regions() as u64).to_le_bytes())?;
        w.write_all(&(self.nnz() as u64).to_le_bytes())?;

        // offsets
        for &offset in offsets {
            w.write_all(&offset.to_le_bytes())?;
        }

        // cell ids
        for &cell in cells {
            w.write_all(&cell.to_le_bytes())?;
        }

        // weights
        for &weight in weights {
            w.write_all(&weight.to_le_bytes())?;
        }

        w.flush()?;
        Ok(())
    }

    /// Read a matrix (and its manifest) from a directory written by
    /// [`WeightMatrix::save`].
    pub fn load(dir: &Path) -> Result<(Self, WeightsManifest)> {
        require_dir_exists(dir)?;

        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest: WeightsManifest = serde_json::from_reader(
            BufReader::new(File::open(&manifest_path)
                .with_context(|| format!("Failed to open {}", manifest_path.display()))?))
            .context("Failed to parse weights manifest")?;

        let mut r = BufReader::new(File::open(dir.join(WEIGHTS_FILE))?);

        // Header
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            bail!("Invalid weights magic: expected 'ZWM1'");
        }

        let mut buf8 = [0u8; 8];
        r.read_exact(&mut buf8)?;
        let n_cells = u64::from_le_bytes(buf8) as usize;

        r.read_exact(&mut buf8)?;
        let n_regions = u64::from_le_bytes(buf8) as usize;

        r.read_exact(&mut buf8)?;
        let nnz_hdr = u64::from_le_bytes(buf8) as usize;

        // offsets
        let mut offsets = vec![0u64; n_regions + 1];
        for offset in offsets.iter_mut() {
            r.read_exact(&mut buf8)?;
            *offset = u64::from_le_bytes(buf8);
        }

        let nnz = offsets[n_regions] as usize;
        if nnz != nnz_hdr {
            bail!("weights nnz mismatch: header {} vs offsets {}", nnz_hdr, nnz);
        }

        // cell ids
        let mut cells = vec![0u32; nnz];
        for cell in cells.iter_mut() {
            let mut buf4 = [0u8; 4];
            r.read_exact(&mut buf4)?;
            *cell = u32::from_le_bytes(buf4);
        }

        // weights
        let mut weights = vec![0.0f64; nnz];
        for weight in weights.iter_mut() {
            r.read_exact(&mut buf8)?;
            *weight = f64::from_le_bytes(buf8);
        }

        let matrix = WeightMatrix::from_raw_parts(n_cells, offsets, cells, weights)?;
        if manifest.n_cells != matrix.n_cells()
            || manifest.n_regions != matrix.n_regions()
            || manifest.nnz != matrix.nnz()
        {
            bail!("weights manifest disagrees with binary: manifest says {}x{} nnz {}, file has {}x{} nnz {}",
                manifest.n_cells, manifest.n_regions, manifest.nnz,
                matrix.n_cells(), matrix.n_regions(), matrix.nnz());
        }
        if manifest.regions.len() != matrix.n_regions() {
            bail!("weights manifest lists {} regions for a {}-region matrix",
                manifest.regions.len(), matrix.n_regions());
        }

        Ok((matrix, manifest))
    }
}
