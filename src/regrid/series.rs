use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use polars::{
    frame::DataFrame,
    io::SerWriter,
    prelude::{Column, CsvWriter, ParquetWriter},
};

/// A regridded variable: one value per (time step, region), labelled by
/// region name.
#[derive(Debug, Clone)]
pub struct RegriddedSeries {
    values: Array2<f64>, // (time, region)
    regions: Vec<String>,
}

impl RegriddedSeries {
    /// Bundle a `(time, region)` array with its region names.
    pub fn new(values: Array2<f64>, regions: Vec<String>) -> Result<Self> {
        if values.ncols() != regions.len() {
            bail!("got {} region names for {} value columns", regions.len(), values.ncols());
        }
        Ok(Self { values, regions })
    }

    /// Get the number of time steps.
    #[inline] pub fn n_steps(&self) -> usize { self.values.nrows() }

    /// Get the `(time, region)` values.
    #[inline] pub fn values(&self) -> &Array2<f64> { &self.values }

    /// Get the region names, in column order.
    #[inline] pub fn regions(&self) -> &[String] { &self.regions }

    /// Convert to a DataFrame: a `time` index column plus one column per
    /// region.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.regions.len() + 1);
        columns.push(Column::new(
            "time".into(),
            (0..self.n_steps() as i64).collect::<Vec<i64>>(),
        ));
        for (r, name) in self.regions.iter().enumerate() {
            columns.push(Column::new(name.as_str().into(), self.values.column(r).to_vec()));
        }
        DataFrame::new(columns).context("Failed to assemble regridded DataFrame")
    }

    /// Write the series to a CSV file at `path`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvWriter::new(BufWriter::new(file)).finish(&mut df)?;
        Ok(())
    }

    /// Write the series to a Parquet file at `path`.
    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        ParquetWriter::new(BufWriter::new(file)).finish(&mut df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn dataframe_has_time_and_region_columns() {
        let series = RegriddedSeries::new(
            array![[1.0, 2.0], [3.0, 4.0]],
            vec!["left".into(), "right".into()],
        ).unwrap();

        let df = series.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.get_column_names_str(), vec!["time", "left", "right"]);
    }

    #[test]
    fn name_count_mismatch_is_an_error() {
        let err = RegriddedSeries::new(array![[1.0, 2.0]], vec!["only".into()]).unwrap_err();
        assert!(err.to_string().contains("region names"));
    }

    #[test]
    fn csv_round_trip_preserves_values() {
        use polars::{io::SerReader, prelude::CsvReader};

        let series = RegriddedSeries::new(
            array![[1.5, -2.0], [0.0, 10.25]],
            vec!["a".into(), "b".into()],
        ).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        series.write_csv(&path).unwrap();

        let df = CsvReader::new(File::open(&path).unwrap()).finish().unwrap();
        assert_eq!(df.shape(), (2, 3));
        let col = df.column("b").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(10.25));
    }
}
