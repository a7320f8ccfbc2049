//! Price history loaders.

mod csv_source;

pub use csv_source::CsvDataSource;

use rotation_core::error::DataError;
use rotation_core::types::{Asset, Bar, BarSeries, Timeframe};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Load a CSV file as a series for `asset`.
pub fn load_csv(
    path: impl AsRef<Path>,
    asset: Asset,
    timeframe: Timeframe,
) -> Result<BarSeries, DataError> {
    let source = CsvDataSource::new(path)?;
    source.load_series(asset, timeframe)
}

/// Load `<dir>/<SYMBOL>.csv` for every asset.
pub fn load_directory<'a>(
    dir: impl AsRef<Path>,
    assets: impl IntoIterator<Item = &'a Asset>,
) -> Result<HashMap<Asset, Vec<Bar>>, DataError> {
    let dir = dir.as_ref();
    let mut history = HashMap::new();

    for asset in assets {
        if history.contains_key(asset) {
            continue;
        }
        let path = dir.join(format!("{}.csv", asset.symbol));
        if !path.exists() {
            return Err(DataError::SymbolNotFound(format!(
                "{} (expected {})",
                asset.symbol,
                path.display()
            )));
        }
        let bars = CsvDataSource::new(&path)?.load_all()?;
        info!(asset = %asset, bars = bars.len(), path = %path.display(), "loaded history");
        history.insert(asset.clone(), bars);
    }

    Ok(history)
}
