//! Forecast retrieval
//!
//! A [`ForecastSource`] turns a mountain's coordinates into a complete
//! [`WeatherRecord`]. The Open-Meteo implementation lives in [`open_meteo`].

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;

use crate::Result;
use crate::models::{Mountain, WeatherRecord};

pub mod open_meteo;

pub use open_meteo::{OpenMeteoForecastSource, parse_forecast};

#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch and ingest one forecast. Issues at most one request, no retries.
    async fn fetch(&self, mountain: &Mountain) -> Result<WeatherRecord>;
}

/// One pending request per mountain, yielding `(mountain, result)` in
/// completion order
pub fn fetch_all<'a, S: ForecastSource + ?Sized>(
    source: &'a S,
    mountains: Vec<Mountain>,
) -> FuturesUnordered<BoxFuture<'a, (Mountain, Result<WeatherRecord>)>> {
    mountains
        .into_iter()
        .map(|mountain| {
            async move {
                let result = source.fetch(&mountain).await;
                (mountain, result)
            }
            .boxed()
        })
        .collect()
}
