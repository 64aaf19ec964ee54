//! Client queries, provider payloads, and the report served to clients.

use serde::{Deserialize, Serialize};

const CITY_MIN_CHARS: usize = 2;
const CITY_MAX_CHARS: usize = 64;
const DEFAULT_VISIBILITY_M: i64 = 10_000;

/// A validated weather lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl WeatherQuery {
    /// Build a query from raw parameters. A valid city takes precedence over coordinates.
    pub fn from_params(city: Option<&str>, lat: Option<&str>, lon: Option<&str>) -> Option<Self> {
        if let Some(city) = parse_city(city) {
            return Some(WeatherQuery::City(city));
        }
        parse_coordinates(lat, lon).map(|(lat, lon)| WeatherQuery::Coordinates { lat, lon })
    }

    /// Cache key. Coordinates are rounded so nearby lookups share an entry.
    pub fn cache_key(&self) -> String {
        match self {
            WeatherQuery::City(city) => format!("city:{}", city.to_lowercase()),
            WeatherQuery::Coordinates { lat, lon } => format!("coord:{lat:.4},{lon:.4}"),
        }
    }

    /// Provider query parameters selecting the location.
    pub fn location_params(&self) -> Vec<(&'static str, String)> {
        match self {
            WeatherQuery::City(city) => vec![("q", city.clone())],
            WeatherQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }
}

/// Trimmed city name of 2 to 64 characters.
pub fn parse_city(raw: Option<&str>) -> Option<String> {
    let city = raw?.trim();
    let len = city.chars().count();
    if (CITY_MIN_CHARS..=CITY_MAX_CHARS).contains(&len) {
        Some(city.to_string())
    } else {
        None
    }
}

/// Latitude in [-90, 90] and longitude in [-180, 180].
pub fn parse_coordinates(lat: Option<&str>, lon: Option<&str>) -> Option<(f64, f64)> {
    let lat: f64 = lat?.trim().parse().ok()?;
    let lon: f64 = lon?.trim().parse().ok()?;
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Some((lat, lon))
    } else {
        None
    }
}

// Provider payload. Every field is optional so a partial answer still decodes.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderWeather {
    pub name: Option<String>,
    pub weather: Option<Vec<ProviderCondition>>,
    pub main: Option<ProviderMain>,
    pub wind: Option<ProviderWind>,
    pub sys: Option<ProviderSys>,
    pub coord: Option<ProviderCoord>,
    pub visibility: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderCondition {
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<i64>,
    pub pressure: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderWind {
    pub speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSys {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderCoord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Weather report served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: Option<f64>,
    pub description: String,
    pub icon: String,
    pub feels_like: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<i64>,
    pub pressure: Option<i64>,
    pub visibility: i64,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Set when served from the response cache.
    #[serde(rename = "_cached", default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl WeatherReport {
    /// A report without a city name or a temperature is useless to clients.
    pub fn is_complete(&self) -> bool {
        !self.city.is_empty() && self.temperature.is_some()
    }
}

impl From<ProviderWeather> for WeatherReport {
    fn from(data: ProviderWeather) -> Self {
        let condition = data.weather.and_then(|list| list.into_iter().next()).unwrap_or_default();
        let main = data.main.unwrap_or_default();
        let sys = data.sys.unwrap_or_default();
        let coord = data.coord.unwrap_or_default();

        Self {
            city: data.name.unwrap_or_default(),
            temperature: main.temp,
            description: condition.description.unwrap_or_default(),
            icon: condition.icon.unwrap_or_default(),
            feels_like: main.feels_like,
            wind_speed: data.wind.and_then(|w| w.speed),
            humidity: main.humidity,
            pressure: main.pressure,
            visibility: data.visibility.unwrap_or(DEFAULT_VISIBILITY_M),
            sunrise: sys.sunrise,
            sunset: sys.sunset,
            lat: coord.lat,
            lon: coord.lon,
            cached: false,
        }
    }
}

/// One geocoding candidate from the provider.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeocodingEntry {
    pub name: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Autocomplete suggestion served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl From<GeocodingEntry> for Suggestion {
    fn from(entry: GeocodingEntry) -> Self {
        let name = entry.name.unwrap_or_default();
        let country = entry.country.unwrap_or_default();
        let label = match entry.state.filter(|s| !s.is_empty()) {
            Some(state) => format!("{name}, {state}, {country}"),
            None => format!("{name}, {country}"),
        };
        Self {
            label,
            lat: entry.lat,
            lon: entry.lon,
        }
    }
}
