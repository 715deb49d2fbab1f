//! Attribute names of the METAR schema and how each one is compared.

use std::collections::HashMap;

pub const STATION: &str = "station";
pub const SITE: &str = "site";
pub const RAW_TEXT: &str = "raw_text";
pub const OBSERVATION_TIME: &str = "observation_time";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const TEMP_C: &str = "temp_c";
pub const DEWPOINT_C: &str = "dewpoint_c";
pub const WIND_DIR_DEGREES: &str = "wind_dir_degrees";
pub const WIND_SPEED_KT: &str = "wind_speed_kt";
pub const WIND_GUST_KT: &str = "wind_gust_kt";
pub const VISIBILITY_STATUTE_MI: &str = "visibility_statute_mi";
pub const ALTIM_IN_HG: &str = "altim_in_hg";
pub const WX_STRING: &str = "wx_string";
pub const CLOUDS: &str = "clouds";
pub const TAF: &str = "taf";
pub const ELEVATION_M: &str = "elevation_m";
pub const METAR_TYPE: &str = "metar_type";

/// How values of an attribute are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Short codes compared trimmed and case-insensitively (station, wind direction).
    Categorical,
    /// Free text compared as-is.
    Text,
    /// Fixed precision decimals.
    Numeric,
    Timestamp,
}

/// Maps attribute names to their [`AttributeKind`].
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    kinds: HashMap<&'static str, AttributeKind>,
}

impl AttributeSchema {
    /// The schema of records produced from the aviationweather.gov METAR feed.
    pub fn metar() -> Self {
        use AttributeKind::*;
        let kinds = HashMap::from([
            (STATION, Categorical),
            (SITE, Text),
            (RAW_TEXT, Text),
            (OBSERVATION_TIME, Timestamp),
            (LATITUDE, Numeric),
            (LONGITUDE, Numeric),
            (TEMP_C, Numeric),
            (DEWPOINT_C, Numeric),
            (WIND_DIR_DEGREES, Categorical),
            (WIND_SPEED_KT, Numeric),
            (WIND_GUST_KT, Numeric),
            (VISIBILITY_STATUTE_MI, Numeric),
            (ALTIM_IN_HG, Numeric),
            (WX_STRING, Text),
            (CLOUDS, Text),
            (TAF, Text),
            (ELEVATION_M, Numeric),
            (METAR_TYPE, Categorical),
        ]);
        Self { kinds }
    }

    pub fn kind(&self, attribute: &str) -> Option<AttributeKind> {
        self.kinds.get(attribute).copied()
    }
}

impl Default for AttributeSchema {
    fn default() -> Self {
        Self::metar()
    }
}
