//! Wire format of the aviationweather.gov METAR JSON API and its conversion into
//! [`ObservationRecord`]s.

use crate::identifier::codec::{truncate_to_minute, MetarId};
use crate::source::error::SourceError;
use crate::types::attributes::*;
use crate::types::record::ObservationRecord;
use crate::types::value::{parse_utc, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One element of the JSON array returned by `/api/data/metar?format=json`.
///
/// Only fields that feed the METAR schema are interpreted; the rest are kept so the
/// struct mirrors the upstream payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetarReport {
    #[serde(rename = "metar_id")]
    pub metar_id: Option<i64>,
    pub icao_id: Option<String>,
    pub receipt_time: Option<String>,
    /// Observation time as Unix seconds.
    pub obs_time: Option<i64>,
    /// Observation time as `YYYY-MM-DD HH:MM:SS` or RFC 3339 text.
    pub report_time: Option<String>,
    pub temp: Option<f64>,
    pub dewp: Option<f64>,
    /// Degrees, or `"VRB"` for variable winds.
    pub wdir: Option<NumberOrString>,
    pub wspd: Option<i64>,
    pub wgst: Option<f64>,
    /// Statute miles, or text such as `"10+"`.
    pub visib: Option<NumberOrString>,
    pub altim: Option<f64>,
    pub slp: Option<f64>,
    pub qc_field: Option<i64>,
    pub wx_string: Option<String>,
    pub pres_tend: Option<f64>,
    pub max_t: Option<f64>,
    pub min_t: Option<f64>,
    pub precip: Option<f64>,
    pub snow: Option<f64>,
    pub vert_vis: Option<f64>,
    pub metar_type: Option<String>,
    pub raw_ob: Option<String>,
    pub most_recent: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub elev: Option<i64>,
    pub prior: Option<i64>,
    pub name: Option<String>,
    #[serde(default)]
    pub clouds: Vec<CloudLayer>,
    pub raw_taf: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudLayer {
    pub cover: Option<String>,
    /// Feet above ground level.
    pub base: Option<i64>,
}

/// Fields the API emits either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl From<&NumberOrString> for Value {
    fn from(value: &NumberOrString) -> Self {
        match value {
            NumberOrString::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Value::Integer(i),
                (None, Some(f)) => Value::Float(f),
                (None, None) => Value::Text(n.to_string()),
            },
            NumberOrString::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl MetarReport {
    pub fn station(&self) -> &str {
        self.icao_id.as_deref().unwrap_or_default()
    }

    /// Observation time from `reportTime`, falling back to `obsTime`.
    pub fn observation_time(&self) -> Option<DateTime<Utc>> {
        self.report_time
            .as_deref()
            .and_then(parse_utc)
            .or_else(|| {
                self.obs_time
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            })
    }

    /// Cloud layers as `"{cover} at {base}"` lines, or an empty string when there are none.
    pub fn cloud_description(&self) -> String {
        self.clouds
            .iter()
            .map(|layer| {
                let cover = layer.cover.as_deref().unwrap_or_default();
                match layer.base {
                    Some(base) => format!("{} at {}", cover, base),
                    None => cover.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end()
            .to_string()
    }

    /// Converts the report into a flat record keyed by its derived [`MetarId`].
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidRecord`] if the report has no usable observation time,
    /// [`SourceError::Identifier`] if station and time do not fit an identifier.
    pub fn into_record(self) -> Result<ObservationRecord, SourceError> {
        let station = self.station().to_string();
        let time = self
            .observation_time()
            .map(truncate_to_minute)
            .ok_or_else(|| SourceError::InvalidRecord {
                station: station.clone(),
                message: format!(
                    "no valid observation time (reportTime {:?}, obsTime {:?})",
                    self.report_time, self.obs_time
                ),
            })?;
        let id = MetarId::encode(&station, time).map_err(|source| SourceError::Identifier {
            station: station.clone(),
            source,
        })?;
        let clouds = self.cloud_description();

        Ok(ObservationRecord::new(id)
            .with(STATION, station)
            .with(SITE, self.name)
            .with(RAW_TEXT, self.raw_ob)
            .with(OBSERVATION_TIME, time)
            .with(LATITUDE, self.lat)
            .with(LONGITUDE, self.lon)
            .with(TEMP_C, self.temp)
            .with(DEWPOINT_C, self.dewp)
            .with(WIND_DIR_DEGREES, self.wdir.as_ref().map(Value::from))
            .with(WIND_SPEED_KT, self.wspd)
            .with(WIND_GUST_KT, self.wgst)
            .with(VISIBILITY_STATUTE_MI, self.visib.as_ref().map(Value::from))
            .with(ALTIM_IN_HG, self.altim)
            .with(WX_STRING, self.wx_string)
            .with(CLOUDS, clouds)
            .with(TAF, self.raw_taf)
            .with(ELEVATION_M, self.elev)
            .with(METAR_TYPE, self.metar_type))
    }
}

/// Parses the JSON array body of a METAR response.
pub fn parse_reports(body: &str, url: &str) -> Result<Vec<MetarReport>, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::JsonParse(url.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"[
      {
        "metar_id": 565043961,
        "icaoId": "KATL",
        "receiptTime": "2024-05-01 12:56:06",
        "obsTime": 1714567980,
        "reportTime": "2024-05-01 13:00:00",
        "temp": 21.1,
        "dewp": 17.8,
        "wdir": 270,
        "wspd": 8,
        "visib": "10+",
        "altim": 1016.6,
        "wxString": "-RA",
        "metarType": "METAR",
        "rawOb": "KATL 011253Z 27008KT 10SM -RA FEW025 BKN050 21/18 A3002",
        "mostRecent": 1,
        "lat": 33.6301,
        "lon": -84.4418,
        "elev": 308,
        "prior": 0,
        "name": "Atlanta/Hartsfield-Jackson Intl, GA, US",
        "clouds": [{"cover": "FEW", "base": 2500}, {"cover": "BKN", "base": 5000}],
        "rawTaf": "TAF KATL 011120Z 0112/0218 27008KT P6SM"
      },
      {
        "icaoId": "KJFK",
        "obsTime": 1714567860,
        "wdir": "VRB",
        "visib": 2.5,
        "clouds": []
      }
    ]"#;

    #[test]
    fn test_parse_and_convert() {
        let reports = parse_reports(SAMPLE, "test").unwrap();
        assert_eq!(reports.len(), 2);

        let atl = reports[0].clone().into_record().unwrap();
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        assert_eq!(atl.id, MetarId::encode("KATL", time).unwrap());
        assert_eq!(atl.get(OBSERVATION_TIME), Some(&Value::Timestamp(time)));
        assert_eq!(atl.get(WIND_DIR_DEGREES), Some(&Value::Integer(270)));
        assert_eq!(atl.get(VISIBILITY_STATUTE_MI), Some(&Value::from("10+")));
        assert_eq!(
            atl.get(CLOUDS),
            Some(&Value::from("FEW at 2500\nBKN at 5000"))
        );
        assert_eq!(atl.get(WX_STRING), Some(&Value::from("-RA")));
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let reports = parse_reports(SAMPLE, "test").unwrap();
        let jfk = reports[1].clone().into_record().unwrap();
        // obsTime 1714567860 is 2024-05-01T12:51:00Z
        let (station, time) = jfk.id.decode().unwrap();
        assert_eq!(station, "KJFK");
        assert_eq!(time, Utc.with_ymd_and_hms(2024, 5, 1, 12, 51, 0).unwrap());
        assert_eq!(jfk.get(WIND_DIR_DEGREES), Some(&Value::from("VRB")));
        assert_eq!(jfk.get(VISIBILITY_STATUTE_MI), Some(&Value::Float(2.5)));
        assert_eq!(jfk.get(CLOUDS), Some(&Value::from("")));
        assert_eq!(jfk.get(WX_STRING), Some(&Value::Null));
    }

    #[test]
    fn test_cloud_layer_without_base() {
        let report = MetarReport {
            clouds: vec![
                CloudLayer {
                    cover: Some("CLR".to_string()),
                    base: None,
                },
                CloudLayer {
                    cover: Some("OVC".to_string()),
                    base: Some(800),
                },
            ],
            ..Default::default()
        };
        assert_eq!(report.cloud_description(), "CLR\nOVC at 800");
    }

    #[test]
    fn test_conversion_errors() {
        let no_time = MetarReport {
            icao_id: Some("KATL".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            no_time.into_record(),
            Err(SourceError::InvalidRecord { .. })
        ));

        let long_station = MetarReport {
            icao_id: Some("KATLX".to_string()),
            obs_time: Some(1714567860),
            ..Default::default()
        };
        assert!(matches!(
            long_station.into_record(),
            Err(SourceError::Identifier { .. })
        ));

        assert!(matches!(
            parse_reports("{not json", "http://x"),
            Err(SourceError::JsonParse(url, _)) if url == "http://x"
        ));
    }
}
