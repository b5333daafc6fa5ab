//! radiko area detection and program schedules.
//!
//! The visible station list depends on the caller's area, which radiko
//! reports from `https://radiko.jp/area`. Schedules are published per area
//! and broadcast day as XML:
//!
//! ```xml
//! <radiko>
//!   <stations>
//!     <station id="TBS">
//!       <name>TBSラジオ</name>
//!       <progs>
//!         <date>20240520</date>
//!         <prog id="..." ft="20240520050000" to="20240520063000" dur="5400">
//!           <title>...</title>
//!           <pfm>...</pfm>
//!         </prog>
//!       </progs>
//!     </station>
//!   </stations>
//! </radiko>
//! ```

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Asia::Tokyo;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::domain::{Job, Program, parse_radiko_timestamp};
use crate::utils::http_client::build_http_client;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://radiko.jp";

/// Number of past broadcast days radiko keeps available for timefree.
pub const TIMEFREE_DAYS: u64 = 8;

const OUT_OF_AREA: &str = "OUT";

static AREA_CLASS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="([^"]+)""#).unwrap());

#[derive(Debug, Deserialize)]
struct RadikoDocument {
    stations: StationsElement,
}

#[derive(Debug, Deserialize)]
struct StationsElement {
    #[serde(rename = "station", default)]
    stations: Vec<StationElement>,
}

#[derive(Debug, Deserialize)]
struct StationElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default)]
    name: String,
    progs: ProgsElement,
}

#[derive(Debug, Deserialize)]
struct ProgsElement {
    #[serde(rename = "prog", default)]
    progs: Vec<ProgElement>,
}

#[derive(Debug, Deserialize)]
struct ProgElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@ft")]
    ft: String,
    #[serde(rename = "@to")]
    to: String,
    #[serde(rename = "@dur")]
    dur: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pfm: Option<String>,
}

impl ProgElement {
    fn into_program(self) -> Result<Program> {
        Ok(Program {
            start: parse_radiko_timestamp(&self.ft)?,
            end: parse_radiko_timestamp(&self.to)?,
            id: self.id,
            duration_secs: self.dur,
            title: self.title,
            performer: self.pfm,
        })
    }
}

/// One station's programs for a broadcast day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub programs: Vec<Program>,
}

/// A parsed radiko schedule document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub stations: Vec<Station>,
}

impl Schedule {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document: RadikoDocument = quick_xml::de::from_str(xml)?;

        let stations = document
            .stations
            .stations
            .into_iter()
            .map(|station| {
                let programs = station
                    .progs
                    .progs
                    .into_iter()
                    .map(ProgElement::into_program)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Station {
                    id: station.id,
                    name: station.name,
                    programs,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { stations })
    }

    /// Every program as a job on its station.
    pub fn jobs(&self) -> Vec<Job> {
        self.stations
            .iter()
            .flat_map(|station| {
                station
                    .programs
                    .iter()
                    .map(|program| Job::new(program.clone(), station.id.clone()))
            })
            .collect()
    }
}

/// Extract the area id from the `/area` response body.
pub fn parse_area_id(body: &str) -> Result<String> {
    let area_id = AREA_CLASS_REGEX
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::Other(format!("Area id not found in response: {}", body.trim())))?;

    if area_id == OUT_OF_AREA {
        return Err(Error::OutOfArea);
    }
    Ok(area_id)
}

/// Client for radiko's public schedule endpoints.
pub struct RadikoClient {
    client: reqwest::Client,
    base_url: String,
    area_id: OnceCell<String>,
}

impl RadikoClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(30))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            area_id: OnceCell::new(),
        })
    }

    /// Area id of this host, fetched once and cached.
    pub async fn area_id(&self) -> Result<&str> {
        self.area_id
            .get_or_try_init(|| self.fetch_area_id())
            .await
            .map(String::as_str)
    }

    async fn fetch_area_id(&self) -> Result<String> {
        let url = format!("{}/area", self.base_url);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let area_id = parse_area_id(&body)?;
        info!("Detected radiko area {}", area_id);
        Ok(area_id)
    }

    /// Schedule of the given broadcast day for this host's area.
    pub async fn fetch_schedule(&self, date: NaiveDate) -> Result<Schedule> {
        let area_id = self.area_id().await?;
        let url = format!(
            "{}/v3/program/date/{}/{}.xml",
            self.base_url,
            date.format("%Y%m%d"),
            area_id
        );
        debug!("Fetching schedule {}", url);

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Schedule::from_xml(&body)
    }

    /// Jobs from every broadcast day still available for timefree, in priority order.
    ///
    /// A day that fails to load is logged and skipped.
    pub async fn fetch_recent_jobs(&self) -> Result<Vec<Job>> {
        // Fail fast when the area itself is unavailable.
        self.area_id().await?;

        let today = Utc::now().with_timezone(&Tokyo).date_naive();
        let mut jobs = BTreeSet::new();
        for offset in 0..TIMEFREE_DAYS {
            let Some(date) = today.checked_sub_days(Days::new(offset)) else {
                continue;
            };
            match self.fetch_schedule(date).await {
                Ok(schedule) => jobs.extend(schedule.jobs()),
                Err(e) => warn!("Failed to fetch schedule for {}: {}", date, e),
            }
        }

        Ok(jobs.into_iter().collect())
    }

    /// The job whose timefree URL equals `url`.
    pub async fn find_job_by_url(&self, url: &str) -> Result<Job> {
        self.fetch_recent_jobs()
            .await?
            .into_iter()
            .find(|job| job.url() == url)
            .ok_or_else(|| Error::not_found("Job", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<radiko>
  <ttl>1800</ttl>
  <srvtime>1716130000</srvtime>
  <stations>
    <station id="TBS">
      <name>TBSラジオ</name>
      <progs>
        <date>20240520</date>
        <prog id="1001" master_id="" ft="20240520010000" to="20240520030000" ftl="0100" tol="0300" dur="7200">
          <title>JUNK 伊集院光・深夜の馬鹿力</title>
          <url>https://www.tbsradio.jp/</url>
          <pfm>伊集院光</pfm>
        </prog>
        <prog id="1002" master_id="" ft="20240520030000" to="20240520033000" ftl="0300" tol="0330" dur="1800">
          <title>A/B Show</title>
          <pfm></pfm>
        </prog>
      </progs>
    </station>
    <station id="QRR">
      <name>文化放送</name>
      <progs>
        <date>20240520</date>
        <prog id="2001" master_id="" ft="20240520000000" to="20240520010000" ftl="0000" tol="0100" dur="3600">
          <title>Night</title>
        </prog>
      </progs>
    </station>
  </stations>
</radiko>"#;

    #[test]
    fn test_schedule_from_xml() {
        let schedule = Schedule::from_xml(SCHEDULE_XML).unwrap();
        assert_eq!(schedule.stations.len(), 2);

        let tbs = &schedule.stations[0];
        assert_eq!(tbs.id, "TBS");
        assert_eq!(tbs.name, "TBSラジオ");
        assert_eq!(tbs.programs.len(), 2);

        let first = &tbs.programs[0];
        assert_eq!(first.id, "1001");
        assert_eq!(first.duration_secs, 7200);
        assert_eq!(first.title, "JUNK 伊集院光・深夜の馬鹿力");
        assert_eq!(first.performer_name(), Some("伊集院光"));
        assert_eq!(first.start.to_rfc3339(), "2024-05-20T01:00:00+09:00");

        assert_eq!(tbs.programs[1].performer_name(), None);
        assert_eq!(schedule.stations[1].programs[0].performer, None);
    }

    #[test]
    fn test_schedule_jobs_carry_station() {
        let jobs = Schedule::from_xml(SCHEDULE_XML).unwrap().jobs();
        assert_eq!(jobs.len(), 3);
        assert_eq!(
            jobs[0].url(),
            "https://radiko.jp/#!/ts/TBS/20240520010000"
        );
        assert_eq!(jobs[2].station_id, "QRR");
    }

    #[test]
    fn test_invalid_timestamp_is_error() {
        let xml = SCHEDULE_XML.replace("20240520010000", "bogus");
        assert!(Schedule::from_xml(&xml).is_err());
    }

    #[test]
    fn test_parse_area_id() {
        let body = r#"document.write('<span class="JP13">TOKYO JAPAN</span>');"#;
        assert_eq!(parse_area_id(body).unwrap(), "JP13");
    }

    #[test]
    fn test_parse_area_id_out_of_area() {
        let body = r#"document.write('<span class="OUT">OUT</span>');"#;
        assert!(matches!(parse_area_id(body), Err(Error::OutOfArea)));
    }

    #[test]
    fn test_parse_area_id_missing() {
        assert!(matches!(parse_area_id("nothing"), Err(Error::Other(_))));
    }
}
