use chrono::{DateTime, Utc};
use reqwest::StatusCode;

use super::{ElementSource, SourceError};
use crate::physics::OrbitalState;

const DEFAULT_BASE_URL: &str = "https://www.space-track.org";

/// Space-Track element source. Authenticates once per session with the
/// credentials from `SPACETRACK_USERNAME`/`SPACETRACK_PASSWORD` and
/// keeps the session cookie in the client's cookie store. Elements are
/// requested in TLE format and parsed with sgp4.
pub struct SpaceTrackSource {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl SpaceTrackSource {
    pub fn new(
        base_url: Option<String>,
        username: String,
        password: String,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(SpaceTrackSource {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            username,
            password,
        })
    }

    /// Build from `SPACETRACK_USERNAME`/`SPACETRACK_PASSWORD`; `None`
    /// when the credentials are not set.
    pub fn from_env(base_url: Option<String>) -> Result<Option<Self>, SourceError> {
        let (Ok(username), Ok(password)) = (
            std::env::var("SPACETRACK_USERNAME"),
            std::env::var("SPACETRACK_PASSWORD"),
        ) else {
            return Ok(None);
        };
        Self::new(base_url, username, password).map(Some)
    }

    async fn login(&self) -> Result<(), SourceError> {
        let response = self
            .client
            .post(format!("{}/ajaxauth/login", self.base_url))
            .form(&[
                ("identity", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::Auth);
        }
        Ok(())
    }

    async fn fetch_tle_text(&self, query_path: &str) -> Result<String, SourceError> {
        self.login().await?;
        let response = self
            .client
            .get(format!("{}{query_path}", self.base_url))
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => Ok(response.text().await?),
            status => Err(SourceError::Status(status)),
        }
    }
}

#[async_trait::async_trait]
impl ElementSource for SpaceTrackSource {
    async fn current(&self, norad_id: u32) -> Result<Option<OrbitalState>, SourceError> {
        let path = format!(
            "/basicspacedata/query/class/gp/NORAD_CAT_ID/{norad_id}/orderby/EPOCH%20desc/limit/1/format/tle"
        );
        let text = self.fetch_tle_text(&path).await?;
        let mut states = parse_tle_text(&text)?;
        Ok(states.pop())
    }

    async fn history(
        &self,
        norad_id: u32,
        days_back: u32,
    ) -> Result<Vec<OrbitalState>, SourceError> {
        let path = format!(
            "/basicspacedata/query/class/gp_history/NORAD_CAT_ID/{norad_id}/EPOCH/%3Enow-{days_back}/orderby/EPOCH%20asc/format/tle"
        );
        let text = self.fetch_tle_text(&path).await?;
        parse_tle_text(&text)
    }
}

/// Parse a TLE response body into normalized orbital states. Content
/// may hold 2-line or 3-line entries. A malformed element set is a
/// hard error here so it cannot silently poison training labels.
pub fn parse_tle_text(content: &str) -> Result<Vec<OrbitalState>, SourceError> {
    let mut states = Vec::new();
    for (name, line1, line2) in split_tle_entries(content) {
        let elements = sgp4::Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| SourceError::Payload(e.to_string()))?;

        let epoch = DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc);
        let state = OrbitalState::from_elements(
            epoch,
            elements.mean_motion,
            elements.eccentricity,
            elements.inclination,
        )
        .map_err(|e| SourceError::Payload(e.to_string()))?;
        states.push(state);
    }
    Ok(states)
}

/// Split raw TLE content into (name, line1, line2) entries.
///
/// Anchors on adjacent "1 "/"2 " line pairs; an unclaimed line
/// directly above a pair is taken as the object name. Anything else
/// is ignored, so headers and footers in the response body are
/// harmless.
fn split_tle_entries(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut entries = Vec::new();
    let mut claimed = 0; // lines consumed by earlier entries
    for i in 0..lines.len().saturating_sub(1) {
        if i < claimed || !lines[i].starts_with("1 ") || !lines[i + 1].starts_with("2 ") {
            continue;
        }
        let name = (i > claimed)
            .then(|| lines[i - 1])
            .filter(|l| !l.starts_with("1 ") && !l.starts_with("2 "))
            .map(str::to_string);
        entries.push((name, lines[i].to_string(), lines[i + 1].to_string()));
        claimed = i + 2;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    #[test]
    fn parses_named_tle_into_state() {
        let states = parse_tle_text(ISS_TLE).unwrap();
        assert_eq!(states.len(), 1);
        let s = &states[0];
        assert!((s.mean_motion - 15.495).abs() < 1e-3);
        assert!(s.altitude_km > 350.0 && s.altitude_km < 450.0);
        assert!((s.inclination_deg - 51.6461).abs() < 1e-3);
    }

    #[test]
    fn parses_bare_two_line_entries() {
        let bare: String = ISS_TLE.lines().skip(1).collect::<Vec<_>>().join("\n");
        let states = parse_tle_text(&bare).unwrap();
        assert_eq!(states.len(), 1);
    }

    #[test]
    fn back_to_back_bare_entries_stay_separate() {
        let bare: String = ISS_TLE.lines().skip(1).collect::<Vec<_>>().join("\n");
        let parts = split_tle_entries(&format!("{bare}\n{bare}"));
        assert_eq!(parts.len(), 2);
        // The first entry's second line must not be mistaken for the
        // next entry's name.
        assert!(parts.iter().all(|(name, _, _)| name.is_none()));
    }

    #[test]
    fn empty_body_yields_no_states() {
        assert!(parse_tle_text("").unwrap().is_empty());
    }

    #[test]
    fn garbage_lines_are_skipped_by_the_splitter() {
        let noisy = format!("-- header --\n{ISS_TLE}\n-- footer --");
        let states = parse_tle_text(&noisy).unwrap();
        assert_eq!(states.len(), 1);
    }
}
