use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use super::store::TleRecord;

const CELESTRAK_GROUPS: &[&str] = &["active", "debris"];
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no TLE data returned")]
    Empty,
}

/// Download the reference catalog from CelesTrak. Later groups win on name
/// collisions, matching how the stored CSV is refreshed.
pub async fn fetch_catalog() -> Result<Vec<TleRecord>, FetchError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<TleRecord> = Vec::new();

    for group in CELESTRAK_GROUPS {
        let url =
            format!("https://celestrak.org/NORAD/elements/gp.php?GROUP={group}&FORMAT=tle");
        let text = get_with_retry(&client, &url).await?;
        let parsed = parse_tle_text(&text);
        log::info!("fetched {} TLEs from group '{}'", parsed.len(), group);

        for record in parsed {
            match by_name.get(&record.name) {
                Some(&index) => records[index] = record,
                None => {
                    by_name.insert(record.name.clone(), records.len());
                    records.push(record);
                }
            }
        }
    }

    if records.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(records)
}

async fn get_with_retry(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let mut attempt = 1;
    loop {
        log::info!("fetching {} (attempt {}/{})", url, attempt, MAX_ATTEMPTS);
        match request_text(client, url).await {
            Ok(text) => return Ok(text),
            Err(e) if attempt < MAX_ATTEMPTS => {
                log::warn!("fetch failed: {}, retrying in {:?}", e, RETRY_DELAY);
                tokio::time::sleep(RETRY_DELAY).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn request_text(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    response.text().await
}

/// Parse 3-line TLE groups (name, line1, line2) out of raw catalog text.
/// Unrecognized lines are skipped so a truncated download degrades instead
/// of failing.
fn parse_tle_text(text: &str) -> Vec<TleRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut records = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !lines[i].starts_with("1 ")
            && !lines[i].starts_with("2 ")
            && i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            records.push(TleRecord {
                name: lines[i].to_string(),
                tle1: lines[i + 1].to_string(),
                tle2: lines[i + 2].to_string(),
            });
            i += 3;
        } else {
            i += 1;
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_line_groups() {
        let text = "ISS (ZARYA)\n\
            1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927\n\
            2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537\n";
        let records = parse_tle_text(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ISS (ZARYA)");
        assert!(records[0].tle1.starts_with("1 25544"));
    }

    #[test]
    fn skips_stray_lines() {
        let text = "stray header\nISS (ZARYA)\n\
            1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927\n\
            2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537\n\
            trailing garbage";
        let records = parse_tle_text(text);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse_tle_text("").is_empty());
    }
}
