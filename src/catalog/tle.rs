use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::{CatalogError, ValidationError};

const TLE_LINE_LENGTH: usize = 69;

/// A validated two-line element set. Construction trims and checks both
/// lines; a record that fails any check is never stored half-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoLineElement {
    line1: String,
    line2: String,
}

impl TwoLineElement {
    pub fn new(line1: &str, line2: &str) -> Result<Self, ValidationError> {
        let line1 = line1.trim();
        let line2 = line2.trim();

        validate_line(line1, 1, '1')?;
        validate_line(line2, 2, '2')?;

        Ok(Self {
            line1: line1.to_string(),
            line2: line2.to_string(),
        })
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> &str {
        &self.line2
    }

    /// Parse the element set with sgp4, yielding the derived quantities
    /// (epoch, mean motion, eccentricity, inclination, RAAN, argument of
    /// perigee, mean anomaly, drag term).
    pub fn elements(&self) -> Result<sgp4::Elements, CatalogError> {
        sgp4::Elements::from_tle(None, self.line1.as_bytes(), self.line2.as_bytes())
            .map_err(|e| CatalogError::Elements(e.to_string()))
    }

    /// True when the element-set epoch is within `max_age_days` of `now`.
    /// Old element sets still propagate; this only drives a warning count.
    pub fn is_recent(&self, now: DateTime<Utc>, max_age_days: i64) -> bool {
        match self.elements() {
            Ok(elements) => {
                let age = now.naive_utc().signed_duration_since(elements.datetime);
                age.num_days().abs() <= max_age_days
            }
            Err(_) => false,
        }
    }
}

fn validate_line(line: &str, number: u8, expected_prefix: char) -> Result<(), ValidationError> {
    if line.is_empty() {
        return Err(ValidationError::EmptyLine(number));
    }
    if !line.starts_with(expected_prefix) {
        return Err(ValidationError::BadPrefix {
            line: number,
            expected: expected_prefix,
        });
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(ValidationError::BadLength {
            line: number,
            length: line.len(),
        });
    }
    Ok(())
}

/// Where a satellite entered the system from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Catalog,
}

/// An ingested satellite. Immutable after creation; the catalog set is
/// replaced wholesale on the next refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Satellite {
    pub name: String,
    pub tle: TwoLineElement,
    pub origin: Origin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    #[test]
    fn accepts_valid_lines_and_trims() {
        let tle = TwoLineElement::new(&format!("  {ISS_LINE1}  "), ISS_LINE2).unwrap();
        assert_eq!(tle.line1(), ISS_LINE1);
        assert_eq!(tle.line2(), ISS_LINE2);
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(
            TwoLineElement::new("", ISS_LINE2).unwrap_err(),
            ValidationError::EmptyLine(1)
        );
        assert_eq!(
            TwoLineElement::new(ISS_LINE1, "   ").unwrap_err(),
            ValidationError::EmptyLine(2)
        );
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert_eq!(
            TwoLineElement::new(ISS_LINE2, ISS_LINE2).unwrap_err(),
            ValidationError::BadPrefix {
                line: 1,
                expected: '1'
            }
        );
        assert_eq!(
            TwoLineElement::new(ISS_LINE1, ISS_LINE1).unwrap_err(),
            ValidationError::BadPrefix {
                line: 2,
                expected: '2'
            }
        );
    }

    #[test]
    fn rejects_wrong_length() {
        let short = &ISS_LINE1[..68];
        assert_eq!(
            TwoLineElement::new(short, ISS_LINE2).unwrap_err(),
            ValidationError::BadLength {
                line: 1,
                length: 68
            }
        );
        let long = format!("{ISS_LINE2}0");
        assert_eq!(
            TwoLineElement::new(ISS_LINE1, &long).unwrap_err(),
            ValidationError::BadLength {
                line: 2,
                length: 70
            }
        );
    }

    #[test]
    fn derives_elements() {
        let tle = TwoLineElement::new(ISS_LINE1, ISS_LINE2).unwrap();
        let elements = tle.elements().unwrap();
        assert_eq!(elements.norad_id, 25544);
        assert!((elements.inclination - 51.6416).abs() < 1e-6);
        assert!((elements.mean_motion - 15.72125391).abs() < 1e-6);
    }

    #[test]
    fn staleness_check() {
        let tle = TwoLineElement::new(ISS_LINE1, ISS_LINE2).unwrap();
        let epoch_day = chrono::Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap();
        assert!(tle.is_recent(epoch_day, 20));
        let much_later = chrono::Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        assert!(!tle.is_recent(much_later, 20));
    }
}
