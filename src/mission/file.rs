//! Waypoint file parsing.
//!
//! Parses the QGroundControl waypoint file format: one header line naming
//! the format version, then one tab-separated record per waypoint:
//!
//! ```text
//! index  current  frame  command  param1..param7  autocontinue
//! ```
//!
//! `param5`/`param6`/`param7` carry latitude, longitude, and altitude. The
//! record at index 0 is the home position and is dropped, since it is never
//! part of the flown mission.

use crate::error::RelayError;
use crate::mission::Waypoint;

/// Header required on the first line of a mission file.
const SUPPORTED_VERSION: &str = "QGC WPL 110";

/// Fields per waypoint record.
const FIELD_COUNT: usize = 12;

/// Parse mission file content into waypoints.
///
/// A header not matching the supported version string is fatal for the
/// whole file; the caller keeps its previous mission. Returns waypoints in
/// file order with the home record (index 0) removed.
pub fn parse_mission_file(content: &str) -> Result<Vec<Waypoint>, RelayError> {
    let mut lines = content.lines();

    let header = lines.next().unwrap_or("");
    if !header.starts_with(SUPPORTED_VERSION) {
        return Err(RelayError::UnsupportedMissionVersion(header.to_string()));
    }

    let mut waypoints = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_no = i + 2; // 1-based, after the header
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < FIELD_COUNT {
            return Err(RelayError::MissionParse {
                line: line_no,
                reason: format!("expected {FIELD_COUNT} fields, got {}", fields.len()),
            });
        }

        let index = parse_field::<u16>(fields[0], line_no, "index")?;
        let command = parse_field::<u16>(fields[3], line_no, "command")?;
        let latitude = parse_field::<f64>(fields[8], line_no, "latitude")?;
        let longitude = parse_field::<f64>(fields[9], line_no, "longitude")?;
        let altitude = parse_field::<f64>(fields[10], line_no, "altitude")?;
        let autocontinue = parse_field::<u8>(fields[11].trim(), line_no, "autocontinue")? != 0;

        // Home position lives at index 0 and is never flown
        if index == 0 {
            continue;
        }

        waypoints.push(Waypoint {
            index,
            latitude,
            longitude,
            altitude,
            command,
            autocontinue,
        });
    }

    Ok(waypoints)
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    line: usize,
    name: &str,
) -> Result<T, RelayError> {
    raw.parse().map_err(|_| RelayError::MissionParse {
        line,
        reason: format!("invalid {name}: {raw:?}"),
    })
}
