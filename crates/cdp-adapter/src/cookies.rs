//! Netscape-style cookie records supplied with a login request.

use chromiumoxide::cdp::browser_protocol::network::SetCookieParams;
use tracing::debug;

/// Minimum number of tab-separated fields in a usable record.
pub const MIN_FIELDS: usize = 7;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CookieRecord {
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub name: String,
    pub value: String,
}

impl CookieRecord {
    /// Parses `domain, _, path, secure, expiry, name, value`. Expiry is ignored; the
    /// cookie lives for the browser session only.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < MIN_FIELDS {
            return None;
        }
        Some(Self {
            domain: parts[0].to_string(),
            path: parts[2].to_string(),
            secure: parts[3] == "TRUE",
            name: parts[5].to_string(),
            value: parts[6].to_string(),
        })
    }

    /// `Network.setCookie` command installing this record.
    pub fn to_command(&self) -> Result<SetCookieParams, String> {
        SetCookieParams::builder()
            .name(self.name.clone())
            .value(self.value.clone())
            .domain(self.domain.clone())
            .path(self.path.clone())
            .secure(self.secure)
            .build()
    }
}

/// Parses every usable record, skipping short ones.
pub fn parse_records(lines: &[String]) -> Vec<CookieRecord> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let record = CookieRecord::parse(line);
            if record.is_none() {
                debug!(index, "skipping cookie record with too few fields");
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seven_field_record() {
        let record =
            CookieRecord::parse(".example.com\tTRUE\t/\tTRUE\t1735689600\tSID\tabc").unwrap();
        assert_eq!(
            record,
            CookieRecord {
                domain: ".example.com".into(),
                path: "/".into(),
                secure: true,
                name: "SID".into(),
                value: "abc".into(),
            }
        );
    }

    #[test]
    fn secure_flag_must_be_exact_true() {
        let record = CookieRecord::parse("a.com\tFALSE\t/app\ttrue\t0\tk\tv").unwrap();
        assert!(!record.secure);
        assert_eq!(record.path, "/app");
    }

    #[test]
    fn short_records_are_skipped_not_rejected() {
        let lines = vec![
            "a.com\tTRUE\t/\tTRUE\t0\tk".to_string(),
            "b.com\tTRUE\t/\tFALSE\t0\tk\tv".to_string(),
            String::new(),
        ];
        let records = parse_records(&lines);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].domain, "b.com");
    }

    #[test]
    fn record_converts_to_set_cookie_command() {
        let record = CookieRecord::parse("a.com\tTRUE\t/\tTRUE\t0\tk\tv").unwrap();
        let param = record.to_command().unwrap();
        assert_eq!(param.name, "k");
        assert_eq!(param.value, "v");
        assert_eq!(param.domain.as_deref(), Some("a.com"));
        assert_eq!(param.secure, Some(true));
    }
}
