use crate::errors::{AppError, AppResult};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// An employee as seen by the engine: read-only, owned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub device_id: String,
    #[serde(default)]
    pub name: String,
    /// IANA zone name; `None` falls back to the organisation zone.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Shared weekly calendar used when the person has no own entry for a weekday.
    #[serde(default)]
    pub calendar_id: Option<String>,
}

impl Person {
    pub fn new(id: &str, device_id: &str) -> Self {
        Self {
            id: id.to_string(),
            device_id: device_id.to_string(),
            name: String::new(),
            timezone: None,
            calendar_id: None,
        }
    }

    pub fn with_timezone(mut self, tz: &str) -> Self {
        self.timezone = Some(tz.to_string());
        self
    }

    pub fn with_calendar(mut self, calendar_id: &str) -> Self {
        self.calendar_id = Some(calendar_id.to_string());
        self
    }

    /// Person zone → organisation zone → UTC.
    ///
    /// An unparsable person zone is an error rather than a silent fallback,
    /// otherwise every punch of that person would be shifted.
    pub fn zone(&self, org_default: Option<Tz>) -> AppResult<Tz> {
        match self.timezone.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => parse_tz(name),
            _ => Ok(org_default.unwrap_or(Tz::UTC)),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

pub fn parse_tz(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_falls_back_to_org_then_utc() {
        let p = Person::new("p1", "111");
        assert_eq!(p.zone(None).unwrap(), Tz::UTC);
        assert_eq!(
            p.zone(Some(chrono_tz::Asia::Muscat)).unwrap(),
            chrono_tz::Asia::Muscat
        );

        let p = p.with_timezone("Europe/Rome");
        assert_eq!(
            p.zone(Some(chrono_tz::Asia::Muscat)).unwrap(),
            chrono_tz::Europe::Rome
        );
    }

    #[test]
    fn bad_zone_is_reported() {
        let p = Person::new("p1", "111").with_timezone("Mars/Olympus");
        assert!(matches!(p.zone(None), Err(AppError::InvalidTimezone(_))));
    }
}
