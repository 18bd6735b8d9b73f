//! Shared wire types and serde helpers.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// `{success, data}` wrapper returned by the live chat endpoints.
///
/// `success: false` is not an error on its own; the data is simply absent.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, logging unsuccessful envelopes.
    pub fn into_data(self, path: &str) -> Option<T> {
        if !self.success {
            tracing::debug!(path, "API envelope reported success=false");
        }
        self.data
    }
}

/// Deserializes `null` as the type's default value.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Formats a date filter as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD HH:MM:SS` timestamps used by the SMTP endpoints.
///
/// Missing, `null` or empty values decode to `None`. RFC 3339 is accepted
/// as a fallback.
pub mod api_datetime {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s).map(Some).map_err(de::Error::custom),
        }
    }

    fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT).or_else(|err| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .map_err(|_| err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Stamped {
        #[serde(default, with = "api_datetime")]
        date: Option<NaiveDateTime>,
        #[serde(default, deserialize_with = "null_default")]
        tags: Vec<String>,
    }

    #[test]
    fn envelope_with_data() {
        let env: Envelope<Vec<i32>> =
            serde_json::from_value(json!({"success": true, "data": [1, 2]})).unwrap();
        assert_eq!(env.into_data("/x"), Some(vec![1, 2]));
    }

    #[test]
    fn envelope_unsuccessful_without_data() {
        let env: Envelope<Vec<i32>> = serde_json::from_value(json!({"success": false})).unwrap();
        assert!(!env.success);
        assert_eq!(env.into_data("/x"), None);

        let env: Envelope<Vec<i32>> =
            serde_json::from_value(json!({"success": true, "data": null})).unwrap();
        assert_eq!(env.into_data("/x"), None);
    }

    #[test]
    fn api_datetime_parsing() {
        let s: Stamped = serde_json::from_value(json!({"date": "2024-03-05 14:07:09"})).unwrap();
        assert_eq!(
            s.date.unwrap().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2024-03-05T14:07:09"
        );

        let s: Stamped = serde_json::from_value(json!({"date": "2024-03-05T14:07:09Z"})).unwrap();
        assert!(s.date.is_some());

        for empty in [json!({"date": ""}), json!({"date": null}), json!({})] {
            let s: Stamped = serde_json::from_value(empty).unwrap();
            assert!(s.date.is_none());
        }

        assert!(serde_json::from_value::<Stamped>(json!({"date": "yesterday"})).is_err());
    }

    #[test]
    fn api_datetime_serializes_in_api_format() {
        let date = NaiveDateTime::parse_from_str("2024-03-05 14:07:09", api_datetime::FORMAT).unwrap();
        let json = serde_json::to_value(Stamped {
            date: Some(date),
            tags: vec![],
        })
        .unwrap();
        assert_eq!(json["date"], "2024-03-05 14:07:09");
    }

    #[test]
    fn null_collections_decode_empty() {
        let s: Stamped = serde_json::from_value(json!({"tags": null})).unwrap();
        assert!(s.tags.is_empty());
    }

    #[test]
    fn date_filter_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(format_date(date), "2024-01-09");
    }
}
