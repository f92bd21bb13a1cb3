use chrono::{
  DateTime,
  Local,
  SubsecRound,
  Utc
};

/// Timestamps are persisted with millisecond precision, so values held in
/// memory are truncated to match what a reload would produce.
pub fn to_stored_precision(
  dt: DateTime<Utc>
) -> DateTime<Utc> {
  dt.trunc_subsecs(3)
}

pub fn format_age(
  created_at: DateTime<Utc>,
  now: DateTime<Utc>
) -> String {
  let elapsed = now - created_at;
  let seconds = elapsed.num_seconds();

  if seconds < 60 {
    "just now".to_string()
  } else if seconds < 60 * 60 {
    format!("{}m ago", elapsed.num_minutes())
  } else if seconds < 24 * 60 * 60 {
    format!("{}h ago", elapsed.num_hours())
  } else if elapsed.num_days() < 7 {
    format!("{}d ago", elapsed.num_days())
  } else {
    created_at
      .with_timezone(&Local)
      .format("%Y-%m-%d")
      .to_string()
  }
}

/// Serde adapter for `createdAt`.
///
/// Writes RFC 3339 UTC with milliseconds (`2026-10-19T08:30:00.000Z`).
/// Years outside 0000-9999 have no RFC 3339 form and are written as an
/// integer count of epoch milliseconds instead.
/// Reads any RFC 3339 string or an integer count of epoch milliseconds.
pub mod created_at_serde {
  use chrono::{
    DateTime,
    Datelike,
    Utc
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  const STORED_FORMAT: &str =
    "%Y-%m-%dT%H:%M:%S%.3fZ";

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawTimestamp {
    Text(String),
    Millis(i64)
  }

  pub fn serialize<S>(
    dt: &DateTime<Utc>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    if (0..=9999).contains(&dt.year()) {
      serializer.serialize_str(
        &dt
          .format(STORED_FORMAT)
          .to_string()
      )
    } else {
      serializer.serialize_i64(
        dt.timestamp_millis()
      )
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<DateTime<Utc>, D::Error>
  where
    D: Deserializer<'de>
  {
    match RawTimestamp::deserialize(
      deserializer
    )? {
      | RawTimestamp::Text(raw) => {
        DateTime::parse_from_rfc3339(
          raw.trim()
        )
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
      }
      | RawTimestamp::Millis(ms) => {
        DateTime::from_timestamp_millis(ms)
          .ok_or_else(|| {
            serde::de::Error::custom(
              format!(
                "timestamp out of range: \
                 {ms}"
              )
            )
          })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Duration,
    TimeZone,
    Utc
  };
  use serde::{
    Deserialize,
    Serialize
  };

  use super::{
    created_at_serde,
    format_age,
    to_stored_precision
  };

  #[derive(Serialize, Deserialize)]
  struct Stamped {
    #[serde(with = "created_at_serde")]
    at: chrono::DateTime<Utc>
  }

  #[test]
  fn writes_millisecond_utc() {
    let at = Utc
      .with_ymd_and_hms(
        2026, 10, 19, 8, 30, 0
      )
      .single()
      .expect("valid time");
    let json =
      serde_json::to_string(&Stamped {
        at
      })
      .expect("serialize");
    assert_eq!(
      json,
      r#"{"at":"2026-10-19T08:30:00.000Z"}"#
    );
  }

  #[test]
  fn reads_offset_and_epoch_millis() {
    let from_offset: Stamped =
      serde_json::from_str(
        r#"{"at":"2026-10-19T10:30:00+02:00"}"#
      )
      .expect("offset timestamp");
    let from_millis: Stamped =
      serde_json::from_str(
        r#"{"at":1792398600000}"#
      )
      .expect("epoch millis");

    let expected = Utc
      .with_ymd_and_hms(
        2026, 10, 19, 8, 30, 0
      )
      .single()
      .expect("valid time");
    assert_eq!(from_offset.at, expected);
    assert_eq!(
      from_millis.at.timestamp_millis(),
      1_792_398_600_000
    );
  }

  #[test]
  fn years_past_9999_roundtrip_as_millis()
  {
    let last_text = 253_402_300_799_999;
    let first_millis = last_text + 1;

    for (ms, expected_json) in [
      (
        last_text,
        r#"{"at":"9999-12-31T23:59:59.999Z"}"#
          .to_string()
      ),
      (
        first_millis,
        format!(r#"{{"at":{first_millis}}}"#)
      ),
      (
        -62_167_219_200_001,
        r#"{"at":-62167219200001}"#
          .to_string()
      ),
    ] {
      let at = chrono::DateTime::from_timestamp_millis(ms)
        .expect("in chrono range");
      let json =
        serde_json::to_string(&Stamped {
          at
        })
        .expect("serialize");
      assert_eq!(json, expected_json);

      let back: Stamped =
        serde_json::from_str(&json)
          .expect("reads back");
      assert_eq!(back.at, at);
    }
  }

  #[test]
  fn rejects_garbage() {
    let parsed =
      serde_json::from_str::<Stamped>(
        r#"{"at":"yesterday"}"#
      );
    assert!(parsed.is_err());
  }

  #[test]
  fn truncates_to_millis() {
    let at = Utc
      .timestamp_opt(10, 123_456_789)
      .single()
      .expect("valid time");
    assert_eq!(
      to_stored_precision(at)
        .timestamp_subsec_nanos(),
      123_000_000
    );
  }

  #[test]
  fn ages_read_naturally() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 10, 19, 12, 0, 0
      )
      .single()
      .expect("valid now");
    assert_eq!(
      format_age(now, now),
      "just now"
    );
    assert_eq!(
      format_age(
        now - Duration::minutes(5),
        now
      ),
      "5m ago"
    );
    assert_eq!(
      format_age(
        now - Duration::hours(3),
        now
      ),
      "3h ago"
    );
    assert_eq!(
      format_age(
        now - Duration::days(2),
        now
      ),
      "2d ago"
    );
  }
}
