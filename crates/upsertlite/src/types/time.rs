//! Conversions between `time` types and SQL TEXT in the formats understood by SQLite's date and
//! time functions.
use std::borrow::Cow;

use time::format_description::{FormatItem, well_known::Rfc3339};
use time::macros::format_description as fd;
pub use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::{StorageValue, decode::Decode, encode::Encode, error::ConversionError};

use super::mismatch;

const DATE: &[FormatItem<'static>] = fd!("[year]-[month]-[day]");
const TIME: &[FormatItem<'static>] = fd!("[hour]:[minute]:[second].[subsecond]");
const DATETIME: &[FormatItem<'static>] =
    fd!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");

const TIME_INPUTS: &[&[FormatItem<'static>]] = &[
    TIME,
    fd!("[hour]:[minute]:[second]"),
    fd!("[hour]:[minute]"),
];

const DATETIME_INPUTS: &[&[FormatItem<'static>]] = &[
    DATETIME,
    fd!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    fd!("[year]-[month]-[day] [hour]:[minute]"),
    fd!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    fd!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    fd!("[year]-[month]-[day]T[hour]:[minute]"),
];

const OFFSET_DATETIME_INPUTS: &[&[FormatItem<'static>]] = &[
    fd!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"),
    fd!("[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"),
    fd!("[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"),
];

fn format_text(
    formatted: Result<String, time::error::Format>,
    type_name: &'static str,
) -> Result<StorageValue<'static>, ConversionError> {
    formatted
        .map(|s| StorageValue::Text(Cow::Owned(s)))
        .map_err(|e| ConversionError::Custom(format!("failed to format {type_name}: {e}")))
}

/// Text or a unix timestamp, the two representations SQLite's date functions produce.
enum Moment<'r> {
    Text(Cow<'r, str>),
    Unix(i64),
}

fn moment<'r>(value: StorageValue<'r>, type_name: &'static str) -> Result<Moment<'r>, ConversionError> {
    match value {
        StorageValue::Text(s) => Ok(Moment::Text(s)),
        StorageValue::Int(v) => Ok(Moment::Unix(i64::from(v))),
        StorageValue::Int64(v) => Ok(Moment::Unix(v)),
        other => Err(mismatch(&other, type_name)),
    }
}

fn from_unix(ts: i64, type_name: &'static str) -> Result<OffsetDateTime, ConversionError> {
    OffsetDateTime::from_unix_timestamp(ts).map_err(|_| ConversionError::out_of_range(type_name, ts))
}

fn first_match<T>(
    input: &str,
    formats: &[&[FormatItem<'static>]],
    parse: impl Fn(&str, &[FormatItem<'static>]) -> Result<T, time::error::Parse>,
) -> Option<T> {
    formats.iter().find_map(|f| parse(input, *f).ok())
}

fn parse_datetime(input: &str) -> Option<PrimitiveDateTime> {
    first_match(input, DATETIME_INPUTS, |s, f| PrimitiveDateTime::parse(s, f))
}

fn parse_offset_datetime(input: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(input, &Rfc3339)
        .ok()
        .or_else(|| first_match(input, OFFSET_DATETIME_INPUTS, |s, f| OffsetDateTime::parse(s, f)))
        .or_else(|| parse_datetime(input).map(PrimitiveDateTime::assume_utc))
}

impl Encode for OffsetDateTime {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        format_text(self.format(&Rfc3339), "OffsetDateTime")
    }
}

impl Encode for PrimitiveDateTime {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        format_text(self.format(DATETIME), "PrimitiveDateTime")
    }
}

impl Encode for Date {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        format_text(self.format(DATE), "Date")
    }
}

impl Encode for Time {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        format_text(self.format(TIME), "Time")
    }
}

impl<'r> Decode<'r> for OffsetDateTime {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match moment(value, "OffsetDateTime")? {
            Moment::Unix(ts) => from_unix(ts, "OffsetDateTime"),
            Moment::Text(s) => parse_offset_datetime(&s)
                .ok_or_else(|| format!("invalid offset datetime: {s}").into()),
        }
    }
}

impl<'r> Decode<'r> for PrimitiveDateTime {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match moment(value, "PrimitiveDateTime")? {
            Moment::Unix(ts) => {
                let dt = from_unix(ts, "PrimitiveDateTime")?;
                Ok(PrimitiveDateTime::new(dt.date(), dt.time()))
            }
            Moment::Text(s) => {
                parse_datetime(&s).ok_or_else(|| format!("invalid datetime: {s}").into())
            }
        }
    }
}

impl<'r> Decode<'r> for Date {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match value {
            StorageValue::Text(s) => {
                Date::parse(&s, DATE).map_err(|e| ConversionError::Custom(e.to_string()))
            }
            other => Err(mismatch(&other, "Date")),
        }
    }
}

impl<'r> Decode<'r> for Time {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match value {
            StorageValue::Text(s) => first_match(&s, TIME_INPUTS, |text, f| Time::parse(text, f))
                .ok_or_else(|| format!("invalid time: {s}").into()),
            other => Err(mismatch(&other, "Time")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn offset_datetime_keeps_offset() {
        let dt = datetime!(2023-12-25 15:30:45.123456789 +05:30);
        let decoded = OffsetDateTime::decode(dt.encode().unwrap()).unwrap();
        assert_eq!(dt, decoded);
    }

    #[test]
    fn offset_datetime_from_unix_timestamp() {
        let ts = 1703516445i64;
        let decoded = OffsetDateTime::decode(StorageValue::Int64(ts)).unwrap();
        assert_eq!(decoded, OffsetDateTime::from_unix_timestamp(ts).unwrap());
    }

    #[test]
    fn offset_datetime_text_formats() {
        let cases = [
            ("2023-12-25T15:30:45.123Z", datetime!(2023-12-25 15:30:45.123 UTC)),
            ("2023-12-25 15:30:45.123", datetime!(2023-12-25 15:30:45.123 UTC)),
            ("2023-12-25 15:30:45+05:30", datetime!(2023-12-25 15:30:45 +05:30)),
        ];
        for (text, expected) in cases {
            let decoded = OffsetDateTime::decode(StorageValue::from(text)).unwrap();
            assert_eq!(decoded, expected, "{text}");
        }
        assert!(OffsetDateTime::decode(StorageValue::from("2023-12-2515:30:45+05:30")).is_err());
    }

    #[test]
    fn primitive_datetime_round_trip() {
        let dt = datetime!(2023-12-25 15:30:45.123456789);
        assert_eq!(PrimitiveDateTime::decode(dt.encode().unwrap()).unwrap(), dt);
        let t_separated = PrimitiveDateTime::decode(StorageValue::from("2023-12-25T15:30")).unwrap();
        assert_eq!(t_separated, datetime!(2023-12-25 15:30));
    }

    #[test]
    fn date_and_time_round_trip() {
        let d = date!(2023 - 12 - 25);
        assert_eq!(Date::decode(d.encode().unwrap()).unwrap(), d);
        let t = time!(15:30:45.123456789);
        assert_eq!(Time::decode(t.encode().unwrap()).unwrap(), t);
        assert_eq!(Time::decode(StorageValue::from("15:30")).unwrap(), time!(15:30));
    }

    #[test]
    fn null_time_is_unexpected() {
        assert!(matches!(
            Time::decode(StorageValue::Null),
            Err(ConversionError::UnexpectedNull { type_name: "Time" })
        ));
    }
}
