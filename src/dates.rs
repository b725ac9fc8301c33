use std::sync::LazyLock;

use jiff::civil::Date;
use regex::Regex;
use tracing::trace;

/// Accepted date layouts, in the order they are tried.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DateFormat {
    Year,
    YearMonth,
    YearMonthDay,
    MonthYear,
    DayMonthYear,
}

impl DateFormat {
    pub const ALL: [DateFormat; 5] = [
        DateFormat::Year,
        DateFormat::YearMonth,
        DateFormat::YearMonthDay,
        DateFormat::MonthYear,
        DateFormat::DayMonthYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DateFormat::Year => "YYYY",
            DateFormat::YearMonth => "YYYY-MM",
            DateFormat::YearMonthDay => "YYYY-MM-DD",
            DateFormat::MonthYear => "MM-YYYY",
            DateFormat::DayMonthYear => "DD-MM-YYYY",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Year => r"^(?P<y>[0-9]{4})$",
            DateFormat::YearMonth => r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{2})$",
            DateFormat::YearMonthDay => r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{2})-(?P<d>[0-9]{2})$",
            DateFormat::MonthYear => r"^(?P<m>[0-9]{2})-(?P<y>[0-9]{4})$",
            DateFormat::DayMonthYear => r"^(?P<d>[0-9]{2})-(?P<m>[0-9]{2})-(?P<y>[0-9]{4})$",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DateParseError {
    #[error(
        "invalid date format {0:?}, accepted formats: YYYY, YYYY-MM, YYYY-MM-DD, MM-YYYY, DD-MM-YYYY"
    )]
    UnknownFormat(String),
    #[error("{input:?} looks like {format} but is not a valid date")]
    OutOfRange { input: String, format: &'static str },
}

static SHAPES: LazyLock<Vec<(DateFormat, Regex)>> = LazyLock::new(|| {
    DateFormat::ALL.iter().map(|&format| (format, Regex::new(format.pattern()).unwrap())).collect()
});

/// Parses a date in any of the [`DateFormat`] layouts. The first layout whose
/// shape matches wins; a missing month or day defaults to 1.
pub fn parse_flexible(input: &str) -> Result<Date, DateParseError> {
    let Some((format, caps)) =
        SHAPES.iter().find_map(|(format, re)| re.captures(input).map(|caps| (*format, caps)))
    else {
        return Err(DateParseError::UnknownFormat(input.to_string()));
    };

    trace!(input = %input, format = format.label(), "matched date format");

    let out_of_range =
        || DateParseError::OutOfRange { input: input.to_string(), format: format.label() };
    let part = |name: &str| -> Result<i16, DateParseError> {
        match caps.name(name) {
            Some(m) => m.as_str().parse().map_err(|_| out_of_range()),
            None => Ok(1),
        }
    };

    let year = part("y")?;
    let month = i8::try_from(part("m")?).map_err(|_| out_of_range())?;
    let day = i8::try_from(part("d")?).map_err(|_| out_of_range())?;

    Date::new(year, month, day).map_err(|_| out_of_range())
}
