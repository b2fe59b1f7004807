use once_cell::sync::Lazy;
use regex::Regex;

static TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\*)|([0-9]+|[a-z]{3})(?:-([0-9]+|[a-z]{3}))?)(?:/([0-9]+))?$").expect("valid regex")
});

const MONTH_NAMES: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const WEEKDAY_NAMES: &[&str] = &["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        Self::Minute,
        Self::Hour,
        Self::DayOfMonth,
        Self::Month,
        Self::DayOfWeek,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
        }
    }

    // Inclusive. Day-of-week accepts 7 as a second spelling of Sunday.
    fn bounds(self) -> (u32, u32) {
        match self {
            Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            Self::DayOfWeek => (0, 7),
        }
    }

    fn names(self) -> Option<(&'static [&'static str], u32)> {
        match self {
            Self::Month => Some((MONTH_NAMES, 1)),
            Self::DayOfWeek => Some((WEEKDAY_NAMES, 0)),
            _ => None,
        }
    }

    fn value(self, token: &str) -> Result<u32, String> {
        if let Ok(number) = token.parse::<u32>() {
            let (low, high) = self.bounds();
            if number < low || number > high {
                return Err(format!("value {} out of range {}-{}", number, low, high));
            }
            return Ok(number);
        }
        self.names()
            .and_then(|(names, offset)| {
                names
                    .iter()
                    .position(|name| *name == token)
                    .map(|index| index as u32 + offset)
            })
            .ok_or_else(|| format!("unknown value '{}'", token))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronField {
    bits: u64,
    restricted: bool,
}

impl CronField {
    pub fn parse(kind: FieldKind, text: &str) -> Result<Self, String> {
        let text = text.to_ascii_lowercase();
        let mut bits = 0u64;
        for term in text.split(',') {
            bits |= parse_term(kind, term)?;
        }
        if kind == FieldKind::DayOfWeek && bits & (1 << 7) != 0 {
            bits = (bits & !(1 << 7)) | 1;
        }
        Ok(Self {
            bits,
            // Conventional cron treats a field as unrestricted only when it
            // starts with `*`, which matters for the day-of-month/day-of-week OR.
            restricted: !text.starts_with('*'),
        })
    }

    pub fn contains(self, value: u32) -> bool {
        value < 64 && self.bits & (1 << value) != 0
    }

    pub fn is_restricted(self) -> bool {
        self.restricted
    }

    pub fn values(self) -> impl Iterator<Item = u32> {
        (0..64u32).filter(move |value| self.contains(*value))
    }

    pub fn min(self) -> Option<u32> {
        self.values().next()
    }
}

fn parse_term(kind: FieldKind, term: &str) -> Result<u64, String> {
    let captures = TERM
        .captures(term)
        .ok_or_else(|| format!("malformed term '{}'", term))?;
    let (low, high) = kind.bounds();

    let step = match captures.get(4) {
        Some(step) => step
            .as_str()
            .parse::<u32>()
            .map_err(|_| format!("step '{}' is not a number", step.as_str()))?,
        None => 1,
    };
    if step == 0 {
        return Err(format!("zero step in '{}'", term));
    }

    let (start, end) = if captures.get(1).is_some() {
        let high = if kind == FieldKind::DayOfWeek { 6 } else { high };
        (low, high)
    } else {
        let start = captures
            .get(2)
            .map(|m| kind.value(m.as_str()))
            .transpose()?
            .ok_or_else(|| format!("malformed term '{}'", term))?;
        match captures.get(3) {
            Some(end) => (start, kind.value(end.as_str())?),
            None if captures.get(4).is_some() => (start, high),
            None => (start, start),
        }
    };
    if start > end {
        return Err(format!("reversed range {}-{}", start, end));
    }

    let mut bits = 0u64;
    let mut value = start;
    while value <= end {
        bits |= 1 << value;
        let Some(next) = value.checked_add(step) else {
            break;
        };
        value = next;
    }
    Ok(bits)
}
