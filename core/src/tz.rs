//! POSIX timezone offset rules
//!
//! Parses and applies a single preconfigured rule of the
//! `STD offset [DST [offset]][,start,end]` form, e.g.
//! `EST5EDT,M3.2.0,M11.1.0` for America/Toronto. Only the `Mm.w.d[/time]`
//! transition syntax is supported; Julian-day transitions are rejected.
//! There is deliberately no timezone database here.
//!
//! Offsets follow POSIX sign conventions: positive values are west of UTC,
//! so `local = utc - offset`.

use core::fmt::Write as _;

use crate::calendar::{days_from_civil, days_in_month, weekday_from_days, DateTime};

/// Transition time when the rule does not carry a `/time` suffix.
const DEFAULT_TRANSITION_SECS: u32 = 2 * 3_600;

/// Rule parsing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TzError {
    /// Empty rule string.
    Empty,
    /// Zone abbreviation missing or shorter than three characters.
    BadName,
    /// Offset missing or out of range.
    BadOffset,
    /// Malformed `Mm.w.d` transition.
    BadTransition,
    /// Julian-day (`Jn` / `n`) transition syntax.
    UnsupportedTransition,
    /// A DST name without transition rules.
    MissingTransitions,
    /// Leftover characters after a complete rule.
    TrailingInput,
}

impl core::fmt::Display for TzError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty rule"),
            Self::BadName => write!(f, "bad zone abbreviation"),
            Self::BadOffset => write!(f, "bad UTC offset"),
            Self::BadTransition => write!(f, "bad transition rule"),
            Self::UnsupportedTransition => write!(f, "unsupported transition syntax"),
            Self::MissingTransitions => write!(f, "DST zone without transition rules"),
            Self::TrailingInput => write!(f, "trailing characters"),
        }
    }
}

impl core::error::Error for TzError {}

/// One `Mm.w.d[/time]` transition: week `w` (5 = last) occurrence of
/// weekday `d` (0 = Sunday) in month `m`, at `time_secs` past local
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub month: u8,
    pub week: u8,
    pub weekday: u8,
    pub time_secs: u32,
}

impl Transition {
    /// The transition instant for `year`, as seconds since the epoch on
    /// the local wall clock that prevails just before the switch.
    fn wall_secs(&self, year: u16) -> i64 {
        let day = nth_weekday(year, self.month, self.week, self.weekday);
        days_from_civil(year, self.month, day) * 86_400 + self.time_secs as i64
    }
}

/// Calendar day of the `week`-th `weekday` of a month; week 5 means the
/// last occurrence.
fn nth_weekday(year: u16, month: u8, week: u8, weekday: u8) -> u8 {
    let first = weekday_from_days(days_from_civil(year, month, 1));
    let mut day = 1 + (weekday + 7 - first) % 7 + (week - 1) * 7;
    let len = days_in_month(year, month);
    while day > len {
        day -= 7;
    }
    day
}

/// Daylight-saving half of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DstRule<'a> {
    pub abbr: &'a str,
    /// Seconds west of UTC while DST is active.
    pub offset_secs: i32,
    pub start: Transition,
    pub end: Transition,
}

/// A parsed POSIX timezone rule. Borrows its abbreviations from the
/// configuration string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TzRule<'a> {
    pub std_abbr: &'a str,
    /// Seconds west of UTC in standard time.
    pub std_offset_secs: i32,
    pub dst: Option<DstRule<'a>>,
}

impl<'a> TzRule<'a> {
    /// Parse a rule string.
    pub fn parse(rule: &'a str) -> Result<Self, TzError> {
        let mut cur = Cursor::new(rule);
        if cur.at_end() {
            return Err(TzError::Empty);
        }

        let std_abbr = parse_abbr(&mut cur)?.ok_or(TzError::BadName)?;
        let std_offset_secs = parse_offset(&mut cur)?.ok_or(TzError::BadOffset)?;

        let dst = match parse_abbr(&mut cur)? {
            Some(abbr) => {
                // A missing DST offset defaults to one hour ahead of
                // standard time.
                let offset_secs = parse_offset(&mut cur)?.unwrap_or(std_offset_secs - 3_600);
                if !cur.eat(b',') {
                    return Err(TzError::MissingTransitions);
                }
                let start = parse_transition(&mut cur)?;
                if !cur.eat(b',') {
                    return Err(TzError::MissingTransitions);
                }
                let end = parse_transition(&mut cur)?;
                Some(DstRule {
                    abbr,
                    offset_secs,
                    start,
                    end,
                })
            }
            None => None,
        };

        if !cur.at_end() {
            return Err(TzError::TrailingInput);
        }

        Ok(Self {
            std_abbr,
            std_offset_secs,
            dst,
        })
    }

    /// Whether daylight-saving time is in effect at a UTC instant.
    pub fn is_dst(&self, unix_secs: u64) -> bool {
        let Some(dst) = self.dst else {
            return false;
        };

        let utc = unix_secs as i64;
        // The year is taken from local standard time; real-world rules do
        // not place transitions close enough to New Year for the
        // approximation to matter.
        let local_std = (utc - self.std_offset_secs as i64).max(0) as u64;
        let year = DateTime::from_unix(local_std).year;

        // POSIX states the start rule in local standard time and the end
        // rule in local DST time.
        let start_utc = dst.start.wall_secs(year) + self.std_offset_secs as i64;
        let end_utc = dst.end.wall_secs(year) + dst.offset_secs as i64;

        if start_utc <= end_utc {
            utc >= start_utc && utc < end_utc
        } else {
            // Southern hemisphere: DST spans the year boundary.
            utc >= start_utc || utc < end_utc
        }
    }

    /// Offset (seconds west) and abbreviation in effect at a UTC instant.
    pub fn active_offset(&self, unix_secs: u64) -> (i32, &'a str) {
        match self.dst {
            Some(dst) if self.is_dst(unix_secs) => (dst.offset_secs, dst.abbr),
            _ => (self.std_offset_secs, self.std_abbr),
        }
    }

    /// Apply the rule: local civil time plus the active abbreviation.
    pub fn local_datetime(&self, unix_secs: u64) -> (DateTime, &'a str) {
        let (offset, abbr) = self.active_offset(unix_secs);
        let local = (unix_secs as i64 - offset as i64).max(0) as u64;
        (DateTime::from_unix(local), abbr)
    }
}

/// Render a UTC timestamp as a local clock string,
/// `YYYY-MM-DD HH:MM:SS ABBR`.
pub fn format_local(unix_secs: u64, rule: &TzRule<'_>) -> heapless::String<32> {
    let (dt, abbr) = rule.local_datetime(unix_secs);
    let mut out = heapless::String::new();
    let _ = write!(
        out,
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} {}",
        dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second, abbr
    );
    out
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn slice(&self, from: usize) -> &'a str {
        // The cursor only ever advances over single-byte characters.
        core::str::from_utf8(&self.bytes[from..self.pos]).unwrap_or("")
    }
}

/// A zone abbreviation: a run of letters, or anything between `<` and `>`.
/// Returns `None` when the cursor does not sit on one.
fn parse_abbr<'a>(cur: &mut Cursor<'a>) -> Result<Option<&'a str>, TzError> {
    if cur.eat(b'<') {
        let start = cur.pos;
        while let Some(b) = cur.peek() {
            if b == b'>' {
                let abbr = cur.slice(start);
                cur.bump();
                if abbr.len() < 3 {
                    return Err(TzError::BadName);
                }
                return Ok(Some(abbr));
            }
            cur.bump();
        }
        return Err(TzError::BadName);
    }

    let start = cur.pos;
    while let Some(b) = cur.peek() {
        if b.is_ascii_alphabetic() {
            cur.bump();
        } else {
            break;
        }
    }
    match cur.pos - start {
        0 => Ok(None),
        1 | 2 => Err(TzError::BadName),
        _ => Ok(Some(cur.slice(start))),
    }
}

/// An offset, `[+|-]h[:mm[:ss]]`, as signed seconds west of UTC. Returns
/// `None` when the cursor does not sit on one.
fn parse_offset(cur: &mut Cursor<'_>) -> Result<Option<i32>, TzError> {
    let sign = if cur.eat(b'-') {
        -1
    } else {
        cur.eat(b'+');
        1
    };

    let Some(hours) = parse_number(cur) else {
        return if sign < 0 { Err(TzError::BadOffset) } else { Ok(None) };
    };
    if hours > 24 {
        return Err(TzError::BadOffset);
    }

    let mut secs = hours as i32 * 3_600;
    if cur.eat(b':') {
        let minutes = parse_number(cur).ok_or(TzError::BadOffset)?;
        if minutes > 59 {
            return Err(TzError::BadOffset);
        }
        secs += minutes as i32 * 60;
        if cur.eat(b':') {
            let seconds = parse_number(cur).ok_or(TzError::BadOffset)?;
            if seconds > 59 {
                return Err(TzError::BadOffset);
            }
            secs += seconds as i32;
        }
    }
    Ok(Some(sign * secs))
}

/// An `Mm.w.d[/time]` transition.
fn parse_transition(cur: &mut Cursor<'_>) -> Result<Transition, TzError> {
    match cur.peek() {
        Some(b'M') => {
            cur.bump();
        }
        // Jn and plain day-number forms exist in POSIX but are not worth
        // carrying for a single preconfigured rule.
        Some(_) => return Err(TzError::UnsupportedTransition),
        None => return Err(TzError::BadTransition),
    }

    let month = parse_number(cur).ok_or(TzError::BadTransition)?;
    if !(1..=12).contains(&month) || !cur.eat(b'.') {
        return Err(TzError::BadTransition);
    }
    let week = parse_number(cur).ok_or(TzError::BadTransition)?;
    if !(1..=5).contains(&week) || !cur.eat(b'.') {
        return Err(TzError::BadTransition);
    }
    let weekday = parse_number(cur).ok_or(TzError::BadTransition)?;
    if weekday > 6 {
        return Err(TzError::BadTransition);
    }

    let time_secs = if cur.eat(b'/') {
        let hours = parse_number(cur).ok_or(TzError::BadTransition)?;
        if hours > 24 {
            return Err(TzError::BadTransition);
        }
        let mut secs = hours * 3_600;
        if cur.eat(b':') {
            let minutes = parse_number(cur).ok_or(TzError::BadTransition)?;
            if minutes > 59 {
                return Err(TzError::BadTransition);
            }
            secs += minutes * 60;
        }
        secs
    } else {
        DEFAULT_TRANSITION_SECS
    };

    Ok(Transition {
        month: month as u8,
        week: week as u8,
        weekday: weekday as u8,
        time_secs,
    })
}

/// A run of decimal digits, capped well below overflow.
fn parse_number(cur: &mut Cursor<'_>) -> Option<u32> {
    let mut value: u32 = 0;
    let mut seen = false;
    while let Some(b) = cur.peek() {
        if b.is_ascii_digit() {
            cur.bump();
            value = (value * 10 + (b - b'0') as u32).min(1_000_000);
            seen = true;
        } else {
            break;
        }
    }
    seen.then_some(value)
}
