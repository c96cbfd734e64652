//! Free-form date parsing
//!
//! Reads dates the way reference managers spell them: `2019`, `Mar 2019`,
//! `March 3, 1999`, `15 March 2019`, `2019-03-15`, `03/15/2019`,
//! `15.03.2019`, `20190315`. Month names, weekday names, clock times and a
//! small set of filler words ("on", "of", "at", ordinal suffixes) are
//! understood; anything else is an unknown token. Strict mode rejects
//! unknown tokens, fuzzy mode skips them.
//!
//! Year/month/day positions are resolved month-first (`03/04/2019` is March
//! 4th). Values above 31 or written with more than two digits are years, and
//! a month name pins the month position.

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::DateParseError;

type Result<T> = std::result::Result<T, DateParseError>;

const MONTHS: [&[&str]; 12] = [
    &["jan", "january"],
    &["feb", "february"],
    &["mar", "march"],
    &["apr", "april"],
    &["may"],
    &["jun", "june"],
    &["jul", "july"],
    &["aug", "august"],
    &["sep", "sept", "september"],
    &["oct", "october"],
    &["nov", "november"],
    &["dec", "december"],
];

const WEEKDAYS: [&[&str]; 7] = [
    &["mon", "monday"],
    &["tue", "tues", "tuesday"],
    &["wed", "wednesday"],
    &["thu", "thur", "thurs", "thursday"],
    &["fri", "friday"],
    &["sat", "saturday"],
    &["sun", "sunday"],
];

/// Words skipped in strict mode.
const JUMP_WORDS: &[&str] = &[
    "at", "on", "and", "ad", "m", "t", "of", "st", "nd", "rd", "th",
];

/// Punctuation skipped in strict mode.
const JUMP_PUNCT: &[char] = &['.', ',', ';', '-', '/', '\''];

/// Day used when a month is known but the day is not.
pub const DEFAULT_MONTH_ONLY_DAY: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Number(&'a str),
    Space,
    Punct(char),
}

impl Token<'_> {
    fn is_jump(&self) -> bool {
        match self {
            Token::Space => true,
            Token::Punct(c) => JUMP_PUNCT.contains(c),
            Token::Word(w) => JUMP_WORDS.iter().any(|j| w.eq_ignore_ascii_case(j)),
            Token::Number(_) => false,
        }
    }

    fn text(&self) -> String {
        match self {
            Token::Word(s) | Token::Number(s) => (*s).to_string(),
            Token::Space => " ".to_string(),
            Token::Punct(c) => c.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Alpha,
    Digit,
    Space,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_ascii_digit() {
            Self::Digit
        } else if c.is_alphabetic() {
            Self::Alpha
        } else if c.is_whitespace() {
            Self::Space
        } else {
            Self::Other
        }
    }
}

/// Split into letter runs, digit runs, whitespace runs and single symbols.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let class = CharClass::of(c);
        let mut end = start + c.len_utf8();
        if class != CharClass::Other {
            while let Some(&(i, next)) = chars.peek() {
                if CharClass::of(next) != class {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
        }
        tokens.push(match class {
            CharClass::Alpha => Token::Word(&text[start..end]),
            CharClass::Digit => Token::Number(&text[start..end]),
            CharClass::Space => Token::Space,
            CharClass::Other => Token::Punct(c),
        });
    }

    tokens
}

fn lookup(table: &[&[&str]], word: &str) -> Option<usize> {
    let lower = word.to_lowercase();
    table
        .iter()
        .position(|names| names.contains(&lower.as_str()))
}

fn month_number(word: &str) -> Option<u32> {
    lookup(&MONTHS, word).map(|i| i as u32 + 1)
}

fn is_weekday(word: &str) -> bool {
    lookup(&WEEKDAYS, word).is_some()
}

/// `Some(true)` for PM, `Some(false)` for AM.
fn ampm(word: &str) -> Option<bool> {
    match word.to_lowercase().as_str() {
        "am" | "a" => Some(false),
        "pm" | "p" => Some(true),
        _ => None,
    }
}

fn is_tzname(word: &str) -> bool {
    word.len() <= 5 && word.chars().all(|c| c.is_ascii_uppercase())
        || ["utc", "gmt", "z"].contains(&word.to_lowercase().as_str())
}

fn parse_int(digits: &str) -> Result<i64> {
    digits
        .parse()
        .map_err(|_| DateParseError::Overflow(digits.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Year,
    Month,
}

/// Year/month/day candidates in the order they were seen.
#[derive(Debug, Default)]
struct Ymd {
    values: Vec<i64>,
    year_idx: Option<usize>,
    month_idx: Option<usize>,
    century_specified: bool,
}

impl Ymd {
    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Push a digit run. Runs longer than two digits can only be years.
    fn push_digits(&mut self, digits: &str) -> Result<()> {
        let value = parse_int(digits)?;
        if digits.len() > 2 || value > 100 {
            self.century_specified = true;
            self.push(value, Some(Label::Year))
        } else {
            self.push(value, None)
        }
    }

    fn push_month(&mut self, month: u32) -> Result<()> {
        self.push(i64::from(month), Some(Label::Month))
    }

    fn push(&mut self, value: i64, label: Option<Label>) -> Result<()> {
        self.values.push(value);
        let idx = self.values.len() - 1;
        match label {
            Some(Label::Year) if self.year_idx.is_some() => Err(DateParseError::Duplicate("year")),
            Some(Label::Year) => {
                self.year_idx = Some(idx);
                Ok(())
            }
            Some(Label::Month) if self.month_idx.is_some() => {
                Err(DateParseError::Duplicate("month"))
            }
            Some(Label::Month) => {
                self.month_idx = Some(idx);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn could_be_day(&self, value: i64) -> bool {
        self.values.len() < 3 && (1..=31).contains(&value)
    }

    /// Assign the collected values to (year, month, day).
    fn resolve(&self) -> Result<(Option<i64>, Option<i64>, Option<i64>)> {
        let v = &self.values;
        let n = v.len();
        if n > 3 {
            return Err(DateParseError::TooManyValues);
        }

        let labelled = usize::from(self.year_idx.is_some()) + usize::from(self.month_idx.is_some());
        if (labelled > 0 && n == labelled) || (n == 3 && labelled == 2) {
            let day_idx = (n == 3).then(|| {
                (0..3)
                    .find(|i| Some(*i) != self.year_idx && Some(*i) != self.month_idx)
                    .unwrap_or(2)
            });
            return Ok((
                self.year_idx.map(|i| v[i]),
                self.month_idx.map(|i| v[i]),
                day_idx.map(|i| v[i]),
            ));
        }

        let resolved = match (n, self.month_idx) {
            (0, _) => (None, None, None),
            (1, _) => {
                if v[0] > 31 {
                    (Some(v[0]), None, None)
                } else {
                    (None, None, Some(v[0]))
                }
            }
            (2, Some(m)) => {
                let other = v[1 - m];
                if other > 31 {
                    (Some(other), Some(v[m]), None)
                } else {
                    (None, Some(v[m]), Some(other))
                }
            }
            (2, None) => {
                if v[0] > 31 {
                    (Some(v[0]), Some(v[1]), None)
                } else if v[1] > 31 {
                    (Some(v[1]), Some(v[0]), None)
                } else {
                    (None, Some(v[0]), Some(v[1]))
                }
            }
            (_, Some(0)) => {
                if v[1] > 31 {
                    (Some(v[1]), Some(v[0]), Some(v[2]))
                } else {
                    (Some(v[2]), Some(v[0]), Some(v[1]))
                }
            }
            (_, Some(1)) => {
                if v[0] > 31 {
                    (Some(v[0]), Some(v[1]), Some(v[2]))
                } else {
                    (Some(v[2]), Some(v[1]), Some(v[0]))
                }
            }
            (_, Some(_)) => {
                if v[1] > 31 {
                    (Some(v[1]), Some(v[2]), Some(v[0]))
                } else {
                    (Some(v[0]), Some(v[2]), Some(v[1]))
                }
            }
            (_, None) => {
                if v[0] > 31 || self.year_idx == Some(0) {
                    (Some(v[0]), Some(v[1]), Some(v[2]))
                } else if v[0] > 12 {
                    (Some(v[2]), Some(v[1]), Some(v[0]))
                } else {
                    (Some(v[2]), Some(v[0]), Some(v[1]))
                }
            }
        };
        Ok(resolved)
    }
}

/// Clock time seen alongside the date. Only validated, never returned.
#[derive(Debug, Default)]
struct Clock {
    hour: Option<u32>,
}

impl Clock {
    fn set(&mut self, hour: i64, minute: i64, second: i64) -> Result<()> {
        if !(0..24).contains(&hour) {
            return Err(DateParseError::OutOfRange {
                field: "hour",
                value: hour,
            });
        }
        if !(0..60).contains(&minute) {
            return Err(DateParseError::OutOfRange {
                field: "minute",
                value: minute,
            });
        }
        if !(0..60).contains(&second) {
            return Err(DateParseError::OutOfRange {
                field: "second",
                value: second,
            });
        }
        self.hour = Some(hour as u32);
        Ok(())
    }

    fn apply_ampm(&mut self, pm: bool) {
        self.hour = self.hour.map(|h| match (h, pm) {
            (h, true) if h < 12 => h + 12,
            (12, false) => 0,
            (h, _) => h,
        });
    }
}

/// Date components recovered from a string, before defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub year: Option<i64>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// The year was written with more than two digits.
    pub century_specified: bool,
    pub has_time: bool,
    pub has_weekday: bool,
}

/// Fill-in values for components a string doesn't carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDefaults {
    /// Supplies the year when none is given, and the century for two-digit years.
    pub reference: NaiveDate,
    /// Day used when only the month is known.
    pub month_only_day: u32,
}

impl DateDefaults {
    pub fn with_reference(reference: NaiveDate) -> Self {
        Self {
            reference,
            month_only_day: DEFAULT_MONTH_ONLY_DAY,
        }
    }
}

impl Default for DateDefaults {
    fn default() -> Self {
        Self::with_reference(Utc::now().date_naive())
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

/// Place a two-digit year within 50 years of the reference year.
fn expand_two_digit_year(year: i32, reference_year: i32) -> i32 {
    let mut full = year + reference_year / 100 * 100;
    if full >= reference_year + 50 {
        full -= 100;
    } else if full < reference_year - 50 {
        full += 100;
    }
    full
}

impl ParsedDate {
    /// Complete the date: missing year → reference year, missing month →
    /// January, missing day → `month_only_day` if a month was given, else 1.
    pub fn to_naive_date(&self, defaults: &DateDefaults) -> Result<NaiveDate> {
        let reference_year = defaults.reference.year();
        let year = match self.year {
            Some(y) if y < 100 && !self.century_specified => {
                expand_two_digit_year(y as i32, reference_year)
            }
            Some(y) => i32::try_from(y).map_err(|_| DateParseError::OutOfRange {
                field: "year",
                value: y,
            })?,
            None => reference_year,
        };
        if !(1..=9999).contains(&year) {
            return Err(DateParseError::OutOfRange {
                field: "year",
                value: i64::from(year),
            });
        }

        let month = self.month.unwrap_or(1);
        let day = match (self.day, self.month) {
            (Some(day), _) => day,
            (None, Some(_)) => defaults.month_only_day.min(days_in_month(year, month)),
            (None, None) => 1,
        };

        NaiveDate::from_ymd_opt(year, month, day).ok_or(DateParseError::OutOfRange {
            field: "day",
            value: i64::from(day),
        })
    }
}

/// Parse `text` into date components.
pub fn parse(text: &str, fuzzy: bool) -> Result<ParsedDate> {
    let tokens = tokenize(text);
    let mut ymd = Ymd::default();
    let mut clock = Clock::default();
    let mut has_weekday = false;

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            Token::Number(digits) => {
                i = parse_number(&tokens, i, digits, &mut ymd, &mut clock, fuzzy)?;
            }
            Token::Word(word) => {
                if let Some(month) = month_number(word) {
                    ymd.push_month(month)?;
                    i = month_suffix(&tokens, i, &mut ymd)?;
                } else if is_weekday(word) {
                    has_weekday = true;
                } else if let Some(pm) = ampm(word) {
                    if clock.hour.is_some() {
                        clock.apply_ampm(pm);
                    } else if !fuzzy {
                        return Err(DateParseError::UnknownToken(word.to_string()));
                    }
                } else if clock.hour.is_some() && is_tzname(word) {
                    // zone names are accepted and dropped
                } else if !tokens[i].is_jump() && !fuzzy {
                    return Err(DateParseError::UnknownToken(word.to_string()));
                }
            }
            Token::Punct('+') if clock.hour.is_some() => {
                // numeric UTC offset after a clock time: +0100 or +01:00
                if let Some(Token::Number(_)) = tokens.get(i + 1) {
                    i += 1;
                    if tokens.get(i + 1) == Some(&Token::Punct(':')) {
                        if let Some(Token::Number(_)) = tokens.get(i + 2) {
                            i += 2;
                        }
                    }
                }
            }
            token @ Token::Punct(_) => {
                if !token.is_jump() && !fuzzy {
                    return Err(DateParseError::UnknownToken(token.text()));
                }
            }
            Token::Space => {}
        }
        i += 1;
    }

    if ymd.is_empty() && clock.hour.is_none() && !has_weekday {
        return Err(DateParseError::NoDate);
    }

    let (year, month, day) = ymd.resolve()?;
    let month = month
        .map(|m| {
            u32::try_from(m)
                .ok()
                .filter(|m| (1..=12).contains(m))
                .ok_or(DateParseError::OutOfRange {
                    field: "month",
                    value: m,
                })
        })
        .transpose()?;
    let day = day
        .map(|d| {
            u32::try_from(d)
                .ok()
                .filter(|d| (1..=31).contains(d))
                .ok_or(DateParseError::OutOfRange {
                    field: "day",
                    value: d,
                })
        })
        .transpose()?;

    Ok(ParsedDate {
        year,
        month,
        day,
        century_specified: ymd.century_specified,
        has_time: clock.hour.is_some(),
        has_weekday,
    })
}

/// Handle a digit run at `i`. Returns the index of the last consumed token.
fn parse_number(
    tokens: &[Token<'_>],
    i: usize,
    digits: &str,
    ymd: &mut Ymd,
    clock: &mut Clock,
    fuzzy: bool,
) -> Result<usize> {
    let value = parse_int(digits)?;
    let next = tokens.get(i + 1).copied();

    match digits.len() {
        // YYMMDD, or HHMMSS once a date has been seen
        6 if next != Some(Token::Punct(':')) => {
            if ymd.is_empty() {
                ymd.push_digits(&digits[..2])?;
                ymd.push_digits(&digits[2..4])?;
                ymd.push_digits(&digits[4..])?;
            } else {
                clock.set(
                    parse_int(&digits[..2])?,
                    parse_int(&digits[2..4])?,
                    parse_int(&digits[4..])?,
                )?;
            }
            return Ok(i);
        }
        // YYYYMMDD[hhmm[ss]]
        8 | 12 | 14 => {
            ymd.push_digits(&digits[..4])?;
            ymd.push_digits(&digits[4..6])?;
            ymd.push_digits(&digits[6..8])?;
            if digits.len() > 8 {
                let second = if digits.len() == 14 {
                    parse_int(&digits[12..14])?
                } else {
                    0
                };
                clock.set(
                    parse_int(&digits[8..10])?,
                    parse_int(&digits[10..12])?,
                    second,
                )?;
            }
            return Ok(i);
        }
        _ => {}
    }

    match next {
        Some(Token::Punct(':')) => parse_clock(tokens, i, value, clock),
        Some(Token::Punct(sep @ ('-' | '/' | '.'))) => {
            parse_separated(tokens, i, digits, sep, ymd)
        }
        None => {
            ymd.push_digits(digits)?;
            Ok(i)
        }
        Some(token) if token.is_jump() => {
            match tokens.get(i + 2) {
                Some(Token::Word(w)) if ampm(w).is_some() && (0..24).contains(&value) => {
                    clock.set(value, 0, 0)?;
                    clock.apply_ampm(ampm(w) == Some(true));
                    Ok(i + 2)
                }
                _ => {
                    ymd.push_digits(digits)?;
                    Ok(i)
                }
            }
        }
        Some(Token::Word(w)) if ampm(w).is_some() && (0..24).contains(&value) => {
            clock.set(value, 0, 0)?;
            clock.apply_ampm(ampm(w) == Some(true));
            Ok(i + 1)
        }
        _ if ymd.could_be_day(value) => {
            ymd.push_digits(digits)?;
            Ok(i)
        }
        _ if fuzzy => Ok(i),
        _ => Err(DateParseError::UnknownToken(digits.to_string())),
    }
}

/// `HH:MM[:SS]` starting at `i`.
fn parse_clock(tokens: &[Token<'_>], i: usize, hour: i64, clock: &mut Clock) -> Result<usize> {
    let Some(Token::Number(minute)) = tokens.get(i + 2) else {
        return Err(DateParseError::UnknownToken(":".to_string()));
    };
    let minute = parse_int(minute)?;

    if tokens.get(i + 3) == Some(&Token::Punct(':')) {
        if let Some(Token::Number(second)) = tokens.get(i + 4) {
            clock.set(hour, minute, parse_int(second)?)?;
            return Ok(i + 4);
        }
    }
    clock.set(hour, minute, 0)?;
    Ok(i + 2)
}

/// `01-02[-03]`, `2019/Mar/15`, `15.03.2019` starting at `i`.
fn parse_separated(
    tokens: &[Token<'_>],
    i: usize,
    digits: &str,
    sep: char,
    ymd: &mut Ymd,
) -> Result<usize> {
    ymd.push_digits(digits)?;

    let Some(second) = tokens.get(i + 2) else {
        return Ok(i + 1);
    };
    if second.is_jump() {
        return Ok(i + 1);
    }
    push_member(second, ymd)?;

    if tokens.get(i + 3) == Some(&Token::Punct(sep)) {
        let third = tokens
            .get(i + 4)
            .ok_or_else(|| DateParseError::UnknownToken(sep.to_string()))?;
        push_member(third, ymd)?;
        return Ok(i + 4);
    }
    Ok(i + 2)
}

fn push_member(token: &Token<'_>, ymd: &mut Ymd) -> Result<()> {
    match token {
        Token::Number(d) => ymd.push_digits(d),
        Token::Word(w) => match month_number(w) {
            Some(month) => ymd.push_month(month),
            None => Err(DateParseError::UnknownToken((*w).to_string())),
        },
        other => Err(DateParseError::UnknownToken(other.text())),
    }
}

/// `Jan-01[-99]` / `Jan/01[/99]` following a month name at `i`.
fn month_suffix(tokens: &[Token<'_>], i: usize, ymd: &mut Ymd) -> Result<usize> {
    let Some(Token::Punct(sep @ ('-' | '/'))) = tokens.get(i + 1).copied() else {
        return Ok(i);
    };
    let Some(Token::Number(first)) = tokens.get(i + 2) else {
        return Err(DateParseError::UnknownToken(sep.to_string()));
    };
    ymd.push_digits(first)?;

    if tokens.get(i + 3) == Some(&Token::Punct(sep)) {
        let Some(Token::Number(second)) = tokens.get(i + 4) else {
            return Err(DateParseError::UnknownToken(sep.to_string()));
        };
        ymd.push_digits(second)?;
        return Ok(i + 4);
    }
    Ok(i + 2)
}

/// Parse and complete a date in one step.
pub fn parse_date(text: &str, fuzzy: bool, defaults: &DateDefaults) -> Result<NaiveDate> {
    parse(text, fuzzy)?.to_naive_date(defaults)
}

/// Whether `text` reads as a calendar date.
///
/// Total: every failure, including out-of-range components and oversized
/// numbers, is reported as `false`.
pub fn is_date(text: &str, fuzzy: bool) -> bool {
    let defaults = DateDefaults::with_reference(Utc::now().date_naive());
    parse_date(text, fuzzy, &defaults).is_ok()
}
