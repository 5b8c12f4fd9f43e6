use std::fmt;

use serde::{Deserialize, Serialize};

/// Teaching day of a slot. Stored as its short English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub fn from_kanji(c: char) -> Option<Self> {
        match c {
            '月' => Some(Weekday::Mon),
            '火' => Some(Weekday::Tue),
            '水' => Some(Weekday::Wed),
            '木' => Some(Weekday::Thu),
            '金' => Some(Weekday::Fri),
            '土' => Some(Weekday::Sat),
            '日' => Some(Weekday::Sun),
            _ => None,
        }
    }

    pub fn kanji(self) -> char {
        match self {
            Weekday::Mon => '月',
            Weekday::Tue => '火',
            Weekday::Wed => '水',
            Weekday::Thu => '木',
            Weekday::Fri => '金',
            Weekday::Sat => '土',
            Weekday::Sun => '日',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Mon" => Some(Weekday::Mon),
            "Tue" => Some(Weekday::Tue),
            "Wed" => Some(Weekday::Wed),
            "Thu" => Some(Weekday::Thu),
            "Fri" => Some(Weekday::Fri),
            "Sat" => Some(Weekday::Sat),
            "Sun" => Some(Weekday::Sun),
            _ => s.chars().next().filter(|_| s.chars().count() == 1).and_then(Self::from_kanji),
        }
    }
}

/// A discrete teaching unit. Two registrations collide iff their slots are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub day: Weekday,
    pub period: u8,
}

impl Slot {
    pub fn new(day: Weekday, period: u8) -> Self {
        Self { day, period }
    }

    /// Display label in the catalog's notation, e.g. `月2`.
    pub fn label(&self) -> String {
        format!("{}{}", self.day.kanji(), self.period)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day.as_str(), self.period)
    }
}

/// Converts full-width digits (`１`) to ASCII.
pub fn to_half_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect()
}

fn parse_token(token: &str) -> Option<Slot> {
    let mut chars = token.chars();
    let day = Weekday::from_kanji(chars.next()?)?;
    let rest = chars.as_str();
    let rest = rest.strip_prefix("曜").unwrap_or(rest);
    let rest = rest.strip_suffix("限").unwrap_or(rest);
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let period = rest.parse::<u8>().ok().filter(|p| *p > 0)?;
    Some(Slot::new(day, period))
}

/// Parses a catalog period label into its slots.
///
/// Labels such as `月1`, `火２`, `水3限` or `月1・月2` yield one slot per
/// entry. Labels without a weekday/period pair (`不定`, `他曜`, `集中`)
/// yield an empty list, meaning the course is unscheduled.
pub fn parse_slots(label: &str) -> Vec<Slot> {
    let normalized = to_half_width(label);
    let mut slots = Vec::new();
    for token in normalized
        .split(|c: char| matches!(c, '・' | ',' | '、' | '/' | '，') || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if let Some(slot) = parse_token(token)
            && !slots.contains(&slot)
        {
            slots.push(slot);
        }
    }
    slots
}
