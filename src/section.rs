use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};

/// One timed segment of a talk.
///
/// Minutes and seconds are entered independently and only combined by
/// [`Section::planned_secs`]. Older saved configs used `duration` for the
/// minutes and had no `seconds` key; both shapes load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub presenter: String,
    #[serde(default, alias = "duration", deserialize_with = "lenient_number")]
    pub planned_minutes: f64,
    #[serde(default, alias = "seconds", deserialize_with = "lenient_number")]
    pub planned_seconds: f64,
}

impl Section {
    pub fn new(name: impl Into<String>, presenter: impl Into<String>, minutes: f64, seconds: f64) -> Self {
        Self {
            name: name.into(),
            presenter: presenter.into(),
            planned_minutes: coerce_non_negative(minutes),
            planned_seconds: coerce_non_negative(seconds),
        }
    }

    /// Planned duration in seconds
    pub fn planned_secs(&self) -> f64 {
        coerce_non_negative(self.planned_minutes) * 60.0 + coerce_non_negative(self.planned_seconds)
    }

    /// Planned duration in (fractional) minutes
    pub fn planned_minutes_total(&self) -> f64 {
        self.planned_secs() / 60.0
    }
}

/// Sum of planned durations, in seconds
pub fn total_planned_secs(sections: &[Section]) -> f64 {
    sections.iter().map(Section::planned_secs).sum()
}

/// Clamp user input into a usable duration component: non-finite and
/// negative values become 0.
pub fn coerce_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parse free-form numeric input the way form fields are read: leading
/// whitespace is skipped and the longest numeric prefix wins, so `"5 min"`
/// reads as 5. Anything without a numeric prefix is 0.
pub fn parse_lenient(text: &str) -> f64 {
    let text = text.trim_start();
    let mut best = None;
    for (idx, ch) in text.char_indices() {
        if let Ok(value) = text[..idx + ch.len_utf8()].parse::<f64>() {
            best = Some(value);
        } else if !matches!(ch, '0'..='9' | '.' | '-' | '+' | 'e' | 'E') {
            break;
        }
    }
    coerce_non_negative(best.unwrap_or(0.0))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Number(n) => coerce_non_negative(n),
        LenientNumber::Text(s) => parse_lenient(&s),
        LenientNumber::Other(_) => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_secs_combines_minutes_and_seconds() {
        let s = Section::new("Intro", "Ana", 3.0, 30.0);
        assert_eq!(s.planned_secs(), 210.0);
        assert_eq!(s.planned_minutes_total(), 3.5);
    }

    #[test]
    fn invalid_components_coerce_to_zero() {
        let s = Section::new("x", "", -2.0, f64::NAN);
        assert_eq!(s.planned_secs(), 0.0);

        // fields edited directly are still read defensively
        let mut s = Section::new("y", "", 1.0, 0.0);
        s.planned_seconds = -30.0;
        assert_eq!(s.planned_secs(), 60.0);
    }

    #[test]
    fn total_planned_sums_sections() {
        let sections = vec![
            Section::new("a", "", 3.0, 0.0),
            Section::new("b", "", 5.0, 0.0),
            Section::new("c", "", 2.0, 0.0),
        ];
        assert_eq!(total_planned_secs(&sections), 600.0);
        assert_eq!(total_planned_secs(&[]), 0.0);
    }

    #[test]
    fn parse_lenient_reads_numeric_prefix() {
        assert_eq!(parse_lenient("5"), 5.0);
        assert_eq!(parse_lenient("  2.5"), 2.5);
        assert_eq!(parse_lenient("7 min"), 7.0);
        assert_eq!(parse_lenient("abc"), 0.0);
        assert_eq!(parse_lenient(""), 0.0);
        assert_eq!(parse_lenient("-4"), 0.0);
    }

    #[test]
    fn deserializes_legacy_shape() {
        let json = r#"{"name":"Demo","duration":5,"presenter":"Bo"}"#;
        let s: Section = serde_json::from_str(json).unwrap();
        assert_eq!(s.name, "Demo");
        assert_eq!(s.presenter, "Bo");
        assert_eq!(s.planned_minutes, 5.0);
        assert_eq!(s.planned_seconds, 0.0);
    }

    #[test]
    fn deserializes_strings_and_garbage_leniently() {
        let json = r#"{"name":"Q&A","planned_minutes":"4","planned_seconds":"oops"}"#;
        let s: Section = serde_json::from_str(json).unwrap();
        assert_eq!(s.planned_secs(), 240.0);

        let json = r#"{"planned_minutes":null,"planned_seconds":[1,2]}"#;
        let s: Section = serde_json::from_str(json).unwrap();
        assert_eq!(s.planned_secs(), 0.0);
        assert!(s.name.is_empty());
    }
}
