//! Core Data Models
//!
//! This module defines the data structures used throughout the symptom tracker,
//! from a validated text line to the per-day summaries consumed by the statistics
//! engine, plus the constants table (sentinel tokens, time-of-day tokens, field
//! aliases) shared by the parser and the analyses.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: a comma-separated line of the import format
//! 2. **Validation**: [`ValidatedRecord`] - every field still a string, structure and ranges checked
//! 3. **Normalization**: [`NormalizedRecord`] - typed values, `None` for absent measurements
//! 4. **Aggregation**: [`DailySummary`] - per-calendar-day means and dose sums
//!
//! ## Absent Values
//!
//! A measurement that was not taken is `None` from normalization onwards. It is
//! never replaced with zero; every mean and regression filters it out.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field delimiter of the import format
pub const DELIMITER: char = ',';

/// Index of the free-text notes column
pub const NOTES_INDEX: usize = 10;

/// Sentinels that mean "no value" in any optional column
pub const ABSENT_SENTINELS: [&str; 4] = ["-", "N/A", "BRAK", ""];

/// Leading token of an affirmative substance-use entry (e.g. `TAK(piwo)`)
pub const AFFIRMATIVE_TOKEN: &str = "TAK";

/// Explicit "no" token used in medication and substance columns
pub const NEGATIVE_TOKEN: &str = "NIE";

/// Header marker of the substance-use column (schema v2 headers)
pub const SUBSTANCE_HEADER_MARKER: &str = "SUBSTANCJE";

/// Inclusive range of the clinical 1-10 scales
pub const METRIC_MIN: f64 = 1.0;
pub const METRIC_MAX: f64 = 10.0;

/// Column headers in input order (schema v1)
pub const BASE_COLUMNS: [&str; 15] = [
    "Data",
    "Czas",
    "JakośćSnu",
    "GodzinySnu",
    "Lęk",
    "Napięcie",
    "BrainFog",
    "Energia",
    "Fokus",
    "PoraDnia",
    "Notatki",
    "Elvanse",
    "ElvanseGodzina",
    "Pregabalina",
    "PregabalinaGodzina",
];

/// Trailing columns added by schema v2
pub const EXTENDED_COLUMNS: [&str; 2] = ["Substancje", "SubstancjeGodzina"];

/// Whether a raw field is one of the absent-value sentinels
pub fn is_absent(value: &str) -> bool {
    ABSENT_SENTINELS.contains(&value.trim())
}

/// Whether a raw field is the explicit negative token
pub fn is_negative(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(NEGATIVE_TOKEN)
}

/// Whether a raw field starts with the affirmative token (case-insensitive)
pub fn is_affirmative(value: &str) -> bool {
    value
        .trim()
        .to_uppercase()
        .starts_with(AFFIRMATIVE_TOKEN)
}

/// Input schema version, detected per line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SchemaVersion {
    /// 15 columns
    #[default]
    V1,
    /// 17 columns: v1 plus substance use and its time
    V2,
}

impl SchemaVersion {
    pub fn column_count(self) -> usize {
        match self {
            Self::V1 => BASE_COLUMNS.len(),
            Self::V2 => BASE_COLUMNS.len() + EXTENDED_COLUMNS.len(),
        }
    }
}

/// The four fixed time-of-day buckets, ordered through the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    #[serde(rename = "RANO")]
    Morning,
    #[serde(rename = "POŁUDNIE")]
    Midday,
    #[serde(rename = "POPOŁUDNIE")]
    Afternoon,
    #[serde(rename = "WIECZÓR")]
    Evening,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Midday,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
    ];

    /// Token used in the import format
    pub fn token(self) -> &'static str {
        match self {
            Self::Morning => "RANO",
            Self::Midday => "POŁUDNIE",
            Self::Afternoon => "POPOŁUDNIE",
            Self::Evening => "WIECZÓR",
        }
    }

    /// Exact match against the import tokens
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.token() == token.trim())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Midday => "Midday",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }

    /// Comma-separated token list for error messages
    pub fn allowed_tokens() -> String {
        Self::ALL
            .iter()
            .map(|t| t.token())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Numeric measurements carried by every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    SleepQuality,
    SleepHours,
    Anxiety,
    Tension,
    BrainFog,
    Energy,
    Focus,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::SleepQuality,
        Metric::SleepHours,
        Metric::Anxiety,
        Metric::Tension,
        Metric::BrainFog,
        Metric::Energy,
        Metric::Focus,
    ];

    /// The 1-10 scales that are range-checked at validation time
    pub const CLINICAL: [Metric; 5] = [
        Metric::Anxiety,
        Metric::Tension,
        Metric::BrainFog,
        Metric::Energy,
        Metric::Focus,
    ];

    /// Metrics followed by the half comparison and the period analysis
    pub const TRACKED: [Metric; 6] = [
        Metric::Anxiety,
        Metric::Tension,
        Metric::Focus,
        Metric::Energy,
        Metric::BrainFog,
        Metric::SleepQuality,
    ];

    /// Snake-case key, used for field resolution and CLI arguments
    pub fn key(self) -> &'static str {
        match self {
            Self::SleepQuality => "sleep_quality",
            Self::SleepHours => "sleep_hours",
            Self::Anxiety => "anxiety",
            Self::Tension => "tension",
            Self::BrainFog => "brain_fog",
            Self::Energy => "energy",
            Self::Focus => "focus",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SleepQuality => "Sleep quality",
            Self::SleepHours => "Sleep hours",
            Self::Anxiety => "Anxiety",
            Self::Tension => "Tension",
            Self::BrainFog => "Brain fog",
            Self::Energy => "Energy",
            Self::Focus => "Focus",
        }
    }

    /// Column header of this metric in the import format
    pub fn column(self) -> &'static str {
        match self {
            Self::SleepQuality => BASE_COLUMNS[2],
            Self::SleepHours => BASE_COLUMNS[3],
            Self::Anxiety => BASE_COLUMNS[4],
            Self::Tension => BASE_COLUMNS[5],
            Self::BrainFog => BASE_COLUMNS[6],
            Self::Energy => BASE_COLUMNS[7],
            Self::Focus => BASE_COLUMNS[8],
        }
    }

    pub fn from_key(name: &str) -> Option<Self> {
        match DailyField::resolve(name)? {
            DailyField::Metric(metric) => Some(metric),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A column of [`DailySummary`] addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyField {
    Metric(Metric),
    /// Daily sum of medication A doses
    DoseA,
    /// Daily sum of medication B doses
    DoseB,
}

/// Lowercase aliases accepted for daily fields
const FIELD_ALIASES: [(&str, DailyField); 24] = [
    ("anxiety", DailyField::Metric(Metric::Anxiety)),
    ("lek", DailyField::Metric(Metric::Anxiety)),
    ("lęk", DailyField::Metric(Metric::Anxiety)),
    ("tension", DailyField::Metric(Metric::Tension)),
    ("napiecie", DailyField::Metric(Metric::Tension)),
    ("napięcie", DailyField::Metric(Metric::Tension)),
    ("sleepquality", DailyField::Metric(Metric::SleepQuality)),
    ("jakoscsnu", DailyField::Metric(Metric::SleepQuality)),
    ("sleephours", DailyField::Metric(Metric::SleepHours)),
    ("godzinysnu", DailyField::Metric(Metric::SleepHours)),
    ("brainfog", DailyField::Metric(Metric::BrainFog)),
    ("brain fog", DailyField::Metric(Metric::BrainFog)),
    ("energy", DailyField::Metric(Metric::Energy)),
    ("energia", DailyField::Metric(Metric::Energy)),
    ("focus", DailyField::Metric(Metric::Focus)),
    ("fokus", DailyField::Metric(Metric::Focus)),
    ("dose", DailyField::DoseA),
    ("dosea", DailyField::DoseA),
    ("elvanse", DailyField::DoseA),
    ("medication_a", DailyField::DoseA),
    ("doseb", DailyField::DoseB),
    ("pregabalina", DailyField::DoseB),
    ("medication_b", DailyField::DoseB),
    ("dose_b", DailyField::DoseB),
];

impl DailyField {
    /// Case-insensitive lookup through the alias table, falling back to the
    /// lowercased name itself as a field key.
    pub fn resolve(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        let compact = lowered.replace('_', "");

        FIELD_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered || *alias == compact)
            .map(|(_, field)| *field)
            .or_else(|| Self::from_key(&lowered))
    }

    /// Canonical keys as used by [`DailyField::key`]
    fn from_key(key: &str) -> Option<Self> {
        Metric::ALL
            .into_iter()
            .map(DailyField::Metric)
            .chain([DailyField::DoseA, DailyField::DoseB])
            .find(|field| field.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Metric(metric) => metric.key(),
            Self::DoseA => "dose_a_mg",
            Self::DoseB => "dose_b_mg",
        }
    }
}

/// A line that passed structural and range validation; all values still text
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub date: String,
    pub time: String,
    pub sleep_quality: String,
    pub sleep_hours: String,
    pub anxiety: String,
    pub tension: String,
    pub brain_fog: String,
    pub energy: String,
    pub focus: String,
    pub time_of_day: TimeOfDay,
    pub notes: String,
    pub medication_a: String,
    pub medication_a_time: String,
    pub medication_b: String,
    pub medication_b_time: String,
    pub substance_use: String,
    pub substance_use_time: String,
    pub schema: SchemaVersion,
}

impl ValidatedRecord {
    /// Raw text of a numeric field
    pub fn metric_text(&self, metric: Metric) -> &str {
        match metric {
            Metric::SleepQuality => &self.sleep_quality,
            Metric::SleepHours => &self.sleep_hours,
            Metric::Anxiety => &self.anxiety,
            Metric::Tension => &self.tension,
            Metric::BrainFog => &self.brain_fog,
            Metric::Energy => &self.energy,
            Metric::Focus => &self.focus,
        }
    }

    /// Re-serialize as one line of the import format
    pub fn to_line(&self) -> String {
        let mut fields = vec![
            self.date.as_str(),
            self.time.as_str(),
            self.sleep_quality.as_str(),
            self.sleep_hours.as_str(),
            self.anxiety.as_str(),
            self.tension.as_str(),
            self.brain_fog.as_str(),
            self.energy.as_str(),
            self.focus.as_str(),
            self.time_of_day.token(),
            self.notes.as_str(),
            self.medication_a.as_str(),
            self.medication_a_time.as_str(),
            self.medication_b.as_str(),
            self.medication_b_time.as_str(),
        ];
        if self.schema == SchemaVersion::V2 {
            fields.push(self.substance_use.as_str());
            fields.push(self.substance_use_time.as_str());
        }
        fields.join(",")
    }
}

/// A fully typed record as persisted and analysed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// Original `DD/MM/YYYY` text, also the grouping key for daily aggregation
    pub date: String,
    /// Whitespace-stripped `H:MM` / `HH:MM`
    pub time: String,
    pub sleep_quality: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub anxiety: Option<f64>,
    pub tension: Option<f64>,
    pub brain_fog: Option<f64>,
    pub energy: Option<f64>,
    pub focus: Option<f64>,
    pub time_of_day: TimeOfDay,
    pub notes: Option<String>,
    pub medication_a: Option<String>,
    pub medication_a_time: Option<String>,
    pub medication_a_mg: Option<u32>,
    pub medication_b: Option<String>,
    pub medication_b_time: Option<String>,
    pub medication_b_mg: Option<u32>,
    #[serde(default)]
    pub substance_use: Option<String>,
    #[serde(default)]
    pub substance_use_time: Option<String>,
    #[serde(default)]
    pub substance_flag: bool,
    /// `date` + `time` as a wall-clock instant; `None` if either failed to parse
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub schema: SchemaVersion,
}

impl NormalizedRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SleepQuality => self.sleep_quality,
            Metric::SleepHours => self.sleep_hours,
            Metric::Anxiety => self.anxiety,
            Metric::Tension => self.tension,
            Metric::BrainFog => self.brain_fog,
            Metric::Energy => self.energy,
            Metric::Focus => self.focus,
        }
    }

    /// Identity used when appending to the store
    pub fn dedup_key(&self) -> String {
        format!("{}_{}", self.date, self.time)
    }

    /// Inverse of normalization: absent values become `-`, numbers their
    /// shortest decimal form. Derived fields are dropped.
    pub fn to_validated(&self) -> ValidatedRecord {
        fn number(value: Option<f64>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }
        fn text(value: &Option<String>) -> String {
            value.clone().unwrap_or_else(|| "-".to_string())
        }

        ValidatedRecord {
            date: self.date.clone(),
            time: self.time.clone(),
            sleep_quality: number(self.sleep_quality),
            sleep_hours: number(self.sleep_hours),
            anxiety: number(self.anxiety),
            tension: number(self.tension),
            brain_fog: number(self.brain_fog),
            energy: number(self.energy),
            focus: number(self.focus),
            time_of_day: self.time_of_day,
            notes: text(&self.notes),
            medication_a: text(&self.medication_a),
            medication_a_time: text(&self.medication_a_time),
            medication_b: text(&self.medication_b),
            medication_b_time: text(&self.medication_b_time),
            substance_use: text(&self.substance_use),
            substance_use_time: text(&self.substance_use_time),
            schema: self.schema,
        }
    }

    /// Regenerate an import line that parses back to this record
    pub fn to_line(&self) -> String {
        self.to_validated().to_line()
    }
}

/// Per-calendar-day means of every metric plus summed medication doses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub sleep_quality: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub anxiety: Option<f64>,
    pub tension: Option<f64>,
    pub brain_fog: Option<f64>,
    pub energy: Option<f64>,
    pub focus: Option<f64>,
    /// Sum of medication A doses taken that day
    pub dose_a_mg: Option<f64>,
    /// Sum of medication B doses taken that day
    pub dose_b_mg: Option<f64>,
    pub record_count: usize,
}

impl DailySummary {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SleepQuality => self.sleep_quality,
            Metric::SleepHours => self.sleep_hours,
            Metric::Anxiety => self.anxiety,
            Metric::Tension => self.tension,
            Metric::BrainFog => self.brain_fog,
            Metric::Energy => self.energy,
            Metric::Focus => self.focus,
        }
    }

    pub fn field(&self, field: DailyField) -> Option<f64> {
        match field {
            DailyField::Metric(metric) => self.metric(metric),
            DailyField::DoseA => self.dose_a_mg,
            DailyField::DoseB => self.dose_b_mg,
        }
    }
}
