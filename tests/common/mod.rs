#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER_V1: &str = "Data,Czas,JakośćSnu,GodzinySnu,Lęk,Napięcie,BrainFog,Energia,Fokus,PoraDnia,Notatki,Elvanse,ElvanseGodzina,Pregabalina,PregabalinaGodzina";
pub const HEADER_V2: &str = "Data,Czas,JakośćSnu,GodzinySnu,Lęk,Napięcie,BrainFog,Energia,Fokus,PoraDnia,Notatki,Elvanse,ElvanseGodzina,Pregabalina,PregabalinaGodzina,Substancje,SubstancjeGodzina";

const BUCKETS: [(&str, &str); 4] = [
    ("08:00", "RANO"),
    ("12:30", "POŁUDNIE"),
    ("16:00", "POPOŁUDNIE"),
    ("21:00", "WIECZÓR"),
];

pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// One v1 line with the given clinical values
pub fn v1_line(date: &str, time: &str, time_of_day: &str, anxiety: &str, tension: &str) -> String {
    format!(
        "{},{},7,7.5,{},{},4,6,7,{},-,TAK(70MG),07:30,-,-",
        date, time, anxiety, tension, time_of_day
    )
}

/// A diary of `days` days starting 1 January 2024, two entries a day
/// (morning and evening), with anxiety and tension easing over time
pub fn declining_diary(days: u32) -> String {
    let mut lines = vec![HEADER_V1.to_string()];
    for day in 0..days {
        let date = format!("{:02}/01/2024", day + 1);
        let wiggle = if day % 2 == 0 { 0.2 } else { 0.0 };
        let anxiety = (8.0 - 0.4 * day as f64 + wiggle).max(1.0);
        let tension = (7.0 - 0.3 * day as f64 + wiggle).max(1.0);
        lines.push(v1_line(&date, "08:00", "RANO", &anxiety.to_string(), &tension.to_string()));
        lines.push(v1_line(
            &date,
            "21:00",
            "WIECZÓR",
            &(anxiety - 1.0).max(1.0).to_string(),
            &tension.to_string(),
        ));
    }
    lines.join("\n")
}

/// `count` v2 lines cycling through the time-of-day buckets
pub fn mixed_diary(count: usize) -> String {
    let mut lines = vec![HEADER_V2.to_string()];
    for i in 0..count {
        let (time, bucket) = BUCKETS[i % BUCKETS.len()];
        let day = i / BUCKETS.len() % 28 + 1;
        let month = i / (BUCKETS.len() * 28) % 12 + 1;
        lines.push(format!(
            "{:02}/{:02}/2024,{},{},7,{},{},{},{},{},{},note {},TAK({}MG),07:30,NIE,-,-,-",
            day,
            month,
            time,
            i % 10 + 1,
            (i * 3) % 10 + 1,
            (i * 7) % 10 + 1,
            (i * 5) % 10 + 1,
            i % 9 + 1,
            (i * 2) % 10 + 1,
            bucket,
            i,
            50 + (i % 3) * 10,
        ));
    }
    lines.join("\n")
}
