// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use rollcall_app::{ColumnDescriptor, ColumnKind, ImageProbe, LoadOutcome, RawRow, RawValue};
use std::path::PathBuf;
use time::{Date, Duration, Month};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const TEAMS: [&str; 8] = [
    "Operations",
    "Finance",
    "Support",
    "Platform",
    "Design",
    "Sales",
    "Legal",
    "Research",
];

const AVATAR_HOSTS: [&str; 3] = [
    "cdn.example.com",
    "avatars.example.org",
    "img.staff.example.net",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const FILE_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

const REFERENCE_YEAR: i32 = 2026;

/// Shapes an image field takes in exported sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoShape {
    DriveFileWithName,
    DriveOpenWithName,
    DriveFileOnly,
    QuotedDriveWithName,
    DirectUrlWithName,
    NameOnly,
    Empty,
}

const PHOTO_SHAPES: [PhotoShape; 7] = [
    PhotoShape::DriveFileWithName,
    PhotoShape::DriveOpenWithName,
    PhotoShape::DriveFileOnly,
    PhotoShape::QuotedDriveWithName,
    PhotoShape::DirectUrlWithName,
    PhotoShape::NameOnly,
    PhotoShape::Empty,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub photo: String,
    pub joined: Option<RawValue>,
    pub progress: Option<RawValue>,
    pub team: String,
}

impl Employee {
    pub fn into_row(self) -> RawRow {
        let mut row = RawRow::new()
            .with("id", self.id)
            .with("photo", self.photo)
            .with("name", self.name)
            .with("team", self.team);
        if let Some(joined) = self.joined {
            row.insert("joined", joined);
        }
        if let Some(progress) = self.progress {
            row.insert("progress", progress);
        }
        row
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of messy employee rows: mixed image field shapes,
/// spreadsheet date tokens next to ISO dates, and percentage strings.
#[derive(Debug, Clone)]
pub struct RowFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl RowFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn rows(&mut self, count: usize) -> Vec<RawRow> {
        (0..count)
            .map(|index| self.employee(index).into_row())
            .collect()
    }

    pub fn employee(&mut self, index: usize) -> Employee {
        let name = format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES));
        let shape = PHOTO_SHAPES[self.rng.int_n(PHOTO_SHAPES.len())];
        Employee {
            id: format!("emp-{:04}", index + 1),
            photo: self.photo_field(shape, &name),
            name,
            joined: self.joined_value(),
            progress: self.progress_value(),
            team: self.pick(&TEAMS).to_owned(),
        }
    }

    pub fn photo_field(&mut self, shape: PhotoShape, name: &str) -> String {
        let file_id = self.file_id();
        match shape {
            PhotoShape::DriveFileWithName => {
                format!("https://drive.google.com/file/d/{file_id}/view?usp=sharing, {name}")
            }
            PhotoShape::DriveOpenWithName => {
                format!("https://drive.google.com/open?id={file_id},{name}")
            }
            PhotoShape::DriveFileOnly => format!("https://drive.google.com/file/d/{file_id}/view"),
            PhotoShape::QuotedDriveWithName => {
                format!("\"https://drive.google.com/file/d/{file_id}/view,{name}\"")
            }
            PhotoShape::DirectUrlWithName => {
                let host = self.pick(&AVATAR_HOSTS);
                format!("https://{host}/u/{}.png, {name}", name.to_ascii_lowercase().replace(' ', "-"))
            }
            PhotoShape::NameOnly => name.to_owned(),
            PhotoShape::Empty => String::new(),
        }
    }

    /// A joined date in one of the encodings seen in sheet exports, or
    /// nothing.
    pub fn joined_value(&mut self) -> Option<RawValue> {
        let years_back = self.int_range(0, 8) as i32;
        let date = self.date_in_year(REFERENCE_YEAR - years_back);
        let value = match self.rng.int_n(6) {
            0 => format!(
                "Date({},{},{})",
                date.year(),
                u8::from(date.month()) - 1,
                date.day()
            ),
            1 => format!(
                "{}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            ),
            2 => format!("{}/{}/{}", date.day(), u8::from(date.month()), date.year()),
            3 => format!(
                "{} {}, {}",
                MONTH_NAMES[usize::from(u8::from(date.month()) - 1)],
                date.day(),
                date.year()
            ),
            4 => "pending".to_owned(),
            _ => return None,
        };
        Some(RawValue::Text(value))
    }

    /// A progress value as a percentage string, a bare number, or nothing.
    pub fn progress_value(&mut self) -> Option<RawValue> {
        let magnitude = self.int_range(0, 120) as f64;
        let value = if self.rng.bool() && self.rng.bool() {
            -magnitude
        } else {
            magnitude
        };
        match self.rng.int_n(4) {
            0 => Some(RawValue::Text(format!("{value}%"))),
            1 => Some(RawValue::Number(value)),
            2 => Some(RawValue::Text("n/a".to_owned())),
            _ => None,
        }
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let start = Date::from_calendar_date(year, Month::January, 1).expect("valid calendar date");
        let offset = self.int_range(0, 364);
        start + Duration::days(offset as i64)
    }

    fn file_id(&mut self) -> String {
        let len = self.int_range(20, 33);
        (0..len)
            .map(|_| char::from(FILE_ID_ALPHABET[self.rng.int_n(FILE_ID_ALPHABET.len())]))
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        min + self.rng.int_n(max - min + 1)
    }
}

/// Column set matching the rows produced by [`RowFaker`].
pub fn employee_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("photo", "Employee", ColumnKind::Image),
        ColumnDescriptor::new("team", "Team", ColumnKind::Plain),
        ColumnDescriptor::new("joined", "Joined", ColumnKind::Date),
        ColumnDescriptor::new("progress", "Progress", ColumnKind::Progress),
    ]
}

/// Probe that fails any url containing one of its patterns and records
/// every attempt in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    failing: Vec<String>,
    attempts: Vec<String>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: patterns.into_iter().map(Into::into).collect(),
            attempts: Vec::new(),
        }
    }

    pub fn attempts(&self) -> &[String] {
        &self.attempts
    }
}

impl ImageProbe for ScriptedProbe {
    fn attempt(&mut self, url: &str) -> LoadOutcome {
        self.attempts.push(url.to_owned());
        if self.failing.iter().any(|pattern| url.contains(pattern.as_str())) {
            LoadOutcome::Failed
        } else {
            LoadOutcome::Loaded
        }
    }
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let config_path = dir.path().join("config.toml");
    Ok((dir, config_path))
}

/// Small table file exercising every column kind and the header flag form.
pub fn fixture_table_json() -> &'static str {
    r#"{
  "columns": [
    { "id": "photo", "label": "Employee", "isImage": true },
    { "id": "team", "label": "Team", "kind": "plain" },
    { "id": "joined", "label": "Joined", "isDate": true },
    { "id": "progress", "label": "Progress", "kind": "progress" }
  ],
  "rows": [
    {
      "_id": "emp-0001",
      "photo": "https://drive.google.com/file/d/ABC123/view, Jane Doe",
      "team": "Operations",
      "joined": "Date(2023,0,15)",
      "progress": "-45%"
    },
    {
      "_id": "emp-0002",
      "photo": "Grace Hopper",
      "team": 0,
      "joined": "31/12/2024",
      "progress": null
    }
  ]
}
"#
}

#[cfg(test)]
mod tests {
    use super::{
        PhotoShape, REFERENCE_YEAR, RowFaker, ScriptedProbe, employee_columns,
        fixture_table_json, temp_config_path,
    };
    use anyhow::Result;
    use rollcall_app::{ImageProbe, LoadOutcome, RawValue, coerce_date};
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut left = RowFaker::new(42);
        let mut right = RowFaker::new(42);
        assert_eq!(left.rows(5), right.rows(5));
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(RowFaker::new(0).seed(), 1);
    }

    #[test]
    fn employee_rows_cover_every_column() {
        let mut faker = RowFaker::new(7);
        let employee = faker.employee(0);
        assert_eq!(employee.id, "emp-0001");
        assert!(!employee.name.is_empty());

        let row = employee.into_row();
        for column in employee_columns() {
            if matches!(column.id.as_str(), "joined" | "progress") {
                continue;
            }
            assert!(row.field(&column.id).is_some(), "column {}", column.id);
        }
    }

    #[test]
    fn photo_shapes() {
        let mut faker = RowFaker::new(3);
        let name = "Jane Doe";

        let drive = faker.photo_field(PhotoShape::DriveFileWithName, name);
        assert!(drive.starts_with("https://drive.google.com/file/d/"));
        assert!(drive.ends_with(", Jane Doe"));

        let quoted = faker.photo_field(PhotoShape::QuotedDriveWithName, name);
        assert!(quoted.starts_with('"') && quoted.ends_with('"'));

        let direct = faker.photo_field(PhotoShape::DirectUrlWithName, name);
        assert!(direct.contains("/u/jane-doe.png"));

        assert_eq!(faker.photo_field(PhotoShape::NameOnly, name), name);
        assert_eq!(faker.photo_field(PhotoShape::Empty, name), "");
    }

    #[test]
    fn joined_values_use_mixed_encodings() {
        let mut faker = RowFaker::new(11);
        let mut tokens = 0;
        let mut missing = 0;
        for _ in 0..200 {
            match faker.joined_value() {
                Some(RawValue::Text(value)) if value.starts_with("Date(") => tokens += 1,
                None => missing += 1,
                _ => {}
            }
        }
        assert!(tokens > 0, "expected spreadsheet date tokens");
        assert!(missing > 0, "expected missing dates");
    }

    #[test]
    fn joined_dates_fall_in_recent_years() {
        let mut faker = RowFaker::new(5);
        let mut dated = 0;
        for _ in 0..200 {
            let formatted = coerce_date(faker.joined_value().as_ref());
            let Some(year) = formatted
                .rsplit('/')
                .next()
                .and_then(|year| year.parse::<i32>().ok())
            else {
                continue;
            };
            assert!(
                (REFERENCE_YEAR - 8..=REFERENCE_YEAR).contains(&year),
                "joined {formatted}"
            );
            dated += 1;
        }
        assert!(dated > 0, "expected some formatted dates");
    }

    #[test]
    fn temp_config_path_points_into_a_fresh_dir() -> Result<()> {
        let (dir, path) = temp_config_path()?;
        assert!(path.starts_with(dir.path()));
        assert!(path.ends_with("config.toml"));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = RowFaker::new(seed);
            names.insert(faker.employee(0).name);
        }
        assert!(names.len() >= 10, "got {}", names.len());
    }

    #[test]
    fn scripted_probe_records_attempts() {
        let mut probe = ScriptedProbe::failing(["thumbnail"]);
        assert_eq!(
            probe.attempt("https://drive.google.com/thumbnail?id=A"),
            LoadOutcome::Failed
        );
        assert_eq!(probe.attempt("https://x/a.png"), LoadOutcome::Loaded);
        assert_eq!(probe.attempts().len(), 2);
    }

    #[test]
    fn fixture_table_mentions_every_kind() {
        let fixture = fixture_table_json();
        for needle in ["isImage", "isDate", "\"plain\"", "\"progress\""] {
            assert!(fixture.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn int_n() {
        let mut faker = RowFaker::new(42);
        for _ in 0..100 {
            let value = faker.int_n(5);
            assert!(value < 5);
        }
    }
}
