use crate::attributes::read_attribute;
use crate::bplist::decode_timestamp;
use crate::model::{DateSource, RenamerSettings, ResolvedDate};
use chrono::{DateTime, Datelike, Local, Utc};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
pub const REFERENCE_EPOCH_OFFSET_SECS: i64 = 978_307_200;

/// Filesystem reads the resolver depends on.
pub trait FileMetadataSource {
    /// Raw extended attribute payload, `Ok(None)` when the attribute is not set.
    fn read_attribute(&self, name: &str, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Native creation (birth) time of the file.
    fn created(&self, path: &Path) -> io::Result<SystemTime>;

    fn now(&self) -> DateTime<Local>;
}

/// Reads from the real filesystem and wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMetadataSource;

impl FileMetadataSource for SystemMetadataSource {
    fn read_attribute(&self, name: &str, path: &Path) -> io::Result<Option<Vec<u8>>> {
        read_attribute(name, path)
    }

    fn created(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.created()
    }

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Determines the original creation date of `path`.
///
/// Tries the custom creation date attribute, then the added date attribute,
/// then the filesystem creation time. A creation time falling on today's
/// local calendar date is treated as a placeholder and rejected. Every
/// failure along the way only advances to the next step.
pub fn resolve_creation_date<S>(
    source: &S,
    path: &Path,
    settings: &RenamerSettings,
) -> Option<ResolvedDate>
where
    S: FileMetadataSource + ?Sized,
{
    if settings.use_extended_attributes {
        let attribute_steps = [
            (
                settings.custom_creation_date_attribute.as_str(),
                DateSource::CustomCreationDate,
            ),
            (
                settings.added_date_attribute.as_str(),
                DateSource::AddedDate,
            ),
        ];
        for (name, date_source) in attribute_steps {
            if let Some(date) = date_from_attribute(source, name, path) {
                return Some(ResolvedDate {
                    date,
                    source: date_source,
                });
            }
        }
    }

    date_from_creation_time(source, path, settings.same_day_guard).map(|date| ResolvedDate {
        date,
        source: DateSource::FileCreation,
    })
}

fn date_from_attribute<S>(source: &S, name: &str, path: &Path) -> Option<DateTime<Local>>
where
    S: FileMetadataSource + ?Sized,
{
    let payload = match source.read_attribute(name, path) {
        Ok(Some(payload)) => payload,
        Ok(None) => return None,
        Err(error) => {
            warn!("{}: 属性 {} の読み込みに失敗しました: {}", path.display(), name, error);
            return None;
        }
    };

    match decode_timestamp(&payload) {
        Ok(seconds) => {
            let date = reference_seconds_to_local(seconds);
            if date.is_none() {
                debug!("{}: 属性 {} の値 {} は日時に変換できません", path.display(), name, seconds);
            }
            date
        }
        Err(error) => {
            debug!("{}: 属性 {} を解析できません: {}", path.display(), name, error);
            None
        }
    }
}

fn date_from_creation_time<S>(source: &S, path: &Path, same_day_guard: bool) -> Option<DateTime<Local>>
where
    S: FileMetadataSource + ?Sized,
{
    let created = match source.created(path) {
        Ok(created) => DateTime::<Local>::from(created),
        Err(error) => {
            debug!("{}: 作成日時を取得できません: {}", path.display(), error);
            return None;
        }
    };

    if same_day_guard && created.date_naive() == source.now().date_naive() {
        debug!("{}: 作成日時が今日のため信頼できません", path.display());
        return None;
    }
    Some(created)
}

/// Years that fit the `YYYYMMDD` prefix.
const PREFIX_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Converts seconds since 2001-01-01 UTC into a local date time.
///
/// `None` for values that are not finite or land outside years 0..=9999.
pub fn reference_seconds_to_local(seconds: f64) -> Option<DateTime<Local>> {
    if !seconds.is_finite() {
        return None;
    }
    let unix = seconds + REFERENCE_EPOCH_OFFSET_SECS as f64;
    let whole = unix.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = (((unix - whole) * 1e9).round() as u32).min(999_999_999);
    let local = DateTime::<Utc>::from_timestamp(whole as i64, nanos)?.with_timezone(&Local);
    PREFIX_YEARS.contains(&local.year()).then_some(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bplist::tests::date_plist;
    use chrono::TimeZone;
    use std::collections::{HashMap, HashSet};

    struct FakeSource {
        attributes: HashMap<String, Vec<u8>>,
        failing_attributes: HashSet<String>,
        created: Option<DateTime<Local>>,
        now: DateTime<Local>,
    }

    impl FakeSource {
        fn new(now: DateTime<Local>) -> Self {
            Self {
                attributes: HashMap::new(),
                failing_attributes: HashSet::new(),
                created: None,
                now,
            }
        }

        fn with_attribute(mut self, name: &str, payload: Vec<u8>) -> Self {
            self.attributes.insert(name.to_string(), payload);
            self
        }

        fn with_created(mut self, created: DateTime<Local>) -> Self {
            self.created = Some(created);
            self
        }
    }

    impl FileMetadataSource for FakeSource {
        fn read_attribute(&self, name: &str, _path: &Path) -> io::Result<Option<Vec<u8>>> {
            if self.failing_attributes.contains(name) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            Ok(self.attributes.get(name).cloned())
        }

        fn created(&self, _path: &Path) -> io::Result<SystemTime> {
            self.created
                .map(SystemTime::from)
                .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "no birth time"))
        }

        fn now(&self) -> DateTime<Local> {
            self.now
        }
    }

    fn local(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn attribute_payload(date: DateTime<Local>) -> Vec<u8> {
        date_plist((date.timestamp() - REFERENCE_EPOCH_OFFSET_SECS) as f64)
    }

    fn today() -> DateTime<Local> {
        local(2026, 10, 18, 15)
    }

    fn resolve(source: &FakeSource) -> Option<ResolvedDate> {
        resolve_creation_date(source, Path::new("IMG_01.jpg"), &RenamerSettings::default())
    }

    #[test]
    fn custom_creation_date_wins_over_other_sources() {
        let source = FakeSource::new(today())
            .with_attribute(
                crate::attributes::CUSTOM_CREATION_DATE_ATTR,
                attribute_payload(local(2022, 3, 1, 12)),
            )
            .with_attribute(
                crate::attributes::ADDED_DATE_ATTR,
                attribute_payload(local(2023, 1, 1, 12)),
            )
            .with_created(local(2021, 11, 5, 12));

        let resolved = resolve(&source).expect("resolved");
        assert_eq!(resolved.date, local(2022, 3, 1, 12));
        assert_eq!(resolved.source, DateSource::CustomCreationDate);
    }

    #[test]
    fn corrupt_custom_attribute_falls_back_to_added_date() {
        let source = FakeSource::new(today())
            .with_attribute(crate::attributes::CUSTOM_CREATION_DATE_ATTR, b"garbage".to_vec())
            .with_attribute(
                crate::attributes::ADDED_DATE_ATTR,
                attribute_payload(local(2023, 1, 1, 12)),
            );

        let resolved = resolve(&source).expect("resolved");
        assert_eq!(resolved.date, local(2023, 1, 1, 12));
        assert_eq!(resolved.source, DateSource::AddedDate);
    }

    #[test]
    fn attribute_read_failure_falls_back_to_creation_time() {
        let mut source = FakeSource::new(today()).with_created(local(2021, 11, 5, 12));
        source
            .failing_attributes
            .insert(crate::attributes::CUSTOM_CREATION_DATE_ATTR.to_string());

        let resolved = resolve(&source).expect("resolved");
        assert_eq!(resolved.date, local(2021, 11, 5, 12));
        assert_eq!(resolved.source, DateSource::FileCreation);
    }

    #[test]
    fn creation_time_on_current_day_is_rejected() {
        let source = FakeSource::new(today()).with_created(local(2026, 10, 18, 1));
        assert_eq!(resolve(&source), None);
    }

    #[test]
    fn same_day_guard_can_be_disabled() {
        let source = FakeSource::new(today()).with_created(local(2026, 10, 18, 1));
        let settings = RenamerSettings {
            same_day_guard: false,
            ..RenamerSettings::default()
        };
        let resolved = resolve_creation_date(&source, Path::new("a.jpg"), &settings);
        assert_eq!(resolved.map(|r| r.date), Some(local(2026, 10, 18, 1)));
    }

    #[test]
    fn missing_creation_time_resolves_to_unknown() {
        let source = FakeSource::new(today());
        assert_eq!(resolve(&source), None);
    }

    #[test]
    fn attributes_ignored_when_disabled() {
        let source = FakeSource::new(today())
            .with_attribute(
                crate::attributes::CUSTOM_CREATION_DATE_ATTR,
                attribute_payload(local(2022, 3, 1, 12)),
            )
            .with_created(local(2021, 11, 5, 12));
        let settings = RenamerSettings {
            use_extended_attributes: false,
            ..RenamerSettings::default()
        };

        let resolved = resolve_creation_date(&source, Path::new("a.jpg"), &settings).expect("resolved");
        assert_eq!(resolved.source, DateSource::FileCreation);
    }

    #[test]
    fn reference_epoch_conversion() {
        let start = reference_seconds_to_local(0.0).expect("date");
        assert_eq!(start.with_timezone(&Utc).to_rfc3339(), "2001-01-01T00:00:00+00:00");

        let half = reference_seconds_to_local(-0.5).expect("date");
        assert_eq!(half.timestamp(), REFERENCE_EPOCH_OFFSET_SECS - 1);
        assert_eq!(half.timestamp_subsec_millis(), 500);

        assert_eq!(reference_seconds_to_local(f64::NAN), None);
        assert_eq!(reference_seconds_to_local(f64::INFINITY), None);
        assert_eq!(reference_seconds_to_local(1e300), None);
        assert_eq!(reference_seconds_to_local(3.0e11), None);
        assert_eq!(reference_seconds_to_local(-1.0e11), None);
        let late = reference_seconds_to_local(2.5e11).expect("date");
        assert_eq!(late.year(), 9_923);
    }

    #[test]
    fn implausible_custom_date_falls_back_to_added_date() {
        let source = FakeSource::new(today())
            .with_attribute(crate::attributes::CUSTOM_CREATION_DATE_ATTR, date_plist(3.0e11))
            .with_attribute(
                crate::attributes::ADDED_DATE_ATTR,
                attribute_payload(local(2023, 1, 1, 12)),
            );

        let resolved = resolve(&source).expect("resolved");
        assert_eq!(resolved.date, local(2023, 1, 1, 12));
        assert_eq!(resolved.source, DateSource::AddedDate);
    }

    #[test]
    fn system_source_reads_real_attribute() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("IMG_01.jpg");
        std::fs::write(&path, b"jpeg").expect("write");
        let payload = attribute_payload(local(2022, 3, 1, 12));
        if let Err(error) = xattr::set(&path, "user.renamer.custom", &payload) {
            eprintln!("skipping: xattr unsupported here: {}", error);
            return;
        }
        let settings = RenamerSettings {
            custom_creation_date_attribute: "user.renamer.custom".to_string(),
            added_date_attribute: "user.renamer.added".to_string(),
            ..RenamerSettings::default()
        };

        let resolved = resolve_creation_date(&SystemMetadataSource, &path, &settings).expect("resolved");
        assert_eq!(resolved.date, local(2022, 3, 1, 12));
        assert_eq!(resolved.source, DateSource::CustomCreationDate);
    }
}
