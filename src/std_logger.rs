use chrono::{DateTime, Local};
use log::{max_level, LevelFilter, Metadata, Record, SetLoggerError};

static LOGGER: StdLogger = StdLogger;

pub struct StdLogger;

impl log::Log for StdLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= max_level()
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      println!("{}", format_record(&Local::now(), record));
    }
  }

  fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER)?;
  log::set_max_level(level);
  Ok(())
}

fn format_record(time: &DateTime<Local>, record: &Record) -> String {
  let time_str = time.format("%Y-%m-%dT%H:%M:%S");
  let target = record.target().rsplit("::").next().unwrap_or_default();

  format!("{0} {1:<8} {2}: {3}", time_str, record.level(), target, record.args())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use log::Level;

  #[test]
  fn record_is_formatted_with_time_level_and_short_target() {
    let time = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
    let line = format_record(
      &time,
      &Record::builder()
        .args(format_args!("Proxying request to: {}", "http://example.com"))
        .level(Level::Info)
        .target("dev_proxy_server::proxy_service::proxy_route_service")
        .build(),
    );

    assert_eq!(
      line,
      "2024-03-01T12:30:05 INFO     proxy_route_service: Proxying request to: http://example.com"
    );
  }
}
