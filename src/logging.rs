use log::LevelFilter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Install a stdout logger for hosts that do not bring their own.
///
/// Messages look like `[2024-05-01 12:00:01.123 DEBUG ayyboy_core::sgb] SGB: ...`,
/// stamped with local time.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                timestamp(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_once() {
        assert!(init(LevelFilter::Debug).is_ok());
        log::debug!("SGB: logger installed");
        assert!(init(LevelFilter::Trace).is_err());
    }

    #[test]
    fn timestamps_carry_the_date() {
        let stamp = timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(stamp.len(), "2024-05-01 12:00:01.123".len());
    }
}
