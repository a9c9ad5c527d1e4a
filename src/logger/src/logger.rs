use std::io::Write;

use env_logger::{fmt::Color, Builder, Env};
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{Level, LevelFilter};
use once_cell::sync::OnceCell;

static INSTANCE: OnceCell<Logger> = OnceCell::new();

/// Process-wide logger, bridging `log` records with `indicatif` progress
/// bars so that bars and log lines do not clobber each other.
#[derive(Debug)]
pub struct Logger {
    multi_pg: MultiProgress,
}

impl Logger {
    /// Build and register the global logger.
    ///
    /// Verbosity maps from the number of `-v` occurrences on the command
    /// line; the `DOMDIST_LOG` environment variable overrides the filter.
    pub fn init(verbosity: u8) {
        let env = Env::default().filter("DOMDIST_LOG");

        let logger = Builder::new()
            .filter_level(Self::level_filter(verbosity))
            .format(|buf, record| {
                // Error records additionally point at their call site.
                let origin = match record.level() {
                    Level::Error => format!(
                        "(@ {}:{}) ",
                        record.file().unwrap_or("unknown"),
                        record.line().unwrap_or(0)
                    ),
                    _ => String::new(),
                };

                let mut level_style = buf.style();
                level_style.set_bold(true).set_color(match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn  => Color::Yellow,
                    Level::Info  => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan,
                });

                writeln!(
                    buf,
                    "[{} {: <5} {}] {origin}{}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    level_style.value(record.level()),
                    record.target(),
                    record.args()
                )
            })
            .parse_env(env)
            .build();

        let multi_pg = MultiProgress::new();
        LogWrapper::new(multi_pg.clone(), logger)
            .try_init()
            .expect("Failed to wrap logger with multiprogress");
        INSTANCE.set(Self { multi_pg }).expect("Logger initialized twice");
    }

    fn level_filter(verbosity: u8) -> LevelFilter {
        match verbosity {
            0          => LevelFilter::Error,
            1          => LevelFilter::Warn,
            2          => LevelFilter::Info,
            3          => LevelFilter::Debug,
            4..=u8::MAX => LevelFilter::Trace,
        }
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::level_filter(verbosity));
    }

    /// The shared progress-bar registry. Bars must be attached here to
    /// interleave with log output.
    pub fn multi() -> &'static MultiProgress {
        &INSTANCE.get().expect("Uninitialized logger").multi_pg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_mapping() {
        Logger::init(0);
        for (verbosity, expected) in [
            (0, LevelFilter::Error),
            (1, LevelFilter::Warn),
            (2, LevelFilter::Info),
            (3, LevelFilter::Debug),
            (4, LevelFilter::Trace),
            (u8::MAX, LevelFilter::Trace),
        ] {
            Logger::set_level(verbosity);
            assert_eq!(log::max_level(), expected);
        }
    }
}
