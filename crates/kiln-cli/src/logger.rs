//! stderr logging through `fern`

use log::LevelFilter;

/// Level from `KILN_LOG` when set, otherwise from the `-v` count
pub fn level(verbosity: u8) -> LevelFilter {
    if let Some(level) = std::env::var("KILN_LOG").ok().and_then(|v| v.parse().ok()) {
        return level;
    }
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn dispatch(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{:<5}] {}", record.level(), message))
        })
        .level(level)
        .chain(std::io::stderr())
}

pub fn init(verbosity: u8) {
    // Only fails when a logger is already installed
    dispatch(level(verbosity)).apply().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        std::env::remove_var("KILN_LOG");
        assert_eq!(level(0), LevelFilter::Info);
        assert_eq!(level(1), LevelFilter::Debug);
        assert_eq!(level(5), LevelFilter::Trace);
    }

    #[test]
    fn test_dispatch_builds_logger() {
        let (max, _logger) = dispatch(LevelFilter::Warn).into_log();
        assert_eq!(max, LevelFilter::Warn);
    }
}
