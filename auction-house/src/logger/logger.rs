use std::path::Path;

use flexi_logger::{FileSpec, FlexiLoggerError, Logger, LoggerHandle, WriteMode};

/// Starts file logging. Keep the returned handle alive for as long as the
/// process logs; dropping it flushes and stops the writer.
pub fn init_logger(
    level: &str,
    dir_path: impl AsRef<Path>,
    prefix: &str,
) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(level)?
        .log_to_file(
            FileSpec::default()
                .directory(dir_path.as_ref())
                .basename(prefix),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .start()
}
