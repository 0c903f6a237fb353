//! # compress 命令实现
//!
//! ## 依赖关系
//! - 使用 `cli/compress.rs` 定义的参数
//! - 使用 `compress/`

use super::print_status;
use crate::cli::compress::CompressArgs;
use crate::compress::{CompressConfig, FolderCompressor, LopdfCompressor, SkipPolicy};
use crate::config::Settings;
use crate::error::{Result, SgdiError};
use crate::utils::output;

/// 执行 compress 命令
pub fn execute(args: CompressArgs, settings: &Settings) -> Result<()> {
    output::print_header("PDF Batch Compression");

    if !(0.0..1.0).contains(&args.min_saving) {
        return Err(SgdiError::InvalidArgument(format!(
            "--min-saving must be in [0, 1), got {}",
            args.min_saving
        )));
    }
    if args.dry_run {
        output::print_info("Dry run: no file will be replaced");
    }

    let config = CompressConfig {
        quality: args.quality,
        skip: SkipPolicy {
            min_size_bytes: args.min_size_kb * 1024,
            min_saving_ratio: args.min_saving,
        },
        dry_run: args.dry_run,
        recursive: !args.no_recursive,
        probe_timeout: settings.probe_timeout,
    };

    let ledger = settings.open_ledger()?;
    let compressor = FolderCompressor::new(ledger, LopdfCompressor, config);
    let runner = settings.runner("Compressing PDFs");
    let outcome = compressor.compress_folder(&args.folder, &runner)?;

    for (item, reason) in &outcome.failures {
        output::print_error(&format!("{}: {}", item, reason));
    }
    if settings.verbosity > 0 {
        for reason in &outcome.skips {
            output::print_skip(reason);
        }
    }
    if outcome.not_attempted > 0 {
        output::print_warning(&format!("{} files not attempted (cancelled)", outcome.not_attempted));
    }

    let r = &outcome.result;
    let ratio = r
        .compression_ratio
        .map(|x| format!("{:.1}%", x * 100.0))
        .unwrap_or_else(|| "-".to_string());
    print_status(
        outcome.status,
        &format!(
            "Compressed {}, skipped {}, errors {}; {:.2} MB -> {:.2} MB (ratio {}, saved {:.2} MB)",
            r.files_processed,
            r.files_skipped,
            r.files_error,
            r.original_size_mb,
            r.compressed_size_mb,
            ratio,
            r.space_saved_mb
        ),
    );
    Ok(())
}
