//! # codes 命令实现
//!
//! ## 功能
//! - 批量生成编码，可选立即导出
//! - 导出尚未导出的编码
//! - 按编码或表号查询
//! - 校验编码格式并检查是否已发放
//!
//! ## 依赖关系
//! - 使用 `cli/codes.rs` 定义的参数
//! - 使用 `codegen/`
//! - 使用 `utils/output.rs`

use super::print_status;
use crate::cli::codes::{
    CheckArgs, CodesArgs, CodesCommand, ExportArgs, ExportKind, FormatKind, GenerateArgs, LookupArgs,
    LookupBy,
};
use crate::codegen::{export_codes, lookup, CodeFormat, CodeGenerator, ExportFormat, Lookup};
use crate::config::Settings;
use crate::error::{Result, SgdiError};
use crate::models::{ArticleMetadata, GeneratedCode};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 编码表格行
#[derive(Debug, Clone, Tabled)]
struct CodeRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Article")]
    article: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Exported")]
    exported: String,
}

impl From<&GeneratedCode> for CodeRow {
    fn from(code: &GeneratedCode) -> Self {
        CodeRow {
            code: code.code.clone(),
            article: code.article_name.clone(),
            serial: code.meter_serial.clone().unwrap_or_default(),
            created: code.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            exported: match &code.export_path {
                Some(path) if code.exported => path.clone(),
                _ => "-".to_string(),
            },
        }
    }
}

/// 执行 codes 命令
pub fn execute(args: CodesArgs, settings: &Settings) -> Result<()> {
    match args.command {
        CodesCommand::Generate(args) => generate(args, settings),
        CodesCommand::Export(args) => export(args, settings),
        CodesCommand::Lookup(args) => find(args, settings),
        CodesCommand::Check(args) => check(args, settings),
    }
}

fn code_format(args: &GenerateArgs) -> Result<CodeFormat> {
    match args.format {
        FormatKind::Inacal => Ok(CodeFormat::Inacal),
        FormatKind::Prefixed => CodeFormat::prefixed(args.prefix.as_deref().unwrap_or_default()),
        FormatKind::Alphabet => {
            CodeFormat::alphabet(args.alphabet.as_deref().unwrap_or_default(), args.length)
        }
    }
}

fn export_format(kind: Option<ExportKind>, path: &std::path::Path) -> Result<ExportFormat> {
    match kind {
        Some(ExportKind::Txt) => Ok(ExportFormat::Txt),
        Some(ExportKind::Csv) => Ok(ExportFormat::Csv),
        None => ExportFormat::from_path(path).ok_or_else(|| {
            SgdiError::InvalidArgument(format!(
                "cannot infer export format from '{}', use --format",
                path.display()
            ))
        }),
    }
}

fn generate(args: GenerateArgs, settings: &Settings) -> Result<()> {
    output::print_header("Generating Unique Codes");

    let format = code_format(&args)?;
    let export_target = match &args.export {
        Some(path) => Some((path.clone(), export_format(None, path)?)),
        None => None,
    };

    let ledger = settings.open_ledger()?;
    let generator = CodeGenerator::new(ledger.clone())
        .with_format(format)
        .with_max_retries(args.retries);
    if settings.verbosity > 0 {
        output::print_info(&format!(
            "Code space: {} combinations",
            generator.format().keyspace()
        ));
    }

    let template = ArticleMetadata {
        article_name: String::new(),
        meter_serial: args.meter_serial.clone(),
        service_type: args.service_type.clone(),
        notes: args.notes.clone(),
    };
    // 预留一旦写入就不能撤回，超时放弃的项会变成已发放却计为失败
    let runner = settings.runner("Generating codes").with_timeout(None);
    let summary = generator.generate_batch(args.count as usize, &args.article, &template, &runner)?;

    let rows: Vec<CodeRow> = summary.codes.iter().map(CodeRow::from).collect();
    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
    for (item, reason) in &summary.failures {
        output::print_error(&format!("{}: {}", item, reason));
    }

    if let Some((path, format)) = export_target {
        let marked = export_codes(&ledger, &summary.codes, &path, format)?;
        output::print_success(&format!("Exported {} codes to '{}'", marked, path.display()));
    }

    print_status(
        summary.status,
        &format!(
            "Generated {} of {} codes in {:.2}s",
            summary.codes.len(),
            summary.requested,
            summary.duration_seconds
        ),
    );
    if summary.not_attempted > 0 {
        output::print_warning(&format!("{} codes not attempted (cancelled)", summary.not_attempted));
    }
    Ok(())
}

fn export(args: ExportArgs, settings: &Settings) -> Result<()> {
    let format = export_format(args.format, &args.output)?;
    let ledger = settings.open_ledger()?;

    let pending: Vec<GeneratedCode> = ledger
        .unexported_codes(args.limit)?
        .into_iter()
        .map(|stored| stored.record)
        .collect();
    if pending.is_empty() {
        output::print_info("No codes waiting for export.");
        return Ok(());
    }

    let marked = export_codes(&ledger, &pending, &args.output, format)?;
    output::print_done(&format!(
        "Exported {} codes to '{}'",
        marked,
        args.output.display()
    ));
    Ok(())
}

fn find(args: LookupArgs, settings: &Settings) -> Result<()> {
    let query = match args.by {
        LookupBy::Code => Lookup::Code(args.query),
        LookupBy::Serial => Lookup::MeterSerial(args.query),
    };
    let ledger = settings.open_ledger()?;
    let found = lookup(&ledger, &query)?;

    if found.is_empty() {
        output::print_warning("No matching codes.");
        return Ok(());
    }
    let rows: Vec<CodeRow> = found.iter().map(|s| CodeRow::from(&s.record)).collect();
    println!("{}", Table::new(&rows));
    output::print_info(&format!("{} match(es)", rows.len()));
    Ok(())
}

fn check(args: CheckArgs, settings: &Settings) -> Result<()> {
    let format = match &args.prefix {
        Some(prefix) => CodeFormat::prefixed(prefix)?,
        None => CodeFormat::Inacal,
    };
    let code = args.code.trim().to_uppercase();
    format.validate(&code)?;

    let ledger = settings.open_ledger()?;
    if ledger.code_exists(&code)? {
        output::print_warning(&format!("{} is already issued", code));
    } else {
        output::print_success(&format!("{} is valid and free", code));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["sgdi", "codes", "generate"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            crate::cli::Commands::Codes(CodesArgs {
                command: CodesCommand::Generate(args),
            }) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_code_format_from_args() {
        assert_eq!(code_format(&generate_args(&["3"])).unwrap(), CodeFormat::Inacal);
        assert_eq!(
            code_format(&generate_args(&["--format", "prefixed", "--prefix", "ab"])).unwrap(),
            CodeFormat::Prefixed("AB".to_string())
        );
        assert!(Cli::try_parse_from(["sgdi", "codes", "generate", "--format", "alphabet"]).is_err());
    }

    #[test]
    fn test_export_format_inference() {
        let path = std::path::Path::new("out/codes.csv");
        assert_eq!(export_format(None, path).unwrap(), ExportFormat::Csv);
        assert_eq!(
            export_format(Some(ExportKind::Txt), path).unwrap(),
            ExportFormat::Txt
        );
        assert!(export_format(None, std::path::Path::new("codes.xlsx")).is_err());
    }

    #[test]
    fn test_check_args_parse() {
        let cli = Cli::try_parse_from(["sgdi", "codes", "check", "ab12345678", "--prefix", "ab"])
            .unwrap();
        match cli.command {
            crate::cli::Commands::Codes(CodesArgs {
                command: CodesCommand::Check(args),
            }) => {
                assert_eq!(args.code, "ab12345678");
                assert_eq!(args.prefix.as_deref(), Some("ab"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
