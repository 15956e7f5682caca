mod source;

use anyhow::{Context, Result};
use charminder_core::report::{write_json, write_report, Symbols};
use charminder_core::{validate_with, ChardetDetector, CheckStats, Issue, ReportEntry, ValidateOptions, ValidationResult};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::source::{download, is_url, Source};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "charminder", version, about = "Check that text files conform to a character encoding")]
struct Cli {
    /// 待检查的文件或 URL；多个时重复指定
    #[arg(short = 'f', long = "files", required = true)]
    files: Vec<String>,

    /// 期望编码
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = EncodingArg::Utf8)]
    encoding: EncodingArg,

    /// 输出格式：text 或 json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// 问题字符上下文窗口半径（字符数）
    #[arg(long, default_value_t = charminder_core::DEFAULT_CONTEXT_RADIUS)]
    context_radius: usize,

    /// 最大文件大小（单位字节）；超过则报告错误
    #[arg(long)]
    max_file_size: Option<u64>,
}

/// 可选的期望编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EncodingArg {
    #[value(name = "UTF8", alias = "utf-8")]
    Utf8,
    #[value(name = "UTF8_SIG", alias = "utf-8-sig")]
    Utf8Sig,
    #[value(name = "ASCII")]
    Ascii,
    #[value(name = "LATIN1", alias = "latin-1")]
    Latin1,
    #[value(name = "CP1252", alias = "windows-1252")]
    Cp1252,
    #[value(name = "UTF16", alias = "utf-16")]
    Utf16,
}

impl EncodingArg {
    /// 传给校验器的编码名称
    fn value(self) -> &'static str {
        match self {
            EncodingArg::Utf8 => "utf-8",
            EncodingArg::Utf8Sig => "utf-8-sig",
            EncodingArg::Ascii => "ascii",
            EncodingArg::Latin1 => "latin-1",
            EncodingArg::Cp1252 => "cp1252",
            EncodingArg::Utf16 => "utf-16",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    let opts = ValidateOptions { context_radius: cli.context_radius, max_file_size: cli.max_file_size };
    let expected = cli.encoding.value();
    let symbols = Symbols::from_env();
    info!(files = cli.files.len(), expected, "starting check");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut stats = CheckStats::default();
    let mut failed = false;
    let mut collected: Vec<(String, ValidationResult)> = Vec::new();

    for file in &cli.files {
        // 单文件失败只影响本文件，继续处理后续输入
        let source = match resolve(file, cli.format, &mut out) {
            Ok(Some(s)) => s,
            Ok(None) => {
                failed = true;
                if cli.format == OutputFormat::Text {
                    writeln!(out, "{} {file}: File not found", symbols.cross).context("write stdout")?;
                } else {
                    let message = format!("File not found: {file}");
                    collected.push((file.clone(), ValidationResult::from_issues(vec![Issue::FileError { message }])));
                }
                continue;
            }
            Err(e) => {
                warn!(file = %file, error = %e, "processing failed");
                failed = true;
                if cli.format == OutputFormat::Text {
                    writeln!(out, "{} {file}: Error processing file - {e:#}", symbols.cross).context("write stdout")?;
                } else {
                    let message = format!("Error processing file - {e:#}");
                    collected.push((file.clone(), ValidationResult::from_issues(vec![Issue::FileError { message }])));
                }
                continue;
            }
        };

        let result = validate_with(source.path(), expected, &opts, &ChardetDetector);
        stats.record(&result);
        if !result.is_valid {
            failed = true;
        }

        match cli.format {
            OutputFormat::Text => write_report(&mut out, file, &result, expected, &symbols).context("write report")?,
            OutputFormat::Json => collected.push((file.clone(), result)),
        }
        // source 在此处离开作用域，下载的临时文件随之删除
    }

    if cli.format == OutputFormat::Json {
        let entries: Vec<ReportEntry<'_>> = collected
            .iter()
            .map(|(file, result)| ReportEntry { file, expected_encoding: expected, result })
            .collect();
        write_json(&mut out, &entries).context("write json report")?;
    }
    out.flush().ok();

    info!(
        files_checked = stats.files_checked,
        files_invalid = stats.files_invalid,
        files_with_warnings = stats.files_with_warnings,
        issues_total = stats.issues_total,
        "check finished"
    );

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// 解析输入：URL 下载到临时文件；本地路径不存在时返回 None
fn resolve(file: &str, format: OutputFormat, out: &mut dyn Write) -> Result<Option<Source>> {
    if is_url(file) {
        if format == OutputFormat::Text {
            writeln!(out, "Downloading {file}...")?;
        }
        return Ok(Some(Source::Downloaded(download(file)?)));
    }
    let path = PathBuf::from(file);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(Source::Local(path)))
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 报告写 stdout，日志写 stderr；默认只输出 warn 及以上
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
