use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dxfface_config::{AppConfig, ConfigError};
use dxfface_core::kernel::PlanarKernel;
use dxfface_io::DxfConverter;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod export;
mod summary;

use summary::FaceReport;

/// 从 DXF 图纸重建带孔平面面，输出摘要并可导出 JSON。
#[derive(Parser, Debug)]
#[command(name = "dxfface")]
#[command(version, about, long_about = None)]
struct Args {
    /// 输入的 DXF 文件
    input: PathBuf,

    /// 将复合体与统计信息写入 JSON 文件
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 配置文件路径（默认读取 DXFFACE_CONFIG 或 ./config/default.toml）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖配置中的日志等级
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = load_configuration(args.config.as_deref());
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    init_logging(&config);
    info!(input = %args.input.display(), "启动 dxfface");

    let kernel = PlanarKernel::with_tolerance(config.conversion.tolerance);
    let mut converter = DxfConverter::with_kernel(kernel);
    if let Err(err) = converter.convert(&args.input) {
        error!(error = %err, "无法读取输入文件");
        eprintln!("错误：{err}");
        return ExitCode::FAILURE;
    }
    let Some(compound) = converter.compound() else {
        return ExitCode::FAILURE;
    };
    let stats = converter.stats();

    let reports = FaceReport::collect(compound, &config.conversion);
    for report in &reports {
        for issue in &report.issues {
            warn!(face = report.index, issue = %issue, "面检查发现问题");
        }
    }

    let mut stdout = io::stdout().lock();
    if let Err(err) = summary::write_summary(&mut stdout, &args.input, compound, stats, &reports) {
        error!(error = %err, "输出摘要失败");
        return ExitCode::FAILURE;
    }

    if let Some(output) = args.output.as_deref() {
        let document = export::ExportDocument::new(&args.input, compound, stats, &reports);
        if let Err(err) = export::write_json(output, &document, config.output.pretty_json) {
            error!(error = %err, "导出 JSON 失败");
            eprintln!("错误：{err}");
            return ExitCode::FAILURE;
        }
        info!(path = %output.display(), "已导出 JSON");
    }

    ExitCode::SUCCESS
}

fn load_configuration(override_path: Option<&Path>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
