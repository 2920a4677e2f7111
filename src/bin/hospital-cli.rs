//! 医院挂号 CLI 客户端
//!
//! 非交互式 CLI，用于在终端中测试数据层：查看基础数据、挂号、按 NIK 查询状态。
//! 远端配置从环境变量 / `.env` 读取，未配置时自动使用本地降级存储。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hospital_registration_core::hospital::registration::PaymentMethod;
use hospital_registration_core::{
    ClientConfig, FallbackListener, HospitalClient, NewRegistration,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// 医院挂号 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "hospital-cli")]
#[command(about = "Hospital registration CLI - 用于测试挂号数据层", long_about = None)]
struct Args {
    /// 日志级别（默认: info,hospital_registration_core=debug）
    #[arg(long, default_value = "info,hospital_registration_core=debug")]
    log_level: String,

    /// 额外把日志写入该文件
    #[arg(long)]
    log_file: Option<String>,

    /// 忽略 Supabase 配置，只使用本地存储
    #[arg(long)]
    offline: bool,

    /// 本地降级存储的 SQLite URL（覆盖 HOSPITAL_FALLBACK_DB_URL）
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出医生（--available 只显示可预约的）
    Doctors {
        #[arg(long)]
        available: bool,
    },
    /// 列出病房与空余床位
    Rooms,
    /// 患者挂号
    Register {
        #[arg(long)]
        nik: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Kelas 3")]
        class_type: String,
        /// cash / transfer / va / bpjs
        #[arg(long, default_value = "cash")]
        payment: String,
        #[arg(long, default_value = "0")]
        cost: i64,
        #[arg(long)]
        bpjs_number: Option<String>,
        #[arg(long)]
        doctor_id: Option<i64>,
    },
    /// 按 NIK 查询挂号状态
    Status {
        #[arg(long)]
        nik: String,
    },
    /// 列出留言
    Messages,
    /// 管理后台统计
    Stats,
}

/// 初始化日志（输出到 stderr，stdout 留给 JSON 结果；可选同时输出到文件）
fn init_logger(log_level: &str, log_file: Option<&str>) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 文件不需要 ANSI 颜色
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("无法创建日志文件 {}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// 降级时在日志中提示
struct CliFallbackListener;

#[async_trait::async_trait]
impl FallbackListener for CliFallbackListener {
    async fn on_fallback(&self, operation: String, reason: String) {
        warn!("[CLI] 📴 {} 使用本地数据: {}", operation, reason);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("输出 JSON 失败")?
    );
    Ok(())
}

fn parse_payment(raw: &str) -> Result<PaymentMethod> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .with_context(|| format!("未知的支付方式: {}（可选 cash / transfer / va / bpjs）", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level, args.log_file.as_deref())?;

    let mut config = if args.offline {
        ClientConfig::offline()
    } else {
        ClientConfig::from_env()
    };
    if let Some(db) = args.db {
        config = config.with_fallback_db_url(db);
    }

    let client = HospitalClient::with_listener(config, Arc::new(CliFallbackListener)).await?;
    info!(
        "[CLI] 🚀 客户端已就绪，远端: {}",
        if client.is_remote_enabled() { "Supabase" } else { "离线" }
    );

    match args.command {
        Command::Doctors { available } => {
            let doctors = if available {
                client.catalog().get_available_doctors().await?
            } else {
                client.catalog().get_doctors().await?
            };
            print_json(&doctors)?;
        }
        Command::Rooms => {
            let rooms = client.catalog().get_rooms().await?;
            for room in &rooms {
                info!(
                    "[CLI] 🛏️ {} 空余 {}/{}",
                    room.class_type,
                    room.available_beds(),
                    room.total_beds
                );
            }
            print_json(&rooms)?;
        }
        Command::Register {
            nik,
            name,
            class_type,
            payment,
            cost,
            bpjs_number,
            doctor_id,
        } => {
            let request = NewRegistration {
                nik,
                full_name: name,
                phone: None,
                address: None,
                birth_date: None,
                doctor_id,
                class_type,
                payment_method: parse_payment(&payment)?,
                cost,
                bpjs_number,
            };
            let registration = client.registrations().register_patient(request).await?;
            info!("[CLI] ✅ 挂号成功，编号: {}", registration.booking_code);
            print_json(&registration)?;
        }
        Command::Status { nik } => {
            let login = client.registrations().login_by_nik(&nik).await?;
            info!(
                "[CLI] 📋 NIK {}：{} 条挂号记录",
                nik,
                login.registrations.len()
            );
            print_json(&login)?;
        }
        Command::Messages => {
            print_json(&client.messages().get_messages().await?)?;
        }
        Command::Stats => {
            print_json(&client.get_dashboard_stats().await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_names_match_stored_values() {
        assert_eq!(parse_payment("BPJS").unwrap(), PaymentMethod::Bpjs);
        assert_eq!(parse_payment("va").unwrap(), PaymentMethod::VirtualAccount);
        assert!(parse_payment("kredit").is_err());
    }

    #[test]
    fn cli_arguments_parse() {
        let args = Args::try_parse_from([
            "hospital-cli",
            "--offline",
            "register",
            "--nik",
            "3201010101010001",
            "--name",
            "Siti",
            "--payment",
            "transfer",
        ])
        .unwrap();
        assert!(args.offline);
        assert!(matches!(args.command, Command::Register { .. }));
    }
}
