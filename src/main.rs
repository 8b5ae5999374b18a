//! 认证网关主入口

use bearer_gate::{
    auth::{
        password::PasswordHasher,
        validator::{CredentialValidator, DenyAll, PasswordTableValidator},
    },
    config::AppConfig,
    handlers::health,
    middleware::AppState,
    routes, telemetry,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("bearer-gate {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            "--hash-password" => {
                let Some(password) = args.get(2) else {
                    eprintln!("--hash-password 需要一个密码参数");
                    std::process::exit(1);
                };
                let hash = PasswordHasher::new()
                    .hash(password)
                    .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
                println!("{}", hash);
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env
    if let Ok(path) = std::env::var("GATE_ENV") {
        dotenv::from_filename(format!(".env.{}", path)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Bearer gate starting...");

    // 3. 凭据校验器：配置了用户表则使用，否则全部拒绝
    let validator: Arc<dyn CredentialValidator> = match &config.security.users {
        Some(table) => {
            let validator = PasswordTableValidator::from_table(table.expose_secret())?;
            tracing::info!(users = validator.len(), "Password table validator loaded");
            Arc::new(validator)
        }
        None => {
            tracing::warn!("No user table configured, every signin will be rejected");
            Arc::new(DenyAll)
        }
    };

    // 4. 构建应用状态（密钥在此写入，之后只读）
    let app_state = Arc::new(AppState::new(config.clone(), validator)?);

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    // 超时后强制退出
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 打印帮助信息
fn print_help() {
    println!("bearer-gate {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: bearer-gate [选项]");
    println!();
    println!("选项:");
    println!("  --version                  打印版本信息并退出");
    println!("  --help                     打印此帮助信息并退出");
    println!("  --hash-password <密码>     生成 Argon2id 哈希（用于 GATE_SECURITY__USERS）");
    println!();
    println!("环境变量:");
    println!("  GATE_SECURITY__JWT_SECRET  令牌签名密钥（至少 32 字符，必填）");
    println!("  GATE_SECURITY__USERS       用户表，格式 name:phc;name:phc");
}
