use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 订单时间估算配置
#[derive(Debug, Clone)]
pub struct OrderTimingConfig {
    /// 下单到完成的基础预估 (分钟)，厨房开始前使用
    pub base_estimate_minutes: u32,
    /// 厨房开始后的制作预估 (分钟)
    pub preparation_minutes: u32,
    /// 超时判定宽限 (分钟)
    pub overdue_margin_minutes: u32,
    /// 超时优先级巡检间隔 (秒)
    pub overdue_sweep_secs: u64,
}

impl OrderTimingConfig {
    pub fn overdue_margin_ms(&self) -> i64 {
        i64::from(self.overdue_margin_minutes) * 60_000
    }
}

impl Default for OrderTimingConfig {
    fn default() -> Self {
        Self {
            base_estimate_minutes: 20,
            preparation_minutes: 15,
            overdue_margin_minutes: 0,
            overdue_sweep_secs: 60,
        }
    }
}

/// 库存准入检查配置
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// 整体检查超时 (毫秒)，超时后按"有货、无延迟"处理
    pub timeout_ms: u64,
    /// 厨房并行处理能力 (活跃订单数)
    pub kitchen_capacity: u32,
    /// 超出能力后每单增加的延迟 (分钟)
    pub load_delay_per_order_minutes: u32,
    /// 每个低库存商品增加的补货延迟 (分钟)
    pub restock_delay_minutes: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            kitchen_capacity: 8,
            load_delay_per_order_minutes: 3,
            restock_delay_minutes: 10,
        }
    }
}

/// 库存扣减重试配置
#[derive(Debug, Clone)]
pub struct DeductionConfig {
    /// 队列扫描间隔 (秒)
    pub retry_secs: u64,
    /// 进入死信表前的最大重试次数
    pub max_retries: u32,
}

impl Default for DeductionConfig {
    fn default() -> Self {
        Self {
            retry_secs: 30,
            max_retries: 5,
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志格式 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
/// | ADMISSION_TIMEOUT_MS | 2000 | 库存检查超时(毫秒) |
/// | BASE_ESTIMATE_MINUTES | 20 | 基础预估时间 |
/// | PREPARATION_MINUTES | 15 | 制作预估时间 |
/// | OVERDUE_MARGIN_MINUTES | 0 | 超时宽限 |
/// | OVERDUE_SWEEP_SECS | 60 | 超时巡检间隔 |
/// | KITCHEN_CAPACITY | 8 | 厨房并行能力 |
/// | LOAD_DELAY_PER_ORDER_MINUTES | 3 | 超负荷每单延迟 |
/// | RESTOCK_DELAY_MINUTES | 10 | 低库存补货延迟 |
/// | DEDUCTION_RETRY_SECS | 30 | 扣减队列扫描间隔 |
/// | DEDUCTION_MAX_RETRIES | 5 | 扣减最大重试次数 |
///
/// JWT 相关变量见 [`JwtConfig`]。
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=9000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
    pub timing: OrderTimingConfig,
    pub admission: AdmissionConfig,
    pub deduction: DeductionConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let timing_default = OrderTimingConfig::default();
        let admission_default = AdmissionConfig::default();
        let deduction_default = DeductionConfig::default();

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 8080),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
            timing: OrderTimingConfig {
                base_estimate_minutes: env_or(
                    "BASE_ESTIMATE_MINUTES",
                    timing_default.base_estimate_minutes,
                ),
                preparation_minutes: env_or(
                    "PREPARATION_MINUTES",
                    timing_default.preparation_minutes,
                ),
                overdue_margin_minutes: env_or(
                    "OVERDUE_MARGIN_MINUTES",
                    timing_default.overdue_margin_minutes,
                ),
                overdue_sweep_secs: env_or("OVERDUE_SWEEP_SECS", timing_default.overdue_sweep_secs),
            },
            admission: AdmissionConfig {
                timeout_ms: env_or("ADMISSION_TIMEOUT_MS", admission_default.timeout_ms),
                kitchen_capacity: env_or("KITCHEN_CAPACITY", admission_default.kitchen_capacity),
                load_delay_per_order_minutes: env_or(
                    "LOAD_DELAY_PER_ORDER_MINUTES",
                    admission_default.load_delay_per_order_minutes,
                ),
                restock_delay_minutes: env_or(
                    "RESTOCK_DELAY_MINUTES",
                    admission_default.restock_delay_minutes,
                ),
            },
            deduction: DeductionConfig {
                retry_secs: env_or("DEDUCTION_RETRY_SECS", deduction_default.retry_secs),
                max_retries: env_or("DEDUCTION_MAX_RETRIES", deduction_default.max_retries),
            },
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 数据库文件路径: work_dir/database/orders.redb
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
            .join("database")
            .join("orders.redb")
    }

    /// 日志目录: work_dir/logs
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(PathBuf::from(&self.work_dir).join("database"))?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
