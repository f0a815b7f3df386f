use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, Result, TaskKind, TaskMonitor};
use crate::inventory::{Admission, DeductionWorker, InventoryLedger, StockLedger};
use crate::orders::{OrderStorage, OrdersManager, OverdueSweep};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，clone 成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | storage | OrderStorage | redb 订单存储 |
/// | orders | Arc<OrdersManager> | 订单生命周期引擎 (唯一写入者) |
/// | stock | StockLedger | redb 库存表 |
/// | ledger | Arc<dyn InventoryLedger> | 准入检查与扣减使用的库存接口 |
/// | admission | Admission | 库存准入检查 |
/// | jwt_service | Arc<JwtService> | JWT 校验 |
/// | tasks | TaskMonitor | 后台任务状态 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: OrderStorage,
    pub orders: Arc<OrdersManager>,
    pub stock: StockLedger,
    pub ledger: Arc<dyn InventoryLedger>,
    pub admission: Admission,
    pub jwt_service: Arc<JwtService>,
    pub tasks: TaskMonitor,
    pub started_at: Instant,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("work_dir", &self.config.work_dir)
            .field("http_port", &self.config.http_port)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 订单数据库 (work_dir/database/orders.redb)
    /// 3. 库存表 (同一数据库文件)
    /// 4. 订单引擎、准入检查、JWT
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let storage = OrderStorage::open(config.database_path())?;
        let stock = StockLedger::new(storage.database())?;
        let ledger: Arc<dyn InventoryLedger> = Arc::new(stock.clone());

        let orders = Arc::new(OrdersManager::new(storage.clone(), config.timing.clone()));
        let admission = Admission::new(ledger.clone(), config.admission.clone());
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        tracing::info!(path = %config.database_path().display(), "Order store opened");

        Ok(Self {
            config: config.clone(),
            storage,
            orders,
            stock,
            ledger,
            admission,
            jwt_service,
            tasks: TaskMonitor::new(),
            started_at: Instant::now(),
        })
    }

    /// 替换库存接口 (外部库存系统)
    ///
    /// 准入检查与扣减 worker 都改用新的 `ledger`；`stock` 仍指向本地库存表。
    pub fn with_ledger(mut self, ledger: Arc<dyn InventoryLedger>) -> Self {
        self.admission = Admission::new(ledger.clone(), self.config.admission.clone());
        self.ledger = ledger;
        self
    }

    /// 启动后台任务
    ///
    /// - 库存扣减 worker (启动时恢复死信)
    /// - 超时优先级巡检
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new(self.tasks.clone());
        let token = tasks.shutdown_token();

        let worker = DeductionWorker::new(
            self.storage.clone(),
            self.ledger.clone(),
            self.config.deduction.clone(),
        );
        tasks.spawn("deduction_worker", TaskKind::Worker, worker.run(token.clone()));

        let sweep = OverdueSweep::new(self.orders.clone());
        tasks.spawn("overdue_sweep", TaskKind::Periodic, sweep.run(token));

        tasks.log_summary();
        tasks
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
