// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::cancel_token::CancelFlag;

#[derive(Debug, Default)]
struct RegistryState {
    flags: HashMap<Uuid, CancelFlag>,
    pre_canceled: HashSet<Uuid>,
}

/// 任务取消注册表
///
/// 把外部的"取消任务X"请求桥接到该任务所有在途的抓取/提取操作。
/// 注册表由调用方构造并显式注入，克隆后共享同一份状态。
///
/// 活跃标志与预取消集合放在同一把锁下，保证 `register` 与
/// `signal_cancel` 并发执行时不会丢失取消信号。
#[derive(Debug, Clone, Default)]
pub struct JobCancelRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl JobCancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册任务并返回其取消标志
    ///
    /// 重复注册返回同一个标志；若任务此前已被预取消，新标志创建即为已设置状态。
    pub fn register(&self, job_id: Uuid) -> CancelFlag {
        let mut state = self.state.lock();
        if let Some(flag) = state.flags.get(&job_id) {
            return flag.clone();
        }

        let flag = if state.pre_canceled.contains(&job_id) {
            debug!(%job_id, "Registering pre-canceled job");
            CancelFlag::new_set()
        } else {
            debug!(%job_id, "Registering job");
            CancelFlag::new()
        };
        state.flags.insert(job_id, flag.clone());
        flag
    }

    /// 注册任务并返回作用域守卫，守卫析构时执行一次 `cleanup`
    pub fn register_scoped(&self, job_id: Uuid) -> JobRegistration {
        let flag = self.register(job_id);
        JobRegistration {
            registry: self.clone(),
            job_id,
            flag,
        }
    }

    /// 发送取消信号
    ///
    /// # 返回值
    ///
    /// * `true` - 找到在途任务并已设置其标志
    /// * `false` - 任务尚未注册，信号已记录，注册时生效
    pub fn signal_cancel(&self, job_id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.flags.get(&job_id) {
            Some(flag) => {
                flag.set();
                debug!(%job_id, "Cancel signaled for running job");
                true
            }
            None => {
                state.pre_canceled.insert(job_id);
                debug!(%job_id, "Cancel recorded before registration");
                false
            }
        }
    }

    pub fn lookup(&self, job_id: Uuid) -> Option<CancelFlag> {
        self.state.lock().flags.get(&job_id).cloned()
    }

    /// 清除任务的全部状态，之后该任务ID与从未出现过的ID无异
    pub fn cleanup(&self, job_id: Uuid) {
        let mut state = self.state.lock();
        let had_flag = state.flags.remove(&job_id).is_some();
        let was_pre_canceled = state.pre_canceled.remove(&job_id);
        debug!(%job_id, had_flag, was_pre_canceled, "Job cancel state cleaned up");
    }

    /// 清空所有状态，仅用于测试隔离
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.flags.clear();
        state.pre_canceled.clear();
    }

    /// 当前活跃任务数
    pub fn active_jobs(&self) -> usize {
        self.state.lock().flags.len()
    }

    pub fn pending_signals(&self) -> usize {
        self.state.lock().pre_canceled.len()
    }
}

/// 任务注册守卫
#[derive(Debug)]
pub struct JobRegistration {
    registry: JobCancelRegistry,
    job_id: Uuid,
    flag: CancelFlag,
}

impl JobRegistration {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn flag(&self) -> &CancelFlag {
        &self.flag
    }
}

impl Drop for JobRegistration {
    fn drop(&mut self) {
        self.registry.cleanup(self.job_id);
    }
}
