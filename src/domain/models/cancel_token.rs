// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// 协作式取消信号
///
/// 由 `CancelToken::raise_if_canceled` 返回，表示当前工作单元被要求停止。
/// 它不是操作本身的失败。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation canceled")]
pub struct Canceled;

/// 共享取消标志
///
/// 一个任务的所有在途单元共享同一个标志，只会从未设置变为已设置。
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个已经处于取消状态的标志
    pub fn new_set() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// 判断两个句柄是否指向同一个标志
    pub fn ptr_eq(&self, other: &CancelFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// 外部取消谓词
pub type CancelPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// 取消令牌
///
/// 由可选的共享取消标志和可选的外部谓词组成，构造后不可变。
/// 标志已设置，或谓词返回 `true` 时，令牌即被触发。
///
/// 默认值（两者皆无）永远不会被触发，对应"没有令牌"的情况。
/// 这是协作式检查：调用方需要在发起抓取、开始提取尝试、
/// 开始下一次重试之前主动轮询。
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Option<CancelFlag>,
    predicate: Option<CancelPredicate>,
}

impl CancelToken {
    pub fn new(flag: Option<CancelFlag>, predicate: Option<CancelPredicate>) -> Self {
        Self { flag, predicate }
    }

    /// 永不触发的令牌
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_flag(flag: CancelFlag) -> Self {
        Self::new(Some(flag), None)
    }

    pub fn from_predicate<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::new(None, Some(Arc::new(predicate)))
    }

    pub fn flag(&self) -> Option<&CancelFlag> {
        self.flag.as_ref()
    }

    /// 令牌是否已被触发
    ///
    /// 谓词发生 panic 时记录日志并视为未取消（fail-open），
    /// 用户提供的谓词永远不会让调用方崩溃。
    pub fn is_canceled(&self) -> bool {
        if self.flag.as_ref().is_some_and(CancelFlag::is_set) {
            return true;
        }
        match &self.predicate {
            Some(predicate) => evaluate_predicate(predicate),
            None => false,
        }
    }

    /// 令牌被触发时返回 `Err(Canceled)`，否则什么都不做
    ///
    /// 这是协作式取消转变为提前退出的唯一位置，配合 `?` 使用。
    pub fn raise_if_canceled(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("flag", &self.flag)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

fn evaluate_predicate(predicate: &CancelPredicate) -> bool {
    match catch_unwind(AssertUnwindSafe(|| predicate())) {
        Ok(canceled) => canceled,
        Err(_) => {
            warn!("Cancel predicate panicked; treating token as not canceled");
            false
        }
    }
}
