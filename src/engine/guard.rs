//! 写回防护
//!
//! 引擎把译文写回文档树时，宿主的变更观察会把这些写入当作新变更
//! 上报回来。防护标志是三道防线里最外面的一道（另两道是快照的
//! 捕获一次规则和"已是译文"过滤），聚合器在分类时读取它。
//!
//! 标志通过 RAII 作用域管理：无论写回途中是否出错提前返回，
//! 作用域析构都会无条件清除标志，不存在标志悬挂。

use std::cell::Cell;

/// 写回抑制标志
#[derive(Debug, Default)]
pub struct ApplyGuard {
    applying: Cell<bool>,
}

impl ApplyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前是否处于写回过程中
    pub fn is_applying(&self) -> bool {
        self.applying.get()
    }

    /// 进入写回作用域，返回的句柄析构时清除标志
    pub fn enter(&self) -> ApplyScope<'_> {
        self.applying.set(true);
        ApplyScope { flag: &self.applying }
    }
}

/// 写回作用域句柄
pub struct ApplyScope<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for ApplyScope<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_sets_and_clears_flag() {
        let guard = ApplyGuard::new();
        assert!(!guard.is_applying());
        {
            let _scope = guard.enter();
            assert!(guard.is_applying());
        }
        assert!(!guard.is_applying());
    }

    #[test]
    fn test_flag_cleared_on_early_return() {
        let guard = ApplyGuard::new();

        fn failing_write(guard: &ApplyGuard) -> Result<(), &'static str> {
            let _scope = guard.enter();
            Err("写入失败")?;
            Ok(())
        }

        assert!(failing_write(&guard).is_err());
        assert!(!guard.is_applying(), "flag must be cleared on the error path");
    }

    #[test]
    fn test_flag_cleared_on_panic_unwind() {
        let apply_guard = ApplyGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = apply_guard.enter();
            panic!("写回中途崩溃");
        }));

        assert!(result.is_err());
        assert!(!apply_guard.is_applying());
    }
}
