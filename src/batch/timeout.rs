//! # 单项超时
//!
//! 在辅助线程中执行单项工作，超过时限即返回，调用方把该项记为失败后继续。
//! 超时的线程不会被强制终止，它在后台自行结束，结果被丢弃。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 和 `batch/enumerator.rs` 使用

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// 超时错误，携带时限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut(pub Duration);

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timed out after {:.1}s", self.0.as_secs_f64())
    }
}

/// 在时限内执行 `work`
///
/// 工作线程 panic 时同样视为未在时限内返回结果。
pub fn run_with_timeout<T, F>(limit: Duration, work: F) -> Result<T, TimedOut>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("sgdi-item".to_string())
        .spawn(move || {
            // 接收端可能已因超时放弃，发送失败无需处理
            let _ = tx.send(work());
        });

    if spawned.is_err() {
        return Err(TimedOut(Duration::ZERO));
    }

    rx.recv_timeout(limit).map_err(|_| TimedOut(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_within_limit() {
        let result = run_with_timeout(Duration::from_secs(5), || 21 * 2);
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_stalled_item_times_out() {
        let limit = Duration::from_millis(50);
        let result = run_with_timeout(limit, || {
            thread::sleep(Duration::from_secs(2));
            1
        });
        assert_eq!(result, Err(TimedOut(limit)));
    }
}
