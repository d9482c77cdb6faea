//! 有界重试策略。

use std::fmt::Display;
use std::time::Duration;
use tracing::warn;

/// 以固定间隔重试 `op`，最多 `attempts` 次。
///
/// `op` 收到从 1 开始的尝试序号；全部失败时返回最后一次的错误。
/// 最后一次失败后不再等待。
pub fn with_retries<T, E: Display>(
    attempts: u32,
    pause: Duration,
    mut op: impl FnMut(u32) -> Result<T, E>,
) -> Result<T, E> {
    let mut last_err = None;
    for attempt in 1..=attempts.max(1) {
        match op(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                warn!("第 {attempt}/{attempts} 次尝试失败: {e}");
                last_err = Some(e);
                if attempt < attempts && !pause.is_zero() {
                    std::thread::sleep(pause);
                }
            }
        }
    }
    // attempts >= 1，循环体至少执行一次。
    Err(last_err.unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_after_first_success() {
        let mut calls = 0u32;
        let result: Result<u32, String> = with_retries(5, Duration::ZERO, |attempt| {
            calls += 1;
            if attempt < 3 {
                Err("not yet".to_string())
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn exhausts_attempts_then_returns_last_error() {
        let mut calls = 0u32;
        let result: Result<(), String> = with_retries(3, Duration::ZERO, |attempt| {
            calls += 1;
            Err(format!("fail {attempt}"))
        });
        assert_eq!(result, Err("fail 3".to_string()));
        assert_eq!(calls, 3);
    }
}
