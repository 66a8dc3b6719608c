//! Utility module for common functionality

use std::time::{Duration, Instant};

/// Async version of measure_time
pub async fn measure_time_async<F, T, Fut>(f: F) -> (T, Duration)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let start = Instant::now();
    let result = f().await;
    let duration = start.elapsed();
    (result, duration)
}

/// Truncate a string to a maximum byte length, adding ellipsis if truncated.
///
/// Cuts on a char boundary, so the result may be slightly shorter than `max_len`.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let budget = if max_len <= 3 { max_len } else { max_len - 3 };
    let mut end = budget;
    while !s.is_char_boundary(end) {
        end -= 1;
    }

    if max_len <= 3 {
        s[..end].to_string()
    } else {
        format!("{}...", &s[..end])
    }
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a longer sentence", 10), "a longe...");
        assert_eq!(truncate_string("abcdef", 3), "abc");
        // multi-byte characters are never split
        assert_eq!(truncate_string("ééééé", 6), "é...");
    }

    #[test]
    fn test_generate_request_id() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_eq!(a.len(), 36);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_measure_time_async() {
        let (value, elapsed) = measure_time_async(|| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            7
        })
        .await;
        assert_eq!(value, 7);
        assert!(elapsed >= Duration::from_millis(10));
    }
}
