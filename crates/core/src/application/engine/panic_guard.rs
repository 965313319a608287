// Panic isolation at the phase boundary
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed (the value may itself be an error)
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Drive a future to completion, converting a panic into `Panicked`.
///
/// The strategy stays exclusively borrowed by the engine for the whole
/// phase; nothing else observes it mid-unwind.
pub async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info.as_ref());
            error!(panic_msg = %panic_msg, "Phase body panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_value_passes_through() {
        let result = execute_guarded_async(async { 42 }).await;
        assert!(matches!(result, PanicGuardResult::Success(42)));
    }

    #[tokio::test]
    async fn test_panic_is_caught_with_message() {
        let result = execute_guarded_async(async {
            tokio::task::yield_now().await;
            panic!("collector exploded");
        })
        .await;

        match result {
            PanicGuardResult::Panicked(msg) => assert_eq!(msg, "collector exploded"),
            PanicGuardResult::Success(()) => panic!("expected panic to be caught"),
        }
    }

    #[tokio::test]
    async fn test_formatted_panic_message() {
        let code = 7;
        let result: PanicGuardResult<()> =
            execute_guarded_async(async move { panic!("exit code {}", code) }).await;
        assert!(matches!(result, PanicGuardResult::Panicked(msg) if msg == "exit code 7"));
    }
}
