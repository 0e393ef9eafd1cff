use std::time::Duration;

use crate::{ClientOptions, FailureKind};

/// Bounded retry policy with linear backoff.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; retry `n` waits `base_delay * n`.
    pub base_delay: Duration,
}

/// Outcome of scheduling a failed attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryDecision {
    /// Hand the failure to the caller.
    Propagate,
    /// Wait, then re-issue the same request.
    RetryAfter(Duration),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_options(&ClientOptions::default())
    }
}

impl RetryPolicy {
    /// Builds the policy from client options.
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            base_delay: Duration::from_millis(options.retry_backoff_ms),
        }
    }

    /// Delay before re-issuing a request that has already been retried
    /// `attempt` times.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Decides what happens to a failure of kind `kind` seen at `attempt`.
    pub fn decide(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        if kind.is_retryable() && attempt < self.max_retries {
            RetryDecision::RetryAfter(self.delay_for(attempt))
        } else {
            RetryDecision::Propagate
        }
    }
}

/// Suspends the current request chain without blocking other requests.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// Suspends the current request chain on a `setTimeout` promise.
///
/// Resolves immediately when no global `setTimeout` is reachable.
#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep(delay: Duration) {
    use wasm_bindgen::{JsCast, JsValue};

    let millis = delay.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let set_timeout = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("setTimeout"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
        match set_timeout {
            Some(set_timeout) => {
                let _ = set_timeout.call2(&JsValue::NULL, &resolve, &JsValue::from(millis));
            }
            None => {
                let _ = resolve.call0(&JsValue::NULL);
            }
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
