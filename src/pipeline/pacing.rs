use std::future::Future;
use std::time::Duration;

/// Run `work` but do not resolve before `min` has elapsed. The timer runs
/// concurrently with the work, so fast steps are padded and slow ones are not.
pub async fn at_least<F: Future>(min: Duration, work: F) -> F::Output {
    if min.is_zero() {
        return work.await;
    }
    let (output, ()) = tokio::join!(work, tokio::time::sleep(min));
    output
}
