//! Ordered `(delay, action)` steps driven by a single loop.
//!
//! Each delay is measured from the previous step's deadline, not from when the
//! previous action finished, so a slow action does not push the rest of the
//! schedule back.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

#[derive(Debug, Clone)]
pub struct Step<A> {
    pub delay: Duration,
    pub action: A,
}

#[derive(Debug, Clone)]
pub struct Sequence<A> {
    steps: Vec<Step<A>>,
}

impl<A> Default for Sequence<A> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<A> Sequence<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, delay: Duration, action: A) -> Self {
        self.steps.push(Step { delay, action });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_delay(&self) -> Duration {
        self.steps.iter().map(|s| s.delay).sum()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step<A>> {
        self.steps.iter()
    }

    pub async fn run<F, Fut>(self, mut handler: F)
    where
        F: FnMut(A) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut deadline = Instant::now();
        for step in self.steps {
            deadline += step.delay;
            sleep_until(deadline).await;
            handler(step.action).await;
        }
    }
}
