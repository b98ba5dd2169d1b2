//! 输出抑制：在单次 Agent 调用期间屏蔽其日志输出
//!
//! Agent 内部的 tracing 事件在 TUI 下会写进日志文件、在 Web 下会刷满控制台；对话期间统一丢弃。
//! 静默 dispatcher 只在被包装的 future 每次 poll 时生效，poll 返回（含 panic 展开）即恢复原 dispatcher。

use std::future::Future;

use tracing::instrument::WithSubscriber;
use tracing::subscriber::NoSubscriber;

/// 以静默 dispatcher 运行 fut
pub async fn quietly<F>(fut: F) -> F::Output
where
    F: Future,
{
    fut.with_subscriber(NoSubscriber::default()).await
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context, Layer};

    /// 统计收到的事件数
    #[derive(Clone, Default)]
    pub struct EventCounter(pub Arc<AtomicUsize>);

    impl EventCounter {
        pub fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl<S: Subscriber> Layer<S> for EventCounter {
        fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
