//! A single worker instance's state machine:
//! `Initializing -> Announcing -> Serving -> Leaving -> Closed`.

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use dda_core::{
    lifecycle, ActionResult, ComputationRegistry, InstanceId, Logger, MessagingAdapter, Role,
    SubscriptionFilter, Tracker, PCOMP_SHARE, PCOMP_TYPE,
};

/// One worker instance. Serves partial-compute actions off the shared
/// `pcompute` group one at a time, for as long as it's subscribed.
pub struct Worker {
    pub id: InstanceId,
    adapter: Arc<dyn MessagingAdapter>,
    registry: ComputationRegistry,
    logger: Logger,
}

impl Worker {
    pub fn new(adapter: Arc<dyn MessagingAdapter>, registry: ComputationRegistry, logger: Logger) -> Self {
        Self {
            id: InstanceId::generate(),
            adapter,
            registry,
            logger,
        }
    }

    /// Drive this instance's full lifecycle until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        self.logger.diag(format!("worker {} initializing", self.id));

        // A worker participates in announceCoordinator replies but never
        // reads its own tracker's census, so a private, never-consulted
        // Tracker suffices here — the responder logic is shared verbatim
        // with the coordinator.
        let tracker = Arc::new(Tracker::new());
        let responder = lifecycle::spawn_announce_responder(
            self.adapter.clone(),
            tracker,
            Role::Worker,
            self.id,
            cancel.clone(),
        );

        let mut incoming =
            self.adapter.subscribe_action(SubscriptionFilter::shared(PCOMP_TYPE, PCOMP_SHARE));

        self.logger.diag(format!("worker {} announcing", self.id));
        lifecycle::announce_join_worker(self.adapter.as_ref(), self.id).await;

        self.logger.diag(format!("worker {} serving", self.id));
        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => break,
                item = incoming.next() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            self.serve_one(job).await;
        }

        self.logger.diag(format!("worker {} leaving", self.id));
        lifecycle::announce_leave(self.adapter.as_ref(), Role::Worker, self.id).await;
        tokio::time::sleep(lifecycle::LEAVE_GRACE).await;

        cancel.cancel();
        let _ = responder.await;
        self.logger.diag(format!("worker {} closed", self.id));
    }

    /// Handle one partial-compute action: unknown computation names are
    /// silently dropped, letting the coordinator's own timeout drive
    /// resubmission elsewhere.
    async fn serve_one(&self, job: dda_core::IncomingAction) {
        let Some(computation) = self.registry.create(&job.action.id) else {
            self.logger.warn(format!("unknown computation '{}', dropping", job.action.id));
            return;
        };

        match computation.partial_compute(job.action.params.clone()).await {
            Some(output) => {
                let result = ActionResult::new(self.id.to_string(), output);
                if let Err(err) = job.reply(result).await {
                    self.logger.warn(format!("failed to publish result: {err}"));
                }
            }
            None => {
                // Declined: publish nothing, triggering resubmission upstream.
            }
        }
    }
}
