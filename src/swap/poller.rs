use super::{OpUpdate, SwapEvent};
use crate::{
    constants::{NATIVE_GAS_DECIMALS, NATIVE_GAS_TOKEN},
    metrics::ReceiptPollerMetrics,
    types::{OpState, UserOperationReceipt, format_amount, format_amount_to_usd},
    upstream::{BundlerApi, PriceFeed},
};
use alloy::primitives::B256;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{MissedTickBehavior, interval, timeout},
};
use tracing::{debug, warn};

/// Tracks one submitted operation against the bundler until it lands or the deadline passes.
pub(super) struct ReceiptPoller {
    pub hash: B256,
    pub epoch: u64,
    pub bundler: Arc<dyn BundlerApi>,
    pub prices: Arc<dyn PriceFeed>,
    pub events: mpsc::UnboundedSender<SwapEvent>,
    pub interval: Duration,
    pub deadline: Duration,
    pub metrics: ReceiptPollerMetrics,
}

impl ReceiptPoller {
    pub(super) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        // Only the polling itself races the deadline. Pricing the receipt happens after, so
        // a slow price lookup cannot turn a landed operation into an unresolved one.
        match timeout(self.deadline, self.poll_until_sent()).await {
            Ok(receipt) => {
                let gas_cost_usd = self.convert_gas_cost(receipt.as_ref()).await;
                self.metrics.confirmed.increment(1);
                let _ = self.events.send(SwapEvent::Op {
                    epoch: self.epoch,
                    update: OpUpdate::Sent { receipt, gas_cost_usd },
                });
            }
            Err(_) => {
                self.metrics.deadline_exceeded.increment(1);
                warn!(op = %self.hash, "operation still unresolved at polling deadline");
                let _ = self
                    .events
                    .send(SwapEvent::Op { epoch: self.epoch, update: OpUpdate::Deadline });
            }
        }
    }

    async fn poll_until_sent(&self) -> Option<UserOperationReceipt> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = OpState::Pending;

        loop {
            ticker.tick().await;
            self.metrics.polls.increment(1);
            let poll = match self.bundler.op_receipt(self.hash).await {
                Ok(poll) => poll,
                Err(err) => {
                    debug!(op = %self.hash, %err, "receipt poll failed");
                    continue;
                }
            };
            match poll.state {
                OpState::Sent => return poll.receipt,
                OpState::Bundled if last != OpState::Bundled => {
                    last = OpState::Bundled;
                    let _ = self
                        .events
                        .send(SwapEvent::Op { epoch: self.epoch, update: OpUpdate::Bundled });
                }
                _ => {}
            }
        }
    }

    async fn convert_gas_cost(&self, receipt: Option<&UserOperationReceipt>) -> Option<String> {
        let receipt = receipt?;
        let native: f64 = format_amount(receipt.actual_gas_cost, NATIVE_GAS_DECIMALS).parse().ok()?;
        match self.prices.usd_price(NATIVE_GAS_TOKEN).await {
            Ok(price) => Some(format_amount_to_usd(native, price)),
            Err(err) => {
                debug!(%err, "failed to price confirmed operation");
                None
            }
        }
    }
}
