//! Transfer-task planning.
//!
//! Detects when a posted transaction's virtual-layer movement implies a real
//! inter-bank transfer that still has to happen. Only the virtual layer is
//! analyzed: the physical layer records what already took place.
//!
//! Each virtual-layer entry is resolved to its **physical anchor** (a
//! physical bucket is its own anchor, a virtual bucket anchors to its parent,
//! income/expense/system buckets have none and are skipped). Anchors with a
//! positive net flow received money, anchors with a negative net flow sent
//! it; senders and receivers are paired off until every flow is drained. An
//! anchor with zero net flow is an intra-bank move and produces nothing.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::{
    entries::{EntryDirection, EntryLayer},
    transactions::Transaction,
    transfer_tasks::TransferTask,
};

/// Plans the pending transfers implied by `tx`.
///
/// `anchors` maps every bucket referenced by a virtual-layer entry to its
/// physical anchor, `None` marking buckets without one. Pure; persistence is
/// the caller's concern.
pub(crate) fn plan_transfer_tasks(
    tx: &Transaction,
    anchors: &HashMap<Uuid, Option<Uuid>>,
) -> Vec<TransferTask> {
    // BTreeMap keeps sender/receiver pairing deterministic.
    let mut flows: BTreeMap<Uuid, Decimal> = BTreeMap::new();

    for entry in tx
        .entries
        .iter()
        .filter(|entry| entry.layer == EntryLayer::Virtual)
    {
        let Some(Some(anchor)) = anchors.get(&entry.bucket_id) else {
            continue;
        };
        let flow = flows.entry(*anchor).or_insert(Decimal::ZERO);
        match entry.direction {
            EntryDirection::Debit => *flow += entry.amount,
            EntryDirection::Credit => *flow -= entry.amount,
        }
    }

    let mut senders: Vec<(Uuid, Decimal)> = flows
        .iter()
        .filter(|(_, flow)| **flow < Decimal::ZERO)
        .map(|(anchor, flow)| (*anchor, -*flow))
        .collect();
    let mut receivers: Vec<(Uuid, Decimal)> = flows
        .iter()
        .filter(|(_, flow)| **flow > Decimal::ZERO)
        .map(|(anchor, flow)| (*anchor, *flow))
        .collect();

    let mut tasks = Vec::new();
    let mut receiver_index = 0;
    for (from, mut outstanding) in senders.drain(..) {
        while outstanding > Decimal::ZERO && receiver_index < receivers.len() {
            let (to, pending) = &mut receivers[receiver_index];
            let amount = outstanding.min(*pending);
            tasks.push(TransferTask::pending(tx.id, from, *to, amount));

            outstanding -= amount;
            *pending -= amount;
            if *pending == Decimal::ZERO {
                receiver_index += 1;
            }
        }
    }

    tasks
}
