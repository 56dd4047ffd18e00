//! Flow table: canonical key to record, with recency order.
//!
//! Records live in a [`Slab`] arena. A map from [`FlowKey`] to arena slot gives
//! lookup, and `prev`/`next` slot links thread every record onto one recency
//! list with the most recently touched record at the head. Moving a record to
//! the head relinks two neighbours and never reallocates.
//!
//! The table never evicts. Walk [`FlowTable::iter`] from the back to find the
//! least recently seen flows.

use std::{
    collections::HashMap,
    iter::FusedIterator,
    time::{SystemTime, UNIX_EPOCH},
};

use fxhash::FxBuildHasher;
use serde::Serialize;
use slab::Slab;
use tracing::{debug, trace};

use crate::{
    flow::{hash::flow_hash, key::FlowKey, record::FlowRecord},
    packet::{ParsedTuple, parse},
};

#[derive(Debug)]
struct FlowNode<C> {
    record: FlowRecord<C>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Point-in-time counters of a [`FlowTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowTableStats {
    pub flows: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Table of known flows.
///
/// Single-threaded: every mutation takes `&mut self`. Shard by
/// [`FlowRecord::hash`] to spread packets across several tables.
#[derive(Debug)]
pub struct FlowTable<C = ()> {
    index: HashMap<FlowKey, usize, FxBuildHasher>,
    nodes: Slab<FlowNode<C>>,
    head: Option<usize>,
    tail: Option<usize>,
    hits: u64,
    misses: u64,
}

impl<C> Default for FlowTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> FlowTable<C> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-sizes the map and arena for `capacity` flows. Not a limit.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
            nodes: Slab::with_capacity(capacity),
            head: None,
            tail: None,
            hits: 0,
            misses: 0,
        }
    }

    /// [`get_or_create`](Self::get_or_create) with no external hash and a
    /// wall-clock timestamp.
    pub fn get(&mut self, frame: &[u8], length: usize) -> Option<&mut FlowRecord<C>> {
        self.get_or_create(frame, length, 0, 0)
    }

    /// Finds or creates the record for the flow `frame` belongs to.
    ///
    /// `hash` overrides the computed flow hash when non-zero. `timestamp` is
    /// stored on the record when non-zero, otherwise the current time in
    /// microseconds is used. Returns `None`, without touching the table, when
    /// the frame is not TCP over IPv4 or is truncated.
    pub fn get_or_create(
        &mut self,
        frame: &[u8],
        length: usize,
        hash: u16,
        timestamp: u64,
    ) -> Option<&mut FlowRecord<C>> {
        match parse(frame, length, hash) {
            Ok(tuple) => Some(self.get_or_create_parsed(tuple, timestamp)),
            Err(e) => {
                trace!(
                    event.name = "flow_table.frame_rejected",
                    reason = e.kind(),
                    length,
                    error = %e,
                    "frame rejected"
                );
                None
            }
        }
    }

    /// Same as [`get_or_create`](Self::get_or_create) for an already parsed tuple.
    pub fn get_or_create_parsed(&mut self, tuple: ParsedTuple, timestamp: u64) -> &mut FlowRecord<C> {
        let timestamp = if timestamp != 0 { timestamp } else { now_us() };

        let idx = match self.index.get(&tuple.key).copied() {
            Some(idx) => {
                self.move_to_front(idx);
                self.hits += 1;

                let record = &mut self.nodes[idx].record;
                if record.hash() == 0 {
                    record.cache_hash(lookup_hash(&tuple));
                }
                record.touch(timestamp);

                trace!(
                    event.name = "flow_table.hit",
                    flow.hash = record.hash(),
                    flow.lower_ip = %record.lower_ip(),
                    flow.upper_ip = %record.upper_ip(),
                    "flow hit"
                );
                idx
            }
            None => {
                let record = FlowRecord::new(tuple.key, tuple.family, lookup_hash(&tuple), timestamp);
                debug!(
                    event.name = "flow_table.flow_created",
                    flow.hash = record.hash(),
                    flow.protocol = record.protocol(),
                    flow.lower_ip = %record.lower_ip(),
                    flow.lower_port = record.lower_port(),
                    flow.upper_ip = %record.upper_ip(),
                    flow.upper_port = record.upper_port(),
                    "new flow"
                );

                let idx = self.nodes.insert(FlowNode {
                    record,
                    prev: None,
                    next: None,
                });
                self.index.insert(tuple.key, idx);
                self.push_front(idx);
                self.misses += 1;
                idx
            }
        };

        &mut self.nodes[idx].record
    }

    /// Looks a key up without counting a hit or changing recency.
    pub fn peek(&self, key: &FlowKey) -> Option<&FlowRecord<C>> {
        self.index.get(key).map(|&idx| &self.nodes[idx].record)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn stats(&self) -> FlowTableStats {
        FlowTableStats {
            flows: self.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    /// Records from most to least recently touched.
    pub fn iter(&self) -> Iter<'_, C> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
            remaining: self.nodes.len(),
        }
    }

    /// Calls `func` once per record in [`iter`](Self::iter) order, passing
    /// `user_data` through to every call.
    pub fn for_each<U, F>(&self, mut func: F, user_data: &mut U)
    where
        F: FnMut(&FlowRecord<C>, &mut U),
    {
        for record in self.iter() {
            func(record, user_data);
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = &mut self.nodes[idx];
            (node.prev.take(), node.next.take())
        };

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[idx];
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.nodes[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }
}

impl<'a, C> IntoIterator for &'a FlowTable<C> {
    type Item = &'a FlowRecord<C>;
    type IntoIter = Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Recency-ordered iterator over a [`FlowTable`], created by [`FlowTable::iter`].
pub struct Iter<'a, C> {
    nodes: &'a Slab<FlowNode<C>>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, C> Iterator for Iter<'a, C> {
    type Item = &'a FlowRecord<C>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = &nodes[self.front?];
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<C> DoubleEndedIterator for Iter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = &nodes[self.back?];
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.record)
    }
}

impl<C> ExactSizeIterator for Iter<'_, C> {}

impl<C> FusedIterator for Iter<'_, C> {}

fn lookup_hash(tuple: &ParsedTuple) -> u16 {
    if tuple.hash != 0 {
        tuple.hash
    } else {
        flow_hash(&tuple.key)
    }
}

fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::packet::FrameBuilder;

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn frame(src: u8, sport: u16, dst: u8, dport: u16) -> Vec<u8> {
        FrameBuilder::tcp(ip(src), sport, ip(dst), dport).build()
    }

    fn order(table: &FlowTable) -> Vec<u16> {
        table.iter().map(|r| r.upper_port()).collect()
    }

    /// Walks the links in both directions and checks them against the map.
    fn assert_consistent<C>(table: &FlowTable<C>) {
        let forward: Vec<_> = table.iter().map(|r| *r.key()).collect();
        let mut backward: Vec<_> = table.iter().rev().map(|r| *r.key()).collect();
        backward.reverse();

        assert_eq!(forward.len(), table.len());
        assert_eq!(forward, backward);
        for key in &forward {
            assert!(table.peek(key).is_some());
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let mut table = FlowTable::<()>::new();
        let f = frame(1, 443, 2, 51000);

        let record = table.get_or_create(&f, f.len(), 0, 100).unwrap();
        assert_eq!(record.timestamp(), 100);
        assert_eq!((table.len(), table.hits(), table.misses()), (1, 0, 1));

        let record = table.get_or_create(&f, f.len(), 0, 200).unwrap();
        assert_eq!(record.timestamp(), 200);
        assert_eq!((table.len(), table.hits(), table.misses()), (1, 1, 1));
        assert_consistent(&table);
    }

    #[test]
    fn test_reverse_direction_hits_same_record() {
        let mut table = FlowTable::<()>::new();
        let forward = frame(1, 443, 2, 51000);
        let reverse = frame(2, 51000, 1, 443);

        table.get(&forward, forward.len()).unwrap();
        let record = table.get(&reverse, reverse.len()).unwrap();

        assert_eq!(record.lower_ip_string(), "10.0.0.1");
        assert_eq!(record.upper_ip_string(), "10.0.0.2");
        assert_eq!(record.lower_port(), 443);
        assert_eq!(record.upper_port(), 51000);
        assert_eq!(record.protocol(), 6);
        assert_eq!((table.len(), table.hits()), (1, 1));
    }

    #[test]
    fn test_recency_order_after_retouch() {
        let mut table = FlowTable::new();
        let a = frame(1, 1, 2, 1001);
        let b = frame(1, 1, 2, 1002);
        let c = frame(1, 1, 2, 1003);

        for f in [&a, &b, &c] {
            table.get(f, f.len());
        }
        assert_eq!(order(&table), vec![1003, 1002, 1001]);

        table.get(&a, a.len());
        assert_eq!(order(&table), vec![1001, 1003, 1002]);

        table.get(&b, b.len());
        assert_eq!(order(&table), vec![1002, 1001, 1003]);

        // touching the head is a no-op for ordering
        table.get(&b, b.len());
        assert_eq!(order(&table), vec![1002, 1001, 1003]);
        assert_consistent(&table);
    }

    #[test]
    fn test_rejected_frames_leave_table_untouched() {
        let mut table = FlowTable::<()>::new();
        let f = frame(1, 1, 2, 2);
        table.get(&f, f.len());

        let udp = FrameBuilder::tcp(ip(1), 1, ip(2), 2).protocol(17).build();
        let ipv6 = FrameBuilder::tcp(ip(1), 1, ip(2), 2).ether_type(0x86DD).build();

        assert!(table.get(&udp, udp.len()).is_none());
        assert!(table.get(&ipv6, ipv6.len()).is_none());
        assert!(table.get(&f, 30).is_none());
        assert!(table.get(&[], 0).is_none());

        assert_eq!(table.stats(), FlowTableStats { flows: 1, hits: 0, misses: 1 });
    }

    #[test]
    fn test_external_hash_is_used_and_never_overwritten() {
        let mut table = FlowTable::<()>::new();
        let f = frame(1, 1, 2, 2);

        assert_eq!(table.get_or_create(&f, f.len(), 0x1111, 1).unwrap().hash(), 0x1111);
        assert_eq!(table.get_or_create(&f, f.len(), 0x2222, 2).unwrap().hash(), 0x1111);
        assert_eq!(table.get_or_create(&f, f.len(), 0, 3).unwrap().hash(), 0x1111);
    }

    #[test]
    fn test_computed_hash_matches_flow_hash() {
        let mut table = FlowTable::<()>::new();
        let f = frame(1, 443, 2, 51000);
        let record = table.get(&f, f.len()).unwrap();
        assert_eq!(record.hash(), flow_hash(record.key()));
        assert_eq!(record.hash(), 0x6450);
    }

    #[test]
    fn test_colliding_external_hashes_keep_distinct_records() {
        let mut table = FlowTable::<()>::new();
        let a = frame(1, 1, 2, 2);
        let b = frame(3, 3, 4, 4);

        table.get_or_create(&a, a.len(), 0xABCD, 1);
        table.get_or_create(&b, b.len(), 0xABCD, 1);

        assert_eq!(table.len(), 2);
        assert_eq!(table.misses(), 2);
        assert!(table.iter().all(|r| r.hash() == 0xABCD));
    }

    #[test]
    fn test_zero_timestamp_uses_wall_clock() {
        let mut table = FlowTable::<()>::new();
        let f = frame(1, 1, 2, 2);
        let before = now_us();
        let ts = table.get(&f, f.len()).unwrap().timestamp();
        assert!(ts >= before);
    }

    #[test]
    fn test_context_survives_lookups() {
        let mut table = FlowTable::<u32>::new();
        let f = frame(1, 1, 2, 2);

        table.get(&f, f.len()).unwrap().set_context(7);
        let record = table.get(&f, f.len()).unwrap();
        if let Some(count) = record.context_mut() {
            *count += 1;
        }
        assert_eq!(table.iter().next().and_then(|r| r.context()), Some(&8));
    }

    #[test]
    fn test_for_each_passes_user_data_in_order() {
        let mut table = FlowTable::<()>::new();
        for port in [10, 20, 30] {
            let f = frame(1, 1, 2, port);
            table.get(&f, f.len());
        }

        let mut seen = Vec::new();
        table.for_each(|record, seen: &mut Vec<u16>| seen.push(record.upper_port()), &mut seen);
        assert_eq!(seen, vec![30, 20, 10]);
    }

    #[test]
    fn test_iter_is_double_ended_and_exact() {
        let mut table = FlowTable::<()>::new();
        for port in [10, 20, 30, 40] {
            let f = frame(1, 1, 2, port);
            table.get(&f, f.len());
        }

        let mut iter = table.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next().map(|r| r.upper_port()), Some(40));
        assert_eq!(iter.next_back().map(|r| r.upper_port()), Some(10));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next_back().map(|r| r.upper_port()), Some(20));
        assert_eq!(iter.next().map(|r| r.upper_port()), Some(30));
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
    }

    #[test]
    fn test_empty_table() {
        let table = FlowTable::<()>::default();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
        assert_eq!(table.stats(), FlowTableStats::default());
    }
}
