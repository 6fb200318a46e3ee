//! Proptest generators for property-based testing.

use blockledger_core::clock::Timestamp;
use blockledger_core::{Chain, SteppingClock, Transaction};
use chrono::{Duration, FixedOffset, TimeZone};
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

/// Generate a JSON scalar.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        // quarters survive a text round trip exactly
        (-4_000_000i64..4_000_000).prop_filter_map("finite", |n| {
            Number::from_f64(n as f64 / 4.0).map(Value::Number)
        }),
        "[ -~]{0,16}".prop_map(Value::String),
        "\\PC{0,8}".prop_map(Value::String),
    ]
}

/// Generate a JSON value nested up to a few levels.
pub fn json_value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate a transaction record.
pub fn transaction() -> impl Strategy<Value = Transaction> {
    prop::collection::btree_map("[a-z_]{1,8}", json_value(), 1..5).prop_map(|fields| {
        let map: Map<String, Value> = fields.into_iter().collect();
        Transaction::from(map)
    })
}

/// Generate a batch of transactions.
pub fn batch(max_len: usize) -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(transaction(), 0..=max_len)
}

/// Generate a timestamp between 2000 and 2100 with a whole-minute offset.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    (
        946_684_800i64..4_102_444_800i64,
        0u32..1_000_000,
        -(14 * 60)..=(14 * 60i32),
    )
        .prop_filter_map("representable", |(secs, micros, offset_minutes)| {
            let offset = FixedOffset::east_opt(offset_minutes * 60)?;
            offset.timestamp_opt(secs, micros * 1_000).single()
        })
}

/// Parameters for generating a chain.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub genesis: Vec<Transaction>,
    pub batches: Vec<Vec<Transaction>>,
    pub max_block_size: usize,
    pub start: Timestamp,
    pub step_millis: i64,
}

impl Arbitrary for ChainParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            batch(3),
            prop::collection::vec(batch(6), 0..4),
            1usize..256,
            timestamp(),
            0i64..5_000,
        )
            .prop_map(|(genesis, batches, max_block_size, start, step_millis)| ChainParams {
                genesis,
                batches,
                max_block_size,
                start,
                step_millis,
            })
            .boxed()
    }
}

/// Build a chain from parameters.
pub fn chain_from_params(params: &ChainParams) -> Chain {
    let clock = SteppingClock::new(params.start, Duration::milliseconds(params.step_millis));
    let mut chain = Chain::new(params.genesis.clone(), params.max_block_size, &clock)
        .expect("max_block_size is positive");
    for batch in &params.batches {
        chain.append(batch.clone(), &clock);
    }
    chain
}
