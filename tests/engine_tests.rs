use chrono::{Local, TimeDelta};
use matchbook::{Amendment, EngineConfig, MatchingEngine, Order, OrderType, Side};
use serde_json::json;
use std::thread;
use std::time::{Duration, Instant};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn gtc(id: u64, side: Side, price: u64, quantity: u64) -> Order {
    Order::new(id, OrderType::Gtc, side, price, quantity)
}

fn day(id: u64, side: Side, price: u64, quantity: u64) -> Order {
    Order::new(id, OrderType::Day, side, price, quantity)
}

#[test]
fn concurrent_submissions_all_land() {
    init_tracing();
    let engine = MatchingEngine::new().unwrap();

    // Non-crossing orders from many threads; every one must rest.
    thread::scope(|scope| {
        for worker in 0u64..8 {
            let engine = &engine;
            scope.spawn(move || {
                for n in 0u64..50 {
                    let id = worker * 1_000 + n;
                    let (side, price) = if worker % 2 == 0 {
                        (Side::Buy, 100 - worker)
                    } else {
                        (Side::Sell, 200 + worker)
                    };
                    assert!(engine.place_order(gtc(id, side, price, 1)).is_empty());
                }
            });
        }
    });

    assert_eq!(engine.size(), 400);
    let snapshot = engine.levels_info();
    assert_eq!(snapshot.bids.len(), 4);
    assert_eq!(snapshot.asks.len(), 4);
    assert!(snapshot.best_bid().unwrap().price < snapshot.best_ask().unwrap().price);
}

#[test]
fn concurrent_crossing_flow_never_leaves_a_crossed_book() {
    init_tracing();
    let engine = MatchingEngine::new().unwrap();

    thread::scope(|scope| {
        for worker in 0u64..4 {
            let engine = &engine;
            scope.spawn(move || {
                for n in 0u64..100 {
                    let id = worker * 10_000 + n;
                    let side = if (worker + n) % 2 == 0 { Side::Buy } else { Side::Sell };
                    let price = 95 + (n % 11);
                    engine.place_order(gtc(id, side, price, 10));
                }
            });
        }
    });

    let snapshot = engine.levels_info();
    if let (Some(bid), Some(ask)) = (snapshot.best_bid(), snapshot.best_ask()) {
        assert!(bid.price < ask.price, "book crossed: {bid:?} vs {ask:?}");
    }
    for level in snapshot.bids.iter().chain(snapshot.asks.iter()) {
        assert!(level.quantity > 0);
    }
}

#[test]
fn engine_matches_and_amends_like_the_book() {
    init_tracing();
    let engine = MatchingEngine::new().unwrap();

    engine.place_order(gtc(1, Side::Buy, 100, 10));
    engine.place_order(gtc(2, Side::Buy, 100, 10));
    assert!(engine.update_order(Amendment::new(1, 100, 10)).is_empty());

    let trades = engine.place_order(gtc(3, Side::Sell, 100, 10));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy.order_id, 2, "amended order must lose its turn");

    engine.cancel_order(1);
    assert_eq!(engine.size(), 0);
}

#[test]
fn day_orders_expire_at_market_close() {
    init_tracing();

    // A close time that wraps past midnight would land a day out; wait out
    // the edge instead of flaking on it.
    let mut close = Local::now() + TimeDelta::seconds(1);
    if close.date_naive() != Local::now().date_naive() {
        thread::sleep(Duration::from_secs(2));
        close = Local::now() + TimeDelta::seconds(1);
    }

    let engine = MatchingEngine::with_config(EngineConfig {
        market_close: close.time(),
    })
    .unwrap();

    engine.place_order(day(1, Side::Buy, 99, 10));
    engine.place_order(day(2, Side::Sell, 105, 5));
    engine.place_order(gtc(3, Side::Buy, 98, 7));
    assert_eq!(engine.size(), 3);

    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.size() > 1 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(25));
    }

    assert_eq!(engine.size(), 1, "day orders should be gone at the close");
    let snapshot = engine.levels_info();
    assert_eq!(snapshot.bids.len(), 1);
    assert_eq!(snapshot.bids[0].price, 98);
    assert!(snapshot.asks.is_empty());
}

#[test]
fn drop_joins_the_worker_promptly() {
    init_tracing();
    let engine = MatchingEngine::new().unwrap();
    engine.place_order(day(1, Side::Buy, 99, 10));

    let started = Instant::now();
    drop(engine);
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "shutdown should not wait for market close"
    );
}

#[test]
fn snapshot_serializes_to_json() {
    let engine = MatchingEngine::new().unwrap();
    engine.place_order(gtc(1, Side::Buy, 99, 10));
    engine.place_order(gtc(2, Side::Buy, 99, 15));
    engine.place_order(gtc(3, Side::Sell, 101, 7));

    let snapshot = serde_json::to_value(engine.levels_info()).unwrap();
    assert_eq!(
        snapshot,
        json!({
            "bids": [{ "price": 99, "quantity": 25 }],
            "asks": [{ "price": 101, "quantity": 7 }],
        })
    );
}
