//! Integration tests for the order fulfillment core.
//!
//! Exercises the full flow against the in-memory stores, including the
//! concurrent races the conditional store operations exist to win.

use std::sync::Arc;

use common::{AgentId, OrderId};
use domain::{AgentRef, CustomerInfo, Money, OrderStatus, Product};
use fulfillment::{FulfillmentError, LineRequest, NewOrder, OrderFulfillmentService};
use store::{InMemoryOrderStore, InMemoryProductStore, ProductStore};

type TestService = OrderFulfillmentService<InMemoryProductStore, InMemoryOrderStore>;

struct TestHarness {
    service: Arc<TestService>,
    products: InMemoryProductStore,
}

impl TestHarness {
    async fn new(stock: u32) -> Self {
        // Idempotent so every test can set up its own harness.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let products = InMemoryProductStore::new();
        products
            .put(Product::new(
                "SKU-001",
                "Widget",
                stock,
                5,
                Money::from_cents(1000),
            ))
            .await;
        products
            .put(Product::new(
                "SKU-002",
                "Gadget",
                stock,
                5,
                Money::from_cents(500),
            ))
            .await;

        let service = Arc::new(OrderFulfillmentService::new(
            products.clone(),
            InMemoryOrderStore::new(),
        ));
        Self { service, products }
    }

    async fn stock_of(&self, sku: &str) -> u32 {
        self.products
            .get(&sku.into())
            .await
            .unwrap()
            .unwrap()
            .stock()
    }

    async fn create_order(&self, lines: Vec<LineRequest>) -> OrderId {
        self.service
            .create_order(new_order(lines))
            .await
            .unwrap()
            .order
            .id()
    }
}

fn new_order(lines: Vec<LineRequest>) -> NewOrder {
    NewOrder {
        customer: CustomerInfo {
            id: "CLI-001".to_string(),
            name: "Comercial Andina".to_string(),
            address: "Av. Siempre Viva 742".to_string(),
            phone: "555-0100".to_string(),
        },
        lines,
        delivery_address: "Calle Falsa 123".to_string(),
        notes: None,
    }
}

fn line(product_id: &str, quantity: u32) -> LineRequest {
    LineRequest {
        product_id: product_id.into(),
        quantity,
    }
}

fn agent(n: usize) -> AgentRef {
    AgentRef::new(format!("agent-{n}"), format!("Agent {n}"))
}

#[tokio::test]
async fn happy_path_create_claim_deliver() {
    let harness = TestHarness::new(20).await;
    let order_id = harness
        .create_order(vec![line("SKU-001", 2), line("SKU-002", 1)])
        .await;
    assert_eq!(harness.stock_of("SKU-001").await, 18);
    assert_eq!(harness.stock_of("SKU-002").await, 19);

    let agent_id = AgentId::new("agent-1");
    harness
        .service
        .claim_order(order_id, agent(1))
        .await
        .unwrap();
    harness
        .service
        .update_status(order_id, &agent_id, OrderStatus::InTransit)
        .await
        .unwrap();
    let delivered = harness
        .service
        .update_status(order_id, &agent_id, OrderStatus::Delivered)
        .await
        .unwrap();

    assert_eq!(delivered.status(), OrderStatus::Delivered);
    assert!(delivered.delivered_at().is_some());
    // Delivered stock stays consumed.
    assert_eq!(harness.stock_of("SKU-001").await, 18);
    assert_eq!(harness.stock_of("SKU-002").await, 19);
}

#[tokio::test]
async fn insufficient_stock_on_second_line_rolls_back_the_first() {
    let harness = TestHarness::new(10).await;

    let err = harness
        .service
        .create_order(new_order(vec![line("SKU-001", 6), line("SKU-002", 11)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FulfillmentError::InsufficientStock {
            available: 10,
            requested: 11,
            ..
        }
    ));
    assert_eq!(harness.stock_of("SKU-001").await, 10);
    assert_eq!(harness.stock_of("SKU-002").await, 10);
    assert!(harness.service.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_claims_have_exactly_one_winner() {
    let harness = TestHarness::new(10).await;
    let order_id = harness.create_order(vec![line("SKU-001", 1)]).await;

    let mut handles = Vec::new();
    for n in 0..10 {
        let service = Arc::clone(&harness.service);
        handles.push(tokio::spawn(async move {
            service.claim_order(order_id, agent(n)).await
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => {
                assert_eq!(order.status(), OrderStatus::Assigned);
                winners += 1;
            }
            Err(FulfillmentError::NotAvailable(id)) => {
                assert_eq!(id, order_id);
                losers += 1;
            }
            Err(other) => panic!("unexpected claim error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(losers, 9);

    let order = harness.service.get_order(order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Assigned);
    assert!(order.assigned_agent().is_some());
}

#[tokio::test]
async fn concurrent_order_creation_never_oversells() {
    let harness = TestHarness::new(10).await;

    // 30 concurrent single-unit orders against 10 units of stock.
    let mut handles = Vec::new();
    for _ in 0..30 {
        let service = Arc::clone(&harness.service);
        handles.push(tokio::spawn(async move {
            service.create_order(new_order(vec![line("SKU-001", 1)])).await
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(FulfillmentError::InsufficientStock { .. }) => rejected += 1,
            Err(other) => panic!("unexpected creation error: {other}"),
        }
    }

    assert_eq!(created, 10);
    assert_eq!(rejected, 20);
    assert_eq!(harness.stock_of("SKU-001").await, 0);
    assert_eq!(harness.service.list_orders().await.unwrap().len(), 10);
}

#[tokio::test]
async fn cancellation_restores_stock_and_is_idempotent_under_races() {
    let harness = TestHarness::new(10).await;
    let order_id = harness.create_order(vec![line("SKU-001", 4)]).await;
    assert_eq!(harness.stock_of("SKU-001").await, 6);

    // Concurrent cancels of the same order release the stock once.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&harness.service);
        handles.push(tokio::spawn(
            async move { service.cancel_order(order_id).await },
        ));
    }
    for handle in handles {
        let order = handle.await.unwrap().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    assert_eq!(harness.stock_of("SKU-001").await, 10);
}

#[tokio::test]
async fn cancelled_stock_is_immediately_reusable() {
    let harness = TestHarness::new(4).await;
    let first = harness.create_order(vec![line("SKU-001", 4)]).await;

    // Stock exhausted; a second order cannot be created.
    let err = harness
        .service
        .create_order(new_order(vec![line("SKU-001", 4)]))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::InsufficientStock { .. }));

    harness.service.cancel_order(first).await.unwrap();

    // Released stock covers the retry.
    harness.create_order(vec![line("SKU-001", 4)]).await;
    assert_eq!(harness.stock_of("SKU-001").await, 0);
}

#[tokio::test]
async fn delivered_orders_are_terminal() {
    let harness = TestHarness::new(10).await;
    let order_id = harness.create_order(vec![line("SKU-001", 1)]).await;
    let agent_id = AgentId::new("agent-1");

    harness
        .service
        .claim_order(order_id, agent(1))
        .await
        .unwrap();
    harness
        .service
        .update_status(order_id, &agent_id, OrderStatus::InTransit)
        .await
        .unwrap();
    harness
        .service
        .update_status(order_id, &agent_id, OrderStatus::Delivered)
        .await
        .unwrap();

    let err = harness.service.cancel_order(order_id).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::AlreadyDelivered(_)));

    for next in [
        OrderStatus::Available,
        OrderStatus::Assigned,
        OrderStatus::InTransit,
    ] {
        let err = harness
            .service
            .update_status(order_id, &agent_id, next)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::Order(domain::OrderError::InvalidTransition { .. })
        ));
    }

    let order = harness.service.get_order(order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Delivered);
}

#[tokio::test]
async fn cancelled_orders_reject_claims_and_agent_updates() {
    let harness = TestHarness::new(10).await;
    let order_id = harness.create_order(vec![line("SKU-001", 1)]).await;
    harness.service.cancel_order(order_id).await.unwrap();

    let err = harness
        .service
        .claim_order(order_id, agent(1))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::NotAvailable(_)));

    // Never-assigned cancelled order: no assignee, so agents are rejected
    // before the transition table is even consulted.
    let err = harness
        .service
        .update_status(order_id, &AgentId::new("agent-1"), OrderStatus::Assigned)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::Order(domain::OrderError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn totals_are_preserved_across_lifecycle() {
    let harness = TestHarness::new(20).await;
    let order_id = harness
        .create_order(vec![line("SKU-001", 2), line("SKU-002", 4)])
        .await;
    let expected_cents = 2 * 1000 + 4 * 500;

    let order = harness.service.get_order(order_id).await.unwrap();
    assert_eq!(order.total().cents(), expected_cents);

    harness
        .service
        .claim_order(order_id, agent(1))
        .await
        .unwrap();
    let order = harness.service.get_order(order_id).await.unwrap();
    assert_eq!(order.total().cents(), expected_cents);

    let order = harness.service.cancel_order(order_id).await.unwrap();
    assert_eq!(order.total().cents(), expected_cents);
}

#[tokio::test]
async fn release_and_reclaim_cycle_keeps_stock_untouched() {
    let harness = TestHarness::new(10).await;
    let order_id = harness.create_order(vec![line("SKU-001", 3)]).await;
    assert_eq!(harness.stock_of("SKU-001").await, 7);

    let first = AgentId::new("agent-1");
    harness
        .service
        .claim_order(order_id, agent(1))
        .await
        .unwrap();
    harness
        .service
        .update_status(order_id, &first, OrderStatus::Available)
        .await
        .unwrap();
    assert_eq!(harness.stock_of("SKU-001").await, 7);

    let reclaimed = harness
        .service
        .claim_order(order_id, agent(2))
        .await
        .unwrap();
    assert_eq!(reclaimed.assigned_agent().unwrap().id.as_str(), "agent-2");
    assert_eq!(harness.stock_of("SKU-001").await, 7);
}
