use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use claimsight::agent::STEP_BUDGET;
use claimsight::error::AgentError;

use super::claim_harness::{AlwaysToolProvider, Harness};

#[tokio::test]
async fn endless_tool_requests_stop_after_fifteen_generations() {
    let harness = Harness::seeded().await;
    let provider = Arc::new(AlwaysToolProvider {
        calls: AtomicU32::new(0),
    });

    let err = harness
        .agent(provider.clone())
        .run("Car slid into a ditch")
        .await
        .unwrap_err();

    assert_eq!(STEP_BUDGET, 15);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 15);
    assert!(matches!(err, AgentError::BudgetExceeded { rounds: 15 }));
    assert_eq!(harness.recommendation_count().await, 0);
}

#[tokio::test]
async fn custom_round_limit_is_honored() {
    let harness = Harness::seeded().await;
    let provider = Arc::new(AlwaysToolProvider {
        calls: AtomicU32::new(0),
    });

    let err = harness
        .agent(provider.clone())
        .with_max_rounds(3)
        .run("Car slid into a ditch")
        .await
        .unwrap_err();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert!(matches!(err, AgentError::BudgetExceeded { rounds: 3 }));
}
