use super::fakes::{FakeAdmin, FakeNodeApiFactory, Reply, test_node};
use crate::NodeApiCache;

use std::sync::Arc;

use googletest::assert_that;
use googletest::prelude::{eq, none, some};

fn cache(admin: &Arc<FakeAdmin>) -> NodeApiCache {
    NodeApiCache::new(Arc::new(FakeNodeApiFactory::new(Arc::clone(admin))))
}

#[test]
fn given_new_handle_when_not_used_then_no_client_built() {
    // Given
    let admin = Arc::new(FakeAdmin::default());
    let cache = cache(&admin);

    // When
    let _handle = cache.handle_for(&Arc::new(test_node("n1")));

    // Then
    assert_that!(admin.creates("n1"), eq(0));
}

#[tokio::test]
async fn given_built_client_when_calls_fail_then_client_reused() {
    // Given
    let admin = Arc::new(FakeAdmin::default());
    admin.set_ping("n1", Reply::Refused);
    let cache = cache(&admin);
    let handle = cache.handle_for(&Arc::new(test_node("n1")));

    // When
    let first = handle.fast().unwrap();
    let _ = first.ping().await;
    let second = handle.fast().unwrap();

    // Then
    assert_that!(Arc::ptr_eq(&first, &second), eq(true));
    assert_that!(admin.creates("n1"), eq(1));
}

#[test]
fn given_fast_and_slow_profiles_when_requested_then_built_separately() {
    // Given
    let admin = Arc::new(FakeAdmin::default());
    let cache = cache(&admin);
    let handle = cache.handle_for(&Arc::new(test_node("n1")));

    // When
    let _fast = handle.fast().unwrap();
    let _slow = handle.slow().unwrap();
    let _fast_again = handle.fast().unwrap();

    // Then
    assert_that!(admin.creates("n1"), eq(2));
}

#[test]
fn given_client_cannot_be_built_when_retried_later_then_built() {
    // Given
    let admin = Arc::new(FakeAdmin::default());
    admin.set_unavailable("n1", true);
    let cache = cache(&admin);
    let handle = cache.handle_for(&Arc::new(test_node("n1")));
    assert_that!(handle.fast().is_err(), eq(true));
    assert_that!(handle.is_obtainable(), eq(false));

    // When
    admin.set_unavailable("n1", false);

    // Then
    assert_that!(handle.fast().is_ok(), eq(true));
    assert_that!(handle.is_obtainable(), eq(true));
}

#[test]
fn given_same_node_when_handle_requested_twice_then_same_handle() {
    // Given
    let admin = Arc::new(FakeAdmin::default());
    let cache = cache(&admin);
    let node = Arc::new(test_node("n1"));

    // When
    let first = cache.handle_for(&node);
    let second = cache.handle_for(&node);

    // Then
    assert_that!(Arc::ptr_eq(&first, &second), eq(true));
    assert_that!(cache.get("n1").map(|h| h.node_name().to_string()), some(eq("n1")));
}

#[test]
fn given_evicted_node_when_looked_up_then_absent() {
    // Given
    let admin = Arc::new(FakeAdmin::default());
    let cache = cache(&admin);
    cache.handle_for(&Arc::new(test_node("n1")));

    // When
    cache.evict("n1");

    // Then
    assert_that!(cache.get("n1").map(|h| h.node_name().to_string()), none());
}
