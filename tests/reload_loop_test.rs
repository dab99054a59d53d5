mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use proxy_reconcile::lifecycle::{run_reload_loop, Shutdown};
use proxy_reconcile::ProxyState;

use common::{cluster, config};

async fn wait_for_generation(state: &ProxyState, generation: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.load().generation() < generation {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("reload not applied in time");
}

#[tokio::test]
async fn test_loop_applies_updates_until_shutdown() {
    let state = Arc::new(
        ProxyState::from_config(config(vec![("web", cluster(&[("d1", "http://10.0.0.1")]))]))
            .unwrap(),
    );
    let d1 = state.load().cluster("web").unwrap().destination("d1").unwrap().clone();

    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(run_reload_loop(state.clone(), rx, shutdown.subscribe()));

    tx.send(config(vec![
        ("web", cluster(&[("d1", "http://10.0.0.1")])),
        ("api", cluster(&[("a1", "http://10.0.1.1")])),
    ]))
    .unwrap();
    wait_for_generation(&state, 2).await;

    let topology = state.load();
    assert_eq!(topology.destination_count(), 2);
    assert!(topology.route("api").is_some());
    assert!(Arc::ptr_eq(&d1, topology.cluster("web").unwrap().destination("d1").unwrap()));

    assert_eq!(shutdown.trigger(), 1);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("reload loop did not stop")
        .unwrap();
    assert_eq!(state.load().generation(), 2);
}

#[tokio::test]
async fn test_loop_exits_when_senders_are_gone() {
    let state = Arc::new(ProxyState::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(run_reload_loop(state.clone(), rx, shutdown.subscribe()));

    tx.send(config(vec![("web", cluster(&[("d1", "http://10.0.0.1")]))]))
        .unwrap();
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("reload loop did not stop")
        .unwrap();
    assert_eq!(state.load().generation(), 1);
    assert_eq!(state.load().destination_count(), 1);
}
