//! Shell composition demo.
//!
//! Run with: cargo run -p shell-demo
//!
//! Wires every runtime piece the way the host application would: one
//! manifest server per remote participant, the shared message bus, two
//! cart stores over one storage area (two simulated tabs), the fragment
//! loader with a deliberate failure, the cart coordinator, and the
//! health monitor.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mfe_cart::{CartCoordinator, CartStore, StorageArea, spawn_follower, storage::MemoryStorage};
use mfe_core::{
    ActivityJournal, AddToCart, CartCountUpdated, CartOperation, MessageBus, Participant, Payload,
    demo_catalog,
};
use mfe_health::{HealthMonitor, MonitorConfig};
use mfe_loader::{Fragment, FragmentLoader, FragmentRegistry, MountPoint};

/// Stand-in for a remotely provided UI fragment.
struct DemoFragment {
    name: String,
}

impl Fragment for DemoFragment {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Serve `HEAD /remoteEntry.json` for one participant and return its
/// manifest endpoint.
async fn start_manifest_server(participant: Participant) -> anyhow::Result<String> {
    let app = Router::new()
        .route("/remoteEntry.json", get(|| async { "{}" }))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(%participant, "Manifest server failed: {e}");
        }
    });

    Ok(format!("http://{addr}/remoteEntry.json"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Manifest servers for the remote participants.
    let mut endpoints = HashMap::new();
    endpoints.insert(Participant::Shell, "local".to_owned());
    for participant in [Participant::Header, Participant::Products, Participant::Cart] {
        let endpoint = start_manifest_server(participant).await?;
        tracing::info!(%participant, %endpoint, "Participant manifest online");
        endpoints.insert(participant, endpoint);
    }

    // Shared coordination state.
    let bus = MessageBus::new();
    let journal = Arc::new(ActivityJournal::new());
    let storage: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new());

    // Two stores over one storage area: the shell tab and a second tab
    // kept converged by the replication follower.
    let shell_tab = Arc::new(CartStore::open(Arc::clone(&storage)).await);
    let other_tab = Arc::new(CartStore::open(storage).await);
    let _follower = spawn_follower(Arc::clone(&other_tab));

    // Fragment registry: what each participant exposes at runtime.
    let registry = FragmentRegistry::new();
    registry.register(Participant::Header, "HeaderComponent", || {
        Ok(Box::new(DemoFragment {
            name: "HeaderComponent".into(),
        }))
    });
    registry.register(Participant::Products, "ProductListComponent", || {
        Ok(Box::new(DemoFragment {
            name: "ProductListComponent".into(),
        }))
    });
    registry.register(Participant::Cart, "CartComponent", || {
        Ok(Box::new(DemoFragment {
            name: "CartComponent".into(),
        }))
    });

    let config = MonitorConfig {
        interval: Duration::from_secs(5),
        ..MonitorConfig::default()
    };
    let monitor = Arc::new(HealthMonitor::with_http_probe(
        Participant::Shell,
        endpoints.clone(),
        &config,
    )?);
    let _health_task = monitor.spawn();

    // Mount the fragments, plus one unresolvable name to show the
    // fallback path.
    let loader = FragmentLoader::new(Arc::new(registry));
    for (participant, fragment) in [
        (Participant::Header, "HeaderComponent"),
        (Participant::Products, "ProductListComponent"),
        (Participant::Cart, "CartComponent"),
        (Participant::Cart, "CheckoutComponent"),
    ] {
        let mount = Mutex::new(MountPoint::new());
        let handle = loader.load(participant, fragment, &mount).await;
        monitor.record_observation(participant, handle.is_some());
    }

    // The host's cart message loop.
    let coordinator = Arc::new(
        CartCoordinator::new(bus.clone(), Arc::clone(&shell_tab)).with_journal(Arc::clone(&journal)),
    );
    let runner = Arc::clone(&coordinator);
    tokio::spawn(async move { runner.run().await });
    coordinator.publish_count().await;

    // The header badge, re-rendering on every count update.
    let mut badge = bus.subscribe(Participant::Shell, CartCountUpdated::KIND);
    tokio::spawn(async move {
        while let Some(msg) = badge.recv().await {
            if let Ok(update) = CartCountUpdated::from_message(&msg) {
                tracing::info!(count = update.count, "Header badge updated");
            }
        }
    });

    // Scripted user flow: add headphones from the products fragment,
    // then bump the quantity from the cart fragment.
    let catalog = demo_catalog();
    bus.publish(
        AddToCart {
            product: catalog[0].clone(),
            quantity: 1,
        }
        .to_message(Participant::Products, Participant::Cart)?,
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    bus.publish(
        CartOperation::Update {
            product_id: catalog[0].id.clone(),
            quantity: 3,
        }
        .to_message(Participant::Cart, Participant::Shell)?,
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    tracing::info!(
        shell_count = shell_tab.count(),
        shell_total = shell_tab.total(),
        other_tab_count = other_tab.count(),
        "Carts converged"
    );

    for status in monitor.check_all().await.values() {
        tracing::info!(
            participant = %status.name,
            active = status.is_active,
            endpoint = %status.endpoint,
            "Participant status"
        );
    }

    for entry in journal.entries() {
        tracing::info!(action = %entry.action, from = %entry.from, "Journal entry");
    }

    Ok(())
}
