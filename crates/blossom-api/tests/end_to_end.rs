//! Dev server, HTTP client and flow controller running together over a
//! real socket.

use blossom_api::{create_router, AppConfig, AppState};
use blossom_client::{BlossomPaymentClient, ClientConfig};
use blossom_core::{InvoiceRequest, PaymentStatus, StatusSource};
use blossom_flow::{FlowCallbacks, FlowConfig, FlowEvent, PaymentFlowController};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const PUBKEY: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";

type Events = Arc<Mutex<Vec<FlowEvent>>>;

async fn spawn_server() -> (AppState, Arc<BlossomPaymentClient>) {
    let state = AppState::with_config(AppConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = create_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = BlossomPaymentClient::new(ClientConfig::new(format!("http://{}", addr))).unwrap();
    (state, Arc::new(client))
}

fn recorder() -> (Events, FlowCallbacks) {
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let on_status = Arc::clone(&events);
    let on_success = Arc::clone(&events);
    let callbacks = FlowCallbacks::new()
        .on_status_change(move |s| on_status.lock().unwrap().push(FlowEvent::StatusChanged(s)))
        .on_payment_success(move || on_success.lock().unwrap().push(FlowEvent::PaymentSucceeded));
    (events, callbacks)
}

fn fast_polling() -> FlowConfig {
    FlowConfig::default().with_polling_interval(Duration::from_millis(50))
}

async fn wait_for(controller: &PaymentFlowController, status: PaymentStatus) {
    for _ in 0..200 {
        if controller.status() == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("flow never reached {}, stuck at {}", status, controller.status());
}

#[tokio::test]
async fn test_settled_invoice_completes_flow() {
    let (state, client) = spawn_server().await;
    let (events, callbacks) = recorder();

    let details = client
        .request_invoice(&InvoiceRequest::new(PUBKEY, 21_000))
        .await
        .unwrap();
    let controller = PaymentFlowController::new(client.clone(), fast_polling(), callbacks).unwrap();
    controller.open_payment_modal(details.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(controller.status(), PaymentStatus::Pending);
    assert!(controller.snapshot().error.is_none());

    state
        .invoices
        .set_status(&details.invoice_id, PaymentStatus::Paid, Utc::now())
        .unwrap();

    wait_for(&controller, PaymentStatus::Paid).await;
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            FlowEvent::StatusChanged(PaymentStatus::Paid),
            FlowEvent::PaymentSucceeded
        ]
    );
    assert!(controller.polling_invoice().is_none());
}

#[tokio::test]
async fn test_close_cancels_invoice_on_server() {
    let (state, client) = spawn_server().await;
    let (_events, callbacks) = recorder();

    let details = client
        .request_invoice(&InvoiceRequest::new(PUBKEY, 5_000))
        .await
        .unwrap();
    let config = fast_polling().with_cancel_on_close(true);
    let controller = PaymentFlowController::new(client.clone(), config, callbacks).unwrap();

    controller.open_payment_modal(details.clone());
    controller.close_payment_modal();

    let mut server_status = PaymentStatus::Pending;
    for _ in 0..100 {
        server_status = state
            .invoices
            .status(&details.invoice_id, Utc::now())
            .unwrap();
        if server_status == PaymentStatus::Cancelled {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server_status, PaymentStatus::Cancelled);
    assert_eq!(
        client.fetch_status(&details.invoice_id).await.unwrap(),
        PaymentStatus::Cancelled
    );
}

#[tokio::test]
async fn test_unknown_invoice_exhausts_failure_bound() {
    let (_state, client) = spawn_server().await;
    let (events, callbacks) = recorder();

    let config = fast_polling().with_max_consecutive_failures(2);
    let controller = PaymentFlowController::new(client, config, callbacks).unwrap();
    controller.open_payment_modal(blossom_core::PaymentDetails::new("inv_missing", 1_000, "lnbc..."));

    wait_for(&controller, PaymentStatus::Error).await;

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_polling);
    let error = snapshot.error.unwrap();
    assert!(error.contains("404"), "unexpected error: {}", error);
    assert_eq!(
        *events.lock().unwrap(),
        vec![FlowEvent::StatusChanged(PaymentStatus::Error)]
    );
}
