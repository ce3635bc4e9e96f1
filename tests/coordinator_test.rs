//! Admission-gate properties of the dispense coordinator: FIFO service,
//! bounded queueing, and the single-session guarantee.

use ration_kiosk::config::KioskConfig;
use ration_kiosk::link::sim::{simulated, SimulatedDevice};
use ration_kiosk::model::{DispenseRequest, OutcomeStatus};
use ration_kiosk::runtime::KioskSystem;
use std::time::Duration;
use tokio::time::sleep;

fn start_system(config: KioskConfig) -> (KioskSystem, SimulatedDevice) {
    let (transport, device) = simulated();
    let system = KioskSystem::start(&config, transport);
    (system, device)
}

#[tokio::test]
async fn admitted_requests_are_served_in_fifo_order() {
    let config = KioskConfig {
        command_timeout: Duration::from_millis(1000),
        ..KioskConfig::default()
    };
    let (system, mut device) = start_system(config);
    system.link.open().await.unwrap();

    let items = ["rice", "wheat", "sugar", "oil"];
    for item in items {
        system.ledger.set_stock(item, 10).await.unwrap();
    }

    let mut handles = Vec::new();
    for item in items {
        let coordinator = system.coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .dispense(DispenseRequest::new(1, 1, item, 1))
                .await
        }));
        // Give each submission time to land before the next, so the
        // admission order is the submission order.
        sleep(Duration::from_millis(20)).await;
    }

    let mut served = Vec::new();
    for _ in 0..items.len() {
        let command = device.next_command().await.unwrap();
        served.push(command);
        device.send_line("COMPLETE").await;
    }

    assert_eq!(
        served,
        vec![
            "DISPENSE,rice,1\n",
            "DISPENSE,wheat,1\n",
            "DISPENSE,sugar,1\n",
            "DISPENSE,oil,1\n",
        ]
    );
    for handle in handles {
        assert!(handle.await.unwrap().is_committed());
    }
}

#[tokio::test]
async fn overflowing_the_admission_queue_is_rejected_as_busy() {
    // Depth 1: one request may wait while another is in flight; the rest
    // must bounce immediately.
    let config = KioskConfig {
        command_timeout: Duration::from_millis(1000),
        queue_depth: 1,
        ..KioskConfig::default()
    };
    let (system, _device) = start_system(config);
    system.ledger.set_stock("rice", 100).await.unwrap();
    system.link.open().await.unwrap();

    // The device stays silent, so the first request holds the gate until its
    // deadline and the queue stays full behind it.
    let mut handles = Vec::new();
    for family in 0..5 {
        let coordinator = system.coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .dispense(DispenseRequest::new(family, 1, "rice", 1))
                .await
        }));
        sleep(Duration::from_millis(25)).await;
    }

    let mut busy = 0;
    let mut timed_out = 0;
    for handle in handles {
        let outcome = handle.await.unwrap();
        match outcome.reason.as_deref() {
            Some("busy") => busy += 1,
            Some("timeout") => timed_out += 1,
            other => panic!("unexpected outcome reason: {:?}", other),
        }
    }

    // First request in flight, second queued, the other three bounced.
    assert_eq!(busy, 3);
    assert_eq!(timed_out, 2);
    // Busy rejections took no reservation; the timed-out ones rolled back.
    assert_eq!(system.ledger.stock_of("rice").await.unwrap(), Some(100));
}

#[tokio::test]
async fn at_most_one_command_is_ever_in_flight() {
    let config = KioskConfig {
        command_timeout: Duration::from_millis(1000),
        ..KioskConfig::default()
    };
    let (system, device) = start_system(config);
    system.ledger.set_stock("rice", 100).await.unwrap();
    system.link.open().await.unwrap();

    // A deliberately slow firmware that checks for overlapping commands
    // before answering each one.
    let driver = tokio::spawn(async move {
        let mut device = device;
        let mut overlap = false;
        while device.next_command().await.is_some() {
            sleep(Duration::from_millis(10)).await;
            if device.try_next_command().is_some() {
                overlap = true;
                break;
            }
            device.send_line("COMPLETE").await;
        }
        overlap
    });

    let mut handles = Vec::new();
    for family in 0..6 {
        let coordinator = system.coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .dispense(DispenseRequest::new(family, 1, "rice", 2))
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_committed());
    }

    // Closing the link ends the driver loop.
    system.link.close().await.unwrap();
    let overlap = driver.await.unwrap();
    assert!(!overlap, "two commands were in flight at once");
    assert_eq!(system.ledger.stock_of("rice").await.unwrap(), Some(88));
}

#[tokio::test]
async fn transactions_are_recorded_only_for_committed_outcomes() {
    let config = KioskConfig {
        command_timeout: Duration::from_millis(1000),
        ..KioskConfig::default()
    };
    let (system, device) = start_system(config);
    system.ledger.set_stock("rice", 100).await.unwrap();
    system.link.open().await.unwrap();

    // Alternate success and failure.
    let driver = tokio::spawn(async move {
        let mut device = device;
        let mut succeed = true;
        while device.next_command().await.is_some() {
            if succeed {
                device.send_line("COMPLETE").await;
            } else {
                device.send_line("ERROR:jam").await;
            }
            succeed = !succeed;
        }
    });

    let mut committed = 0;
    for family in 0..6 {
        let outcome = system
            .coordinator
            .dispense(DispenseRequest::new(family, 1, "rice", 1))
            .await;
        match outcome.status {
            OutcomeStatus::Committed => committed += 1,
            OutcomeStatus::Failed => {
                assert_eq!(outcome.reason.as_deref(), Some("jam"));
            }
            OutcomeStatus::Rejected => panic!("unexpected rejection"),
        }
    }

    assert_eq!(committed, 3);
    assert_eq!(system.transactions.count().await.unwrap(), 3);
    // 3 committed units gone, 3 failed ones restored.
    assert_eq!(system.ledger.stock_of("rice").await.unwrap(), Some(97));

    system.link.close().await.unwrap();
    driver.await.unwrap();
}
