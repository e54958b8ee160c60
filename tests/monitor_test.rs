use mailwatch::core::error::MailError;
use mailwatch::infrastructure::session::MockMailbox;
use mailwatch::services::checkpoint::MailCheckPoint;
use mailwatch::services::connection::SessionConnection;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const DATE: &str = "01-Feb-2026 10:30:00 +0900";

fn raw_mail(subject: &str) -> String {
    format!(
        "From: Alice <alice@example.com>\r\n\
         To: bob@example.com\r\n\
         Subject: {}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         body of {}\r\n",
        subject, subject
    )
}

async fn checkpoint_over(mailbox: &MockMailbox) -> MailCheckPoint {
    SessionConnection::new(mailbox.session())
        .create_checkpoint()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_arrival_is_delivered_once_and_monitor_stops() {
    let mailbox = MockMailbox::new();
    for i in 1..=3 {
        mailbox.deliver(raw_mail(&format!("mail {}", i)), DATE);
    }

    let mut checkpoint = checkpoint_over(&mailbox).await;
    assert_eq!(checkpoint.reference_mail().map(|m| m.uid()), Some(3));

    let arrival = mailbox.deliver(raw_mail("mail 4"), DATE);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_callback = seen.clone();
    checkpoint
        .monitor(
            move |batch| {
                let mut seen = seen_in_callback.lock().unwrap();
                seen.extend(batch.iter().map(|m| m.uid()));
                true
            },
            Duration::from_millis(10),
            Duration::from_secs(30),
        )
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![arrival]);
}

#[tokio::test]
async fn test_monitor_times_out_without_new_mail() {
    let mailbox = MockMailbox::new();
    mailbox.deliver(raw_mail("mail 1"), DATE);

    let mut checkpoint = checkpoint_over(&mailbox).await;

    let started = Instant::now();
    let result = checkpoint
        .monitor(
            |_| panic!("no mail should be delivered"),
            Duration::from_millis(50),
            Duration::from_millis(200),
        )
        .await;

    assert!(matches!(result, Err(MailError::MonitoringTimeout(_))));
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_fetch_gap_yields_partial_batch_not_error() {
    let mailbox = MockMailbox::new();
    for i in 1..=3 {
        mailbox.deliver(raw_mail(&format!("mail {}", i)), DATE);
    }
    let mut checkpoint = checkpoint_over(&mailbox).await;

    let arrival = mailbox.deliver(raw_mail("mail 4"), DATE);
    mailbox.deliver_unavailable();
    mailbox.deliver(raw_mail("mail 6"), DATE);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_callback = seen.clone();
    checkpoint
        .monitor(
            move |batch| {
                let mut seen = seen_in_callback.lock().unwrap();
                seen.extend(batch.iter().map(|m| m.uid()));
                true
            },
            Duration::from_millis(10),
            Duration::from_secs(30),
        )
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![arrival]);
}

#[tokio::test]
async fn test_reference_does_not_advance_between_cycles() {
    let mailbox = MockMailbox::new();
    for i in 1..=3 {
        mailbox.deliver(raw_mail(&format!("mail {}", i)), DATE);
    }
    let mut checkpoint = checkpoint_over(&mailbox).await;

    mailbox.deliver(raw_mail("mail 4"), DATE);

    let mailbox_in_callback = mailbox.clone();
    let batches = Arc::new(Mutex::new(Vec::new()));
    let batches_in_callback = batches.clone();
    checkpoint
        .monitor(
            move |batch| {
                let uids: Vec<u32> = batch.iter().map(|m| m.uid()).collect();
                let mut batches = batches_in_callback.lock().unwrap();
                batches.push(uids);
                if batches.len() == 1 {
                    // deliver one more before the second cycle
                    mailbox_in_callback.deliver(raw_mail("mail 5"), DATE);
                    false
                } else {
                    true
                }
            },
            Duration::from_millis(10),
            Duration::from_secs(30),
        )
        .await
        .unwrap();

    // every batch is the cumulative diff from the checkpoint reference
    assert_eq!(*batches.lock().unwrap(), vec![vec![4], vec![4, 5]]);
}

#[tokio::test]
async fn test_checkpoint_on_empty_mailbox_reports_first_arrival() {
    let mailbox = MockMailbox::new();
    let mut checkpoint = checkpoint_over(&mailbox).await;
    assert!(checkpoint.reference_mail().is_none());

    let arrival = mailbox.deliver(raw_mail("first"), DATE);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_callback = seen.clone();
    checkpoint
        .monitor(
            move |batch| {
                let mut seen = seen_in_callback.lock().unwrap();
                seen.extend(batch.iter().map(|m| m.uid()));
                true
            },
            Duration::from_millis(10),
            Duration::from_secs(30),
        )
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![arrival]);
}

#[tokio::test]
async fn test_empty_checkpoint_tolerates_fetch_gap() {
    let mailbox = MockMailbox::new();
    let mut checkpoint = checkpoint_over(&mailbox).await;
    assert!(checkpoint.reference_mail().is_none());

    // uid 1 is indexed but its content is not retrievable yet
    mailbox.deliver_unavailable();

    let result = checkpoint
        .monitor(
            |_| panic!("the gap must not produce a batch"),
            Duration::from_millis(50),
            Duration::from_millis(200),
        )
        .await;

    // the gap must keep the monitor polling instead of aborting it
    assert!(matches!(result, Err(MailError::MonitoringTimeout(_))));
}

#[tokio::test]
async fn test_cancellation_stops_monitoring_cleanly() {
    let mailbox = MockMailbox::new();
    mailbox.deliver(raw_mail("mail 1"), DATE);
    let mut checkpoint = checkpoint_over(&mailbox).await;

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = checkpoint
        .monitor_with_cancel(
            |_| false,
            Duration::from_millis(10),
            Duration::from_secs(30),
            cancel,
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_uid_validity_change_fails_fast() {
    let mailbox = MockMailbox::new();
    mailbox.deliver(raw_mail("mail 1"), DATE);
    let mut checkpoint =
        MailCheckPoint::from_connection(SessionConnection::boxed(mailbox.session()))
            .await
            .unwrap();

    mailbox.reset_uid_validity();

    let result = checkpoint
        .monitor(
            |_| false,
            Duration::from_millis(10),
            Duration::from_secs(30),
        )
        .await;

    assert!(matches!(
        result,
        Err(MailError::MailboxIdentityChanged { expected: 1, actual: 2 })
    ));
}
