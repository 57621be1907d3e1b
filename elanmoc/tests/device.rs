//! Device operations against a scripted sensor

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use elanmoc::{
    Device, DeviceInfo, Error, Event, FingerStatus, Finger, MatchOutcome, Operation, Print,
    RetryReason, SessionConfig, Transport,
};

const PRODUCT_ID: u16 = 0x0c4c;

const ABORT: [u8; 3] = [0x40, 0xff, 0x02];

/// Shared view of what the sensor received and will answer
#[derive(Clone, Default)]
struct Script {
    inner: Arc<Mutex<ScriptInner>>,
}

#[derive(Default)]
struct ScriptInner {
    replies: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    open: bool,
}

impl Script {
    fn reply(&self, status: u8) -> &Self {
        self.inner.lock().replies.push_back(vec![0x40, status]);
        self
    }

    fn finger_info(&self, user_id: &[u8]) -> &Self {
        let mut frame = vec![0u8; 64];
        frame[0] = 0x40;
        frame[2..2 + user_id.len()].copy_from_slice(user_id);
        self.inner.lock().replies.push_back(frame);
        self
    }

    fn raw(&self, frame: &[u8]) -> &Self {
        self.inner.lock().replies.push_back(frame.to_vec());
        self
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.lock().sent.clone()
    }

    /// Second opcode byte of every frame sent
    fn sent_opcodes(&self) -> Vec<u8> {
        self.sent().iter().map(|frame| frame[2]).collect()
    }

    fn pending_replies(&self) -> usize {
        self.inner.lock().replies.len()
    }
}

/// In-memory sensor
///
/// A receive with no scripted reply waits forever, like a sensor waiting
/// for a finger.
struct ScriptedTransport {
    script: Script,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&mut self) -> elanmoc_transport::Result<()> {
        self.script.inner.lock().open = true;
        Ok(())
    }

    async fn close(&mut self) -> elanmoc_transport::Result<()> {
        self.script.inner.lock().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.script.inner.lock().open
    }

    async fn transmit(
        &mut self,
        endpoint: u8,
        data: &[u8],
        _timeout: Duration,
    ) -> elanmoc_transport::Result<()> {
        assert_eq!(endpoint, 0x01);
        self.script.inner.lock().sent.push(data.to_vec());
        Ok(())
    }

    async fn receive(
        &mut self,
        _endpoint: u8,
        len: usize,
        _timeout: Duration,
    ) -> elanmoc_transport::Result<BytesMut> {
        let reply = self.script.inner.lock().replies.pop_front();
        match reply {
            Some(mut frame) => {
                frame.truncate(len);
                Ok(BytesMut::from(&frame[..]))
            }
            None => std::future::pending().await,
        }
    }

    fn describe(&self) -> String {
        "scripted sensor".into()
    }
}

async fn open_device() -> (Device, Script) {
    let script = Script::default();
    let transport = ScriptedTransport {
        script: script.clone(),
    };
    let info = DeviceInfo::new(0x04f3, PRODUCT_ID, "scripted");

    let mut device = Device::new(transport, info).unwrap();
    device.open().await.unwrap();
    (device, script)
}

#[tokio::test]
async fn test_list_reports_provisioned_slots() {
    let (mut device, script) = open_device().await;

    script.reply(2);
    for slot in 0..10u8 {
        match slot {
            2 => script.finger_info(b"FP1-20240101-7-00000001-alice"),
            5 => script.finger_info(b"FP1-20240101-2-00000002-nobody"),
            _ => script.finger_info(&[]),
        };
    }

    let prints = device.list().await.unwrap();

    assert_eq!(prints.len(), 2);
    assert_eq!(prints[0].finger, Finger::RightIndex);
    assert_eq!(prints[0].stored().unwrap().slot, 2);
    assert_eq!(prints[1].finger, Finger::LeftIndex);
    assert_eq!(script.pending_replies(), 0);
    assert_eq!(script.sent().len(), 11);
}

#[tokio::test]
async fn test_enroll_then_verify() {
    let (mut device, script) = open_device().await;
    let mut events = device.subscribe();

    script.reply(1).reply(0xfd);
    for stage in 0..8 {
        script.reply(if stage == 3 { 0x42 } else { 0 });
        if stage == 3 {
            script.reply(3);
        }
    }
    script.raw(&[0x40, 0x00, 0x00]).reply(0);

    let template = Print::new(Finger::LeftThumb).with_username("bob");
    let print = device.enroll(template).await.unwrap();

    let stored = print.stored().unwrap().clone();
    assert_eq!(stored.slot, 1);
    assert!(stored.user_id.starts_with(b"FP1-"));
    assert!(stored.user_id.ends_with(b"-bob"));
    assert_eq!(print.username.as_deref(), Some("bob"));
    assert!(print.enroll_date.is_some());

    let commit = script.sent().last().unwrap().clone();
    assert_eq!(&commit[..4], &[0x40, 0xff, 0x11, 0xf6]);
    assert_eq!(&commit[4..4 + stored.user_id.len()], &stored.user_id[..]);

    let mut progress = Vec::new();
    let mut retries = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::EnrollProgress { stage, retry, .. } = event {
            match retry {
                Some(reason) => retries.push(reason),
                None => progress.push(stage),
            }
        }
    }
    assert_eq!(progress, (0..=8).collect::<Vec<_>>());
    assert_eq!(retries, vec![RetryReason::MoveRight]);

    // The persisted record verifies against the sensor
    let persisted = serde_json::to_string(&print).unwrap();
    let restored: Print = serde_json::from_str(&persisted).unwrap();

    script.reply(2).reply(1).finger_info(&stored.user_id);
    let outcome = device.verify(restored).await.unwrap();
    assert!(matches!(outcome, MatchOutcome::Matched { index: 0, .. }));

    let events = std::iter::from_fn(|| events.try_recv().ok()).collect::<Vec<_>>();
    assert_eq!(
        events,
        vec![
            Event::FingerStatus(FingerStatus::Needed),
            Event::FingerStatus(FingerStatus::Present),
            Event::FingerStatus(FingerStatus::None),
        ]
    );
}

#[tokio::test]
async fn test_enroll_rejects_unencodable_username() {
    let (mut device, script) = open_device().await;

    let template = Print::new(Finger::LeftMiddle).with_username("eve\0admin");
    let result = device.enroll(template).await;

    assert!(matches!(
        result,
        Err(Error::Types(elanmoc_types::Error::Validation(_)))
    ));
    assert!(script.sent().is_empty());
    assert!(!device.session().is_busy());
}

#[tokio::test]
async fn test_delete_on_empty_sensor_sends_nothing() {
    let (mut device, script) = open_device().await;
    script.reply(0);

    let print = Print::from_sensor(4, b"FP1-20240101-7-00000001-alice".to_vec());
    device.delete(&print).await.unwrap();

    assert_eq!(script.sent(), vec![vec![0x40, 0xff, 0x04]]);
}

#[tokio::test]
async fn test_delete_unstored_print_fails() {
    let (mut device, script) = open_device().await;
    script.reply(3);

    let result = device.delete(&Print::new(Finger::RightThumb)).await;
    assert!(matches!(
        result,
        Err(Error::Core(elanmoc_core::Error::Print(
            elanmoc_types::Error::NotDeviceStored
        )))
    ));
}

#[tokio::test]
async fn test_clear_storage() {
    let (mut device, script) = open_device().await;

    script.reply(0);
    device.clear_storage().await.unwrap();
    assert_eq!(script.sent_opcodes(), vec![0x99, 0x04]);

    script.reply(3);
    let err = device.clear_storage().await.unwrap_err();
    assert!(err.is_sensor_error());
    assert!(matches!(
        err,
        Error::Core(elanmoc_core::Error::StorageNotEmpty(3))
    ));
}

#[tokio::test]
async fn test_cancel_while_waiting_for_finger() {
    let (mut device, script) = open_device().await;
    let session = device.session();

    // Count answered, identify never is
    script.reply(1);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), device.identify(Vec::new()))
        .await
        .expect("identify hung after cancel");
    canceller.await.unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(script.sent().last().unwrap(), &ABORT.to_vec());
    assert!(!device.session().is_busy());

    // Device stays usable
    script.reply(0);
    assert!(device.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_identify_retries_are_reported() {
    let (mut device, script) = open_device().await;
    let mut events = device.subscribe();

    script
        .reply(1)
        .reply(0xfb)
        .reply(0x44)
        .reply(0)
        .finger_info(b"FP1-20240101-7-00000001-alice");

    let gallery = vec![Print::from_sensor(0, b"FP1-20240101-7-00000001-alice".to_vec())];
    let outcome = device.identify(gallery).await.unwrap();
    assert!(outcome.is_match());

    let retries = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            Event::Retry(reason) => Some(reason),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(retries, vec![RetryReason::SensorDirty, RetryReason::MoveLeft]);
}

#[tokio::test]
async fn test_retry_cap_from_config() {
    let script = Script::default();
    let transport = ScriptedTransport {
        script: script.clone(),
    };
    let mut device = Device::new(transport, DeviceInfo::new(0x04f3, PRODUCT_ID, "scripted"))
        .unwrap()
        .with_config(SessionConfig::default().with_max_retries(0));
    device.open().await.unwrap();

    script.reply(1).reply(0xff);
    let result = device.identify(Vec::new()).await;

    let err = result.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        Error::Core(elanmoc_core::Error::RetryLimitExceeded { limit: 0, .. })
    ));
}

#[tokio::test]
async fn test_bad_marker_is_fatal() {
    let (mut device, script) = open_device().await;
    script.raw(&[0x41, 0x00]);

    let err = device.list().await.unwrap_err();
    assert!(err.requires_reopen());
    assert!(matches!(
        err,
        Error::Core(elanmoc_core::Error::InvalidMarker { marker: 0x41, .. })
    ));
}

#[tokio::test]
async fn test_busy_session_rejects_operation() {
    let (mut device, _script) = open_device().await;
    device.session().begin(Operation::Enroll).unwrap();

    assert!(matches!(
        device.list().await,
        Err(Error::Core(elanmoc_core::Error::Busy {
            active: Operation::Enroll
        }))
    ));
}

#[tokio::test]
async fn test_close_aborts_and_releases() {
    let (mut device, script) = open_device().await;

    device.close().await.unwrap();

    assert!(!device.is_open());
    assert_eq!(script.sent(), vec![ABORT.to_vec()]);
    assert!(matches!(device.list().await, Err(Error::NotOpen)));
}

mod mocked {
    use super::*;
    use pretty_assertions::assert_eq;
    use mockall::mock;

    mock! {
        pub Usb {}

        #[async_trait]
        impl Transport for Usb {
            async fn open(&mut self) -> elanmoc_transport::Result<()>;
            async fn close(&mut self) -> elanmoc_transport::Result<()>;
            fn is_open(&self) -> bool;
            async fn transmit(
                &mut self,
                endpoint: u8,
                data: &[u8],
                timeout: Duration,
            ) -> elanmoc_transport::Result<()>;
            async fn receive(
                &mut self,
                endpoint: u8,
                len: usize,
                timeout: Duration,
            ) -> elanmoc_transport::Result<BytesMut>;
            fn describe(&self) -> String;
        }
    }

    #[tokio::test]
    async fn test_transmit_failure_ends_operation() {
        let mut transport = MockUsb::new();
        transport.expect_open().times(1).returning(|| Ok(()));
        transport.expect_is_open().return_const(true);
        transport
            .expect_describe()
            .return_const("mock".to_string());
        transport
            .expect_transmit()
            .times(1)
            .returning(|endpoint, _, _| Err(elanmoc_transport::Error::SendTimeout { endpoint }));
        transport.expect_receive().never();

        let info = DeviceInfo::new(0x04f3, 0x0c00, "mock");
        let mut device = Device::new(transport, info).unwrap();
        device.open().await.unwrap();

        let err = device.list().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!err.is_sensor_error());
        assert!(matches!(
            err,
            Error::Transport(elanmoc_transport::Error::SendTimeout { endpoint: 0x01 })
        ));
        assert!(!device.session().is_busy());
    }

    #[tokio::test]
    async fn test_receive_uses_capture_endpoint() {
        let mut transport = MockUsb::new();
        transport.expect_open().returning(|| Ok(()));
        transport.expect_is_open().return_const(true);
        transport
            .expect_describe()
            .return_const("mock".to_string());
        transport.expect_transmit().returning(|_, _, _| Ok(()));

        let mut seq = mockall::Sequence::new();
        transport
            .expect_receive()
            .withf(|endpoint, len, _| *endpoint == 0x83 && *len == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(BytesMut::from(&[0x40, 0x01][..])));
        transport
            .expect_receive()
            .withf(|endpoint, len, _| *endpoint == 0x84 && *len == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(BytesMut::from(&[0x40, 0xdd][..])));

        let info = DeviceInfo::new(0x04f3, 0x0c00, "mock");
        let mut device = Device::new(transport, info).unwrap();
        device.open().await.unwrap();

        let err = device.identify(Vec::new()).await.unwrap_err();
        assert!(err.is_sensor_error());
        assert_eq!(
            err.fatal_reason(),
            Some(elanmoc::FatalReason::StorageFull)
        );
    }
}
