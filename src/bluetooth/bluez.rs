// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! BlueZ implementation of the radio.

use bluer::{Adapter, AdapterEvent, Session};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{DeviceHandle, Radio, RadioError, RadioEvent, SubscriptionId};

/// Radio backed by the default BlueZ adapter.
pub struct BluezRadio {
    _session: Option<Session>,
    adapter: Option<Adapter>,
    inquiry: Duration,
    event_tx: mpsc::UnboundedSender<RadioEvent>,
    inquiry_task: Mutex<Option<JoinHandle<()>>>,
}

impl BluezRadio {
    /// Connect to BlueZ. A missing daemon or adapter is not an error here;
    /// the radio then reports itself as absent.
    pub async fn new(inquiry: Duration, event_tx: mpsc::UnboundedSender<RadioEvent>) -> Self {
        let (session, adapter) = match Self::open().await {
            Ok((session, adapter)) => {
                info!("Using Bluetooth adapter: {}", adapter.name());
                (Some(session), Some(adapter))
            }
            Err(e) => {
                warn!("No Bluetooth adapter available: {}", e);
                (None, None)
            }
        };

        Self {
            _session: session,
            adapter,
            inquiry,
            event_tx,
            inquiry_task: Mutex::new(None),
        }
    }

    async fn open() -> bluer::Result<(Session, Adapter)> {
        let session = Session::new().await?;
        debug!("BlueZ session created");
        let adapter = session.default_adapter().await?;
        Ok((session, adapter))
    }

    /// Name of the adapter in use, e.g. `hci0`.
    pub fn adapter_name(&self) -> Option<&str> {
        self.adapter.as_ref().map(|a| a.name())
    }

    fn adapter(&self) -> Result<&Adapter, RadioError> {
        self.adapter.as_ref().ok_or(RadioError::Unavailable)
    }

    fn inquiry_running(&self) -> bool {
        self.inquiry_task
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Make `task` the running inquiry, aborting any previous one.
    fn track_inquiry(&self, task: JoinHandle<()>) {
        if let Some(previous) = self.inquiry_task.lock().replace(task) {
            previous.abort();
        }
    }
}

impl Radio for BluezRadio {
    async fn is_present(&self) -> bool {
        self.adapter.is_some()
    }

    async fn is_enabled(&self) -> Result<bool, RadioError> {
        Ok(self.adapter()?.is_powered().await?)
    }

    async fn request_enable(&self) -> Result<(), RadioError> {
        info!("Powering on Bluetooth adapter...");
        self.adapter()?.set_powered(true).await?;
        Ok(())
    }

    async fn request_discoverable(&self, window: Duration) -> Result<(), RadioError> {
        let adapter = self.adapter()?;
        let secs = u32::try_from(window.as_secs()).unwrap_or(u32::MAX);
        adapter.set_discoverable_timeout(secs).await?;
        adapter.set_discoverable(true).await?;
        Ok(())
    }

    async fn is_discovering(&self) -> Result<bool, RadioError> {
        if self.inquiry_running() {
            return Ok(true);
        }
        Ok(self.adapter()?.is_discovering().await?)
    }

    async fn start_discovery(&self, subscription: SubscriptionId) -> Result<bool, RadioError> {
        let adapter = self.adapter()?.clone();
        // Re-announces a device whenever its properties change, so late
        // RSSI and name updates still reach us.
        let events = adapter.discover_devices_with_changes().await?;
        let sightings = events.filter_map(move |event| {
            let adapter = adapter.clone();
            async move { read_sighting(&adapter, event).await }
        });

        self.track_inquiry(tokio::spawn(forward_inquiry(
            sightings,
            subscription,
            self.inquiry,
            self.event_tx.clone(),
        )));
        Ok(true)
    }

    async fn cancel_discovery(&self) -> Result<(), RadioError> {
        // Dropping the event stream stops the inquiry in BlueZ.
        if let Some(task) = self.inquiry_task.lock().take() {
            task.abort();
            info!("Discovery cancelled");
        }
        Ok(())
    }
}

/// Device properties read after an adapter announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Sighting {
    address: String,
    rssi: Option<i16>,
    name: Result<Option<String>, RadioError>,
}

async fn read_sighting(adapter: &Adapter, event: AdapterEvent) -> Option<Sighting> {
    let AdapterEvent::DeviceAdded(address) = event else {
        return None;
    };

    let device = match adapter.device(address) {
        Ok(device) => device,
        Err(e) => {
            debug!("Skipping {}: {}", address, e);
            return None;
        }
    };

    let rssi = match device.rssi().await {
        Ok(rssi) => rssi,
        Err(e) => {
            debug!("No RSSI for {}: {}", address, e);
            None
        }
    };

    Some(Sighting {
        address: address.to_string(),
        rssi,
        name: device.name().await.map_err(RadioError::from),
    })
}

/// Decides which sightings count as found devices.
///
/// BlueZ also announces cached devices that are out of range; those carry no
/// RSSI and are skipped. A live device is reported once its name is known,
/// or when the name lookup was refused. Live devices that never resolved a
/// name are reported by `flush` when the inquiry ends.
#[derive(Debug, Default)]
struct InquiryTracker {
    reported: HashSet<String>,
    unnamed: Vec<String>,
}

impl InquiryTracker {
    fn observe(&mut self, sighting: Sighting) -> Option<DeviceHandle> {
        if sighting.rssi.is_none() || self.reported.contains(&sighting.address) {
            return None;
        }

        let resolved = match &sighting.name {
            Ok(Some(name)) => !name.is_empty(),
            Ok(None) => false,
            Err(_) => true,
        };

        if !resolved {
            if !self.unnamed.contains(&sighting.address) {
                self.unnamed.push(sighting.address);
            }
            return None;
        }

        self.unnamed.retain(|a| *a != sighting.address);
        self.reported.insert(sighting.address.clone());
        Some(DeviceHandle {
            address: sighting.address,
            name: sighting.name,
        })
    }

    fn flush(&mut self) -> Vec<DeviceHandle> {
        let unnamed = std::mem::take(&mut self.unnamed);
        unnamed
            .into_iter()
            .filter(|address| self.reported.insert(address.clone()))
            .map(|address| DeviceHandle::new(address, None))
            .collect()
    }
}

/// Forward live sightings as found notifications until the window closes.
async fn forward_inquiry<S>(
    sightings: S,
    subscription: SubscriptionId,
    window: Duration,
    event_tx: mpsc::UnboundedSender<RadioEvent>,
) where
    S: Stream<Item = Sighting> + Send + 'static,
{
    let mut sightings = Box::pin(sightings);
    let mut tracker = InquiryTracker::default();
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    loop {
        let found = tokio::select! {
            _ = &mut deadline => {
                debug!("Inquiry window of {}s elapsed", window.as_secs());
                break;
            }
            sighting = sightings.next() => match sighting {
                Some(sighting) => tracker.observe(sighting),
                None => break,
            },
        };

        if let Some(device) = found {
            if event_tx
                .send(RadioEvent::DeviceFound { subscription, device })
                .is_err()
            {
                return;
            }
        }
    }

    for device in tracker.flush() {
        if event_tx
            .send(RadioEvent::DeviceFound { subscription, device })
            .is_err()
        {
            return;
        }
    }

    if event_tx
        .send(RadioEvent::DiscoveryFinished { subscription })
        .is_err()
    {
        debug!("Radio event receiver gone");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn sighting(address: &str, rssi: Option<i16>, name: Option<&str>) -> Sighting {
        Sighting {
            address: address.to_string(),
            rssi,
            name: Ok(name.map(str::to_string)),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RadioEvent>) -> Vec<RadioEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn found(subscription: SubscriptionId, address: &str, name: Option<&str>) -> RadioEvent {
        RadioEvent::DeviceFound {
            subscription,
            device: DeviceHandle::new(address, name),
        }
    }

    #[test]
    fn test_cached_device_out_of_range_is_skipped() {
        let mut tracker = InquiryTracker::default();
        assert_eq!(tracker.observe(sighting("AA", None, Some("Headset"))), None);
        assert!(tracker.flush().is_empty());
    }

    #[test]
    fn test_live_named_device_reported_once() {
        let mut tracker = InquiryTracker::default();
        assert_eq!(
            tracker.observe(sighting("AA", Some(-60), Some("Pixel"))),
            Some(DeviceHandle::new("AA", Some("Pixel")))
        );
        assert_eq!(tracker.observe(sighting("AA", Some(-55), Some("Pixel"))), None);
    }

    #[test]
    fn test_name_arriving_later_is_used() {
        let mut tracker = InquiryTracker::default();
        assert_eq!(tracker.observe(sighting("AA", Some(-70), None)), None);
        assert_eq!(
            tracker.observe(sighting("AA", Some(-68), Some("Buds"))),
            Some(DeviceHandle::new("AA", Some("Buds")))
        );
        assert!(tracker.flush().is_empty());
    }

    #[test]
    fn test_refused_name_is_reported_immediately() {
        let mut tracker = InquiryTracker::default();
        let refused = Sighting {
            address: "AA".to_string(),
            rssi: Some(-40),
            name: Err(RadioError::NotAuthorized),
        };
        let device = tracker.observe(refused).unwrap();
        assert_eq!(device.name, Err(RadioError::NotAuthorized));
    }

    #[test]
    fn test_flush_reports_nameless_devices() {
        let mut tracker = InquiryTracker::default();
        tracker.observe(sighting("AA", Some(-70), None));
        tracker.observe(sighting("BB", Some(-70), Some("")));
        assert_eq!(
            tracker.flush(),
            vec![DeviceHandle::new("AA", None), DeviceHandle::new("BB", None)]
        );
        assert!(tracker.flush().is_empty());
    }

    #[tokio::test]
    async fn test_inquiry_posts_found_then_finished() {
        tokio::time::pause();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = SubscriptionId(3);
        let sightings = stream::iter(vec![
            sighting("00:00:00:00:00:01", None, Some("Cached")),
            sighting("00:00:00:00:00:02", Some(-50), Some("Pixel")),
            sighting("00:00:00:00:00:03", Some(-80), None),
            sighting("00:00:00:00:00:02", Some(-49), Some("Pixel")),
        ])
        .chain(stream::pending());

        forward_inquiry(sightings, sub, Duration::from_secs(12), tx).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                found(sub, "00:00:00:00:00:02", Some("Pixel")),
                found(sub, "00:00:00:00:00:03", None),
                RadioEvent::DiscoveryFinished { subscription: sub },
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_inquiry_never_finishes() {
        tokio::time::pause();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let radio = BluezRadio {
            _session: None,
            adapter: None,
            inquiry: Duration::from_secs(12),
            event_tx: tx.clone(),
            inquiry_task: Mutex::new(None),
        };

        let sub = SubscriptionId(1);
        let sightings = stream::iter(vec![sighting("AA", Some(-50), Some("Pixel"))])
            .chain(stream::pending());
        radio.track_inquiry(tokio::spawn(forward_inquiry(
            sightings,
            sub,
            radio.inquiry,
            tx,
        )));
        assert_eq!(rx.recv().await, Some(found(sub, "AA", Some("Pixel"))));
        assert_eq!(radio.is_discovering().await, Ok(true));

        radio.cancel_discovery().await.unwrap();
        assert!(!radio.inquiry_running());
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;

        assert!(drain(&mut rx).is_empty());
    }
}
